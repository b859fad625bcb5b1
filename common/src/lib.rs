//! Shared building blocks for the editor relay.
//!
//! This crate holds the pieces every other crate in the workspace depends on
//! and that carry no business logic of their own.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking
//! - **relay-core**: leader arbitration, command channel, host resolution
//! - **editor-relay**: the binary wiring everything together

pub mod error;

#[cfg(test)]
mod tests;

pub use error::error_location::ErrorLocation;
