use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by the relay binary.
///
/// Library failures are flattened to their message here; the structured
/// variants stay in `relay_core::error`.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum RelayError {
    /// Error from this binary (logging, directories)
    #[error("Relay Error: {message} {location}")]
    Relay {
        message: String,
        location: ErrorLocation,
    },

    /// Error from relay-core operations (channel, arbiter, config)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// No server accepted the command in time
    #[error("No Server Error: {message} {location}")]
    NoServer {
        message: String,
        location: ErrorLocation,
    },
}
