//! Instance arbitration and command dispatch for the editor relay.
//!
//! A short-lived caller hands an "open this file at this line" request to one
//! long-running relay server per machine. The server decides which running host
//! application receives the request, starts one when needed, and falls back to
//! the host's own command line when no programmatic handle is available.

pub mod arbiter;
pub mod channel;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod launcher;
pub mod locator;
pub mod project;
pub mod resolver;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub const RELAY_NAME: &str = "editor-relay";

/// Field delimiter on the wire (ASCII unit separator).
pub const FIELD_SEPARATOR: char = '\u{1F}';

pub const FLAG_PREFIX: &str = "--";
pub const NEW_INSTANCE_FLAG: &str = const_format::concatcp!(FLAG_PREFIX, "new");
pub const SERVER_FLAG: &str = const_format::concatcp!(FLAG_PREFIX, "server");

/// Host command-line switches understood by the launched application.
pub const EDIT_SWITCH: &str = "/Edit";
pub const COMMAND_SWITCH: &str = "/Command";

/// Directory holding the leader lock and the channel socket.
///
/// Uses the per-user runtime directory when the platform has one.
pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(std::env::temp_dir)
}
