//! Error types for the command channel.
//!
//! `ConnectTimeout` is the only variant a client reports to its own caller as
//! "no server is listening"; every other variant is an I/O or decoding failure.

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;
use std::time::Duration;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ChannelError {
    #[error("Connect Timeout Error: {message} {location}")]
    ConnectTimeout {
        message: String,
        timeout: Duration,
        location: ErrorLocation,
    },

    #[error("Channel Error: {message} {location}")]
    Channel {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Parse Error: {message} {location}")]
    Parse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Already Served Error: {message} {location}")]
    AlreadyServed {
        message: String,
        location: ErrorLocation,
    },
}

impl ChannelError {
    #[track_caller]
    pub fn connect_timeout(endpoint: impl AsRef<str>, timeout: Duration) -> Self {
        ChannelError::ConnectTimeout {
            message: format!(
                "No server accepted a connection on {} within {timeout:?}",
                endpoint.as_ref()
            ),
            timeout,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn io(context: impl Into<String>, source: IoError) -> Self {
        let context = context.into();
        ChannelError::Channel {
            message: format!("{context}: {source}"),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn parse(message: impl Into<String>) -> Self {
        ChannelError::Parse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_served(endpoint: impl AsRef<str>) -> Self {
        ChannelError::AlreadyServed {
            message: format!("Another server is listening on {}", endpoint.as_ref()),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the failure means "no server is currently listening".
    pub fn is_connect_timeout(&self) -> bool {
        matches!(self, ChannelError::ConnectTimeout { .. })
    }
}
