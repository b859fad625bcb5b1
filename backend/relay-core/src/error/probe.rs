use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProbeError {
    #[error("Registry Enumeration Error: {message} {location}")]
    Enumeration {
        message: String,
        location: ErrorLocation,
    },

    #[error("Registry Inspection Error: {identity}: {message} {location}")]
    Inspection {
        identity: String,
        message: String,
        location: ErrorLocation,
    },
}

impl ProbeError {
    #[track_caller]
    pub fn enumeration(message: impl Into<String>) -> Self {
        ProbeError::Enumeration {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn inspection(identity: impl Into<String>, message: impl Into<String>) -> Self {
        ProbeError::Inspection {
            identity: identity.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
