//! Errors raised by a host's automation endpoint.

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AutomationError {
    #[error("Open File Error: {message} {location}")]
    Open {
        message: String,
        location: ErrorLocation,
    },

    #[error("Named Command Error: '{name}': {message} {location}")]
    Command {
        name: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("Navigate Error: {message} {location}")]
    Navigate {
        message: String,
        location: ErrorLocation,
    },

    #[error("No Project Loaded Error: {message} {location}")]
    NoProject {
        message: String,
        location: ErrorLocation,
    },

    #[error("Handle Released Error {location}")]
    Released { location: ErrorLocation },
}

impl AutomationError {
    #[track_caller]
    pub fn open(message: impl Into<String>) -> Self {
        AutomationError::Open {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn command(name: impl Into<String>, message: impl Into<String>) -> Self {
        AutomationError::Command {
            name: name.into(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn navigate(message: impl Into<String>) -> Self {
        AutomationError::Navigate {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_project(message: impl Into<String>) -> Self {
        AutomationError::NoProject {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn released() -> Self {
        AutomationError::Released {
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
