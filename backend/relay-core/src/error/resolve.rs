use crate::error::LaunchError;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ResolveError {
    #[error("Open Failure: {message} {location}")]
    OpenFailure {
        message: String,
        location: ErrorLocation,
    },

    #[error("Missing File Error: {message} {location}")]
    MissingFile {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl ResolveError {
    #[track_caller]
    pub fn open_failure(message: impl Into<String>) -> Self {
        ResolveError::OpenFailure {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn missing_file(message: impl Into<String>) -> Self {
        ResolveError::MissingFile {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
