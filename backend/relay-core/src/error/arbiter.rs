use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ArbiterError {
    #[error("Lock File Error: {path}: {message} {location}")]
    LockFile {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Lock Error: {path}: {message} {location}")]
    Lock {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}
