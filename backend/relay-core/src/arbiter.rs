//! Leader arbitration.
//!
//! At startup each process tries, once and without blocking, to take an
//! exclusive machine-wide lock. The winner becomes the server and keeps the
//! lock until it exits; everyone else is a client.

use crate::error::ArbiterError;

use common::ErrorLocation;

use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Error as IoError;
use std::panic::Location;
use std::path::{Path, PathBuf};

use fs2::{FileExt, lock_contended_error};
use log::{debug, info, warn};

const LOCK_FILE_EXTENSION: &str = "lock";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Server,
    Client,
}

/// Exclusive lock on the leader file. Released when dropped (process exit).
#[derive(Debug)]
pub struct LeaderLock {
    _file: File,
    path: PathBuf,
}

impl LeaderLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LeaderLock {
    fn drop(&mut self) {
        debug!("Released leader lock {}", self.path.display());
    }
}

/// Role of this process, decided once at startup.
#[derive(Debug)]
pub struct RoleDecision {
    role: Role,
    lock: Option<LeaderLock>,
}

impl RoleDecision {
    pub fn client() -> Self {
        Self {
            role: Role::Client,
            lock: None,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Forced servers run without the lock.
    pub fn lock(&self) -> Option<&LeaderLock> {
        self.lock.as_ref()
    }
}

/// Default lock file for a lock name.
pub fn lock_path_for(name: &str) -> PathBuf {
    crate::runtime_dir().join(format!("{name}.{LOCK_FILE_EXTENSION}"))
}

/// Decide this process's role.
///
/// `force_server` grants the server role even when another process holds the
/// lock. Two servers may then coexist; this is meant for manual diagnostics.
///
/// # Errors
///
/// Returns [`ArbiterError`] if the lock file cannot be opened or locking fails
/// for a reason other than contention.
#[track_caller]
pub fn acquire_role(lock_path: &Path, force_server: bool) -> Result<RoleDecision, ArbiterError> {
    if let Some(parent) = lock_path.parent() {
        create_dir_all(parent).map_err(|e| ArbiterError::LockFile {
            path: parent.to_path_buf(),
            message: String::from("Failed to create lock directory"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| ArbiterError::LockFile {
            path: lock_path.to_path_buf(),
            message: String::from("Failed to open lock file"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            info!("Acquired leader lock {}", lock_path.display());
            Ok(RoleDecision {
                role: Role::Server,
                lock: Some(LeaderLock {
                    _file: file,
                    path: lock_path.to_path_buf(),
                }),
            })
        }
        Err(e) if is_contended(&e) => {
            if force_server {
                warn!(
                    "Leader lock {} is held elsewhere, forcing server role",
                    lock_path.display()
                );
                Ok(RoleDecision {
                    role: Role::Server,
                    lock: None,
                })
            } else {
                debug!("Leader lock {} is held, acting as client", lock_path.display());
                Ok(RoleDecision::client())
            }
        }
        Err(e) => Err(ArbiterError::Lock {
            path: lock_path.to_path_buf(),
            message: String::from("Failed to lock leader file"),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        }),
    }
}

pub(crate) fn is_contended(error: &IoError) -> bool {
    let contended = lock_contended_error();
    match (error.raw_os_error(), contended.raw_os_error()) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => error.kind() == contended.kind(),
    }
}
