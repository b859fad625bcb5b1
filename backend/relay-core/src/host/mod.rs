//! Host applications and their automation endpoints.
//!
//! A running host exposes a narrow automation surface ([`HostAutomation`]) with
//! exactly the operations the resolver needs. Callers never hold a raw
//! endpoint: they get a [`HostHandle`], a non-owning reference that is released
//! when the handle goes out of scope.

pub mod process_table;
pub mod registry;

pub use registry::{HostClass, HostProbe, HostRegistry, RegistryEntry};

use crate::error::AutomationError;

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use log::trace;

/// Document currently focused in a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDocument {
    pub full_name: String,
}

/// Capability adapter bound to one host application's automation interface.
pub trait HostAutomation: Send {
    /// Structured "open file" call.
    fn open_file(&self, path: &Path) -> Result<(), AutomationError>;

    /// Generic "execute named command" call.
    fn execute_named_command(&self, name: &str, argument: &str) -> Result<(), AutomationError>;

    fn active_document(&self) -> Result<ActiveDocument, AutomationError>;

    fn goto_line(&self, document: &ActiveDocument, line: NonZeroU32)
    -> Result<(), AutomationError>;

    /// Path of the project descriptor the host currently has loaded.
    fn loaded_project_path(&self) -> Result<PathBuf, AutomationError>;

    /// Give the reference back to the OS-managed registry.
    fn release(&mut self);
}

/// Reference to a running host's automation endpoint.
///
/// Valid only for the resolution that obtained it. The endpoint is released
/// exactly once, either by [`HostHandle::release`] or on drop.
pub struct HostHandle {
    identity: String,
    endpoint: Option<Box<dyn HostAutomation>>,
}

impl HostHandle {
    pub fn new(identity: impl Into<String>, endpoint: Box<dyn HostAutomation>) -> Self {
        Self {
            identity: identity.into(),
            endpoint: Some(endpoint),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[track_caller]
    fn endpoint(&self) -> Result<&dyn HostAutomation, AutomationError> {
        self.endpoint
            .as_deref()
            .ok_or_else(AutomationError::released)
    }

    pub fn open_file(&self, path: &Path) -> Result<(), AutomationError> {
        self.endpoint()?.open_file(path)
    }

    pub fn execute_named_command(&self, name: &str, argument: &str) -> Result<(), AutomationError> {
        self.endpoint()?.execute_named_command(name, argument)
    }

    pub fn active_document(&self) -> Result<ActiveDocument, AutomationError> {
        self.endpoint()?.active_document()
    }

    pub fn goto_line(
        &self,
        document: &ActiveDocument,
        line: NonZeroU32,
    ) -> Result<(), AutomationError> {
        self.endpoint()?.goto_line(document, line)
    }

    pub fn loaded_project_path(&self) -> Result<PathBuf, AutomationError> {
        self.endpoint()?.loaded_project_path()
    }

    pub fn release(mut self) {
        self.release_endpoint();
    }

    fn release_endpoint(&mut self) {
        if let Some(mut endpoint) = self.endpoint.take() {
            endpoint.release();
            trace!("Released host handle {}", self.identity);
        }
    }
}

impl Drop for HostHandle {
    fn drop(&mut self) {
        self.release_endpoint();
    }
}

impl std::fmt::Debug for HostHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHandle")
            .field("identity", &self.identity)
            .field("released", &self.endpoint.is_none())
            .finish()
    }
}
