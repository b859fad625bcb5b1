//! Host registry probe.
//!
//! The registry is an OS-wide table of running automation-capable processes.
//! It is exposed as a typed sequence of [`RegistryEntry`] values, each carrying
//! a display identity and a lazy factory for the automation endpoint, so that
//! entries of the wrong class are never bound at all.

use crate::error::ProbeError;
use crate::host::{HostAutomation, HostHandle};
use crate::project::ProjectIdentifier;

use log::{debug, trace};

pub type HandleFactory =
    Box<dyn FnOnce() -> Result<Box<dyn HostAutomation>, ProbeError> + Send + 'static>;

pub struct RegistryEntry {
    display_identity: String,
    factory: HandleFactory,
}

impl RegistryEntry {
    pub fn new<F>(display_identity: impl Into<String>, factory: F) -> Self
    where
        F: FnOnce() -> Result<Box<dyn HostAutomation>, ProbeError> + Send + 'static,
    {
        Self {
            display_identity: display_identity.into(),
            factory: Box::new(factory),
        }
    }

    pub fn display_identity(&self) -> &str {
        &self.display_identity
    }

    /// Bind the entry's automation endpoint.
    pub fn bind(self) -> Result<HostHandle, ProbeError> {
        let endpoint = (self.factory)()?;
        Ok(HostHandle::new(self.display_identity, endpoint))
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("display_identity", &self.display_identity)
            .finish_non_exhaustive()
    }
}

/// OS-provided table of running automation-capable processes.
///
/// Enumeration order is registry-defined and not guaranteed stable.
pub trait HostRegistry: Send + Sync {
    fn entries(&self) -> Result<Vec<RegistryEntry>, ProbeError>;
}

/// Recognises display identities that belong to the host application.
///
/// Identities have the form `<class>:<instance>`; the class part is compared
/// case-insensitively, ignoring a trailing `.exe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostClass {
    name: String,
}

impl HostClass {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: strip_exe(name.as_ref()).to_lowercase(),
        }
    }

    pub fn matches(&self, identity: &str) -> bool {
        let class = identity.rsplit_once(':').map_or(identity, |(class, _)| class);
        strip_exe(class).to_lowercase() == self.name
    }
}

fn strip_exe(name: &str) -> &str {
    let len = name.len();
    if len > 4 && name.is_char_boundary(len - 4) && name[len - 4..].eq_ignore_ascii_case(".exe") {
        &name[..len - 4]
    } else {
        name
    }
}

/// Finds the running host that has a given project loaded.
#[derive(Debug)]
pub struct HostProbe<R> {
    registry: R,
    class: HostClass,
}

impl<R: HostRegistry> HostProbe<R> {
    pub fn new(registry: R, class: HostClass) -> Self {
        Self { registry, class }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Return the first host whose normalized loaded project equals `target`.
    ///
    /// Entries that fail while being inspected (e.g. a host still starting up
    /// with no project loaded) are skipped. Only a failure to enumerate the
    /// registry itself is returned as an error.
    pub fn find_host(&self, target: &ProjectIdentifier) -> Result<Option<HostHandle>, ProbeError> {
        let entries = self.registry.entries()?;
        trace!("Probing {} registry entries for {target}", entries.len());

        for entry in entries {
            if !self.class.matches(entry.display_identity()) {
                continue;
            }

            let identity = entry.display_identity().to_string();
            match inspect(entry, target) {
                Ok(Some(handle)) => {
                    debug!("Host {identity} has {target} loaded");
                    return Ok(Some(handle));
                }
                Ok(None) => trace!("Host {identity} has a different project loaded"),
                Err(e) => debug!("Skipping registry entry {identity}: {e}"),
            }
        }

        Ok(None)
    }
}

/// Bind one entry and compare its loaded project. Non-matching handles are
/// dropped, and therefore released, before returning.
fn inspect(
    entry: RegistryEntry,
    target: &ProjectIdentifier,
) -> Result<Option<HostHandle>, ProbeError> {
    let handle = entry.bind()?;

    let loaded = handle
        .loaded_project_path()
        .map_err(|e| ProbeError::inspection(handle.identity(), e.to_string()))?;

    if ProjectIdentifier::new(&loaded) == *target {
        Ok(Some(handle))
    } else {
        Ok(None)
    }
}
