// Unit tests for host class matching and the registry probe
// Resolver-level probing is covered in integration_tests/resolver.rs

use crate::error::{AutomationError, ProbeError};
use crate::host::{
    ActiveDocument, HostAutomation, HostClass, HostProbe, HostRegistry, RegistryEntry,
};
use crate::project::ProjectIdentifier;

use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct FixedProject {
    project: Option<PathBuf>,
    releases: Arc<AtomicUsize>,
}

impl HostAutomation for FixedProject {
    fn open_file(&self, _path: &Path) -> Result<(), AutomationError> {
        Ok(())
    }

    fn execute_named_command(&self, _name: &str, _argument: &str) -> Result<(), AutomationError> {
        Ok(())
    }

    fn active_document(&self) -> Result<ActiveDocument, AutomationError> {
        Err(AutomationError::navigate("none"))
    }

    fn goto_line(
        &self,
        _document: &ActiveDocument,
        _line: NonZeroU32,
    ) -> Result<(), AutomationError> {
        Ok(())
    }

    fn loaded_project_path(&self) -> Result<PathBuf, AutomationError> {
        self.project
            .clone()
            .ok_or_else(|| AutomationError::no_project("starting up"))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

struct ListRegistry {
    hosts: Vec<(&'static str, Option<&'static str>)>,
    binds: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl ListRegistry {
    fn new(hosts: Vec<(&'static str, Option<&'static str>)>) -> Self {
        Self {
            hosts,
            binds: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl HostRegistry for ListRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>, ProbeError> {
        Ok(self
            .hosts
            .iter()
            .map(|(identity, project)| {
                let binds = Arc::clone(&self.binds);
                let releases = Arc::clone(&self.releases);
                let project = project.map(PathBuf::from);
                RegistryEntry::new(*identity, move || {
                    binds.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(FixedProject { project, releases }) as Box<dyn HostAutomation>)
                })
            })
            .collect())
    }
}

/// **VALUE**: Verifies host class matching on `<class>:<instance>` identities.
///
/// **BUG THIS CATCHES**: Would catch a case-sensitive compare or one that trips over the
/// `.exe` suffix on Windows process names.
#[test]
fn given_identities_when_matching_host_class_then_class_part_is_compared() {
    let class = HostClass::new("DevEnv");

    assert!(class.matches("devenv:1234"));
    assert!(class.matches("DEVENV.EXE:99"));
    assert!(class.matches("devenv"));
    assert!(!class.matches("notepad:1234"));
    assert!(!class.matches("devenv-helper:1"));
}

/// **VALUE**: Verifies entries of another class are never bound.
///
/// **WHY THIS MATTERS**: Binding is the expensive step and may have side effects on
/// unrelated processes.
#[test]
fn given_foreign_class_entries_when_probing_then_only_host_entries_are_bound() {
    // GIVEN: One foreign entry and one host entry with the target loaded
    let registry = ListRegistry::new(vec![
        ("shell:1", Some("/repo/App.sln")),
        ("devenv:2", Some("/Repo/app.sln")),
    ]);
    let binds = Arc::clone(&registry.binds);
    let probe = HostProbe::new(registry, HostClass::new("devenv"));

    // WHEN: Probing
    let handle = probe
        .find_host(&ProjectIdentifier::new("/repo/App.sln"))
        .expect("probe");

    // THEN: Matched the host entry, bound only it
    assert_eq!(handle.as_ref().map(|h| h.identity()), Some("devenv:2"));
    assert_eq!(binds.load(Ordering::SeqCst), 1);
}

/// **VALUE**: Verifies entries that fail inspection are skipped, and mismatches released.
///
/// **BUG THIS CATCHES**: Would catch the probe aborting on a host that is still starting
/// up, or leaking handles for hosts with another project loaded.
#[test]
fn given_starting_and_mismatched_hosts_when_probing_then_skipped_and_released() {
    // GIVEN: A host without a project, one with another project, one matching
    let registry = ListRegistry::new(vec![
        ("devenv:1", None),
        ("devenv:2", Some("/other/Other.sln")),
        ("devenv:3", Some("/repo/App.sln")),
    ]);
    let releases = Arc::clone(&registry.releases);
    let probe = HostProbe::new(registry, HostClass::new("devenv"));

    // WHEN: Probing
    let handle = probe
        .find_host(&ProjectIdentifier::new("/repo/App.sln"))
        .expect("probe")
        .expect("matching host");

    // THEN: The first two were released, the match is still held
    assert_eq!(handle.identity(), "devenv:3");
    assert_eq!(releases.load(Ordering::SeqCst), 2);

    handle.release();
    assert_eq!(releases.load(Ordering::SeqCst), 3);
}

/// **VALUE**: Verifies an empty registry is a miss, not an error.
#[test]
fn given_no_hosts_when_probing_then_none() {
    let probe = HostProbe::new(ListRegistry::new(vec![]), HostClass::new("devenv"));

    let result = probe.find_host(&ProjectIdentifier::new("/repo/App.sln"));

    assert!(matches!(result, Ok(None)));
}
