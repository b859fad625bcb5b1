//! Test doubles for the resolver's seams.
//!
//! - [`FakeRegistry`]: in-memory host table, counts probes
//! - [`FakeAutomation`]: records every call made through a host handle
//! - [`RecordingLauncher`]: records launches and can register a host when one starts

use relay_core::command::{Command, CommandBuilder};
use relay_core::error::{AutomationError, LaunchError, ProbeError};
use relay_core::host::{ActiveDocument, HostAutomation, HostClass, HostRegistry, RegistryEntry};
use relay_core::launcher::{LaunchArgs, Launcher};
use relay_core::resolver::{Resolver, ResolverSettings};

use common::ErrorLocation;

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const HOST_CLASS: &str = "devenv";
pub const PROJECT: &str = "/work/repo/App.sln";
pub const FILE: &str = "/work/repo/src/main.cs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    OpenFile(PathBuf),
    NamedCommand(String, String),
    ActiveDocument,
    GotoLine(String, u32),
    LoadedProject,
    Release,
}

#[derive(Debug, Clone, Default)]
pub struct HostBehavior {
    pub fail_open: bool,
    pub fail_named_command: bool,
}

#[derive(Debug, Clone)]
pub struct FakeHost {
    pub identity: String,
    pub project: Option<PathBuf>,
    pub behavior: HostBehavior,
}

impl FakeHost {
    pub fn with_project(identity: &str, project: &str) -> Self {
        Self {
            identity: identity.to_string(),
            project: Some(PathBuf::from(project)),
            behavior: HostBehavior::default(),
        }
    }

    pub fn behaving(mut self, behavior: HostBehavior) -> Self {
        self.behavior = behavior;
        self
    }
}

type HostTable = Arc<Mutex<Vec<FakeHost>>>;
type CallLog = Arc<Mutex<Vec<HostCall>>>;

/// In-memory registry. Clones share the same host table and call log.
#[derive(Clone, Default)]
pub struct FakeRegistry {
    hosts: HostTable,
    calls: CallLog,
    probes: Arc<AtomicUsize>,
    fail_enumeration: bool,
}

impl FakeRegistry {
    pub fn with_hosts(hosts: Vec<FakeHost>) -> Self {
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_enumeration: true,
            ..Self::default()
        }
    }

    pub fn register(&self, host: FakeHost) {
        self.hosts.lock().expect("host table").push(host);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().expect("call log").clone()
    }
}

impl HostRegistry for FakeRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>, ProbeError> {
        self.probes.fetch_add(1, Ordering::SeqCst);

        if self.fail_enumeration {
            return Err(ProbeError::enumeration("registry unavailable"));
        }

        let hosts = self.hosts.lock().expect("host table").clone();
        Ok(hosts
            .into_iter()
            .map(|host| {
                let calls = Arc::clone(&self.calls);
                let identity = host.identity.clone();
                RegistryEntry::new(identity, move || {
                    Ok(Box::new(FakeAutomation {
                        host,
                        calls,
                        last_opened: RefCell::new(None),
                    }) as Box<dyn HostAutomation>)
                })
            })
            .collect())
    }
}

pub struct FakeAutomation {
    host: FakeHost,
    calls: CallLog,
    last_opened: RefCell<Option<String>>,
}

impl FakeAutomation {
    fn record(&self, call: HostCall) {
        self.calls.lock().expect("call log").push(call);
    }
}

impl HostAutomation for FakeAutomation {
    fn open_file(&self, path: &Path) -> Result<(), AutomationError> {
        self.record(HostCall::OpenFile(path.to_path_buf()));
        if self.host.behavior.fail_open {
            return Err(AutomationError::open("open refused"));
        }
        self.last_opened
            .replace(Some(path.to_string_lossy().into_owned()));
        Ok(())
    }

    fn execute_named_command(&self, name: &str, argument: &str) -> Result<(), AutomationError> {
        self.record(HostCall::NamedCommand(name.to_string(), argument.to_string()));
        if self.host.behavior.fail_named_command {
            return Err(AutomationError::command(name, "command refused"));
        }
        self.last_opened.replace(Some(argument.to_string()));
        Ok(())
    }

    fn active_document(&self) -> Result<ActiveDocument, AutomationError> {
        self.record(HostCall::ActiveDocument);
        self.last_opened
            .borrow()
            .clone()
            .map(|full_name| ActiveDocument { full_name })
            .ok_or_else(|| AutomationError::navigate("no active document"))
    }

    fn goto_line(
        &self,
        document: &ActiveDocument,
        line: NonZeroU32,
    ) -> Result<(), AutomationError> {
        self.record(HostCall::GotoLine(document.full_name.clone(), line.get()));
        Ok(())
    }

    fn loaded_project_path(&self) -> Result<PathBuf, AutomationError> {
        self.record(HostCall::LoadedProject);
        self.host
            .project
            .clone()
            .ok_or_else(|| AutomationError::no_project("host is starting"))
    }

    fn release(&mut self) {
        self.record(HostCall::Release);
    }
}

/// Records launches instead of starting processes.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    launches: Arc<Mutex<Vec<(LaunchArgs, bool)>>>,
    on_launch: Option<(FakeRegistry, FakeHost)>,
    fail: bool,
}

impl RecordingLauncher {
    /// Each launch registers `host` in `registry`, like a real host starting up.
    pub fn registering(registry: &FakeRegistry, host: FakeHost) -> Self {
        Self {
            on_launch: Some((registry.clone(), host)),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> Vec<(LaunchArgs, bool)> {
        self.launches.lock().expect("launch log").clone()
    }
}

impl Launcher for RecordingLauncher {
    fn launch(&self, args: &LaunchArgs, wait: bool) -> Result<(), LaunchError> {
        self.launches
            .lock()
            .expect("launch log")
            .push((args.clone(), wait));

        if self.fail {
            return Err(LaunchError::Validation {
                message: "launch refused".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if let Some((registry, host)) = &self.on_launch {
            registry.register(host.clone());
        }
        Ok(())
    }
}

pub fn fast_settings() -> ResolverSettings {
    ResolverSettings {
        poll_interval: Duration::from_millis(10),
        poll_budget: Duration::from_millis(500),
        ..ResolverSettings::default()
    }
}

pub fn resolver(
    registry: FakeRegistry,
    launcher: RecordingLauncher,
    settings: ResolverSettings,
) -> Resolver<FakeRegistry, RecordingLauncher> {
    Resolver::new(registry, HostClass::new(HOST_CLASS), launcher, settings)
}

pub fn open_at_line(line: u32) -> Command {
    CommandBuilder::default()
        .with_file_path(FILE)
        .with_line(line)
        .build()
        .expect("valid command")
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
