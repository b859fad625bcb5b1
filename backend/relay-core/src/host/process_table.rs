//! Host registry backed by the OS process table.
//!
//! Every running process is listed as `<name>:<pid>`. A host's loaded project is
//! the first argument on its command line that has a project extension, and the
//! automation adapter drives the host through its own command-line surface
//! (`/Edit`, `/Command`) by re-invoking the host's executable.

use crate::error::{AutomationError, ProbeError};
use crate::host::registry::{HostRegistry, RegistryEntry};
use crate::host::{ActiveDocument, HostAutomation};
use crate::launcher::{LaunchArgs, Launcher, ProcessLauncher};
use crate::{COMMAND_SWITCH, EDIT_SWITCH};

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use log::trace;
use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};

#[derive(Debug, Clone)]
pub struct ProcessTableRegistry {
    fallback_executable: PathBuf,
    project_extensions: Vec<String>,
    goto_command: String,
}

impl ProcessTableRegistry {
    pub fn new<I, S>(
        fallback_executable: impl Into<PathBuf>,
        project_extensions: I,
        goto_command: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fallback_executable: fallback_executable.into(),
            project_extensions: project_extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
            goto_command: goto_command.into(),
        }
    }
}

impl HostRegistry for ProcessTableRegistry {
    fn entries(&self) -> Result<Vec<RegistryEntry>, ProbeError> {
        let mut sys = System::new();
        let refreshed = sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_cmd(UpdateKind::OnlyIfNotSet)
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_cwd(UpdateKind::OnlyIfNotSet),
        );

        if refreshed == 0 {
            return Err(ProbeError::enumeration("Process table is empty"));
        }

        let mut snapshots: Vec<ProcessSnapshot> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessSnapshot::capture(*pid, process))
            .collect();
        snapshots.sort_by_key(|s| s.pid);

        trace!("Process table has {} entries", snapshots.len());

        Ok(snapshots
            .into_iter()
            .map(|snapshot| {
                let identity = snapshot.identity();
                let executable = snapshot
                    .executable
                    .clone()
                    .unwrap_or_else(|| self.fallback_executable.clone());
                let extensions = self.project_extensions.clone();
                let goto_command = self.goto_command.clone();

                RegistryEntry::new(identity, move || {
                    let adapter = CommandLineAutomation::new(
                        snapshot.pid,
                        ProcessLauncher::new(executable),
                        loaded_project(&snapshot, &extensions),
                        goto_command,
                    );
                    Ok(Box::new(adapter) as Box<dyn HostAutomation>)
                })
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ProcessSnapshot {
    pub(crate) pid: u32,
    pub(crate) name: String,
    pub(crate) executable: Option<PathBuf>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) args: Vec<String>,
}

impl ProcessSnapshot {
    fn capture(pid: Pid, process: &Process) -> Self {
        Self {
            pid: pid.as_u32(),
            name: process.name().to_string_lossy().into_owned(),
            executable: process.exe().map(Path::to_path_buf),
            cwd: process.cwd().map(Path::to_path_buf),
            args: process
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy().into_owned())
                .collect(),
        }
    }

    pub(crate) fn identity(&self) -> String {
        format!("{}:{}", self.name, self.pid)
    }
}

/// First command-line argument (after the program) with a project extension,
/// resolved against the process working directory when relative.
pub(crate) fn loaded_project(snapshot: &ProcessSnapshot, extensions: &[String]) -> Option<PathBuf> {
    snapshot
        .args
        .iter()
        .skip(1)
        .map(Path::new)
        .find(|arg| {
            arg.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .is_some_and(|ext| extensions.contains(&ext))
        })
        .map(|arg| match &snapshot.cwd {
            Some(cwd) if arg.is_relative() => cwd.join(arg),
            _ => arg.to_path_buf(),
        })
}

/// Automation adapter that talks to a running host through its command line.
pub(crate) struct CommandLineAutomation {
    pid: u32,
    launcher: ProcessLauncher,
    project: Option<PathBuf>,
    goto_command: String,
    last_opened: RefCell<Option<String>>,
    released: bool,
}

impl CommandLineAutomation {
    pub(crate) fn new(
        pid: u32,
        launcher: ProcessLauncher,
        project: Option<PathBuf>,
        goto_command: String,
    ) -> Self {
        Self {
            pid,
            launcher,
            project,
            goto_command,
            last_opened: RefCell::new(None),
            released: false,
        }
    }

    fn invoke(&self, args: Vec<String>) -> Result<(), String> {
        if self.released {
            return Err(format!("handle to host {} was released", self.pid));
        }
        self.launcher
            .launch(&LaunchArgs::from(args), false)
            .map_err(|e| e.to_string())
    }
}

impl HostAutomation for CommandLineAutomation {
    fn open_file(&self, path: &Path) -> Result<(), AutomationError> {
        let file = path.to_string_lossy().into_owned();
        self.invoke(vec![EDIT_SWITCH.to_string(), file.clone()])
            .map_err(AutomationError::open)?;
        self.last_opened.replace(Some(file));
        Ok(())
    }

    /// The argument of a successful named command becomes the active document.
    fn execute_named_command(&self, name: &str, argument: &str) -> Result<(), AutomationError> {
        self.invoke(vec![COMMAND_SWITCH.to_string(), format!("{name} {argument}")])
            .map_err(|e| AutomationError::command(name, e))?;
        self.last_opened.replace(Some(argument.to_string()));
        Ok(())
    }

    fn active_document(&self) -> Result<ActiveDocument, AutomationError> {
        self.last_opened
            .borrow()
            .clone()
            .map(|full_name| ActiveDocument { full_name })
            .ok_or_else(|| {
                AutomationError::navigate(format!(
                    "No document was opened in host {} through this handle",
                    self.pid
                ))
            })
    }

    fn goto_line(
        &self,
        document: &ActiveDocument,
        line: NonZeroU32,
    ) -> Result<(), AutomationError> {
        trace!("Navigating {} to line {line}", document.full_name);
        self.invoke(vec![
            COMMAND_SWITCH.to_string(),
            format!("{} {line}", self.goto_command),
        ])
        .map_err(AutomationError::navigate)
    }

    fn loaded_project_path(&self) -> Result<PathBuf, AutomationError> {
        self.project.clone().ok_or_else(|| {
            AutomationError::no_project(format!("Host {} has no project loaded", self.pid))
        })
    }

    fn release(&mut self) {
        self.released = true;
    }
}
