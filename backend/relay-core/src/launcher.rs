//! Starts the host application.
//!
//! Every call site launches fire-and-forget: the relay never blocks on the
//! lifetime of the host process. A background thread reaps the child so it does
//! not linger as a zombie once it exits.

use crate::error::LaunchError;
use crate::project::ProjectIdentifier;
use crate::{COMMAND_SWITCH, EDIT_SWITCH};

use common::ErrorLocation;

use std::env::current_exe;
use std::io::{Error as IoError, ErrorKind};
use std::num::NonZeroU32;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::thread;

use log::{debug, info, trace, warn};

/// Argument list for one host invocation.
///
/// Recognised forms: project path only; project path plus `/Edit <file>`; any
/// of those plus `/Command "<goto> <line>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs(Vec<String>);

impl LaunchArgs {
    /// Open a project with no file (the `LaunchHost` step).
    pub fn for_project(project: &ProjectIdentifier) -> Self {
        Self(vec![project.path().to_string_lossy().into_owned()])
    }

    /// Full command-line form used when no automation handle is available.
    pub fn command_line(
        project: Option<&ProjectIdentifier>,
        file_path: Option<&str>,
        line: Option<NonZeroU32>,
        goto_command: &str,
    ) -> Self {
        let mut args = match project {
            Some(project) => Self::for_project(project),
            None => Self::default(),
        };

        if let Some(file_path) = file_path {
            args.0.push(EDIT_SWITCH.to_string());
            args.0.push(file_path.to_string());
        }

        if let Some(line) = line {
            args.0.push(COMMAND_SWITCH.to_string());
            args.0.push(format!("{goto_command} {line}"));
        }

        args
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Human-readable command line: switches bare, every value quoted.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .map(|arg| {
                if is_switch(arg) {
                    arg.clone()
                } else {
                    format!("\"{arg}\"")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<String>> for LaunchArgs {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

fn is_switch(arg: &str) -> bool {
    arg == EDIT_SWITCH || arg == COMMAND_SWITCH
}

/// Process creation seam, replaced by recording doubles in tests.
pub trait Launcher: Send + Sync {
    fn launch(&self, args: &LaunchArgs, wait: bool) -> Result<(), LaunchError>;
}

/// Launches the configured host executable as an OS process.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    executable: PathBuf,
}

impl ProcessLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    #[track_caller]
    fn spawn(&self, args: &LaunchArgs) -> Result<Child, LaunchError> {
        match build_launch_command(&self.executable, args).spawn() {
            Ok(child) => Ok(child),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    "{} not found, trying next to the relay binary",
                    self.executable.display()
                );
                self.spawn_local_binary(args)
            }
            Err(err) => Err(LaunchError::Spawn {
                message: format!("Failed to launch {}: {err}", self.executable.display()),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(err),
            }),
        }
    }

    #[track_caller]
    fn spawn_local_binary(&self, args: &LaunchArgs) -> Result<Child, LaunchError> {
        let exe = current_exe().map_err(|e| LaunchError::Spawn {
            message: format!("Failed to get current executable path: {e}"),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(e),
        })?;

        let dir = exe.parent().ok_or_else(|| LaunchError::Spawn {
            message: format!("Executable has no parent directory: {}", exe.display()),
            location: ErrorLocation::from(Location::caller()),
            source: Box::new(IoError::new(ErrorKind::NotFound, "no parent dir")),
        })?;

        let file_name = self.executable.file_name().ok_or_else(|| LaunchError::Validation {
            message: format!("Host executable has no file name: {}", self.executable.display()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let local_path = dir.join(file_name);
        build_launch_command(&local_path, args)
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                message: format!("Failed to launch {}: {e}", local_path.display()),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            })
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, args: &LaunchArgs, wait: bool) -> Result<(), LaunchError> {
        if self.executable.as_os_str().is_empty() {
            return Err(LaunchError::Validation {
                message: String::from("Host executable is not configured"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        info!("Launching {} {}", self.executable.display(), args.render());

        let mut child = self.spawn(args)?;
        let pid = child.id();

        if wait {
            let status = child.wait().map_err(|e| LaunchError::Wait {
                message: format!("Failed waiting for host process {pid}: {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: Box::new(e),
            })?;
            debug!("Host process {pid} exited with {status}");
            return Ok(());
        }

        debug!("Host process {pid} started, not waiting");
        let reaper = thread::Builder::new()
            .name(format!("reap-{pid}"))
            .spawn(move || match child.wait() {
                Ok(status) => trace!("Host process {pid} exited with {status}"),
                Err(e) => trace!("Lost track of host process {pid}: {e}"),
            });

        if let Err(e) = reaper {
            warn!("Could not start reaper for host process {pid}: {e}");
        }

        Ok(())
    }
}

pub(crate) fn build_launch_command(executable: &Path, args: &LaunchArgs) -> ProcessCommand {
    let mut cmd = ProcessCommand::new(executable);
    cmd.args(args.as_slice())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    cmd
}
