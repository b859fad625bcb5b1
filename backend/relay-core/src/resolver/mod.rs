//! Attach-or-launch resolver.
//!
//! Given a command and the project it belongs to, the resolver either attaches
//! to a running host that has that project loaded, launches one and waits for it
//! to register, or hands everything to the host's command line:
//!
//! ```text
//! ProbeExisting -> OpenInHost
//!               -> LaunchHost -> PollForHost -> OpenInHost
//!                                            -> FallbackLaunch
//! ```
//!
//! A command with the new-instance flag, or without a known project, goes
//! straight to `FallbackLaunch`. The registry is never consulted in that case.

mod attempt;

pub use attempt::{Outcome, ResolutionAttempt, ResolutionState};

use crate::command::Command;
use crate::dispatch::guarded;
use crate::error::ResolveError;
use crate::host::{HostClass, HostHandle, HostProbe, HostRegistry};
use crate::launcher::{LaunchArgs, Launcher};
use crate::project::ProjectIdentifier;

use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use log::{debug, info, warn};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(15);
pub const DEFAULT_OPEN_FILE_COMMAND: &str = "File.OpenFile";
pub const DEFAULT_GOTO_COMMAND: &str = "Edit.GoTo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverSettings {
    pub poll_interval: Duration,
    pub poll_budget: Duration,
    pub open_file_command: String,
    pub goto_command: String,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
            open_file_command: DEFAULT_OPEN_FILE_COMMAND.to_string(),
            goto_command: DEFAULT_GOTO_COMMAND.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Resolver<R, L> {
    probe: HostProbe<R>,
    launcher: L,
    settings: ResolverSettings,
}

impl<R: HostRegistry, L: Launcher> Resolver<R, L> {
    pub fn new(registry: R, class: HostClass, launcher: L, settings: ResolverSettings) -> Self {
        Self {
            probe: HostProbe::new(registry, class),
            launcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn registry(&self) -> &R {
        self.probe.registry()
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Run one resolution to a terminal state.
    ///
    /// Blocks the calling thread for up to the poll budget plus one interval
    /// while waiting for a launched host to register.
    pub fn resolve(
        &self,
        command: Command,
        project: Option<ProjectIdentifier>,
    ) -> Result<ResolutionAttempt, ResolveError> {
        let mut attempt = ResolutionAttempt::new(command, project);

        match self.run(&mut attempt) {
            Ok(outcome) => {
                attempt.transition(ResolutionState::Terminal(outcome));
                Ok(attempt)
            }
            Err(e) => {
                attempt.transition(ResolutionState::Terminal(Outcome::Failed));
                Err(e)
            }
        }
    }

    fn run(&self, attempt: &mut ResolutionAttempt) -> Result<Outcome, ResolveError> {
        if attempt.command().file_path().is_none() {
            return Err(ResolveError::missing_file("Command carries no file path"));
        }

        if attempt.command().is_new_instance() {
            info!("New host instance requested, skipping registry");
            attempt.transition(ResolutionState::FallbackLaunch);
            return self.fallback_launch(attempt);
        }

        let Some(target) = attempt.target().cloned() else {
            info!("No project known, launching host without one");
            attempt.transition(ResolutionState::FallbackLaunch);
            return self.fallback_launch(attempt);
        };

        attempt.transition(ResolutionState::ProbeExisting);
        if let Some(handle) = guarded("registry probe", || self.probe.find_host(&target)).flatten() {
            attempt.transition(ResolutionState::OpenInHost);
            return self.open_in_host(handle, attempt.command());
        }

        attempt.transition(ResolutionState::LaunchHost);
        guarded("host launch", || {
            self.launcher.launch(&LaunchArgs::for_project(&target), false)
        });

        attempt.transition(ResolutionState::PollForHost);
        match self.poll_for_host(&target, attempt) {
            Some(handle) => {
                attempt.transition(ResolutionState::OpenInHost);
                self.open_in_host(handle, attempt.command())
            }
            None => {
                info!(
                    "Host for {target} did not register within {:?}, using its command line",
                    self.settings.poll_budget
                );
                attempt.transition(ResolutionState::FallbackLaunch);
                self.fallback_launch(attempt)
            }
        }
    }

    /// Probe at a fixed interval until a match or the budget runs out. Probe
    /// failures only end their own attempt.
    fn poll_for_host(
        &self,
        target: &ProjectIdentifier,
        attempt: &mut ResolutionAttempt,
    ) -> Option<HostHandle> {
        let interval = self.settings.poll_interval;
        let mut backoff = ExponentialBackoff {
            current_interval: interval,
            initial_interval: interval,
            max_interval: interval,
            multiplier: 1.0,
            randomization_factor: 0.0,
            max_elapsed_time: Some(self.settings.poll_budget),
            ..Default::default()
        };
        backoff.reset();

        while let Some(delay) = backoff.next_backoff() {
            sleep(delay);
            attempt.record_poll();

            if let Some(handle) = guarded("registry poll", || self.probe.find_host(target)).flatten()
            {
                debug!(
                    "Host for {target} registered after {} polls",
                    attempt.poll_count()
                );
                return Some(handle);
            }
        }

        None
    }

    /// Open through the handle: structured call first, then the generic named
    /// command. The handle is released on every path out of here.
    fn open_in_host(&self, handle: HostHandle, command: &Command) -> Result<Outcome, ResolveError> {
        let Some(file_path) = command.file_path() else {
            return Err(ResolveError::missing_file("Command carries no file path"));
        };

        let opened = match handle.open_file(Path::new(file_path)) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    "Structured open failed in {}: {e}; trying '{}'",
                    handle.identity(),
                    self.settings.open_file_command
                );
                match handle.execute_named_command(&self.settings.open_file_command, file_path) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Named open command failed in {}: {e}", handle.identity());
                        false
                    }
                }
            }
        };

        if !opened {
            return Err(ResolveError::open_failure(format!(
                "Every open strategy failed for {file_path} in {}",
                handle.identity()
            )));
        }

        if let Some(line) = command.line() {
            let navigated = handle
                .active_document()
                .and_then(|document| handle.goto_line(&document, line));
            if let Err(e) = navigated {
                warn!("Opened {file_path} but could not go to line {line}: {e}");
            }
        }

        info!("Opened {file_path} in {}", handle.identity());
        handle.release();
        Ok(Outcome::Opened)
    }

    fn fallback_launch(&self, attempt: &ResolutionAttempt) -> Result<Outcome, ResolveError> {
        let command = attempt.command();
        let args = LaunchArgs::command_line(
            attempt.target(),
            command.file_path(),
            command.line(),
            &self.settings.goto_command,
        );

        self.launcher.launch(&args, false)?;
        Ok(Outcome::FallbackOpened)
    }
}
