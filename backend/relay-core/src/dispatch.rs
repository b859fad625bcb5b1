//! Hands decoded commands to the resolver.
//!
//! Each command gets its own named OS thread: resolution may sleep for the
//! whole poll budget and automation calls need single-threaded affinity, so it
//! never runs on the channel's runtime or on a shared pool.

use crate::command::Command;
use crate::error::ResolveError;
use crate::host::HostRegistry;
use crate::launcher::Launcher;
use crate::locator::ProjectLocator;
use crate::project::ProjectIdentifier;
use crate::resolver::{ResolutionAttempt, Resolver};

use std::fmt::Display;
use std::io::Error as IoError;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{Builder as ThreadBuilder, JoinHandle};

use log::{error, info};

/// Error boundary around one unit of work: failures are logged and absorbed.
pub fn guarded<T, E, F>(label: &str, work: F) -> Option<T>
where
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    match work() {
        Ok(value) => Some(value),
        Err(e) => {
            error!("{label} failed: {e}");
            None
        }
    }
}

/// Receiver of commands decoded by the channel server.
///
/// Called synchronously from the accept loop, so implementations must return
/// quickly and offload any long work.
pub trait CommandSink: Send + Sync {
    fn dispatch(&self, command: Command);
}

pub struct ResolutionDispatcher<R, L, P> {
    resolver: Arc<Resolver<R, L>>,
    locator: Arc<P>,
    next_id: AtomicU64,
}

impl<R, L, P> ResolutionDispatcher<R, L, P>
where
    R: HostRegistry + 'static,
    L: Launcher + 'static,
    P: ProjectLocator + 'static,
{
    pub fn new(resolver: Resolver<R, L>, locator: P) -> Self {
        Self {
            resolver: Arc::new(resolver),
            locator: Arc::new(locator),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn resolver(&self) -> &Resolver<R, L> {
        &self.resolver
    }

    /// Start a resolution thread for `command`.
    pub fn spawn(
        &self,
        command: Command,
    ) -> Result<JoinHandle<Option<ResolutionAttempt>>, IoError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resolver = Arc::clone(&self.resolver);
        let locator = Arc::clone(&self.locator);

        ThreadBuilder::new()
            .name(format!("resolution-{id}"))
            .spawn(move || {
                let attempt = run_resolution(resolver.as_ref(), locator.as_ref(), command);
                if let Some(attempt) = &attempt {
                    info!("Resolution {id} finished in {}", attempt.state());
                }
                attempt
            })
    }
}

impl<R, L, P> CommandSink for ResolutionDispatcher<R, L, P>
where
    R: HostRegistry + 'static,
    L: Launcher + 'static,
    P: ProjectLocator + 'static,
{
    fn dispatch(&self, command: Command) {
        if let Err(e) = self.spawn(command) {
            error!("Failed to start resolution thread: {e}");
        }
    }
}

/// Locate the command's project and resolve it inside one error boundary.
pub fn run_resolution<R, L, P>(
    resolver: &Resolver<R, L>,
    locator: &P,
    command: Command,
) -> Option<ResolutionAttempt>
where
    R: HostRegistry,
    L: Launcher,
    P: ProjectLocator + ?Sized,
{
    guarded("resolution", || {
        let file_path = command
            .file_path()
            .ok_or_else(|| ResolveError::missing_file("Command carries no file path"))?;

        let project = locator
            .find_project_for(Path::new(file_path))
            .map(ProjectIdentifier::new);

        resolver.resolve(command, project)
    })
}
