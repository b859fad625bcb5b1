//! Run modes of the relay binary.
//!
//! Every invocation decides its role once: the leader becomes the long-running
//! server, everyone else forwards its command to that server and exits.

use crate::args::Invocation;
use crate::error::RelayError;
use crate::logger::{default_log_dir, initialize as initialize_logger, prepare_log_dir};

use relay_core::arbiter::{Role, RoleDecision, acquire_role};
use relay_core::channel::{ChannelAddress, ChannelServer, ServerSettings, send};
use relay_core::command::Command;
use relay_core::config::RelayConfig;
use relay_core::dispatch::{CommandSink, ResolutionDispatcher};
use relay_core::error::ChannelError;
use relay_core::host::process_table::ProcessTableRegistry;
use relay_core::launcher::ProcessLauncher;
use relay_core::locator::AncestorLocator;
use relay_core::resolver::Resolver;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = -1;
/// Server could not open its endpoint.
pub const EXIT_SERVER_ERROR: i32 = 1;

/// Parse `args` (without the program name), pick a role and run it.
pub async fn run<I, S>(args: I) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let invocation = Invocation::parse(args);
    start_logging();

    let config = load_config();

    let decision = match acquire_role(&config.lock_path(), invocation.force_server()) {
        Ok(decision) => decision,
        Err(e) => {
            warn!("Leader arbitration failed, acting as client: {e}");
            RoleDecision::client()
        }
    };

    match decision.role() {
        Role::Server => run_server(&config, invocation.into_command(), decision).await,
        Role::Client => {
            if !invocation.has_request() {
                info!("No file given and a server is already running, nothing to do");
                return EXIT_SUCCESS;
            }
            run_client(
                &config.channel_address(),
                invocation.command(),
                config.connect_timeout(),
            )
            .await
        }
    }
}

/// Logging is best-effort: failures are reported on stderr and ignored.
fn start_logging() {
    let log_dir = default_log_dir();
    let started = prepare_log_dir(&log_dir).and_then(|()| initialize_logger(&log_dir));

    match started {
        Ok(()) => debug!("Log directory: {}", log_dir.display()),
        Err(e) => eprintln!("Logging disabled: {e}"),
    }
}

fn load_config() -> RelayConfig {
    match RelayConfig::default_dir() {
        Some(dir) => RelayConfig::load_or_default(&dir),
        None => {
            warn!("No config directory on this platform, using defaults");
            RelayConfig::default()
        }
    }
}

/// Forward `command` to the running server. Returns the process exit code.
pub async fn run_client(address: &ChannelAddress, command: &Command, timeout: Duration) -> i32 {
    match send_command(address, command, timeout).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!("{e}");
            EXIT_FAILURE
        }
    }
}

/// Send one command, mapping channel failures to [`RelayError`].
///
/// # Errors
///
/// - [`RelayError::NoServer`] if no server accepted within `timeout`
/// - [`RelayError::Core`] for any other channel failure
pub async fn send_command(
    address: &ChannelAddress,
    command: &Command,
    timeout: Duration,
) -> Result<(), RelayError> {
    send(address, command, timeout).await.map_err(|e| match e {
        ChannelError::ConnectTimeout { message, .. } => RelayError::NoServer {
            message,
            location: ErrorLocation::from(Location::caller()),
        },
        other => RelayError::Core {
            message: other.to_string(),
            location: ErrorLocation::from(Location::caller()),
        },
    })
}

async fn run_server(config: &RelayConfig, initial: Command, decision: RoleDecision) -> i32 {
    match decision.lock() {
        Some(lock) => info!("Running as relay server (lock {})", lock.path().display()),
        None => warn!("Running as forced relay server without the leader lock"),
    }

    let host = &config.host;
    let registry = ProcessTableRegistry::new(
        host.executable.clone(),
        &host.project_extensions,
        host.goto_command.clone(),
    );
    let resolver = Resolver::new(
        registry,
        config.host_class(),
        ProcessLauncher::new(host.executable.clone()),
        config.resolver_settings(),
    );
    let dispatcher =
        ResolutionDispatcher::new(resolver, AncestorLocator::new(&host.project_extensions));

    if initial.file_path().is_some() {
        debug!("Serving own invocation first");
        dispatcher.dispatch(initial);
    }

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let code = serve(
        config.channel_address(),
        dispatcher,
        config.server_settings(),
        cancel,
    )
    .await;

    drop(decision);
    code
}

/// Run the accept loop until `cancel` fires. Returns the process exit code.
pub async fn serve<S: CommandSink>(
    address: ChannelAddress,
    sink: S,
    settings: ServerSettings,
    cancel: CancellationToken,
) -> i32 {
    let server = ChannelServer::new(address, sink, settings);

    match server.run(cancel).await {
        Ok(()) => {
            info!("Relay server stopped");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!("Relay server failed to start: {e}");
            EXIT_SERVER_ERROR
        }
    }
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                cancel.cancel();
            }
            Err(e) => warn!("Cannot listen for shutdown signal: {e}"),
        }
    });
}
