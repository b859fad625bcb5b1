use relay_core::error::LaunchError;
use relay_core::launcher::{LaunchArgs, Launcher, ProcessLauncher};

/// **VALUE**: Verifies an unconfigured executable is rejected before spawning.
#[test]
fn given_empty_executable_when_launching_then_validation_error() {
    let launcher = ProcessLauncher::new("");

    let result = launcher.launch(&LaunchArgs::default(), false);

    assert!(matches!(result, Err(LaunchError::Validation { .. })));
}

/// **VALUE**: Verifies a missing executable is a spawn error after the local fallback.
///
/// **BUG THIS CATCHES**: Would catch the NotFound fallback swallowing the error and
/// reporting success.
#[test]
fn given_missing_executable_when_launching_then_spawn_error() {
    let launcher = ProcessLauncher::new("editor-relay-no-such-host-binary");

    let result = launcher.launch(&LaunchArgs::default(), false);

    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
}

/// **VALUE**: Verifies a real process can be started and waited for.
#[cfg(unix)]
#[test]
fn given_existing_executable_when_launching_with_wait_then_ok() {
    let launcher = ProcessLauncher::new("true");

    let result = launcher.launch(&LaunchArgs::from(vec!["/Edit".to_string()]), true);

    assert!(result.is_ok(), "launch failed: {result:?}");
}

/// **VALUE**: Verifies fire-and-forget launches return without waiting on the child.
#[cfg(unix)]
#[test]
fn given_long_running_process_when_launching_without_wait_then_returns_immediately() {
    let launcher = ProcessLauncher::new("sleep");
    let started = std::time::Instant::now();

    let result = launcher.launch(&LaunchArgs::from(vec!["2".to_string()]), false);

    assert!(result.is_ok(), "launch failed: {result:?}");
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
}
