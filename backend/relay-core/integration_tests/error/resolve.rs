use relay_core::error::{AutomationError, LaunchError, ProbeError, ResolveError};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies launch failures convert into resolution errors transparently.
///
/// **BUG THIS CATCHES**: Would catch a wrapper that hides the launch message behind a
/// generic "resolution failed".
#[test]
#[track_caller]
fn given_launch_error_when_converted_then_resolve_error_shows_launch_message() {
    // GIVEN: A launch validation error
    let launch = LaunchError::Validation {
        message: "Host executable is not configured".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting
    let err: ResolveError = launch.into();

    // THEN: Launch variant with the original message
    assert!(matches!(err, ResolveError::Launch(_)));
    assert!(err.to_string().contains("Host executable is not configured"));
}

/// **VALUE**: Verifies probe and automation errors name what failed.
#[test]
fn given_probe_and_automation_errors_when_formatted_then_identity_and_name_present() {
    let probe = ProbeError::inspection("devenv:12", "no project");
    let automation = AutomationError::command("File.OpenFile", "refused");

    assert!(probe.to_string().contains("devenv:12"));
    assert!(automation.to_string().contains("File.OpenFile"));
    assert!(AutomationError::released().to_string().contains("resolve.rs"));
}

/// **VALUE**: Verifies the missing-file error carries its message and location.
#[test]
fn given_missing_file_error_when_formatted_then_message_and_location_present() {
    let err = ResolveError::missing_file("Command carries no file path");

    let text = err.to_string();
    assert!(text.contains("Missing File Error"));
    assert!(text.contains("resolve.rs"));
}
