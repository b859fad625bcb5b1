use crate::support::{
    FILE, FakeHost, FakeRegistry, HostBehavior, HostCall, PROJECT, RecordingLauncher,
    fast_settings, open_at_line, resolver, strings,
};

use relay_core::command::CommandBuilder;
use relay_core::error::ResolveError;
use relay_core::project::ProjectIdentifier;
use relay_core::resolver::{Outcome, ResolutionState, ResolverSettings};

use std::path::PathBuf;
use std::time::{Duration, Instant};

fn target() -> Option<ProjectIdentifier> {
    Some(ProjectIdentifier::new(PROJECT))
}

/// **VALUE**: Verifies a host that already has the project loaded is reused.
///
/// **WHY THIS MATTERS**: This is the common path: the developer's IDE is already open.
///
/// **BUG THIS CATCHES**: Would catch the resolver launching a second host although a match
/// was found, or forgetting to navigate to the line.
#[test]
fn given_running_host_with_project_when_resolving_then_file_opened_in_it() {
    // GIVEN: A running host with the project loaded (different casing)
    let registry = FakeRegistry::with_hosts(vec![FakeHost::with_project(
        "devenv:10",
        "/WORK/repo/app.sln",
    )]);
    let launcher = RecordingLauncher::default();
    let resolver = resolver(registry, launcher, fast_settings());

    // WHEN: Resolving
    let attempt = resolver
        .resolve(open_at_line(42), target())
        .expect("resolution");

    // THEN: Opened in place, nothing launched, handle released
    assert_eq!(attempt.outcome(), Some(Outcome::Opened));
    assert!(resolver.launcher().launches().is_empty());
    assert_eq!(
        resolver.registry().calls(),
        vec![
            HostCall::LoadedProject,
            HostCall::OpenFile(PathBuf::from(FILE)),
            HostCall::ActiveDocument,
            HostCall::GotoLine(FILE.to_string(), 42),
            HostCall::Release,
        ]
    );
}

/// **VALUE**: Verifies a forced new instance never touches the registry.
///
/// **BUG THIS CATCHES**: Would catch a probe sneaking in before the `--new` check, which
/// would reuse a host the caller explicitly asked not to reuse.
#[test]
fn given_new_instance_flag_when_resolving_then_registry_never_probed() {
    // GIVEN: A matching host and a forced new instance
    let registry = FakeRegistry::with_hosts(vec![FakeHost::with_project("devenv:10", PROJECT)]);
    let resolver = resolver(registry, RecordingLauncher::default(), fast_settings());
    let command = CommandBuilder::default()
        .with_new_instance()
        .with_file_path(FILE)
        .with_line(7)
        .build()
        .expect("valid command");

    // WHEN: Resolving
    let attempt = resolver.resolve(command, target()).expect("resolution");

    // THEN: Full command line launched, registry untouched
    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    assert_eq!(resolver.registry().probes(), 0);
    let launches = resolver.launcher().launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(
        launches[0].0.as_slice(),
        strings(&[PROJECT, "/Edit", FILE, "/Command", "Edit.GoTo 7"])
    );
    assert!(!launches[0].1, "launches must not wait");
}

/// **VALUE**: Scenario A, cold start: launch the host, wait for it, then open and navigate.
///
/// **WHY THIS MATTERS**: First request of the day. The host takes a while to appear in the
/// registry, and the file must still land in it with the caret on the right line.
#[test]
fn given_no_host_when_launched_host_registers_then_file_opened_at_line() {
    // GIVEN: An empty registry; launching registers a host with the project
    let registry = FakeRegistry::default();
    let launcher =
        RecordingLauncher::registering(&registry, FakeHost::with_project("devenv:20", PROJECT));
    let resolver = resolver(registry, launcher, fast_settings());

    // WHEN: Resolving
    let attempt = resolver
        .resolve(open_at_line(42), target())
        .expect("resolution");

    // THEN: One project launch, at least one poll, opened with go-to line 42
    assert_eq!(attempt.outcome(), Some(Outcome::Opened));
    assert!(attempt.poll_count() >= 1);

    let launches = resolver.launcher().launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].0.as_slice(), strings(&[PROJECT]));

    let calls = resolver.registry().calls();
    assert!(calls.contains(&HostCall::OpenFile(PathBuf::from(FILE))));
    assert!(calls.contains(&HostCall::GotoLine(FILE.to_string(), 42)));
    assert_eq!(calls.last(), Some(&HostCall::Release));
}

/// **VALUE**: Scenario B: a forced new instance with no project is a plain `/Edit` launch.
///
/// **BUG THIS CATCHES**: Would catch a `/Command` switch emitted without a line, or a probe
/// against an empty target.
#[test]
fn given_new_instance_without_project_when_resolving_then_edit_only_launch() {
    // GIVEN: "--new" + "file.cs", no line, no known project
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::default(),
        fast_settings(),
    );
    let command = CommandBuilder::default()
        .with_new_instance()
        .with_file_path("file.cs")
        .build()
        .expect("valid command");

    // WHEN: Resolving
    let attempt = resolver.resolve(command, None).expect("resolution");

    // THEN: ["/Edit", "file.cs"], no probe
    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    assert_eq!(resolver.registry().probes(), 0);
    let launches = resolver.launcher().launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].0.as_slice(), strings(&["/Edit", "file.cs"]));
}

/// **VALUE**: Verifies polling gives up after the budget and falls back to the command line.
///
/// **WHY THIS MATTERS**: A host that never registers must not block the resolution forever.
///
/// **BUG THIS CATCHES**: Would catch an unbounded poll loop or a budget measured in polls
/// instead of elapsed time.
#[test]
fn given_host_never_registers_when_polling_then_fallback_within_budget() {
    // GIVEN: A short budget and a host that never appears
    let settings = ResolverSettings {
        poll_interval: Duration::from_millis(20),
        poll_budget: Duration::from_millis(200),
        ..ResolverSettings::default()
    };
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::default(),
        settings,
    );

    // WHEN: Resolving
    let started = Instant::now();
    let attempt = resolver
        .resolve(open_at_line(3), target())
        .expect("resolution");
    let elapsed = started.elapsed();

    // THEN: Bounded by budget plus one interval (with slack), fell back
    assert!(elapsed < Duration::from_millis(200 + 20 + 500), "took {elapsed:?}");
    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    assert!(attempt.poll_count() >= 1);

    let launches = resolver.launcher().launches();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].0.as_slice(), strings(&[PROJECT]));
    assert_eq!(
        launches[1].0.as_slice(),
        strings(&[PROJECT, "/Edit", FILE, "/Command", "Edit.GoTo 3"])
    );
}

/// **VALUE**: Verifies a refused structured open falls back to the named command.
#[test]
fn given_structured_open_fails_when_opening_then_named_command_used() {
    // GIVEN: A host that refuses the structured open call
    let host = FakeHost::with_project("devenv:30", PROJECT).behaving(HostBehavior {
        fail_open: true,
        ..HostBehavior::default()
    });
    let resolver = resolver(
        FakeRegistry::with_hosts(vec![host]),
        RecordingLauncher::default(),
        fast_settings(),
    );

    // WHEN: Resolving
    let attempt = resolver
        .resolve(open_at_line(5), target())
        .expect("resolution");

    // THEN: The named open command carried the file
    assert_eq!(attempt.outcome(), Some(Outcome::Opened));
    let calls = resolver.registry().calls();
    assert!(calls.contains(&HostCall::NamedCommand(
        "File.OpenFile".to_string(),
        FILE.to_string()
    )));
}

/// **VALUE**: Verifies total open failure is reported and the handle still released.
///
/// **BUG THIS CATCHES**: Would catch a leaked automation reference on the error path.
#[test]
fn given_every_open_fails_when_opening_then_open_failure_and_handle_released() {
    // GIVEN: A host refusing both open strategies
    let host = FakeHost::with_project("devenv:31", PROJECT).behaving(HostBehavior {
        fail_open: true,
        fail_named_command: true,
    });
    let resolver = resolver(
        FakeRegistry::with_hosts(vec![host]),
        RecordingLauncher::default(),
        fast_settings(),
    );

    // WHEN: Resolving
    let result = resolver.resolve(open_at_line(5), target());

    // THEN: OpenFailure, no launch, released exactly once
    assert!(matches!(result, Err(ResolveError::OpenFailure { .. })));
    assert!(resolver.launcher().launches().is_empty());
    let releases = resolver
        .registry()
        .calls()
        .into_iter()
        .filter(|call| *call == HostCall::Release)
        .count();
    assert_eq!(releases, 1);
}

/// **VALUE**: Verifies a broken registry counts as "no host" rather than an error.
#[test]
fn given_registry_enumeration_fails_when_resolving_then_host_is_launched() {
    let resolver = resolver(
        FakeRegistry::failing(),
        RecordingLauncher::default(),
        ResolverSettings {
            poll_interval: Duration::from_millis(10),
            poll_budget: Duration::from_millis(50),
            ..ResolverSettings::default()
        },
    );

    let attempt = resolver
        .resolve(open_at_line(1), target())
        .expect("resolution");

    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    assert!(resolver.registry().probes() >= 2);
}

/// **VALUE**: Verifies a failed host launch still polls and then tries the full command line.
///
/// **WHY THIS MATTERS**: The first launch can fail for transient reasons. The command line
/// launch is the last chance to deliver the file, so only its failure ends the resolution.
///
/// **BUG THIS CATCHES**: Would catch the project-only launch error short-circuiting the
/// resolution before polling and the fallback launch.
#[test]
fn given_launch_fails_when_resolving_then_polls_and_fallback_launch_attempted() {
    // GIVEN: A launcher that refuses every launch and no running host
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::failing(),
        ResolverSettings {
            poll_interval: Duration::from_millis(10),
            poll_budget: Duration::from_millis(50),
            ..ResolverSettings::default()
        },
    );

    // WHEN: Resolving
    let result = resolver.resolve(open_at_line(3), target());

    // THEN: Polling happened, both launches were attempted, and the fallback error surfaces
    assert!(matches!(result, Err(ResolveError::Launch(_))));
    assert!(resolver.registry().probes() >= 2);
    let launches = resolver.launcher().launches();
    assert_eq!(launches.len(), 2);
    assert_eq!(launches[0].0.as_slice(), strings(&[PROJECT]));
    assert_eq!(
        launches[1].0.as_slice(),
        strings(&[PROJECT, "/Edit", FILE, "/Command", "Edit.GoTo 3"])
    );
}

/// **VALUE**: Verifies a project-less command without the flag takes the same path.
#[test]
fn given_no_project_when_resolving_then_launch_without_project() {
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::default(),
        fast_settings(),
    );

    let attempt = resolver.resolve(open_at_line(11), None).expect("resolution");

    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    assert_eq!(resolver.registry().probes(), 0);
    assert_eq!(
        resolver.launcher().launches()[0].0.as_slice(),
        strings(&["/Edit", FILE, "/Command", "Edit.GoTo 11"])
    );
}

/// **VALUE**: Verifies a command without a file is rejected before any side effect.
#[test]
fn given_command_without_file_when_resolving_then_missing_file() {
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::default(),
        fast_settings(),
    );
    let command = CommandBuilder::default()
        .with_new_instance()
        .build()
        .expect("valid command");

    let result = resolver.resolve(command, target());

    assert!(matches!(result, Err(ResolveError::MissingFile { .. })));
    assert_eq!(resolver.registry().probes(), 0);
    assert!(resolver.launcher().launches().is_empty());
}

/// **VALUE**: Verifies terminal states render readably in logs.
#[test]
fn given_terminal_state_when_displayed_then_outcome_is_named() {
    assert_eq!(
        ResolutionState::Terminal(Outcome::FallbackOpened).to_string(),
        "Terminal(FallbackOpened)"
    );
    assert_eq!(ResolutionState::PollForHost.to_string(), "PollForHost");
}
