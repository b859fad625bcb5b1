use crate::support::{
    FILE, FakeHost, FakeRegistry, PROJECT, RecordingLauncher, fast_settings, open_at_line,
    resolver, strings,
};

use relay_core::command::CommandBuilder;
use relay_core::dispatch::{ResolutionDispatcher, run_resolution};
use relay_core::locator::ProjectLocator;
use relay_core::resolver::Outcome;

use std::path::{Path, PathBuf};

struct FixedLocator(Option<PathBuf>);

impl ProjectLocator for FixedLocator {
    fn find_project_for(&self, _file_path: &Path) -> Option<PathBuf> {
        self.0.clone()
    }
}

/// **VALUE**: Verifies the located project becomes the resolution target.
///
/// **BUG THIS CATCHES**: Would catch the dispatcher passing the file path itself as the
/// project, which would never match a running host.
#[test]
fn given_locator_finds_project_when_running_resolution_then_project_is_target() {
    // GIVEN: A host with the project loaded and a locator pointing at it
    let resolver = resolver(
        FakeRegistry::with_hosts(vec![FakeHost::with_project("devenv:1", PROJECT)]),
        RecordingLauncher::default(),
        fast_settings(),
    );
    let locator = FixedLocator(Some(PathBuf::from(PROJECT)));

    // WHEN: Running a resolution
    let attempt = run_resolution(&resolver, &locator, open_at_line(4)).expect("attempt");

    // THEN: Opened in the running host
    assert_eq!(attempt.outcome(), Some(Outcome::Opened));
    assert_eq!(attempt.target().map(|t| t.normalized()), Some("/work/repo/app.sln"));
}

/// **VALUE**: Verifies failures are absorbed by the boundary.
///
/// **WHY THIS MATTERS**: One bad command must never bring down the server.
#[test]
fn given_failing_resolution_when_running_then_none_instead_of_error() {
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::failing(),
        fast_settings(),
    );

    let attempt = run_resolution(&resolver, &FixedLocator(None), open_at_line(1));

    assert!(attempt.is_none());
}

/// **VALUE**: Verifies commands without a file never reach the locator or launcher.
#[test]
fn given_command_without_file_when_running_then_nothing_launched() {
    let resolver = resolver(
        FakeRegistry::default(),
        RecordingLauncher::default(),
        fast_settings(),
    );
    let command = CommandBuilder::default().build().expect("valid command");

    let attempt = run_resolution(&resolver, &FixedLocator(None), command);

    assert!(attempt.is_none());
    assert!(resolver.launcher().launches().is_empty());
}

/// **VALUE**: Verifies dispatch runs the resolution on its own named thread.
#[test]
fn given_dispatcher_when_spawning_then_resolution_completes_on_worker_thread() {
    // GIVEN: A dispatcher without a project
    let dispatcher = ResolutionDispatcher::new(
        resolver(
            FakeRegistry::default(),
            RecordingLauncher::default(),
            fast_settings(),
        ),
        FixedLocator(None),
    );

    // WHEN: Spawning a resolution
    let attempt = dispatcher
        .spawn(open_at_line(8))
        .expect("thread")
        .join()
        .expect("join")
        .expect("attempt");

    // THEN: Completed through the command line
    assert_eq!(attempt.outcome(), Some(Outcome::FallbackOpened));
    let launches = dispatcher.resolver().launcher().launches();
    assert_eq!(
        launches[0].0.as_slice(),
        strings(&["/Edit", FILE, "/Command", "Edit.GoTo 8"])
    );
}
