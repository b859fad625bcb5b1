// Unit tests for launcher argument building
// Process spawning is covered in integration_tests/launcher.rs

use crate::launcher::{LaunchArgs, build_launch_command};
use crate::project::ProjectIdentifier;

use std::ffi::OsStr;
use std::num::NonZeroU32;
use std::path::Path;

/// **VALUE**: Verifies the full fallback command line.
///
/// **WHY THIS MATTERS**: This is what the host receives when no automation handle is
/// available, so switch order matters.
///
/// **BUG THIS CATCHES**: Would catch a missing `/Command` or a go-to argument built without
/// the line number.
#[test]
fn given_project_file_and_line_when_building_command_line_then_all_switches_present() {
    // GIVEN: Project, file and line
    let project = ProjectIdentifier::new("C:\\repo\\App.sln");

    // WHEN: Building the command line
    let args = LaunchArgs::command_line(
        Some(&project),
        Some("C:\\repo\\a.cs"),
        NonZeroU32::new(42),
        "Edit.GoTo",
    );

    // THEN: project /Edit file /Command "Edit.GoTo 42"
    assert_eq!(
        args.as_slice(),
        ["C:\\repo\\App.sln", "/Edit", "C:\\repo\\a.cs", "/Command", "Edit.GoTo 42"]
    );
}

/// **VALUE**: Verifies the no-project, no-line form has no `/Command`.
#[test]
fn given_file_only_when_building_command_line_then_edit_switch_only() {
    let args = LaunchArgs::command_line(None, Some("file.cs"), None, "Edit.GoTo");

    assert_eq!(args.as_slice(), ["/Edit", "file.cs"]);
}

/// **VALUE**: Verifies rendering quotes values but not switches.
#[test]
fn given_args_when_rendered_then_values_are_quoted() {
    let args = LaunchArgs::from(vec![
        "/Edit".to_string(),
        "my file.cs".to_string(),
        "/Command".to_string(),
        "Edit.GoTo 3".to_string(),
    ]);

    assert_eq!(args.render(), "/Edit \"my file.cs\" /Command \"Edit.GoTo 3\"");
}

/// **VALUE**: Verifies the spawned process gets exactly the argument list.
#[test]
fn given_launch_args_when_building_process_command_then_args_are_passed_through() {
    // GIVEN: A project launch
    let args = LaunchArgs::for_project(&ProjectIdentifier::new("/repo/App.sln"));

    // WHEN: Building the OS command
    let cmd = build_launch_command(Path::new("devenv"), &args);

    // THEN: Program and args match
    assert_eq!(cmd.get_program(), OsStr::new("devenv"));
    let passed: Vec<&OsStr> = cmd.get_args().collect();
    assert_eq!(passed, vec![OsStr::new("/repo/App.sln")]);
}
