// Unit tests for the process-table registry helpers

use crate::host::process_table::{
    CommandLineAutomation, ProcessSnapshot, ProcessTableRegistry, loaded_project,
};
use crate::host::{HostAutomation, HostRegistry};
use crate::launcher::ProcessLauncher;

use std::num::NonZeroU32;
use std::path::PathBuf;

fn snapshot(args: &[&str], cwd: Option<&str>) -> ProcessSnapshot {
    ProcessSnapshot {
        pid: 4242,
        name: "devenv.exe".to_string(),
        executable: None,
        cwd: cwd.map(PathBuf::from),
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

/// **VALUE**: Verifies the loaded project is read from the host's command line.
///
/// **WHY THIS MATTERS**: This is how a running host is matched to a request.
///
/// **BUG THIS CATCHES**: Would catch the program name itself being taken as the project
/// when it happens to carry a project extension.
#[test]
fn given_command_line_with_descriptor_when_reading_project_then_first_descriptor_is_used() {
    // GIVEN: argv with a project argument
    let process = snapshot(&["/opt/app.sln", "/work/Repo.sln", "/work/Other.sln"], None);

    // WHEN: Reading the loaded project
    let project = loaded_project(&process, &["sln".to_string()]);

    // THEN: First argument after argv[0]
    assert_eq!(project, Some(PathBuf::from("/work/Repo.sln")));
}

/// **VALUE**: Verifies a relative project argument is resolved against the process cwd.
#[test]
fn given_relative_descriptor_when_reading_project_then_joined_to_cwd() {
    let process = snapshot(&["devenv", "Repo.SLN"], Some("/work"));

    let project = loaded_project(&process, &["sln".to_string()]);

    assert_eq!(project, Some(PathBuf::from("/work/Repo.SLN")));
}

/// **VALUE**: Verifies hosts started without a project report none.
#[test]
fn given_no_descriptor_argument_when_reading_project_then_none() {
    let process = snapshot(&["devenv", "/Edit", "a.cs"], Some("/work"));

    assert_eq!(loaded_project(&process, &["sln".to_string()]), None);
}

/// **VALUE**: Verifies identities use the `<name>:<pid>` form the host class expects.
#[test]
fn given_snapshot_when_identity_taken_then_name_and_pid() {
    assert_eq!(snapshot(&[], None).identity(), "devenv.exe:4242");
}

/// **VALUE**: Verifies enumeration sees the current process.
///
/// **BUG THIS CATCHES**: Would catch a refresh that leaves the process table empty, which
/// would make every probe miss.
#[test]
fn given_live_process_table_when_enumerating_then_own_pid_is_listed() {
    // GIVEN: A registry over the real process table
    let registry = ProcessTableRegistry::new("devenv", ["sln"], "Edit.GoTo");
    let suffix = format!(":{}", std::process::id());

    // WHEN: Enumerating
    let entries = registry.entries().expect("process table");

    // THEN: Our own pid is present
    assert!(
        entries
            .iter()
            .any(|entry| entry.display_identity().ends_with(&suffix)),
        "Own process missing from {} entries",
        entries.len()
    );
}

/// **VALUE**: Verifies a file opened through the named open command becomes the active
/// document.
///
/// **WHY THIS MATTERS**: The named command is the fallback when the structured open fails.
/// Navigation needs an active document, so without it the line is never reached.
///
/// **BUG THIS CATCHES**: Would catch only the structured open recording the document, or
/// the go-to-line command overwriting it with the line number.
#[cfg(unix)]
#[test]
fn given_named_open_succeeds_when_asking_active_document_then_file_is_reported() {
    // GIVEN: An adapter whose host executable always succeeds
    let adapter = CommandLineAutomation::new(
        4242,
        ProcessLauncher::new("true"),
        None,
        "Edit.GoTo".to_string(),
    );
    assert!(adapter.active_document().is_err());

    // WHEN: Opening through the named command, then navigating
    adapter
        .execute_named_command("File.OpenFile", "/work/repo/src/main.cs")
        .expect("named open");
    let document = adapter.active_document().expect("active document");
    adapter
        .goto_line(&document, NonZeroU32::new(7).expect("non-zero"))
        .expect("navigate");

    // THEN: The opened file is still the active document
    assert_eq!(
        adapter.active_document().expect("active document").full_name,
        "/work/repo/src/main.cs"
    );
}
