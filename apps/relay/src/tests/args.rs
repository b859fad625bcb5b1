// Unit tests for invocation parsing

use crate::args::Invocation;

use std::num::NonZeroU32;

/// **VALUE**: Verifies a leading `--server` forces the role and is not forwarded.
///
/// **BUG THIS CATCHES**: Would catch `--server` being sent to another server as a flag, or
/// being taken as the file path.
#[test]
fn given_leading_server_flag_when_parsed_then_forced_and_consumed() {
    // GIVEN: --server followed by a request
    let args = ["--server", "--new", "/repo/a.cs", "12"];

    // WHEN: Parsing
    let invocation = Invocation::parse(args);

    // THEN: Server forced, command keeps only --new
    assert!(invocation.force_server());
    assert!(!invocation.command().has_flag("--server"));
    assert!(invocation.command().is_new_instance());
    assert_eq!(invocation.command().file_path(), Some("/repo/a.cs"));
    assert_eq!(invocation.command().line(), NonZeroU32::new(12));
}

/// **VALUE**: Verifies a plain invocation is not forced to lead.
#[test]
fn given_plain_request_when_parsed_then_not_forced() {
    let invocation = Invocation::parse(["file.cs"]);

    assert!(!invocation.force_server());
    assert!(invocation.has_request());
}

/// **VALUE**: Verifies an invocation without a file carries no request.
///
/// **WHY THIS MATTERS**: A bare `editor-relay --server` starts a server without opening
/// anything; a bare client invocation has nothing to send.
#[test]
fn given_no_file_when_parsed_then_no_request() {
    let server_only = Invocation::parse(["--server"]);
    let empty = Invocation::parse(Vec::<String>::new());

    assert!(server_only.force_server());
    assert!(!server_only.has_request());
    assert!(!empty.has_request());
}
