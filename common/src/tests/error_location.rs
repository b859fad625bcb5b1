use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every error in the relay carries an `ErrorLocation`. If it
/// captures garbage, server-side log lines for failed resolutions lose their only pointer
/// back into the code.
///
/// **BUG THIS CATCHES**: Would catch if file path extraction or line/column capture breaks.
#[test]
#[track_caller]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: Current caller location
    let expected = Location::caller();

    // WHEN: Creating ErrorLocation from caller
    let location = ErrorLocation::from(expected);

    // THEN: Should capture file, line, and column
    assert_eq!(location.file, expected.file());
    assert_eq!(location.line, expected.line());
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` display format used in every error message.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: A fixed ErrorLocation
    let location = ErrorLocation {
        file: "src/channel/server.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should produce "[file:line:column]"
    assert_eq!(formatted, "[src/channel/server.rs:42:7]");
}

/// **VALUE**: Verifies that `#[track_caller]` helpers report their call site.
///
/// **BUG THIS CATCHES**: Error constructors in relay-core rely on this propagation. If it
/// breaks, every error points at the constructor instead of the failing call.
#[test]
fn given_track_caller_helper_when_called_twice_then_lines_differ() {
    // GIVEN: A helper that captures its caller
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing from two consecutive lines
    let first = capture();
    let second = capture();

    // THEN: Both point into this test file, one line apart
    assert!(first.file.ends_with("error_location.rs"));
    assert!(first.file.contains("tests"), "Should point at the test, not the helper");
    assert_eq!(first.line + 1, second.line, "Lines should be sequential");
}
