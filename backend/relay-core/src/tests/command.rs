// Unit tests for the command builder and token parser
// Channel round trips are covered in integration_tests/channel.rs

use crate::command::CommandBuilder;
use crate::command::parser::{get_flag_regex, parse, parse_position};
use crate::error::ChannelError;

use std::num::NonZeroU32;

/// **VALUE**: Verifies the flag pattern accepts real flags and rejects look-alikes.
///
/// **WHY THIS MATTERS**: The parser decides flag vs. file path with this regex. A path that
/// happens to start with `--` must not silently become a flag.
///
/// **BUG THIS CATCHES**: Would catch a loosened pattern that accepts `--` alone or
/// `--1abc`, which would swallow the file path slot.
#[test]
fn given_flag_regex_when_matching_tokens_then_only_named_flags_match() {
    // GIVEN: The compiled flag pattern
    let regex = get_flag_regex();

    // WHEN/THEN: Named flags match, bare prefixes and digits do not
    assert!(regex.is_match("--new"));
    assert!(regex.is_match("--server"));
    assert!(regex.is_match("--dry-run_2"));
    assert!(!regex.is_match("--"));
    assert!(!regex.is_match("--1abc"));
    assert!(!regex.is_match("-new"));
    assert!(!regex.is_match("--new flag"));
}

/// **VALUE**: Verifies the full positional form parses into every field.
///
/// **BUG THIS CATCHES**: Would catch an off-by-one in the positional walk that shifts the
/// line into the column slot.
#[test]
fn given_all_positional_tokens_when_parsed_then_every_field_is_set() {
    // GIVEN: Flag, file, line, column
    let tokens = ["--new", "src/main.cs", "42", "7"];

    // WHEN: Parsing
    let command = parse(&tokens);

    // THEN: All fields populated in order
    assert!(command.is_new_instance());
    assert_eq!(command.file_path(), Some("src/main.cs"));
    assert_eq!(command.line(), NonZeroU32::new(42));
    assert_eq!(command.column(), NonZeroU32::new(7));
}

/// **VALUE**: Verifies malformed tokens are skipped instead of failing the command.
///
/// **WHY THIS MATTERS**: A caller with a slightly wrong argument list should still get
/// its file opened.
///
/// **BUG THIS CATCHES**: Would catch a parser that rejects the whole command on a bad
/// line number, or keeps a malformed flag.
#[test]
fn given_malformed_tokens_when_parsed_then_they_are_skipped() {
    // GIVEN: A malformed flag, a valid file, a non-numeric line
    let tokens = ["--", "--bad flag", "file.cs", "forty-two", "3"];

    // WHEN: Parsing
    let command = parse(&tokens);

    // THEN: File kept, no flags, no line, column not read without a line
    assert!(command.flags().is_empty());
    assert_eq!(command.file_path(), Some("file.cs"));
    assert_eq!(command.line(), None);
    assert_eq!(command.column(), None);
}

/// **VALUE**: Verifies empty leading tokens do not take the file path slot.
#[test]
fn given_empty_leading_tokens_when_parsed_then_file_path_is_next_real_token() {
    // GIVEN: Empty fields before the file
    let tokens = ["", "", "file.cs"];

    // WHEN: Parsing
    let command = parse(&tokens);

    // THEN: File path found
    assert_eq!(command.file_path(), Some("file.cs"));
}

/// **VALUE**: Verifies zero and negative positions are rejected.
///
/// **BUG THIS CATCHES**: Would catch a position parser that lets `0` through, which the
/// host's go-to command would reject.
#[test]
fn given_non_positive_positions_when_parsed_then_none() {
    assert_eq!(parse_position("line", "0"), None);
    assert_eq!(parse_position("line", "-3"), None);
    assert_eq!(parse_position("line", ""), None);
    assert_eq!(parse_position("line", " 12 "), NonZeroU32::new(12));
}

/// **VALUE**: Verifies the builder refuses values the wire format cannot carry.
///
/// **WHY THIS MATTERS**: A separator byte in a path would split it into two fields on the
/// server side and open the wrong file.
///
/// **BUG THIS CATCHES**: Would catch a builder that accepts reserved characters or a
/// column without a line.
#[test]
fn given_unencodable_values_when_built_then_parse_errors() {
    // GIVEN/WHEN/THEN: Each invalid builder fails with a parse error
    let cases = [
        CommandBuilder::default().with_file_path("a\u{1F}b"),
        CommandBuilder::default().with_file_path("a\nb"),
        CommandBuilder::default().with_file_path(""),
        CommandBuilder::default().with_flag("new"),
        CommandBuilder::default().with_file_path("a.cs").with_line(0),
        CommandBuilder::default().with_file_path("a.cs").with_column(3),
        CommandBuilder::default().with_line(3),
    ];

    for builder in cases {
        let result = builder.build();
        assert!(
            matches!(result, Err(ChannelError::Parse { .. })),
            "Expected parse error, got {result:?}"
        );
    }
}

/// **VALUE**: Verifies a file path that looks like a flag is refused at build time.
///
/// **BUG THIS CATCHES**: Would catch a path such as `--weird.cs` being sent, then read back
/// by the server as a malformed flag so the file silently disappears.
#[test]
fn given_file_path_with_flag_prefix_when_built_then_parse_error() {
    // GIVEN: A path starting with the flag prefix
    let builder = CommandBuilder::default().with_file_path("--weird.cs").with_line(4);

    // WHEN: Building
    let result = builder.build();

    // THEN: Rejected before it can reach the wire
    assert!(
        matches!(result, Err(ChannelError::Parse { .. })),
        "Expected parse error, got {result:?}"
    );
}

/// **VALUE**: Verifies `tokens()` keeps the positional order the parser expects.
#[test]
fn given_built_command_when_tokens_taken_then_positional_order_is_kept() {
    // GIVEN: A command with every field
    let command = CommandBuilder::default()
        .with_new_instance()
        .with_file_path("file.cs")
        .with_line(10)
        .with_column(4)
        .build()
        .expect("valid command");

    // WHEN: Taking its tokens
    let tokens = command.tokens();

    // THEN: Flags, file, line, column
    assert_eq!(tokens, vec!["--new", "file.cs", "10", "4"]);
}
