// Unit tests for the line codec

use crate::command::CommandBuilder;
use crate::command::wire::{decode, decode_bytes, encode};
use crate::error::ChannelError;

use std::num::NonZeroU32;

/// **VALUE**: Verifies the exact bytes put on the wire.
///
/// **WHY THIS MATTERS**: Clients and servers from different builds must agree on the
/// delimiter and terminator.
///
/// **BUG THIS CATCHES**: Would catch a switch to a different separator or a missing `\n`.
#[test]
fn given_command_when_encoded_then_fields_joined_by_unit_separator() {
    // GIVEN: A command with a file and line
    let command = CommandBuilder::default()
        .with_file_path("C:\\src\\a.cs")
        .with_line(42)
        .build()
        .expect("valid command");

    // WHEN: Encoding
    let line = encode(&command);

    // THEN: Unit separator between fields, newline at the end
    assert_eq!(line, "C:\\src\\a.cs\u{1F}42\n");
}

/// **VALUE**: Verifies empty and whitespace-only lines decode to nothing.
///
/// **BUG THIS CATCHES**: Would catch the server dispatching an empty command when a
/// client connects and disconnects without writing.
#[test]
fn given_blank_lines_when_decoded_then_none() {
    assert!(decode("").is_none());
    assert!(decode("\n").is_none());
    assert!(decode("  \t \r\n").is_none());
}

/// **VALUE**: Verifies Windows line endings are stripped before parsing.
#[test]
fn given_crlf_line_when_decoded_then_line_number_parses() {
    // GIVEN: A CRLF-terminated line
    let line = "file.cs\u{1F}9\r\n";

    // WHEN: Decoding
    let command = decode(line).expect("command");

    // THEN: The line number is not polluted by '\r'
    assert_eq!(command.file_path(), Some("file.cs"));
    assert_eq!(command.line(), NonZeroU32::new(9));
}

/// **VALUE**: Verifies invalid UTF-8 is a parse error, not a panic.
#[test]
fn given_invalid_utf8_when_decoded_then_parse_error() {
    // GIVEN: Bytes that are not UTF-8
    let bytes = [0x66, 0xff, 0xfe, b'\n'];

    // WHEN: Decoding
    let result = decode_bytes(&bytes);

    // THEN: Parse error
    assert!(matches!(result, Err(ChannelError::Parse { .. })));
}

/// **VALUE**: Verifies every shape of command survives the wire unchanged.
///
/// **WHY THIS MATTERS**: Fields are positional, so an optional field that is dropped or
/// shifted changes the meaning of the ones after it.
///
/// **BUG THIS CATCHES**: Would catch a column emitted without its line, a flag placed after
/// the file, or the new-instance flag lost in transit.
#[test]
fn given_each_command_shape_when_encoded_and_decoded_then_unchanged() {
    let positions: [(Option<u32>, Option<u32>); 3] =
        [(None, None), (Some(42), None), (Some(42), Some(5))];

    for new_instance in [false, true] {
        for (line, column) in positions {
            // GIVEN: A command of this shape
            let mut builder = CommandBuilder::default().with_file_path("/repo/src/File.cs");
            if new_instance {
                builder = builder.with_new_instance();
            }
            if let Some(line) = line {
                builder = builder.with_line(line);
            }
            if let Some(column) = column {
                builder = builder.with_column(column);
            }
            let command = builder.build().expect("valid command");

            // WHEN: Sending it through the codec
            let decoded = decode(&encode(&command));

            // THEN: The same command comes back
            assert_eq!(
                decoded,
                Some(command),
                "new_instance={new_instance} line={line:?} column={column:?}"
            );
        }
    }
}
