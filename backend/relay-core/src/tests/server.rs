// Unit tests for reading one command line off a connection
// The accept loop is covered in integration_tests/channel.rs

use crate::channel::server::read_command;
use crate::error::ChannelError;

use std::num::NonZeroU32;

use tokio::io::{AsyncWriteExt, duplex};

/// **VALUE**: Verifies one line is read and anything after it is ignored.
///
/// **BUG THIS CATCHES**: Would catch a reader that waits for EOF and hangs on a client that
/// keeps the connection open after its line.
#[tokio::test]
async fn given_line_followed_by_more_bytes_when_reading_then_first_line_only() {
    // GIVEN: A connection carrying a full line and trailing garbage
    let (mut client, server) = duplex(256);
    client
        .write_all(b"file.cs\x1F12\nnext\x1F1\n")
        .await
        .expect("write");

    // WHEN: Reading a command
    let command = read_command(server).await.expect("read").expect("command");

    // THEN: Only the first line was decoded
    assert_eq!(command.file_path(), Some("file.cs"));
    assert_eq!(command.line(), NonZeroU32::new(12));
}

/// **VALUE**: Verifies a client that disconnects without a newline still delivers its line.
#[tokio::test]
async fn given_unterminated_line_then_eof_when_reading_then_decoded() {
    // GIVEN: A line without '\n', then the write side closes
    let (mut client, server) = duplex(64);
    client.write_all(b"file.cs").await.expect("write");
    drop(client);

    // WHEN: Reading
    let command = read_command(server).await.expect("read");

    // THEN: Decoded
    assert_eq!(command.and_then(|c| c.file_path().map(str::to_string)).as_deref(), Some("file.cs"));
}

/// **VALUE**: Verifies an immediate disconnect yields no command.
#[tokio::test]
async fn given_empty_connection_when_reading_then_none() {
    let (client, server) = duplex(16);
    drop(client);

    let command = read_command(server).await.expect("read");

    assert!(command.is_none());
}

/// **VALUE**: Verifies oversized input is rejected.
///
/// **WHY THIS MATTERS**: A misbehaving client must not make the server buffer without limit.
#[tokio::test]
async fn given_oversized_line_when_reading_then_parse_error() {
    // GIVEN: 70 KiB with no newline
    let payload = vec![b'a'; 70 * 1024];
    let reader: &[u8] = &payload;

    // WHEN: Reading
    let result = read_command(reader).await;

    // THEN: Rejected
    assert!(matches!(result, Err(ChannelError::Parse { .. })));
}
