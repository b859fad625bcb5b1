#![cfg(unix)]

use editor_relay::app::{EXIT_SERVER_ERROR, EXIT_SUCCESS, run_client, serve};

use relay_core::channel::{ChannelAddress, ServerSettings};
use relay_core::command::{Command, CommandBuilder};
use relay_core::dispatch::CommandSink;

use std::num::NonZeroU32;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(2);

struct ForwardingSink(UnboundedSender<Command>);

impl CommandSink for ForwardingSink {
    fn dispatch(&self, command: Command) {
        let _ = self.0.send(command);
    }
}

/// **VALUE**: Verifies a client run against a live server succeeds and the server exits 0
/// on cooperative shutdown.
///
/// **WHY THIS MATTERS**: These are the two exit codes callers depend on.
#[tokio::test]
async fn given_live_server_when_client_runs_then_success_and_server_exits_zero() {
    // GIVEN: A server on a temp socket
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("relay.sock"));
    let (tx, mut rx) = unbounded_channel();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(serve(
        address.clone(),
        ForwardingSink(tx),
        ServerSettings::default(),
        cancel.clone(),
    ));

    // WHEN: A client delivers a command
    let command = CommandBuilder::default()
        .with_file_path("/repo/src/File.cs")
        .with_line(42)
        .build()
        .expect("valid command");
    let code = run_client(&address, &command, WAIT).await;

    // THEN: Client exits 0, the command arrives
    assert_eq!(code, EXIT_SUCCESS);
    let received = timeout(WAIT, rx.recv()).await.expect("in time");
    assert_eq!(received, Some(command));

    // AND: Shutdown makes the server return 0
    cancel.cancel();
    let server_code = timeout(WAIT, server)
        .await
        .expect("stopped in time")
        .expect("joined");
    assert_eq!(server_code, EXIT_SUCCESS);
}

/// **VALUE**: Scenario A on the wire: the raw line a foreign client would send decodes to
/// file, line 42 and column 5.
#[tokio::test]
async fn given_raw_wire_line_when_received_then_file_line_and_column_decoded() {
    // GIVEN: A server
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("relay.sock"));
    let (tx, mut rx) = unbounded_channel();
    let cancel = CancellationToken::new();
    let server = tokio::spawn(serve(
        address.clone(),
        ForwardingSink(tx),
        ServerSettings::default(),
        cancel.clone(),
    ));

    // WHEN: Writing the raw line once the socket exists
    let mut stream = None;
    for _ in 0..100 {
        if let Ok(connected) = UnixStream::connect(address.path()).await {
            stream = Some(connected);
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    let mut stream = stream.expect("server listening");
    stream
        .write_all("/repo/src/File.cs\u{1F}42\u{1F}5\n".as_bytes())
        .await
        .expect("write");
    stream.shutdown().await.expect("shutdown");

    // THEN: Decoded field for field
    let received = timeout(WAIT, rx.recv())
        .await
        .expect("in time")
        .expect("command");
    assert_eq!(received.file_path(), Some("/repo/src/File.cs"));
    assert_eq!(received.line(), NonZeroU32::new(42));
    assert_eq!(received.column(), NonZeroU32::new(5));

    cancel.cancel();
    let _ = server.await;
}

/// **VALUE**: Verifies a server that cannot open its endpoint exits with the error code.
#[tokio::test]
async fn given_unbindable_address_when_serving_then_server_error_code() {
    // GIVEN: A socket path whose parent is a regular file
    let temp = TempDir::new().expect("tempdir");
    let blocker = temp.path().join("not-a-dir");
    std::fs::write(&blocker, b"").expect("write");
    let address = ChannelAddress::new(blocker.join("relay.sock"));
    let (tx, _rx) = unbounded_channel();

    // WHEN: Serving
    let code = serve(
        address,
        ForwardingSink(tx),
        ServerSettings::default(),
        CancellationToken::new(),
    )
    .await;

    // THEN: Non-zero
    assert_eq!(code, EXIT_SERVER_ERROR);
}
