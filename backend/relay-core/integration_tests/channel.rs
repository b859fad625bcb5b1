#![cfg(unix)]

use relay_core::channel::{ChannelAddress, ChannelServer, ServerSettings, send};
use relay_core::command::{Command, CommandBuilder};
use relay_core::dispatch::CommandSink;
use relay_core::error::ChannelError;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(2);

struct ForwardingSink(UnboundedSender<Command>);

impl CommandSink for ForwardingSink {
    fn dispatch(&self, command: Command) {
        let _ = self.0.send(command);
    }
}

struct RunningServer {
    address: ChannelAddress,
    received: UnboundedReceiver<Command>,
    cancel: CancellationToken,
    task: JoinHandle<Result<(), ChannelError>>,
    _temp: TempDir,
}

fn start_server() -> RunningServer {
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("relay.sock"));
    let (tx, rx) = unbounded_channel();
    let settings = ServerSettings {
        retry_backoff: Duration::from_millis(20),
        read_timeout: Duration::from_millis(500),
    };
    let server = Arc::new(ChannelServer::new(address.clone(), ForwardingSink(tx), settings));
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    let task = tokio::spawn(async move { server.run(token).await });

    RunningServer {
        address,
        received: rx,
        cancel,
        task,
        _temp: temp,
    }
}

fn command(line: u32) -> Command {
    CommandBuilder::default()
        .with_file_path("/repo/src/a.cs")
        .with_line(line)
        .build()
        .expect("valid command")
}

async fn raw_write(address: &ChannelAddress, bytes: &[u8]) {
    let deadline = Instant::now() + WAIT;
    let mut stream = loop {
        match UnixStream::connect(address.path()).await {
            Ok(stream) => break stream,
            Err(_) if Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(10)).await
            }
            Err(e) => panic!("server never listened: {e}"),
        }
    };
    stream.write_all(bytes).await.expect("write");
    stream.shutdown().await.expect("shutdown");
}

/// **VALUE**: Verifies a command sent by a client reaches the sink unchanged.
///
/// **WHY THIS MATTERS**: This is the whole job of the channel.
///
/// **BUG THIS CATCHES**: Would catch encoder/decoder drift or a server that never dispatches.
#[tokio::test]
async fn given_running_server_when_client_sends_then_sink_receives_command() {
    // GIVEN: A running server
    let mut server = start_server();
    let sent = command(42);

    // WHEN: A client sends (retrying until the server is bound)
    send(&server.address, &sent, WAIT).await.expect("send");

    // THEN: The same command arrives
    let received = timeout(WAIT, server.received.recv())
        .await
        .expect("in time")
        .expect("command");
    assert_eq!(received, sent);

    server.cancel.cancel();
}

/// **VALUE**: Verifies commands from several clients are each delivered once, in order.
#[tokio::test]
async fn given_sequential_clients_when_sending_then_each_command_delivered() {
    let mut server = start_server();

    for line in 1..=3 {
        send(&server.address, &command(line), WAIT).await.expect("send");
    }

    for line in 1..=3 {
        let received = timeout(WAIT, server.received.recv())
            .await
            .expect("in time")
            .expect("command");
        assert_eq!(received.line().map(|l| l.get()), Some(line));
    }

    server.cancel.cancel();
}

/// **VALUE**: Verifies empty lines and failed cycles do not stop the loop.
///
/// **BUG THIS CATCHES**: Would catch the server dispatching an empty command, or exiting on
/// a client that sends garbage.
#[tokio::test]
async fn given_empty_and_invalid_lines_when_followed_by_valid_then_only_valid_dispatched() {
    // GIVEN: A running server
    let mut server = start_server();

    // WHEN: An empty line, invalid UTF-8, then a valid command
    raw_write(&server.address, b"\n").await;
    raw_write(&server.address, &[0xff, 0xfe, b'\n']).await;
    send(&server.address, &command(9), WAIT).await.expect("send");

    // THEN: Only the valid command arrives
    let received = timeout(WAIT, server.received.recv())
        .await
        .expect("in time")
        .expect("command");
    assert_eq!(received, command(9));
    assert!(server.received.try_recv().is_err());

    server.cancel.cancel();
}

/// **VALUE**: Verifies cancellation stops an idle server promptly and removes the socket.
///
/// **BUG THIS CATCHES**: Would catch an accept that is not raced against cancellation, which
/// would keep the process alive until the next client connects.
#[tokio::test]
async fn given_idle_server_when_cancelled_then_stops_and_removes_socket() {
    // GIVEN: A server that has served one command and is waiting again
    let mut server = start_server();
    send(&server.address, &command(1), WAIT).await.expect("send");
    timeout(WAIT, server.received.recv()).await.expect("in time");
    assert!(server.address.path().exists());

    // WHEN: Cancelling
    server.cancel.cancel();

    // THEN: run() returns Ok quickly and the socket file is gone
    let result = timeout(Duration::from_secs(1), server.task)
        .await
        .expect("stopped in time")
        .expect("task joined");
    assert!(result.is_ok());
    assert!(!server.address.path().exists());
}

/// **VALUE**: Verifies a stale socket file from a crashed server does not block startup.
#[tokio::test]
async fn given_stale_socket_file_when_server_starts_then_it_binds() {
    // GIVEN: A leftover regular file at the socket path
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("relay.sock");
    std::fs::write(&path, b"stale").expect("write stale file");
    let address = ChannelAddress::new(&path);
    let (tx, mut rx) = unbounded_channel();
    let server = Arc::new(ChannelServer::new(
        address.clone(),
        ForwardingSink(tx),
        ServerSettings::default(),
    ));
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let task = tokio::spawn(async move { server.run(token).await });

    // WHEN: A client sends
    send(&address, &command(2), WAIT).await.expect("send");

    // THEN: Delivered
    let received = timeout(WAIT, rx.recv()).await.expect("in time");
    assert_eq!(received, Some(command(2)));

    cancel.cancel();
    let _ = task.await;
}

/// **VALUE**: Scenario C: with no server, the client gives up after its connect timeout.
///
/// **WHY THIS MATTERS**: The caller is usually an IDE waiting on the process. It must get a
/// failure exit promptly, not hang.
#[tokio::test]
async fn given_no_server_when_sending_then_connect_timeout_within_bound() {
    // GIVEN: A socket path nobody listens on
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("nobody.sock"));

    // WHEN: Sending with a 1 s timeout
    let started = Instant::now();
    let result = send(&address, &command(1), Duration::from_millis(1000)).await;
    let elapsed = started.elapsed();

    // THEN: ConnectTimeout within ~1.5 s
    let err = result.expect_err("no server");
    assert!(err.is_connect_timeout(), "unexpected error: {err}");
    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
}

/// **VALUE**: Verifies a second server on a live address refuses to start and leaves the
/// first one reachable.
///
/// **WHY THIS MATTERS**: A forced server can start while the leader is serving. If it
/// replaced the leader's socket, every later client would time out while the leader still
/// held the lock.
///
/// **BUG THIS CATCHES**: Would catch `bind` unlinking a socket that still accepts
/// connections, or the second server's drop removing the leader's socket file.
#[tokio::test]
async fn given_live_server_when_second_server_binds_then_refused_and_first_keeps_serving() {
    // GIVEN: A leader that has served one command
    let mut leader = start_server();
    send(&leader.address, &command(1), WAIT).await.expect("send");
    timeout(WAIT, leader.received.recv()).await.expect("in time");

    // WHEN: A second server starts on the same address
    let (tx, _rx) = unbounded_channel();
    let second = ChannelServer::new(
        leader.address.clone(),
        ForwardingSink(tx),
        ServerSettings::default(),
    );
    let result = timeout(WAIT, second.run(CancellationToken::new()))
        .await
        .expect("second server returned in time");

    // THEN: It is refused, the socket survives, and the leader still receives commands
    assert!(
        matches!(result, Err(ChannelError::AlreadyServed { .. })),
        "unexpected result: {result:?}"
    );
    assert!(leader.address.path().exists());

    send(&leader.address, &command(2), Duration::from_millis(1000))
        .await
        .expect("leader still reachable");
    let received = timeout(WAIT, leader.received.recv())
        .await
        .expect("in time")
        .expect("command");
    assert_eq!(received, command(2));

    leader.cancel.cancel();
}
