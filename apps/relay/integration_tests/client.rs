use editor_relay::app::{EXIT_FAILURE, run_client, send_command};
use editor_relay::error::RelayError;

use relay_core::channel::ChannelAddress;
use relay_core::command::CommandBuilder;

use std::time::{Duration, Instant};

use tempfile::TempDir;

/// **VALUE**: Scenario C: with no server, the client exits with the failure code promptly.
///
/// **WHY THIS MATTERS**: IDEs run the relay synchronously. A hanging client freezes the IDE.
///
/// **BUG THIS CATCHES**: Would catch an unbounded connect, or a timeout mapped to success.
#[tokio::test]
async fn given_no_server_when_client_runs_then_failure_exit_within_timeout() {
    // GIVEN: A channel address nobody listens on
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("relay.sock"));
    let command = CommandBuilder::default()
        .with_file_path("file.cs")
        .build()
        .expect("valid command");

    // WHEN: Running the client with a 1 s connect timeout
    let started = Instant::now();
    let code = run_client(&address, &command, Duration::from_millis(1000)).await;

    // THEN: -1 within ~1.5 s
    assert_eq!(code, EXIT_FAILURE);
    assert!(started.elapsed() < Duration::from_millis(1500));
}

/// **VALUE**: Verifies a connect timeout is reported as "no server", not a generic failure.
#[tokio::test]
async fn given_no_server_when_sending_then_no_server_error() {
    let temp = TempDir::new().expect("tempdir");
    let address = ChannelAddress::new(temp.path().join("relay.sock"));
    let command = CommandBuilder::default()
        .with_file_path("file.cs")
        .build()
        .expect("valid command");

    let result = send_command(&address, &command, Duration::from_millis(200)).await;

    assert!(matches!(result, Err(RelayError::NoServer { .. })));
}
