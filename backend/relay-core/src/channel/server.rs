//! Accept loop of the command channel.
//!
//! ```text
//! Idle -> WaitingForConnection -> Reading -> Dispatched -> Idle
//!   any state -> Stopped (cancellation)
//! ```
//!
//! One connection is processed at a time. Waits are raced against the
//! cancellation token so shutdown is observed promptly without tearing down a
//! connection by force. A failed cycle is logged, followed by a short pause, and
//! never ends the loop.

use crate::channel::transport::{ChannelAddress, Endpoint};
use crate::command::{Command, wire};
use crate::dispatch::CommandSink;
use crate::error::ChannelError;

use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

use log::{error, info, trace};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Upper bound on one command line; longer input is a failed cycle.
const MAX_LINE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    WaitingForConnection,
    Reading,
    Dispatched,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Pause after a failed cycle before accepting again.
    pub retry_backoff: Duration,
    /// How long a connected client may take to deliver its line.
    pub read_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

pub struct ChannelServer<S> {
    address: ChannelAddress,
    sink: S,
    settings: ServerSettings,
}

impl<S: CommandSink> ChannelServer<S> {
    pub fn new(address: ChannelAddress, sink: S, settings: ServerSettings) -> Self {
        Self {
            address,
            sink,
            settings,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Serve until `cancel` fires.
    ///
    /// # Errors
    ///
    /// Only failing to open the endpoint is returned; per-cycle failures are
    /// logged and absorbed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ChannelError> {
        let mut endpoint = Endpoint::bind(&self.address)?;
        info!("Command channel listening on {}", self.address);

        let mut state = ServerState::Idle;

        while !cancel.is_cancelled() {
            enter(&mut state, ServerState::WaitingForConnection);

            let cycle = tokio::select! {
                _ = cancel.cancelled() => break,
                cycle = self.cycle(&mut endpoint, &mut state) => cycle,
            };

            match cycle {
                Ok(Some(command)) => {
                    enter(&mut state, ServerState::Dispatched);
                    self.sink.dispatch(command);
                }
                Ok(None) => trace!("Discarded empty command line"),
                Err(e) => {
                    error!("Command channel cycle failed: {e}");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = sleep(self.settings.retry_backoff) => {}
                    }
                }
            }

            enter(&mut state, ServerState::Idle);
        }

        enter(&mut state, ServerState::Stopped);
        drop(endpoint);
        info!("Command channel on {} stopped", self.address);
        Ok(())
    }

    async fn cycle(
        &self,
        endpoint: &mut Endpoint,
        state: &mut ServerState,
    ) -> Result<Option<Command>, ChannelError> {
        let connection = endpoint.accept().await?;
        enter(state, ServerState::Reading);

        timeout(self.settings.read_timeout, read_command(connection))
            .await
            .map_err(|_| {
                ChannelError::io(
                    "Client did not send a command line",
                    IoError::from(ErrorKind::TimedOut),
                )
            })?
    }
}

fn enter(state: &mut ServerState, next: ServerState) {
    trace!("Channel {state:?} -> {next:?}");
    *state = next;
}

/// Read exactly one line from `connection` and decode it.
pub(crate) async fn read_command<C>(connection: C) -> Result<Option<Command>, ChannelError>
where
    C: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(connection).take(MAX_LINE_BYTES);
    let mut line = Vec::new();

    reader
        .read_until(b'\n', &mut line)
        .await
        .map_err(|e| ChannelError::io("Failed to read command line", e))?;

    if line.len() as u64 >= MAX_LINE_BYTES && !line.ends_with(b"\n") {
        return Err(ChannelError::parse(format!(
            "Command line exceeds {MAX_LINE_BYTES} bytes"
        )));
    }

    wire::decode_bytes(&line)
}
