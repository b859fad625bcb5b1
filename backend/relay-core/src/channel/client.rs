//! Client side of the command channel.

use crate::channel::transport::{ChannelAddress, connect, is_not_listening};
use crate::command::{Command, wire};
use crate::error::ChannelError;

use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::time::{Instant, sleep, timeout};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Pause between connection attempts while no server is listening.
const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Deliver one command to the server listening on `address`.
///
/// Keeps trying to connect until `connect_timeout` elapses, which covers a
/// server that is busy with another client or still starting up.
///
/// # Errors
///
/// - [`ChannelError::ConnectTimeout`] if no server accepted in time
/// - [`ChannelError::Channel`] if connecting or writing failed otherwise
pub async fn send(
    address: &ChannelAddress,
    command: &Command,
    connect_timeout: Duration,
) -> Result<(), ChannelError> {
    let mut connection = connect_within(address, connect_timeout).await?;
    let line = wire::encode(command);

    connection
        .write_all(line.as_bytes())
        .await
        .map_err(|e| ChannelError::io("Failed to send command", e))?;
    connection
        .flush()
        .await
        .map_err(|e| ChannelError::io("Failed to flush command", e))?;

    if let Err(e) = connection.shutdown().await {
        trace!("Ignoring shutdown error after send: {e}");
    }

    debug!("Delivered command to {address}");
    Ok(())
}

async fn connect_within(
    address: &ChannelAddress,
    connect_timeout: Duration,
) -> Result<impl AsyncWrite + Unpin, ChannelError> {
    let deadline = Instant::now() + connect_timeout;
    let endpoint = address.to_string();

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ChannelError::connect_timeout(&endpoint, connect_timeout));
        }

        match timeout(remaining, connect(address)).await {
            Err(_) => return Err(ChannelError::connect_timeout(&endpoint, connect_timeout)),
            Ok(Ok(connection)) => return Ok(connection),
            Ok(Err(e)) if is_not_listening(&e) => {
                trace!("No server on {endpoint} yet: {e}");
                sleep(CONNECT_RETRY_INTERVAL.min(remaining)).await;
            }
            Ok(Err(e)) => {
                return Err(ChannelError::io(format!("Failed to connect to {endpoint}"), e));
            }
        }
    }
}
