// src/signal/client.rs

//! Producer side of the trigger protocol.

use std::io;
use std::time::Duration;

use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::errors::Result;
use crate::signal::Endpoint;

/// Connect timeout used by `--send`.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(1);

/// Request a rebuild: open a connection to `endpoint` and close it.
///
/// Fire-and-forget; the daemon sends nothing back.
pub async fn send_trigger(endpoint: &Endpoint, timeout: Duration) -> Result<()> {
    debug!(endpoint = %endpoint, "sending trigger");

    let connect = async {
        match endpoint {
            Endpoint::Unix(path) => UnixStream::connect(path).await.map(drop),
            Endpoint::Tcp(addr) => TcpStream::connect(addr.as_str()).await.map(drop),
        }
    };

    match tokio::time::timeout(timeout, connect).await {
        Ok(res) => res?,
        Err(_) => {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connecting to {endpoint} timed out"),
            )
            .into());
        }
    }

    debug!(endpoint = %endpoint, "trigger sent");
    Ok(())
}
