// src/signal/listener.rs

use std::fs;
use std::future::Future;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::{TcpListener, UnixListener};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::engine::Scheduler;
use crate::errors::{RebuildError, Result};
use crate::exec::BuildRunner;
use crate::signal::Endpoint;
use crate::types::{TriggerEvent, TriggerSource};

/// A bound trigger endpoint.
///
/// Wire contract: a connection being established *is* the trigger. Nothing
/// is read from or written to the stream; it is closed right after accept.
#[derive(Debug)]
pub enum TriggerListener {
    Unix {
        listener: UnixListener,
        path: PathBuf,
    },
    Tcp(TcpListener),
}

impl TriggerListener {
    /// Bind `endpoint`. Any failure here is fatal for the daemon.
    ///
    /// For unix sockets a stale socket file is removed first and the new
    /// socket is made world-connectable (0666) so unprivileged producers
    /// can reach it.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        let bind_err = |source: io::Error| RebuildError::BindFailed {
            endpoint: endpoint.to_string(),
            source,
        };

        match endpoint {
            Endpoint::Unix(path) => {
                remove_stale_socket(path).map_err(bind_err)?;
                let listener = UnixListener::bind(path).map_err(bind_err)?;
                fs::set_permissions(path, fs::Permissions::from_mode(0o666))
                    .map_err(bind_err)?;
                info!(endpoint = %endpoint, "listening for local triggers");
                Ok(TriggerListener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr.as_str()).await.map_err(bind_err)?;
                info!(endpoint = %endpoint, "listening for network triggers");
                Ok(TriggerListener::Tcp(listener))
            }
        }
    }

    pub fn source(&self) -> TriggerSource {
        match self {
            TriggerListener::Unix { .. } => TriggerSource::Local,
            TriggerListener::Tcp(_) => TriggerSource::Network,
        }
    }

    /// The endpoint actually bound (resolves port 0 for TCP).
    pub fn local_endpoint(&self) -> io::Result<Endpoint> {
        match self {
            TriggerListener::Unix { path, .. } => Ok(Endpoint::Unix(path.clone())),
            TriggerListener::Tcp(listener) => {
                Ok(Endpoint::Tcp(listener.local_addr()?.to_string()))
            }
        }
    }

    /// Accept one connection and close it immediately.
    async fn accept_and_close(&self) -> io::Result<()> {
        match self {
            TriggerListener::Unix { listener, .. } => {
                let (stream, _addr) = listener.accept().await?;
                drop(stream);
            }
            TriggerListener::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                drop(stream);
                debug!(%peer, "network trigger connection");
            }
        }
        Ok(())
    }
}

fn remove_stale_socket(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale socket file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Pause after a failed accept. Errors such as EMFILE persist until some
/// descriptor is released, so retrying at once would spin.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Run the accept loop for `listener` on its own task.
///
/// Every accepted connection becomes a [`TriggerEvent`] stamped at accept
/// time and handed to the scheduler on a separate task, so a build in
/// progress never stalls accepting. Accept errors are logged, the loop
/// waits [`ACCEPT_BACKOFF`] and keeps going.
pub fn spawn_accept_loop<R: BuildRunner>(
    listener: TriggerListener,
    scheduler: Scheduler<R>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let source = listener.source();
        let listener = &listener;
        serve(source, scheduler, move || listener.accept_and_close()).await;
    })
}

async fn serve<R, F, Fut>(source: TriggerSource, scheduler: Scheduler<R>, mut accept: F)
where
    R: BuildRunner,
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    loop {
        match accept().await {
            Ok(()) => {
                let event = TriggerEvent::now(source);
                let scheduler = scheduler.clone();
                tokio::spawn(async move {
                    scheduler.handle_trigger(event).await;
                });
            }
            Err(e) => {
                error!(%source, error = %e, "accept error");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}
