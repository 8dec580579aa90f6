//! The content host: TCP listener pushing the batch to each client.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use worldsync_discovery::{Responder, ResponderConfig};
use worldsync_transfer::send_files;

use crate::{HostError, batch_paths};

/// Host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
    /// Directory whose files form the served batch.
    pub content_dir: PathBuf,
}

/// Serves a content directory's batch to every inbound connection.
///
/// Each accepted connection gets its own send task; a failed client never
/// takes down the accept loop. The batch is re-enumerated per connection,
/// so files added to the directory are picked up by later clients.
pub struct ContentHost {
    config: HostConfig,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ContentHost {
    /// Creates a new host serving `config.content_dir`.
    pub fn new(config: HostConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// The bound address, available once [`run`](Self::run) has bound.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// The listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Stops the accept loop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the accept loop until [`shutdown`](Self::shutdown).
    pub async fn run(self: &Arc<Self>) -> Result<(), HostError> {
        let addr: SocketAddr = ([0, 0, 0, 0], self.config.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("content host listening on {local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("content host shutting down");
                    return Ok(());
                }
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            tracing::info!(%peer, "client connected");
                            let host = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = host.serve_client(stream).await {
                                    tracing::warn!(%peer, "failed to serve client: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!("accept failed: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Runs the accept loop with a discovery responder advertising this
    /// node on `discovery_port` for the host's lifetime.
    pub async fn run_with_responder(
        self: &Arc<Self>,
        discovery_port: u16,
    ) -> Result<(), HostError> {
        let mut responder = Responder::new(ResponderConfig {
            port: discovery_port,
            advertise: None,
        });
        responder.start().await?;

        let result = self.run().await;
        responder.stop().await?;
        result
    }

    async fn serve_client(&self, mut stream: TcpStream) -> Result<(), HostError> {
        let paths = batch_paths(&self.config.content_dir)?;
        let sent = send_files(&mut stream, &paths).await?;
        tracing::debug!(files = paths.len(), bytes = sent, "batch served");
        Ok(())
    }
}
