//! Client side: connect to a host and pull its batch.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::info;

use worldsync_discovery::Finder;
use worldsync_transfer::Receiver;

use crate::HostError;

/// Timeout for the TCP connection attempt.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connects to a content host and receives its batch into `out_dir`.
///
/// Returns the paths written, in batch order.
pub async fn fetch(addr: SocketAddr, out_dir: &Path) -> Result<Vec<PathBuf>, HostError> {
    let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
        .await
        .map_err(|_| HostError::Timeout)??;
    info!(%addr, "connected to content host");

    let written = Receiver::new(out_dir).receive(&mut stream).await?;
    Ok(written)
}

/// Locates the content host via `finder` on `discovery_port`, then fetches
/// its batch from `content_port` into `out_dir`.
///
/// Discovery only yields the host's address; the content port is a shared
/// convention between host and clients.
pub async fn discover_and_fetch(
    finder: &Finder,
    discovery_port: u16,
    content_port: u16,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, HostError> {
    let host = finder.find(discovery_port).await?;
    fetch(SocketAddr::new(host, content_port), out_dir).await
}
