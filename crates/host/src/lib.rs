//! Worldsync content host.
//!
//! A host node owns a content directory and pushes its batch down every
//! TCP connection it accepts. Peers locate the host via broadcast
//! discovery, connect, and pull the batch with [`fetch`].

mod batch;
mod fetch;
mod server;

pub use batch::batch_paths;
pub use fetch::{CONNECT_TIMEOUT, discover_and_fetch, fetch};
pub use server::{ContentHost, HostConfig};

use worldsync_discovery::DiscoveryError;
use worldsync_transfer::TransferError;

/// Errors produced by the content host and fetch client.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("connection timed out")]
    Timeout,

    #[error("not a directory: {0}")]
    NotADirectory(String),
}
