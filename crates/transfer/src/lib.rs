//! Batch file transfer over a byte stream.
//!
//! The sender serializes an ordered batch of files onto any connected
//! stream; the receiver reconstructs byte-identical copies from
//! arbitrarily-chunked reads. Both sides are generic over
//! `AsyncRead`/`AsyncWrite`, so the same code runs over TCP sockets and
//! in-memory buffers.

mod receive;
mod send;

pub use receive::Receiver;
pub use send::send_files;

use worldsync_protocol::ProtocolError;

/// Stream read buffer size (64 KB).
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("connection closed with {received} of {expected} files received")]
    ConnectionClosed { expected: usize, received: usize },
}
