//! Batch receiver.

use std::path::PathBuf;

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use worldsync_protocol::{Event, SessionDecoder};

use crate::{READ_BUFFER_SIZE, TransferError};

/// Reconstructs a batch from a stream into an output directory.
///
/// One receiver drives one connection; concurrent connections need their
/// own instances. Two sessions writing identically-named files into the
/// same directory at once is undefined; callers must serialize that.
pub struct Receiver {
    out_dir: PathBuf,
}

impl Receiver {
    /// Creates a receiver writing into `out_dir`.
    ///
    /// The directory is created (recursively) when the first file is
    /// written, not before.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    /// Receives one session, returning the paths written, in batch order.
    ///
    /// Reads are arbitrary-sized; the session decoder reassembles frames
    /// across read boundaries. A stream that ends before every file named
    /// in the header has been assembled surfaces
    /// [`TransferError::ConnectionClosed`]: completed files stay on disk,
    /// the partially-assembled one is discarded.
    pub async fn receive<R: AsyncRead + Unpin>(
        &self,
        reader: &mut R,
    ) -> Result<Vec<PathBuf>, TransferError> {
        let mut decoder = SessionDecoder::new();
        let mut written = Vec::new();
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                if decoder.is_done() {
                    break;
                }
                return Err(TransferError::ConnectionClosed {
                    expected: decoder.expected(),
                    received: decoder.completed(),
                });
            }

            for event in decoder.feed(&buf[..n])? {
                match event {
                    Event::Header(names) => {
                        debug!(files = names.len(), "batch header received");
                    }
                    Event::File { name, data } => {
                        tokio::fs::create_dir_all(&self.out_dir).await?;
                        let path = self.out_dir.join(&name);
                        tokio::fs::write(&path, &data).await?;
                        debug!(file = %name, size = data.len(), "file written");
                        written.push(path);
                    }
                    Event::End => {
                        debug!("batch complete");
                    }
                }
            }

            if decoder.is_done() {
                break;
            }
        }

        info!(
            files = written.len(),
            dir = %self.out_dir.display(),
            "batch received"
        );
        Ok(written)
    }
}
