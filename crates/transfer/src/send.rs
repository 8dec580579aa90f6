//! Batch sender.

use std::path::{Path, PathBuf};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use worldsync_protocol::{BatchHeader, ProtocolError, write_frame};

use crate::TransferError;

/// Serializes a batch of files onto an already-connected stream.
///
/// The header frame (base filenames joined with `';'`, in argument order)
/// goes first, then one frame per file in the same order, each file read
/// whole into memory. The write side is shut down after the last frame,
/// which is the end-of-stream signal; no terminator frame is sent.
///
/// Filename validation happens before any byte is written, and an
/// unreadable source file aborts the whole batch. Nothing is retried.
///
/// Returns the total payload bytes sent (header excluded).
pub async fn send_files<W: AsyncWrite + Unpin>(
    writer: &mut W,
    paths: &[PathBuf],
) -> Result<u64, TransferError> {
    let names = paths
        .iter()
        .map(|p| base_name(p))
        .collect::<Result<Vec<_>, _>>()?;
    let header = BatchHeader::new(names)?;

    write_frame(writer, &header.encode()).await?;
    debug!(files = header.len(), "batch header sent");

    let mut total: u64 = 0;
    for (path, name) in paths.iter().zip(header.filenames()) {
        let data = tokio::fs::read(path).await?;
        write_frame(writer, &data).await?;
        total += data.len() as u64;
        debug!(file = %name, size = data.len(), "file sent");
    }

    writer.shutdown().await?;
    info!(files = header.len(), total_bytes = total, "batch sent");
    Ok(total)
}

/// Extracts the transmittable base name of a path.
fn base_name(path: &Path) -> Result<String, ProtocolError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| ProtocolError::InvalidFilename(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use worldsync_protocol::{Event, SessionDecoder};

    fn write_fixture(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    #[tokio::test]
    async fn sends_header_then_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_fixture(dir.path(), "a.txt", b"hello");
        let b = write_fixture(dir.path(), "b.bin", &[0, 1, 2, 255]);

        let mut buf = Vec::new();
        let total = send_files(&mut buf, &[a, b]).await.unwrap();
        assert_eq!(total, 9);

        let mut decoder = SessionDecoder::new();
        let events = decoder.feed(&buf).unwrap();
        assert_eq!(events[0], Event::Header(vec!["a.txt".into(), "b.bin".into()]));
        assert_eq!(
            events[1],
            Event::File {
                name: "a.txt".into(),
                data: b"hello".to_vec()
            }
        );
        assert_eq!(
            events[2],
            Event::File {
                name: "b.bin".into(),
                data: vec![0, 1, 2, 255]
            }
        );
        assert_eq!(events[3], Event::End);
    }

    #[tokio::test]
    async fn empty_batch_sends_empty_header() {
        let mut buf = Vec::new();
        let total = send_files(&mut buf, &[]).await.unwrap();
        assert_eq!(total, 0);
        assert_eq!(buf, 0i32.to_le_bytes());
    }

    #[tokio::test]
    async fn delimiter_in_filename_rejected_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_fixture(dir.path(), "bad;name.txt", b"data");

        let mut buf = Vec::new();
        let result = send_files(&mut buf, &[bad]).await;
        assert!(matches!(
            result,
            Err(TransferError::Protocol(ProtocolError::InvalidFilename(_)))
        ));
        assert!(buf.is_empty(), "no bytes written on rejected batch");
    }

    #[tokio::test]
    async fn missing_source_file_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_fixture(dir.path(), "good.txt", b"ok");
        let missing = dir.path().join("missing.txt");

        let mut buf = Vec::new();
        let result = send_files(&mut buf, &[good, missing]).await;
        assert!(matches!(result, Err(TransferError::Io(_))));
    }
}
