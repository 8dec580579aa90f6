//! Frame writers: length-prefixed units on the wire.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{MAX_FRAME_LEN, ProtocolError};

/// Writes one frame: a little-endian `i32` length prefix followed by the
/// payload bytes.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), ProtocolError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }

    writer.write_i32_le(payload.len() as i32).await?;
    writer.write_all(payload).await?;
    Ok(())
}

/// Writes the explicit session terminator (a negative length prefix).
///
/// Optional on the wire: shutting down the write side after the last file
/// frame is the normal end-of-stream signal.
pub async fn write_terminator<W: AsyncWrite + Unpin>(writer: &mut W) -> Result<(), ProtocolError> {
    writer.write_i32_le(-1).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_layout() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").await.unwrap();

        assert_eq!(&buf[..4], &5i32.to_le_bytes());
        assert_eq!(&buf[4..], b"hello");
    }

    #[tokio::test]
    async fn empty_frame_is_zero_length_prefix() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"").await.unwrap();
        assert_eq!(buf, 0i32.to_le_bytes());
    }

    #[tokio::test]
    async fn terminator_is_negative() {
        let mut buf = Vec::new();
        write_terminator(&mut buf).await.unwrap();
        assert_eq!(buf, (-1i32).to_le_bytes());
    }
}
