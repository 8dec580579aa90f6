//! Wire format for Worldsync batch transfers.
//!
//! # Wire format
//!
//! All length prefixes are 4-byte little-endian signed integers.
//!
//! ```text
//! Session     := HeaderFrame FileFrame* [Terminator]
//! HeaderFrame := [i32 LE: len] [len bytes: ';'-joined filenames, UTF-8]
//! FileFrame   := [i32 LE: len] [len bytes: raw file content]
//! Terminator  := [i32 LE: len < 0]
//! ```
//!
//! The header's filename count is authoritative: a session is complete once
//! that many file frames have been assembled. A length of 0 where a file
//! length is expected is an empty file while files remain outstanding. The
//! terminator is optional; senders normally signal end-of-stream by shutting
//! down the write side instead.

mod decoder;
mod frame;
mod header;

pub use decoder::{Event, SessionDecoder};
pub use frame::{write_frame, write_terminator};
pub use header::{BatchHeader, validate_filename};

/// Delimiter between filenames in the header frame.
pub const HEADER_DELIMITER: char = ';';

/// Size of a frame length prefix in bytes.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Upper bound on a declared frame length (256 MiB).
///
/// Checked before any payload allocation so a corrupt or hostile length
/// prefix cannot trigger a huge allocation.
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

/// Errors produced by wire encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("invalid filename: {0}")]
    InvalidFilename(String),

    #[error("frame length {len} exceeds maximum {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("header announced {expected} files but stream terminated after {received}")]
    FileCountMismatch { expected: usize, received: usize },

    #[error("unexpected data after session end")]
    TrailingData,
}
