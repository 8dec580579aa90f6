//! Batch header: the ordered filename list sent as the first frame.

use crate::{HEADER_DELIMITER, ProtocolError};

/// The ordered list of filenames in a batch, in transmission order.
///
/// Encodes to the header frame payload: filenames joined with `';'`, no
/// trailing delimiter. An empty batch encodes to an empty payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchHeader {
    filenames: Vec<String>,
}

impl BatchHeader {
    /// Creates a header from validated filenames.
    pub fn new(filenames: Vec<String>) -> Result<Self, ProtocolError> {
        for name in &filenames {
            validate_filename(name)?;
        }
        Ok(Self { filenames })
    }

    /// Parses a header frame payload.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(payload)
            .map_err(|e| ProtocolError::MalformedHeader(format!("invalid UTF-8: {e}")))?;

        if text.is_empty() {
            return Ok(Self { filenames: vec![] });
        }

        let filenames: Vec<String> = text.split(HEADER_DELIMITER).map(str::to_owned).collect();
        for name in &filenames {
            if name.is_empty() {
                return Err(ProtocolError::MalformedHeader(
                    "empty filename entry".into(),
                ));
            }
            validate_filename(name)?;
        }
        Ok(Self { filenames })
    }

    /// Encodes the header frame payload.
    pub fn encode(&self) -> Vec<u8> {
        self.filenames
            .join(&HEADER_DELIMITER.to_string())
            .into_bytes()
    }

    /// Filenames in transmission order.
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Number of files in the batch.
    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    /// Returns `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }
}

/// Validates a filename for transmission and receiver-side write safety.
///
/// Filenames are base names, never paths: separators, parent components and
/// drive prefixes are rejected, as is the header delimiter itself.
pub fn validate_filename(name: &str) -> Result<(), ProtocolError> {
    if name.is_empty() {
        return Err(ProtocolError::InvalidFilename("empty filename".into()));
    }

    if name.contains(HEADER_DELIMITER) {
        return Err(ProtocolError::InvalidFilename(format!(
            "'{name}' contains the header delimiter '{HEADER_DELIMITER}'"
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(ProtocolError::InvalidFilename(format!(
            "'{name}' contains a path separator"
        )));
    }

    if name == "." || name == ".." {
        return Err(ProtocolError::InvalidFilename(format!(
            "'{name}' is a directory reference"
        )));
    }

    // Windows drive prefix (e.g. "C:").
    if name.len() >= 2 && name.as_bytes()[1] == b':' {
        return Err(ProtocolError::InvalidFilename(format!(
            "'{name}' has a drive prefix"
        )));
    }

    Ok(())
}
