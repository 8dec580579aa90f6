//! Incremental session decoder.
//!
//! Reconstructs a batch session from a byte stream that arrives in
//! arbitrary-sized chunks: a single read may hold a fragment of a frame, an
//! entire frame, or several concatenated frames. The decoder consumes each
//! chunk in one linear pass and emits completed events; no alignment between
//! read boundaries and frame boundaries is assumed.

use crate::header::BatchHeader;
use crate::{LEN_PREFIX_SIZE, MAX_FRAME_LEN, ProtocolError};

/// A completed unit emitted by [`SessionDecoder::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The batch header: filenames in transmission order.
    Header(Vec<String>),
    /// A fully assembled file payload.
    File { name: String, data: Vec<u8> },
    /// All files named in the header have been assembled.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    HeaderLen,
    HeaderBody,
    FileLen,
    FileBody,
    /// Session complete; at most one terminator prefix may still arrive.
    Done,
    /// Terminator consumed; any further byte is trailing data.
    Closed,
}

/// Per-session decoder state machine.
///
/// `HeaderLen -> HeaderBody -> FileLen -> FileBody -> (loop) -> Done`.
///
/// A length prefix split across reads is buffered in `len_buf` (0-3 pending
/// bytes); payload bytes accumulate in `payload` across as many reads as the
/// frame spans. One decoder instance per connection; no shared state.
#[derive(Debug)]
pub struct SessionDecoder {
    state: State,
    len_buf: [u8; LEN_PREFIX_SIZE],
    len_filled: usize,
    payload: Vec<u8>,
    payload_needed: usize,
    filenames: Vec<String>,
    completed: usize,
    max_frame: usize,
}

impl SessionDecoder {
    /// Creates a decoder with the default [`MAX_FRAME_LEN`] cap.
    pub fn new() -> Self {
        Self::with_max_frame(MAX_FRAME_LEN)
    }

    /// Creates a decoder with a custom frame length cap.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            state: State::HeaderLen,
            len_buf: [0; LEN_PREFIX_SIZE],
            len_filled: 0,
            payload: Vec::new(),
            payload_needed: 0,
            filenames: Vec::new(),
            completed: 0,
            max_frame,
        }
    }

    /// Consumes one read's bytes, emitting zero or more completed events.
    ///
    /// The chunk is processed in a single pass; partial frame state carries
    /// over to the next call. After an error the decoder is poisoned and
    /// must not be fed again.
    pub fn feed(&mut self, mut input: &[u8]) -> Result<Vec<Event>, ProtocolError> {
        let mut events = Vec::new();

        while !input.is_empty() {
            match self.state {
                State::HeaderLen | State::FileLen | State::Done => {
                    let take = (LEN_PREFIX_SIZE - self.len_filled).min(input.len());
                    self.len_buf[self.len_filled..self.len_filled + take]
                        .copy_from_slice(&input[..take]);
                    self.len_filled += take;
                    input = &input[take..];

                    if self.len_filled == LEN_PREFIX_SIZE {
                        self.len_filled = 0;
                        let len = i32::from_le_bytes(self.len_buf);
                        self.on_length(len, &mut events)?;
                    }
                }
                State::HeaderBody | State::FileBody => {
                    let take = self.payload_needed.min(input.len());
                    self.payload.extend_from_slice(&input[..take]);
                    self.payload_needed -= take;
                    input = &input[take..];

                    if self.payload_needed == 0 {
                        let data = std::mem::take(&mut self.payload);
                        self.on_payload(data, &mut events)?;
                    }
                }
                State::Closed => return Err(ProtocolError::TrailingData),
            }
        }

        Ok(events)
    }

    /// A fully assembled length prefix.
    fn on_length(&mut self, len: i32, events: &mut Vec<Event>) -> Result<(), ProtocolError> {
        match self.state {
            State::HeaderLen => {
                if len < 0 {
                    return Err(ProtocolError::MalformedHeader(format!(
                        "negative header length {len}"
                    )));
                }
                self.check_cap(len as usize)?;
                if len == 0 {
                    // Empty batch: nothing follows the header.
                    self.accept_header(BatchHeader::parse(b"")?, events);
                } else {
                    self.payload_needed = len as usize;
                    self.state = State::HeaderBody;
                }
            }
            State::FileLen => {
                if len < 0 {
                    // Explicit terminator while files are still outstanding.
                    return Err(ProtocolError::FileCountMismatch {
                        expected: self.filenames.len(),
                        received: self.completed,
                    });
                }
                self.check_cap(len as usize)?;
                if len == 0 {
                    // Empty file frame.
                    self.complete_file(Vec::new(), events);
                } else {
                    self.payload_needed = len as usize;
                    self.state = State::FileBody;
                }
            }
            State::Done => {
                if len > 0 {
                    return Err(ProtocolError::TrailingData);
                }
                // Trailing terminator from a sender using the explicit
                // end marker; swallow it.
                self.state = State::Closed;
            }
            _ => unreachable!("on_length only fires in length states"),
        }
        Ok(())
    }

    /// A fully assembled frame payload.
    fn on_payload(&mut self, data: Vec<u8>, events: &mut Vec<Event>) -> Result<(), ProtocolError> {
        match self.state {
            State::HeaderBody => {
                self.accept_header(BatchHeader::parse(&data)?, events);
            }
            State::FileBody => {
                self.complete_file(data, events);
            }
            _ => unreachable!("on_payload only fires in body states"),
        }
        Ok(())
    }

    fn accept_header(&mut self, header: BatchHeader, events: &mut Vec<Event>) {
        self.filenames = header.filenames().to_vec();
        self.completed = 0;
        events.push(Event::Header(self.filenames.clone()));
        if self.filenames.is_empty() {
            self.state = State::Done;
            events.push(Event::End);
        } else {
            self.state = State::FileLen;
        }
    }

    fn complete_file(&mut self, data: Vec<u8>, events: &mut Vec<Event>) {
        let name = self.filenames[self.completed].clone();
        self.completed += 1;
        events.push(Event::File { name, data });
        if self.completed == self.filenames.len() {
            self.state = State::Done;
            events.push(Event::End);
        } else {
            self.state = State::FileLen;
        }
    }

    fn check_cap(&self, len: usize) -> Result<(), ProtocolError> {
        if len > self.max_frame {
            return Err(ProtocolError::FrameTooLarge {
                len,
                max: self.max_frame,
            });
        }
        Ok(())
    }

    /// Returns `true` once every file named in the header has been assembled.
    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done | State::Closed)
    }

    /// Number of files announced by the header (0 before the header arrives).
    pub fn expected(&self) -> usize {
        self.filenames.len()
    }

    /// Number of files fully assembled so far.
    pub fn completed(&self) -> usize {
        self.completed
    }
}

impl Default for SessionDecoder {
    fn default() -> Self {
        Self::new()
    }
}
