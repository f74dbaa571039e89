use bytes::{Buf, BytesMut};

use crate::sip::sip_error::SipParseError;

/// Upper bound on bytes held while waiting for a frame to complete. A peer
/// that exceeds it gets its buffer dropped and a 513 on the wire.
pub const MAX_BUFFERED_BYTES: usize = 64 * 1024;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// One delimited message off the stream: the header block (first line plus
/// fields, without the blank line) and exactly `Content-Length` bytes of body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SipFrame {
    pub header: String,
    pub body: String,
}

/// Reassembles messages from an ordered byte stream. Chunk boundaries carry
/// no meaning: bytes are appended as they arrive and frames drained as they
/// complete, so any split of the same stream yields the same frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: BytesMut,
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    ///
    /// # Errors
    /// [`SipParseError::FrameTooLarge`] when the pending data would exceed
    /// [`MAX_BUFFERED_BYTES`]; the buffer is cleared so the stream can only
    /// resume at a fresh message boundary.
    pub fn submit(&mut self, bytes: &[u8]) -> Result<(), SipParseError> {
        if self.buffer.len().saturating_add(bytes.len()) > MAX_BUFFERED_BYTES {
            self.buffer.clear();
            return Err(SipParseError::FrameTooLarge);
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Takes the next complete frame, or `None` while one is still partial.
    /// Call repeatedly after each [`submit`](Self::submit); a single chunk
    /// can complete several frames.
    ///
    /// # Errors
    /// [`SipParseError::MalformedMessage`] for non-UTF-8 data or an unreadable
    /// Content-Length, [`SipParseError::FrameTooLarge`] for a declared body
    /// that could never fit.
    pub fn next_frame(&mut self) -> Result<Option<SipFrame>, SipParseError> {
        // keep-alive newlines between messages
        while self.buffer.starts_with(b"\r\n") {
            self.buffer.advance(2);
        }

        let Some(header_end) = find(&self.buffer, HEADER_TERMINATOR) else {
            return Ok(None);
        };
        let header = std::str::from_utf8(&self.buffer[..header_end])
            .map_err(|_| SipParseError::MalformedMessage("utf-8"))?
            .to_string();

        let body_length = declared_content_length(&header)?;
        if body_length > MAX_BUFFERED_BYTES {
            self.buffer.clear();
            return Err(SipParseError::FrameTooLarge);
        }
        let frame_end = header_end + HEADER_TERMINATOR.len() + body_length;
        if self.buffer.len() < frame_end {
            return Ok(None);
        }

        let frame = self.buffer.split_to(frame_end);
        let body = std::str::from_utf8(&frame[header_end + HEADER_TERMINATOR.len()..])
            .map_err(|_| SipParseError::MalformedMessage("utf-8"))?
            .to_string();
        Ok(Some(SipFrame { header, body }))
    }

    /// Bytes currently held waiting for completion.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn declared_content_length(header: &str) -> Result<usize, SipParseError> {
    for line in header.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                return value
                    .trim()
                    .parse()
                    .map_err(|_| SipParseError::MalformedMessage("Content-Length"));
            }
        }
    }
    Ok(0)
}
