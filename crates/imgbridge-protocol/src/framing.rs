//! Length-prefix framing for the notification stream.
//!
//! Each frame is a 4-byte big-endian payload length followed by the payload
//! (one serialized JSON-RPC message).

use std::fmt;

/// Largest image that fits in a single unchunked upload (64 MiB).
pub const MAX_IMAGE_BYTES: usize = 64 * 1024 * 1024;

/// Room for the JSON-RPC envelope, the filename and the display options.
const ENVELOPE_SLACK: usize = 1024 * 1024;

/// Maximum frame payload size: a [`MAX_IMAGE_BYTES`] image as base64 text,
/// plus the envelope.
pub const MAX_FRAME_SIZE: usize = MAX_IMAGE_BYTES.div_ceil(3) * 4 + ENVELOPE_SLACK;

const HEADER_LEN: usize = 4;

#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The message exceeds [`MAX_FRAME_SIZE`].
    MessageTooLarge(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::MessageTooLarge(size) => {
                write!(f, "message too large: {size} bytes (max {MAX_FRAME_SIZE})")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Prefix `msg` with its length.
pub fn encode_frame(msg: &[u8]) -> Result<Vec<u8>, FrameError> {
    if msg.len() > MAX_FRAME_SIZE {
        return Err(FrameError::MessageTooLarge(msg.len()));
    }
    let len = u32::try_from(msg.len()).map_err(|_| FrameError::MessageTooLarge(msg.len()))?;
    let mut frame = Vec::with_capacity(HEADER_LEN + msg.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(msg);
    Ok(frame)
}

/// Decode one frame from the start of `buf`.
///
/// Returns `Ok(Some((consumed, payload)))` for a complete frame, `Ok(None)`
/// when more bytes are needed.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(usize, Vec<u8>)>, FrameError> {
    let Some(header) = buf.get(..HEADER_LEN) else {
        return Ok(None);
    };
    let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(FrameError::MessageTooLarge(len));
    }
    match buf.get(HEADER_LEN..HEADER_LEN + len) {
        Some(payload) => Ok(Some((HEADER_LEN + len, payload.to_vec()))),
        None => Ok(None),
    }
}

/// Accumulates bytes from a stream and hands out complete frames.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next complete frame payload, if any.
    ///
    /// An oversized header poisons the stream; the buffer is cleared so the
    /// caller can drop the connection without holding the garbage.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, FrameError> {
        match decode_frame(&self.pending) {
            Ok(Some((consumed, payload))) => {
                self.pending.drain(..consumed);
                Ok(Some(payload))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                self.pending.clear();
                Err(e)
            }
        }
    }

    pub fn buffered_len(&self) -> usize {
        self.pending.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_frame_has_length_prefix() {
        let frame = encode_frame(b"hello").expect("encode");
        assert_eq!(&frame[..4], &[0, 0, 0, 5]);
        assert_eq!(&frame[4..], b"hello");
    }

    #[test]
    fn decode_incomplete_header() {
        assert!(decode_frame(&[0x00, 0x00]).unwrap().is_none());
    }

    #[test]
    fn decode_incomplete_payload() {
        let frame = encode_frame(b"hello").expect("encode");
        assert!(decode_frame(&frame[..frame.len() - 1]).unwrap().is_none());
    }

    #[test]
    fn decode_rejects_oversized_header() {
        let huge_len = (MAX_FRAME_SIZE + 1) as u32;
        let mut buf = huge_len.to_be_bytes().to_vec();
        buf.push(0);
        assert_eq!(
            decode_frame(&buf),
            Err(FrameError::MessageTooLarge(MAX_FRAME_SIZE + 1))
        );
    }

    #[test]
    fn frame_limit_fits_largest_base64_image() {
        let encoded = MAX_IMAGE_BYTES.div_ceil(3) * 4;
        assert!(encoded < MAX_FRAME_SIZE);
        assert!(MAX_FRAME_SIZE > 16 * 1024 * 1024);
    }

    #[test]
    fn encode_rejects_oversized_message() {
        let big = vec![0u8; MAX_FRAME_SIZE + 1];
        assert!(encode_frame(&big).is_err());
    }

    #[test]
    fn frame_buffer_splits_across_reads() {
        let mut stream = encode_frame(b"first").unwrap();
        stream.extend(encode_frame(b"second").unwrap());

        let mut buf = FrameBuffer::new();
        buf.extend(&stream[..7]);
        assert_eq!(buf.next_frame().unwrap(), None);

        buf.extend(&stream[7..]);
        assert_eq!(buf.next_frame().unwrap().as_deref(), Some(&b"first"[..]));
        assert_eq!(buf.next_frame().unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(buf.next_frame().unwrap(), None);
        assert_eq!(buf.buffered_len(), 0);
    }

    #[test]
    fn frame_buffer_clears_on_oversized_frame() {
        let mut buf = FrameBuffer::new();
        buf.extend(&u32::MAX.to_be_bytes());
        buf.extend(b"junk");
        assert!(buf.next_frame().is_err());
        assert_eq!(buf.buffered_len(), 0);
    }
}
