//! Protocol codec
//!
//! JSON encoding/decoding of messages plus the length-prefixed framing used
//! on stream transports.
//!
//! ## Frame Format
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │      Body (UTF-8 JSON)      │
//! └──────────┴─────────────────────────────┘
//! ```
//!
//! Everything here is stateless and safe to call from any thread.

use std::io::{Read, Write};

use bytes::{Buf, Bytes, BytesMut};
use serde_json::Value;
use thiserror::Error;

use crate::error::{LhcError, Result};
use super::{Message, Reply};

/// Header size: 4 bytes body length, big-endian
pub const HEADER_SIZE: usize = 4;

/// Default maximum body size (16 MB)
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Bytes that are not structured data, or a frame that cannot be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is not syntactically valid JSON
    #[error("malformed message: {0}")]
    Malformed(String),

    /// Declared body length exceeds the limit
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },
}

// =============================================================================
// Message Encoding/Decoding
// =============================================================================

/// Encode a reply to wire bytes
///
/// Output is deterministic: fields in declaration order, payload keys sorted.
pub fn encode(reply: &Reply) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(reply)?)
}

/// Encode a request to wire bytes
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode wire bytes into structured data
///
/// Only checks syntax; shape and semantics are the validator's job.
pub fn decode(bytes: &[u8]) -> std::result::Result<Value, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Decode a reply (client side)
pub fn decode_reply(bytes: &[u8]) -> Result<Reply> {
    let value = decode(bytes)?;
    serde_json::from_value(value)
        .map_err(|e| LhcError::Protocol(format!("Unexpected reply shape: {}", e)))
}

// =============================================================================
// Framing
// =============================================================================

/// Prefix a body with its length
pub fn frame(body: &[u8]) -> Result<Vec<u8>> {
    let len = u32::try_from(body.len()).map_err(|_| {
        LhcError::Protocol(format!("Body too large to frame: {} bytes", body.len()))
    })?;

    let mut out = Vec::with_capacity(HEADER_SIZE + body.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

/// Split one complete frame body off the front of `buffer`
///
/// Returns `Ok(None)` while the frame is still incomplete; the buffer is left
/// untouched in that case.
pub fn split_frame(
    buffer: &mut BytesMut,
    max: usize,
) -> std::result::Result<Option<Bytes>, DecodeError> {
    if buffer.len() < HEADER_SIZE {
        return Ok(None);
    }

    let mut header = [0u8; HEADER_SIZE];
    header.copy_from_slice(&buffer[..HEADER_SIZE]);
    let body_len = u32::from_be_bytes(header) as usize;

    if body_len > max {
        return Err(DecodeError::FrameTooLarge { size: body_len, max });
    }

    if buffer.len() < HEADER_SIZE + body_len {
        return Ok(None);
    }

    buffer.advance(HEADER_SIZE);
    Ok(Some(buffer.split_to(body_len).freeze()))
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame body from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_frame<R: Read>(reader: &mut R, max: usize) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let body_len = u32::from_be_bytes(header) as usize;
    if body_len > max {
        return Err(DecodeError::FrameTooLarge { size: body_len, max }.into());
    }

    let mut body = vec![0u8; body_len];
    if body_len > 0 {
        reader.read_exact(&mut body)?;
    }
    Ok(body)
}

/// Write one frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, body: &[u8]) -> Result<()> {
    writer.write_all(&frame(body)?)?;
    writer.flush()?;
    Ok(())
}
