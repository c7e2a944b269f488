//! Wire format for update messages.
//!
//! One datagram carries one [`Update`]: a pixel index, a packed color value,
//! and a render flag. Payloads are bincode-encoded (fixed-width integers,
//! little-endian), 9 bytes per message. This module owns the validation that
//! the serializer does not: size bounds and the empty-payload case.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted payload size in bytes.
///
/// Matches the transport's historical datagram limit. Anything larger is
/// rejected as a whole, never truncated and partially processed.
pub const MAX_DATAGRAM: usize = 548;

/// One decoded instruction to set a pixel's color.
///
/// Created per received message, consumed immediately, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    /// 0-based pixel index. Indices beyond the strip length are dropped
    /// downstream without error.
    pub index: u32,
    /// Packed color value; channel layout is the strip driver's concern.
    pub color: u32,
    /// Whether this update requests an immediate hardware commit.
    pub render: bool,
}

// ── Error type ──

/// Wire decode errors. All of them discard a single message; none are fatal.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Zero-byte payload. A decode failure, not a no-op.
    Empty,
    /// Payload exceeds [`MAX_DATAGRAM`]; rejected before any parse attempt.
    Oversized { len: usize },
    /// The serializer could not produce an [`Update`] from the bytes.
    Malformed(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "empty payload"),
            DecodeError::Oversized { len } => {
                write!(f, "payload of {len} bytes exceeds {MAX_DATAGRAM} byte limit")
            }
            DecodeError::Malformed(e) => write!(f, "malformed payload: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode a raw datagram payload into an [`Update`].
pub fn decode(payload: &[u8]) -> std::result::Result<Update, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    if payload.len() > MAX_DATAGRAM {
        return Err(DecodeError::Oversized { len: payload.len() });
    }
    bincode::deserialize(payload).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// Encode an [`Update`] for transmission. Used by the send client and tests.
pub fn encode(update: &Update) -> Vec<u8> {
    // A 9-byte fixed-layout struct cannot fail to serialize.
    bincode::serialize(update).expect("Update serialization is infallible")
}
