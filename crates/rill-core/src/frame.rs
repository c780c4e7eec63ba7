//! Wire framing for serialized components
//!
//! ```text
//! +----------------+----------------+-----------------+
//! | length: u32 BE | tag: u32 BE    | payload ...     |
//! +----------------+----------------+-----------------+
//!                  |<---------- length bytes -------->|
//! ```
//!
//! The tag selects the codec inside a category; the payload encoding is
//! owned by that codec.

use crate::error::{BridgeError, BridgeResult, MalformedReason};

/// Length prefix size
pub const PREFIX_LEN: usize = 4;

/// Discriminant size
pub const TAG_LEN: usize = 4;

/// Frame a tagged payload.
///
/// Fails if the framed length exceeds `max_frame_len` or `u32::MAX`.
pub fn encode(tag: u32, payload: &[u8], max_frame_len: usize) -> BridgeResult<Vec<u8>> {
    let body_len = TAG_LEN + payload.len();
    let total = PREFIX_LEN + body_len;
    let declared = u32::try_from(body_len).map_err(|_| BridgeError::FrameTooLarge {
        len: total,
        max: max_frame_len,
    })?;
    if total > max_frame_len {
        return Err(BridgeError::FrameTooLarge {
            len: total,
            max: max_frame_len,
        });
    }

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&declared.to_be_bytes());
    buf.extend_from_slice(&tag.to_be_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Total framed length announced by a buffer's prefix (prefix included)
pub fn framed_len(buf: &[u8]) -> Result<usize, MalformedReason> {
    let prefix: [u8; PREFIX_LEN] = buf
        .get(..PREFIX_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(MalformedReason::MissingPrefix(buf.len()))?;
    Ok(PREFIX_LEN + u32::from_be_bytes(prefix) as usize)
}

/// Split a framed buffer into its tag and payload.
///
/// Bytes past the declared length are ignored.
pub fn decode(buf: &[u8], max_frame_len: usize) -> Result<(u32, &[u8]), MalformedReason> {
    let total = framed_len(buf)?;
    let declared = total - PREFIX_LEN;
    if total > max_frame_len {
        return Err(MalformedReason::FrameTooLarge {
            declared,
            max: max_frame_len,
        });
    }
    let available = buf.len() - PREFIX_LEN;
    if declared > available {
        return Err(MalformedReason::Truncated {
            declared,
            available,
        });
    }
    if declared < TAG_LEN {
        return Err(MalformedReason::MissingTag(declared));
    }

    let body = &buf[PREFIX_LEN..total];
    let (tag, payload) = body.split_at(TAG_LEN);
    let tag = u32::from_be_bytes([tag[0], tag[1], tag[2], tag[3]]);
    Ok((tag, payload))
}
