//! Field codec and validators shared by every command module.
//!
//! Pure functions, no I/O. All wire integers are little-endian with a
//! single exception: the OATH counter is 8 big-endian bytes, because that
//! encoding feeds the device HMAC and is fixed by RFC 4226.

use crate::core::constants::AEAD_NONCE_SIZE;
use crate::core::error::{InputError, ResponseError};

/// Decode a little-endian `u16` from the front of `data`.
pub fn read_le_u16(data: &[u8]) -> Result<u16, ResponseError> {
    let bytes = field(data, 0, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Decode a little-endian `u32` from the front of `data`.
pub fn read_le_u32(data: &[u8]) -> Result<u32, ResponseError> {
    let bytes = field(data, 0, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Extract `len` bytes at `offset`, failing on truncated responses.
pub fn field(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ResponseError> {
    let end = offset.saturating_add(len);
    data.get(offset..end).ok_or(ResponseError::Truncated {
        needed: end,
        len: data.len(),
    })
}

/// Lowercase hex rendering of a byte string.
pub fn bytes_to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Parse a hex string, failing on odd length or non-hex characters.
pub fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, InputError> {
    hex::decode(hex).map_err(|_| InputError::InvalidHex(hex.to_string()))
}

/// Concatenate payload pieces into one buffer.
pub fn concat(parts: &[&[u8]]) -> Vec<u8> {
    let len = parts.iter().map(|p| p.len()).sum();
    let mut buffer = Vec::with_capacity(len);
    for part in parts {
        buffer.extend_from_slice(part);
    }
    buffer
}

/// Prefix `data` with its one-byte length.
pub fn length_prefixed(data: &[u8]) -> Result<Vec<u8>, InputError> {
    if data.len() > u8::MAX as usize {
        return Err(InputError::LengthOverflow(data.len()));
    }
    let mut buffer = Vec::with_capacity(data.len() + 1);
    buffer.push(data.len() as u8);
    buffer.extend_from_slice(data);
    Ok(buffer)
}

/// The pad-then-bound field rule.
///
/// Zero-right-pads `data` to `pad` bytes first (when `pad > 0`), then
/// rejects the result if it exceeds `max` (when `max > 0`) or differs from
/// `exact` (when `exact > 0`). A zero parameter disables that part of the
/// rule. Bytes are never altered beyond the appended padding.
pub fn validate_bytes(
    name: &'static str,
    data: &[u8],
    max: usize,
    exact: usize,
    pad: usize,
) -> Result<Vec<u8>, InputError> {
    let mut data = data.to_vec();
    if pad > 0 && data.len() < pad {
        data.resize(pad, 0);
    }
    if max > 0 && data.len() > max {
        return Err(InputError::TooLong {
            name,
            max,
            len: data.len(),
        });
    }
    if exact > 0 && data.len() != exact {
        return Err(InputError::WrongSize {
            name,
            expected: exact,
            len: data.len(),
        });
    }
    Ok(data)
}

/// Validate a nonce: longer than 6 bytes is rejected; shorter input is
/// zero-right-padded when `pad` is set, passed through short otherwise.
pub fn validate_nonce(nonce: &[u8], pad: bool) -> Result<Vec<u8>, InputError> {
    if nonce.len() > AEAD_NONCE_SIZE {
        return Err(InputError::TooLong {
            name: "nonce",
            max: AEAD_NONCE_SIZE,
            len: nonce.len(),
        });
    }
    if pad {
        let mut nonce = nonce.to_vec();
        nonce.resize(AEAD_NONCE_SIZE, 0);
        return Ok(nonce);
    }
    Ok(nonce.to_vec())
}
