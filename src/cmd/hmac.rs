//! Incremental HMAC-SHA1 using a device-resident key.

use super::{command_failed, expect_echo};
use crate::codec;
use crate::core::constants::{
    HMAC_SHA1_FINAL, HMAC_SHA1_RESET, HMAC_SHA1_TO_BUFFER, MAX_PKT_SIZE, SHA1_HASH_SIZE,
};
use crate::core::error::{HsmError, ResponseError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, DeviceLock, status};

/// Largest data chunk one HMAC command carries.
const MAX_CHUNK: usize = MAX_PKT_SIZE - 6;

/// Flags byte of the HMAC command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HmacFlags(u8);

impl HmacFlags {
    /// No flags set (continue an open computation).
    pub const NONE: Self = Self(0);
    /// Start a fresh computation.
    pub const RESET: Self = Self(HMAC_SHA1_RESET);
    /// Finalize and return the digest.
    pub const FINAL: Self = Self(HMAC_SHA1_FINAL);
    /// Write the digest into the device buffer instead of the response.
    pub const TO_BUFFER: Self = Self(HMAC_SHA1_TO_BUFFER);

    /// Raw flags byte.
    pub fn as_byte(self) -> u8 {
        self.0
    }

    /// Combine with another flag.
    pub fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the digest is requested in this call.
    pub fn is_final(self) -> bool {
        self.0 & HMAC_SHA1_FINAL != 0
    }
}

/// Outcome of one HMAC command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HmacOutput {
    /// Final call: the computed digest.
    Hash([u8; SHA1_HASH_SIZE]),
    /// Non-final call: the device expects more input.
    Pending,
}

impl HmacOutput {
    /// The digest, if this was a final call.
    pub fn hash(&self) -> Option<&[u8; SHA1_HASH_SIZE]> {
        match self {
            Self::Hash(hash) => Some(hash),
            Self::Pending => None,
        }
    }
}

/// Start an HMAC-SHA1 computation over `data`.
///
/// With `last` set the digest comes back immediately; otherwise feed more
/// input with [`next`]. `to_buffer` diverts the digest into the device
/// buffer for use by a follow-up command.
pub fn generate<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    data: &[u8],
    last: bool,
    to_buffer: bool,
) -> Result<HmacOutput, HsmError> {
    execute(device, key_handle, data, assemble(HmacFlags::RESET, last, to_buffer))
}

/// Feed more input to an open HMAC computation.
pub fn next<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    data: &[u8],
    last: bool,
    to_buffer: bool,
) -> Result<HmacOutput, HsmError> {
    execute(device, key_handle, data, assemble(HmacFlags::NONE, last, to_buffer))
}

/// Run one HMAC command with an explicit flags byte.
pub fn execute<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    data: &[u8],
    flags: HmacFlags,
) -> Result<HmacOutput, HsmError> {
    execute_locked(&mut device.lock(), key_handle, data, flags)
}

/// [`execute`] on an already-held link.
pub(crate) fn execute_locked<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    key_handle: u32,
    data: &[u8],
    flags: HmacFlags,
) -> Result<HmacOutput, HsmError> {
    let data = codec::validate_bytes("data", data, MAX_CHUNK, 0, 0)?;
    let payload = codec::concat(&[
        &key_handle.to_le_bytes(),
        &[flags.as_byte()],
        &codec::length_prefixed(&data)?,
    ]);
    let resp = lock.execute(CommandCode::HmacSha1Generate, &payload, true)?;
    parse(&resp, key_handle, flags.is_final())
}

/// One-shot digest on an already-held link; used by the OATH engine.
pub(crate) fn digest_locked<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    key_handle: u32,
    data: &[u8],
) -> Result<[u8; SHA1_HASH_SIZE], HsmError> {
    let flags = HmacFlags::RESET.with(HmacFlags::FINAL);
    match execute_locked(lock, key_handle, data, flags)? {
        HmacOutput::Hash(hash) => Ok(hash),
        HmacOutput::Pending => Err(HsmError::Response(ResponseError::FieldLength {
            field: "hash",
            expected: SHA1_HASH_SIZE,
            got: 0,
        })),
    }
}

fn assemble(base: HmacFlags, last: bool, to_buffer: bool) -> HmacFlags {
    let mut flags = base;
    if last {
        flags = flags.with(HmacFlags::FINAL);
    }
    if to_buffer {
        flags = flags.with(HmacFlags::TO_BUFFER);
    }
    flags
}

/// Response layout: `keyHandle@0..4, status@4, len@5, hash@6..6+len`.
fn parse(resp: &[u8], key_handle: u32, last: bool) -> Result<HmacOutput, HsmError> {
    let byte = super::status_at(resp, 4)?;
    if byte != status::OK {
        return Err(command_failed(CommandCode::HmacSha1Generate, byte));
    }
    expect_echo(resp, 0, &key_handle.to_le_bytes(), "keyHandle")?;

    if !last {
        return Ok(HmacOutput::Pending);
    }
    let len = codec::field(resp, 5, 1)?[0] as usize;
    let bytes = codec::field(resp, 6, len)?;
    let hash = <[u8; SHA1_HASH_SIZE]>::try_from(bytes).map_err(|_| {
        HsmError::Response(ResponseError::FieldLength {
            field: "hash",
            expected: SHA1_HASH_SIZE,
            got: len,
        })
    })?;
    Ok(HmacOutput::Hash(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_assembly() {
        assert_eq!(assemble(HmacFlags::RESET, false, false).as_byte(), 0x01);
        assert_eq!(assemble(HmacFlags::RESET, true, false).as_byte(), 0x03);
        assert_eq!(assemble(HmacFlags::NONE, true, true).as_byte(), 0x06);
        assert!(assemble(HmacFlags::NONE, true, false).is_final());
        assert!(!HmacFlags::RESET.is_final());
    }
}
