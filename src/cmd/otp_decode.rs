//! Token OTP decoding against a wrapped token secret.
//!
//! The caller supplies the token's secret as an AEAD (key + private uid)
//! and the raw 16-byte OTP block; the device decrypts both and returns the
//! token's counters so the caller can enforce replay policy.

use super::{command_failed, expect_echo};
use crate::codec;
use crate::core::constants::{OTP_SIZE, PUBLIC_ID_SIZE, TOKEN_AEAD_SIZE};
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, status};

/// Response layout offsets after the echoed public id and key handle.
const USE_CTR_OFFSET: usize = PUBLIC_ID_SIZE + 4;
const SESSION_CTR_OFFSET: usize = USE_CTR_OFFSET + 2;
const TS_HIGH_OFFSET: usize = SESSION_CTR_OFFSET + 1;
const TS_LOW_OFFSET: usize = TS_HIGH_OFFSET + 1;
const STATUS_OFFSET: usize = TS_LOW_OFFSET + 2;

/// Counters recovered from a successfully decoded token OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpCounters {
    /// Non-volatile use counter, incremented on first OTP after power-up.
    pub use_counter: u16,
    /// Volatile session counter.
    pub session_counter: u8,
    /// High byte of the 24-bit token timestamp.
    pub timestamp_high: u8,
    /// Low two bytes of the 24-bit token timestamp.
    pub timestamp_low: u16,
}

/// Decode a token OTP.
pub fn decode<T: Transport>(
    device: &DeviceHandle<T>,
    public_id: &[u8],
    key_handle: u32,
    otp: &[u8],
    aead: &[u8],
) -> Result<OtpCounters, HsmError> {
    let public_id = codec::validate_nonce(public_id, true)?;
    let otp = codec::validate_bytes("otp", otp, 0, OTP_SIZE, 0)?;
    let aead = codec::validate_bytes("aead", aead, 0, TOKEN_AEAD_SIZE, 0)?;
    let payload = codec::concat(&[&public_id, &key_handle.to_le_bytes(), &otp, &aead]);
    let resp = device.execute(CommandCode::TokenOtpDecode, &payload, true)?;
    parse(&resp, &public_id, key_handle)
}

fn parse(resp: &[u8], public_id: &[u8], key_handle: u32) -> Result<OtpCounters, HsmError> {
    let byte = super::status_at(resp, STATUS_OFFSET)?;
    if byte != status::OK {
        return Err(command_failed(CommandCode::TokenOtpDecode, byte));
    }
    expect_echo(resp, 0, public_id, "publicId")?;
    expect_echo(resp, PUBLIC_ID_SIZE, &key_handle.to_le_bytes(), "keyHandle")?;
    Ok(OtpCounters {
        use_counter: codec::read_le_u16(codec::field(resp, USE_CTR_OFFSET, 2)?)?,
        session_counter: codec::field(resp, SESSION_CTR_OFFSET, 1)?[0],
        timestamp_high: codec::field(resp, TS_HIGH_OFFSET, 1)?[0],
        timestamp_low: codec::read_le_u16(codec::field(resp, TS_LOW_OFFSET, 2)?)?,
    })
}
