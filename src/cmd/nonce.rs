//! The device nonce counter.

use std::fmt;

use super::command_failed;
use crate::codec;
use crate::core::constants::AEAD_NONCE_SIZE;
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, status};

/// A snapshot of the device nonce counter.
///
/// The six nonce bytes are the volatile counter (low four, little-endian)
/// concatenated with the power-up counter (high two, little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNonce {
    /// The six nonce bytes as they appear on the wire.
    pub nonce: [u8; AEAD_NONCE_SIZE],
    /// Volatile counter, reset on power cycle.
    pub volatile_count: u32,
    /// Number of device power-ups.
    pub power_up_count: u16,
}

impl fmt::Display for DeviceNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Nonce: {} Power up count: {} Volatile: {}",
            codec::bytes_to_hex(&self.nonce),
            self.power_up_count,
            self.volatile_count
        )
    }
}

/// Fetch the nonce counter, advancing it by `increment`.
///
/// An increment of zero peeks at the counter without consuming nonces.
pub fn get<T: Transport>(device: &DeviceHandle<T>, increment: u16) -> Result<DeviceNonce, HsmError> {
    let resp = device.execute(CommandCode::NonceGet, &increment.to_le_bytes(), true)?;
    parse(&resp)
}

/// Response layout: `status@0, nonce@1..7` (volatile LE32 + power-up LE16).
fn parse(resp: &[u8]) -> Result<DeviceNonce, HsmError> {
    let byte = super::status_at(resp, 0)?;
    if byte != status::OK {
        return Err(command_failed(CommandCode::NonceGet, byte));
    }
    let bytes = codec::field(resp, 1, AEAD_NONCE_SIZE)?;
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    nonce.copy_from_slice(bytes);
    Ok(DeviceNonce {
        nonce,
        volatile_count: codec::read_le_u32(bytes)?,
        power_up_count: codec::read_le_u16(&bytes[4..])?,
    })
}
