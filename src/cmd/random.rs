//! Device TRNG: random generation and DRBG reseeding.

use super::ensure_ok;
use crate::codec;
use crate::core::constants::{CTR_DRBG_SEED_SIZE, MAX_PKT_SIZE};
use crate::core::error::{HsmError, InputError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle};

/// Generate `count` random bytes on the device.
pub fn generate<T: Transport>(device: &DeviceHandle<T>, count: usize) -> Result<Vec<u8>, HsmError> {
    if count > MAX_PKT_SIZE - 1 {
        return Err(InputError::TooLong {
            name: "count",
            max: MAX_PKT_SIZE - 1,
            len: count,
        }
        .into());
    }
    let resp = device.execute(CommandCode::RandomGenerate, &[count as u8], true)?;
    let len = codec::field(&resp, 0, 1)?[0] as usize;
    Ok(codec::field(&resp, 1, len)?.to_vec())
}

/// Reseed the device CTR-DRBG with exactly 32 bytes of entropy.
pub fn reseed<T: Transport>(device: &DeviceHandle<T>, seed: &[u8]) -> Result<(), HsmError> {
    let seed = codec::validate_bytes("seed", seed, 0, CTR_DRBG_SEED_SIZE, 0)?;
    let resp = device.execute(CommandCode::RandomReseed, &seed, true)?;
    ensure_ok(&resp, 0, CommandCode::RandomReseed)
}
