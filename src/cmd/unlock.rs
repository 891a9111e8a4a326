//! Key-storage unlock commands.
//!
//! Three generations of the same concern: the legacy password unlock, the
//! current master-key decrypt, and OTP-based unlock. All model their
//! designed negative outcome (`LOCKED`, `MISMATCH`, `OTP_INVALID`) as
//! `false` rather than an error.

use zeroize::Zeroizing;

use super::command_failed;
use crate::codec;
use crate::core::constants::{BLOCK_SIZE, MAX_KEY_SIZE, OTP_SIZE, PUBLIC_ID_SIZE};
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, status};

/// Unlock the key storage with the HSM password (legacy, pre-1.0
/// firmware). Returns `false` while the storage stays locked.
pub fn key_storage_unlock<T: Transport>(
    device: &DeviceHandle<T>,
    password: &[u8],
) -> Result<bool, HsmError> {
    let password = Zeroizing::new(codec::validate_bytes(
        "password", password, BLOCK_SIZE, 0, BLOCK_SIZE,
    )?);
    let resp = device.execute(CommandCode::KeyStorageUnlock, &password, true)?;
    match super::status_at(&resp, 0)? {
        status::OK => Ok(true),
        status::KEY_STORAGE_LOCKED => Ok(false),
        byte => Err(command_failed(CommandCode::KeyStorageUnlock, byte)),
    }
}

/// Decrypt the key store with the master key (current firmware).
/// Returns `false` if the key does not match.
pub fn key_store_decrypt<T: Transport>(
    device: &DeviceHandle<T>,
    key: &[u8],
) -> Result<bool, HsmError> {
    let key = Zeroizing::new(codec::validate_bytes(
        "key", key, MAX_KEY_SIZE, 0, MAX_KEY_SIZE,
    )?);
    let resp = device.execute(CommandCode::KeyStoreDecrypt, &key, true)?;
    match super::status_at(&resp, 0)? {
        status::OK => Ok(true),
        status::MISMATCH => Ok(false),
        byte => Err(command_failed(CommandCode::KeyStoreDecrypt, byte)),
    }
}

/// Unlock the HSM with a token OTP. Returns `false` if the OTP does not
/// validate.
pub fn unlock_otp<T: Transport>(
    device: &DeviceHandle<T>,
    public_id: &[u8],
    otp: &[u8],
) -> Result<bool, HsmError> {
    let public_id =
        codec::validate_bytes("publicId", public_id, 0, PUBLIC_ID_SIZE, PUBLIC_ID_SIZE)?;
    let otp = codec::validate_bytes("otp", otp, 0, OTP_SIZE, OTP_SIZE)?;
    let payload = codec::concat(&[&public_id, &otp]);
    let resp = device.execute(CommandCode::HsmUnlock, &payload, true)?;
    match super::status_at(&resp, 0)? {
        status::OK => Ok(true),
        status::OTP_INVALID => Ok(false),
        byte => Err(command_failed(CommandCode::HsmUnlock, byte)),
    }
}
