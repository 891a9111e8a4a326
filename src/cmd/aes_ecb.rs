//! Single-block AES-ECB operations with device-resident keys.

use super::{command_failed, expect_echo};
use crate::codec;
use crate::core::constants::BLOCK_SIZE;
use crate::core::error::{HsmError, ResponseError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, status};

/// Encrypt one block. Short plaintext is zero-right-padded to 16 bytes.
pub fn encrypt<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    plaintext: &[u8],
) -> Result<[u8; BLOCK_SIZE], HsmError> {
    let plaintext = codec::validate_bytes("plaintext", plaintext, BLOCK_SIZE, 0, BLOCK_SIZE)?;
    let payload = codec::concat(&[&key_handle.to_le_bytes(), &plaintext]);
    let resp = device.execute(CommandCode::AesEcbEncrypt, &payload, true)?;
    parse_block(&resp, key_handle, CommandCode::AesEcbEncrypt)
}

/// Decrypt one block. The ciphertext must be exactly 16 bytes.
pub fn decrypt<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    ciphertext: &[u8],
) -> Result<[u8; BLOCK_SIZE], HsmError> {
    let ciphertext = codec::validate_bytes("ciphertext", ciphertext, 0, BLOCK_SIZE, 0)?;
    let payload = codec::concat(&[&key_handle.to_le_bytes(), &ciphertext]);
    let resp = device.execute(CommandCode::AesEcbDecrypt, &payload, true)?;
    parse_block(&resp, key_handle, CommandCode::AesEcbDecrypt)
}

/// Decrypt one block inside the device and compare against `plaintext`.
///
/// Returns `false` on a designed mismatch, an error for anything else.
pub fn compare<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    ciphertext: &[u8],
    plaintext: &[u8],
) -> Result<bool, HsmError> {
    let ciphertext = codec::validate_bytes("ciphertext", ciphertext, 0, BLOCK_SIZE, 0)?;
    let plaintext = codec::validate_bytes("plaintext", plaintext, BLOCK_SIZE, 0, BLOCK_SIZE)?;
    let payload = codec::concat(&[&key_handle.to_le_bytes(), &ciphertext, &plaintext]);
    let resp = device.execute(CommandCode::AesEcbDecryptCmp, &payload, true)?;

    expect_echo(&resp, 0, &key_handle.to_le_bytes(), "keyHandle")?;
    match super::status_at(&resp, 4)? {
        status::OK => Ok(true),
        status::MISMATCH => Ok(false),
        byte => Err(command_failed(CommandCode::AesEcbDecryptCmp, byte)),
    }
}

/// Response layout: `keyHandle@0..4, block@4..20, status@20`.
fn parse_block(
    resp: &[u8],
    key_handle: u32,
    code: CommandCode,
) -> Result<[u8; BLOCK_SIZE], HsmError> {
    super::ensure_ok(resp, 4 + BLOCK_SIZE, code)?;
    expect_echo(resp, 0, &key_handle.to_le_bytes(), "keyHandle")?;
    let bytes = codec::field(resp, 4, BLOCK_SIZE)?;
    <[u8; BLOCK_SIZE]>::try_from(bytes).map_err(|_| {
        HsmError::Response(ResponseError::FieldLength {
            field: "block",
            expected: BLOCK_SIZE,
            got: bytes.len(),
        })
    })
}
