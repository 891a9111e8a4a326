//! AEAD generation and in-device validation.
//!
//! The device wraps data into opaque authenticated blocks bound to a
//! (nonce, key handle) pair. The host never sees the plaintext of a block
//! it did not supply: validation decrypts and compares inside the device.

use super::{command_failed, ensure_ok, expect_echo};
use crate::codec;
use crate::core::constants::{
    AEAD_MAC_SIZE, AEAD_NONCE_SIZE, DATA_BUF_SIZE, MAX_PKT_SIZE, SHA1_HASH_SIZE,
};
use crate::core::error::{HsmError, InputError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, DeviceLock, status};

/// Offset of the status byte in every AEAD response.
const STATUS_OFFSET: usize = AEAD_NONCE_SIZE + 4;

/// Offset of the AEAD length byte; the AEAD itself follows immediately.
const LENGTH_OFFSET: usize = STATUS_OFFSET + 1;

/// An AEAD block returned by the device, paired with the nonce that
/// scopes it. The block is `len(data) + 8` bytes and is only meaningful
/// together with its nonce and originating key handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AeadBlock {
    /// Nonce the block is bound to. Usually the caller's nonce; for an
    /// all-zero input nonce this is the nonce the device picked.
    pub nonce: [u8; AEAD_NONCE_SIZE],
    /// The opaque block (data plus 8-byte tag).
    pub aead: Vec<u8>,
}

/// Generate an AEAD block from caller data.
///
/// `data` is padded to 20 bytes and bounded by the device buffer size.
pub fn generate<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
    data: &[u8],
) -> Result<AeadBlock, HsmError> {
    let nonce = codec::validate_nonce(nonce, true)?;
    let data = codec::validate_bytes("data", data, DATA_BUF_SIZE, 0, SHA1_HASH_SIZE)?;
    let payload = codec::concat(&[
        &nonce,
        &key_handle.to_le_bytes(),
        &codec::length_prefixed(&data)?,
    ]);
    let resp = device.execute(CommandCode::AeadGenerate, &payload, true)?;
    parse_generated(&resp, &nonce, key_handle, CommandCode::AeadGenerate)
}

/// Generate an AEAD block over `size` bytes from the device TRNG.
///
/// Used to mint secrets that never exist outside the device; pass a token
/// public id as the nonce to mint a token secret.
pub fn generate_random<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
    size: u8,
) -> Result<AeadBlock, HsmError> {
    let nonce = codec::validate_nonce(nonce, true)?;
    let payload = codec::concat(&[&nonce, &key_handle.to_le_bytes(), &[size]]);
    let resp = device.execute(CommandCode::RandomAeadGenerate, &payload, true)?;
    parse_generated(&resp, &nonce, key_handle, CommandCode::RandomAeadGenerate)
}

/// Generate an AEAD block over the current device buffer contents.
///
/// After one buffer load this can run repeatedly with different key
/// handles, e.g. to wrap one secret for several validation hosts.
pub fn generate_buffered<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
) -> Result<AeadBlock, HsmError> {
    generate_buffered_locked(&mut device.lock(), nonce, key_handle)
}

/// [`generate_buffered`] on an already-held link.
pub(crate) fn generate_buffered_locked<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    nonce: &[u8],
    key_handle: u32,
) -> Result<AeadBlock, HsmError> {
    let nonce = codec::validate_nonce(nonce, true)?;
    let payload = codec::concat(&[&nonce, &key_handle.to_le_bytes()]);
    let resp = lock.execute(CommandCode::BufferAeadGenerate, &payload, true)?;
    parse_generated(&resp, &nonce, key_handle, CommandCode::BufferAeadGenerate)
}

/// Validate an AEAD block against a known plaintext.
///
/// The comparison runs inside the device; the block is never decrypted
/// host-side. Returns `false` on a designed mismatch, an error for
/// anything else. The plaintext (padded to 20 bytes) must be exactly
/// `len(aead) - 8` bytes or an input error is raised before any I/O.
pub fn validate<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
    aead: &[u8],
    plaintext: &[u8],
) -> Result<bool, HsmError> {
    let expected_len = aead
        .len()
        .checked_sub(AEAD_MAC_SIZE)
        .ok_or(InputError::WrongSize {
            name: "aead",
            expected: AEAD_MAC_SIZE,
            len: aead.len(),
        })?;
    let plaintext =
        codec::validate_bytes("plaintext", plaintext, 0, expected_len, SHA1_HASH_SIZE)?;
    let plain_and_aead = codec::concat(&[&plaintext, aead]);
    if plain_and_aead.len() > MAX_PKT_SIZE - 0x10 {
        return Err(InputError::TooLong {
            name: "plaintext+aead",
            max: MAX_PKT_SIZE - 0x10,
            len: plain_and_aead.len(),
        }
        .into());
    }
    let nonce = codec::validate_nonce(nonce, true)?;
    let payload = codec::concat(&[
        &nonce,
        &key_handle.to_le_bytes(),
        &codec::length_prefixed(&plain_and_aead)?,
    ]);
    let resp = device.execute(CommandCode::AeadDecryptCmp, &payload, true)?;

    expect_echo(&resp, AEAD_NONCE_SIZE, &key_handle.to_le_bytes(), "keyHandle")?;
    expect_echo(&resp, 0, &nonce, "nonce")?;
    match super::status_at(&resp, STATUS_OFFSET)? {
        status::OK => Ok(true),
        status::MISMATCH => Ok(false),
        byte => Err(command_failed(CommandCode::AeadDecryptCmp, byte)),
    }
}

/// Parse the shared generate-response layout:
/// `nonce@0..6, keyHandle@6..10, status@10, len@11, aead@12..12+len`.
fn parse_generated(
    resp: &[u8],
    sent_nonce: &[u8],
    key_handle: u32,
    code: CommandCode,
) -> Result<AeadBlock, HsmError> {
    ensure_ok(resp, STATUS_OFFSET, code)?;

    let len = codec::field(resp, LENGTH_OFFSET, 1)?[0] as usize;
    let aead = codec::field(resp, LENGTH_OFFSET + 1, len)?.to_vec();
    expect_echo(resp, AEAD_NONCE_SIZE, &key_handle.to_le_bytes(), "keyHandle")?;

    let echoed = codec::field(resp, 0, AEAD_NONCE_SIZE)?;
    // An all-zero input nonce asks the device to pick one; accept its
    // echo instead of comparing in that case.
    if sent_nonce.iter().any(|&b| b != 0) {
        expect_echo(resp, 0, sent_nonce, "nonce")?;
    }
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    nonce.copy_from_slice(echoed);

    Ok(AeadBlock { nonce, aead })
}
