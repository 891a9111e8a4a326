//! Loading the device-global temporary key slot.
//!
//! The slot (handle `0xffffffff`) is shared, mutable device state.
//! Loading installs the key wrapped inside an AEAD (key material plus a
//! four-byte permission flag word); a later command using the slot must
//! run under the same held link or another caller may clobber it.

use super::{ensure_ok, expect_echo};
use crate::codec;
use crate::core::constants::{AEAD_MAC_SIZE, AEAD_NONCE_SIZE, MAX_KEY_SIZE};
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, DeviceLock};

/// Largest AEAD the slot accepts: key + flag word + tag.
const MAX_AEAD_SIZE: usize = MAX_KEY_SIZE + 4 + AEAD_MAC_SIZE;

/// Load an AEAD into the temporary key slot.
///
/// `key_handle` must carry the temporary-key-load permission and be the
/// handle the AEAD was generated under.
pub fn load<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
    aead: &[u8],
) -> Result<(), HsmError> {
    load_locked(&mut device.lock(), nonce, key_handle, aead)
}

/// [`load`] on an already-held link.
pub(crate) fn load_locked<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    nonce: &[u8],
    key_handle: u32,
    aead: &[u8],
) -> Result<(), HsmError> {
    let nonce = codec::validate_nonce(nonce, true)?;
    let aead = codec::validate_bytes("aead", aead, MAX_AEAD_SIZE, 0, 0)?;
    let payload = codec::concat(&[
        &nonce,
        &key_handle.to_le_bytes(),
        &codec::length_prefixed(&aead)?,
    ]);
    let resp = lock.execute(CommandCode::TempKeyLoad, &payload, true)?;

    // Same response layout as the AEAD commands: nonce, key handle, status.
    ensure_ok(&resp, AEAD_NONCE_SIZE + 4, CommandCode::TempKeyLoad)?;
    expect_echo(&resp, 0, &nonce, "nonce")?;
    expect_echo(&resp, AEAD_NONCE_SIZE, &key_handle.to_le_bytes(), "keyHandle")?;
    Ok(())
}
