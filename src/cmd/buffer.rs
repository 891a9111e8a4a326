//! The device-internal data buffer.
//!
//! The buffer feeds buffer-consuming commands (buffer AEAD generation).
//! Loading at offset 0 resets it first; the response reports the resulting
//! buffer length, which must then equal what was just submitted.

use crate::codec;
use crate::core::error::{HsmError, ResponseError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, DeviceLock};

/// Load `data` into the buffer at `offset`; returns the buffer length.
pub fn load<T: Transport>(
    device: &DeviceHandle<T>,
    data: &[u8],
    offset: u8,
) -> Result<usize, HsmError> {
    load_locked(&mut device.lock(), data, offset)
}

/// [`load`] on an already-held link.
pub(crate) fn load_locked<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    data: &[u8],
    offset: u8,
) -> Result<usize, HsmError> {
    let payload = codec::concat(&[&[offset], &codec::length_prefixed(data)?]);
    let resp = lock.execute(CommandCode::BufferLoad, &payload, true)?;
    parse(&resp, offset, data.len())
}

/// Fill `len` device-generated random bytes into the buffer at `offset`.
pub fn load_random<T: Transport>(
    device: &DeviceHandle<T>,
    len: u8,
    offset: u8,
) -> Result<usize, HsmError> {
    let resp = device.execute(CommandCode::BufferRandomLoad, &[offset, len], true)?;
    parse(&resp, offset, len as usize)
}

/// Response layout: `buffer_length@0`.
fn parse(resp: &[u8], offset: u8, submitted: usize) -> Result<usize, HsmError> {
    let count = codec::field(resp, 0, 1)?[0] as usize;
    // Offset 0 resets the buffer, so the reported length must match
    // exactly what was submitted.
    if offset == 0 && count != submitted {
        return Err(HsmError::Response(ResponseError::BufferLength {
            got: count,
            expected: submitted,
        }));
    }
    Ok(count)
}
