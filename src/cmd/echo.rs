//! Loopback test command.

use crate::codec;
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle};

/// Send `data` and return what the device echoes back.
pub fn execute<T: Transport>(device: &DeviceHandle<T>, data: &[u8]) -> Result<Vec<u8>, HsmError> {
    let payload = codec::length_prefixed(data)?;
    let resp = device.execute(CommandCode::Echo, &payload, true)?;
    let len = codec::field(&resp, 0, 1)?[0] as usize;
    Ok(codec::field(&resp, 1, len)?.to_vec())
}
