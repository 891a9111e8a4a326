//! Monitor-mode exit (debug-configured devices only).

use crate::codec;
use crate::core::constants::MONITOR_EXIT_MAGIC;
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle};

/// Tell the device to leave monitor mode. Fire-and-forget: the device
/// reboots into its configuration console and sends no response.
pub fn exit<T: Transport>(device: &DeviceHandle<T>) -> Result<(), HsmError> {
    let payload = codec::concat(&[
        &MONITOR_EXIT_MAGIC.to_le_bytes(),
        &(0xffff_ffff - MONITOR_EXIT_MAGIC).to_le_bytes(),
    ]);
    device
        .execute(CommandCode::MonitorExit, &payload, false)
        .map(|_| ())
}
