//! Firmware version and system id query.

use std::fmt;

use crate::codec;
use crate::core::constants::SYSTEM_ID_SIZE;
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle};

/// Device identification, read once at session start and immutable for
/// the life of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemInfo {
    /// Firmware major version.
    pub major: u8,
    /// Firmware minor version.
    pub minor: u8,
    /// Firmware build number.
    pub build: u8,
    /// Protocol version spoken by the firmware.
    pub protocol: u8,
    /// Unique system id.
    pub system_id: [u8; SYSTEM_ID_SIZE],
}

impl SystemInfo {
    /// Firmware version as `major.minor.build`.
    pub fn version(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.build)
    }

    /// System id as a hex string.
    pub fn system_id_hex(&self) -> String {
        format!("0x{}", codec::bytes_to_hex(&self.system_id))
    }
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Version {}  Protocol={}  SysId: {}",
            self.version(),
            self.protocol,
            self.system_id_hex()
        )
    }
}

/// Query the device.
pub fn query<T: Transport>(device: &DeviceHandle<T>) -> Result<SystemInfo, HsmError> {
    let resp = device.execute(CommandCode::SystemInfoQuery, &[], true)?;
    parse(&resp)
}

/// Response layout: `major@0, minor@1, build@2, protocol@3, sysid@4..16`.
fn parse(resp: &[u8]) -> Result<SystemInfo, HsmError> {
    let head = codec::field(resp, 0, 4)?;
    let (major, minor, build, protocol) = (head[0], head[1], head[2], head[3]);
    let bytes = codec::field(resp, 4, SYSTEM_ID_SIZE)?;
    let mut system_id = [0u8; SYSTEM_ID_SIZE];
    system_id.copy_from_slice(bytes);
    Ok(SystemInfo {
        major,
        minor,
        build,
        protocol,
        system_id,
    })
}
