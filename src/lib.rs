//! # minihsm
//!
//! Host-side driver for serial-attached cryptographic HSM dongles. The
//! device holds the private keys and performs authenticated encryption,
//! HMAC and random-number operations; this crate speaks the binary
//! request/response protocol that drives it:
//!
//! - **Protocol integrity**: timeout-bounded polling, response
//!   correlation, and automatic framing realignment on desynchronization
//! - **Opaque secrets**: key material never leaves the device; the host
//!   handles only AEAD blocks and derived values
//! - **Device-backed OATH**: HOTP/TOTP validation where the HMAC runs on
//!   the device and only RFC 4226 truncation and window search run here
//! - **Single link discipline**: one in-flight command per handle,
//!   enforced internally
//!
//! ## Modules
//!
//! - [`core`]: constants, error types and the [`Transport`](core::traits::Transport) interface
//! - [`codec`]: field codec and the pad-then-bound validators
//! - [`transport`]: wire frames, the exchange engine, [`DeviceHandle`](transport::DeviceHandle)
//! - [`cmd`]: one typed module per device operation
//! - [`oath`]: HOTP/TOTP engine built on the command layer
//! - [`hsm`]: the high-level [`Hsm`](hsm::Hsm) session type
//!
//! ## Example
//!
//! Bring your own transport (typically a serial port at 115200 8N1) and
//! hand it to a session:
//!
//! ```no_run
//! use std::io;
//! use std::time::Duration;
//! use minihsm::prelude::*;
//!
//! struct SerialPort {/* ... */}
//!
//! impl Transport for SerialPort {
//!     fn write(&mut self, data: &[u8]) -> io::Result<()> {
//!         # let _ = data;
//!         /* port.write_all(data) */ Ok(())
//!     }
//!     fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
//!         # let _ = n;
//!         /* read up to n bytes */ Ok(Vec::new())
//!     }
//!     fn bytes_available(&mut self) -> io::Result<usize> { Ok(0) }
//!     fn drain(&mut self) -> io::Result<()> { Ok(()) }
//!     fn timeout(&self) -> Duration { Duration::from_millis(500) }
//!     fn set_timeout(&mut self, _timeout: Duration) {}
//! }
//!
//! fn main() -> Result<(), HsmError> {
//!     let hsm = Hsm::new(SerialPort {/* ... */})?;
//!     println!("{}", hsm.info_string()?);
//!
//!     // Wrap a secret; store the block and nonce, resubmit them later.
//!     let block = hsm.generate_aead(b"\x01\x02\x03\x04\x05\x06", 8192, b"secret")?;
//!     assert!(hsm.validate_aead(&block.nonce, 8192, &block.aead, b"secret")?);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cmd;
pub mod codec;
pub mod core;
pub mod hsm;
pub mod oath;
pub mod transport;

/// The most common imports in one place.
pub mod prelude {
    pub use crate::cmd::aead::AeadBlock;
    pub use crate::cmd::hmac::{HmacFlags, HmacOutput};
    pub use crate::cmd::nonce::DeviceNonce;
    pub use crate::cmd::otp_decode::OtpCounters;
    pub use crate::cmd::system_info::SystemInfo;
    pub use crate::core::constants::TEMP_KEY_HANDLE;
    pub use crate::core::error::{
        CommandFailed, HsmError, InputError, ProtocolError, ResponseError,
    };
    pub use crate::core::traits::Transport;
    pub use crate::hsm::Hsm;
    pub use crate::transport::{CommandCode, DeviceHandle, DeviceLock, status};
}
