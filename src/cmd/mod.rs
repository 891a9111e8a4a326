//! Typed command layer: one module per device operation.
//!
//! Every module follows the same shape: validate and pack the request
//! fields with the pad-then-bound rule (raising an input error before any
//! I/O), run the exchange through a [`DeviceHandle`](crate::transport::DeviceHandle),
//! then parse the fixed-offset response, checking the status byte and any
//! echoed fields.

pub mod aead;
pub mod aes_ecb;
pub mod buffer;
pub mod echo;
pub mod hmac;
pub mod monitor;
pub mod nonce;
pub mod otp_decode;
pub mod random;
pub mod system_info;
pub mod temp_key;
pub mod unlock;

use crate::codec;
use crate::core::error::{CommandFailed, HsmError, ResponseError};
use crate::transport::{CommandCode, status};

/// Read the status byte at `offset`.
pub(crate) fn status_at(resp: &[u8], offset: usize) -> Result<u8, ResponseError> {
    Ok(codec::field(resp, offset, 1)?[0])
}

/// Require `STATUS_OK` at `offset`, failing with canonical names otherwise.
pub(crate) fn ensure_ok(resp: &[u8], offset: usize, code: CommandCode) -> Result<(), HsmError> {
    let byte = status_at(resp, offset)?;
    if byte != status::OK {
        return Err(command_failed(code, byte));
    }
    Ok(())
}

/// Build the device-command-failure error for `code` and a status byte.
pub(crate) fn command_failed(code: CommandCode, byte: u8) -> HsmError {
    HsmError::Command(CommandFailed {
        command: code.name(),
        status: status::name(byte),
    })
}

/// Require an echoed response field to match what was sent.
pub(crate) fn expect_echo(
    resp: &[u8],
    offset: usize,
    expected: &[u8],
    field: &'static str,
) -> Result<(), HsmError> {
    let got = codec::field(resp, offset, expected.len())?;
    if got != expected {
        return Err(HsmError::Response(ResponseError::BadEcho {
            field,
            got: codec::bytes_to_hex(got),
            expected: codec::bytes_to_hex(expected),
        }));
    }
    Ok(())
}
