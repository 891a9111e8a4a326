//! The request/response engine.
//!
//! One call = one exchange: build frame → write → poll → read header →
//! read payload. The caller (the handle in [`super`]) holds the transport
//! lock for the whole sequence, so an exchange is never interleaved with
//! another.
//!
//! Desynchronization (no bytes within the timeout, or a response echoing
//! the wrong command) always sends one reset frame before the error is
//! surfaced, so the next exchange starts from clean framing. A coherent
//! but unfavourable device status never resets.

use std::thread;

use log::debug;

use super::frame::{self, CommandCode, echoed_command_name};
use crate::codec;
use crate::core::constants::{DEFAULT_TIMEOUT, NO_RESPONSE_DELAY, POLL_INTERVAL};
use crate::core::error::{HsmError, ProtocolError};
use crate::core::traits::Transport;

/// Run one command exchange on a locked transport.
///
/// With `expect_response` unset the engine sleeps a short settle delay
/// after the write and returns an empty payload; the device produces no
/// output to check.
pub(crate) fn execute<T: Transport>(
    transport: &mut T,
    code: CommandCode,
    payload: &[u8],
    expect_response: bool,
) -> Result<Vec<u8>, HsmError> {
    let request = frame::build_frame(code, payload);
    debug!("{} request frame: {}", code.name(), codec::bytes_to_hex(&request));
    write_or_desync(transport, &request)?;

    if !expect_response {
        thread::sleep(NO_RESPONSE_DELAY);
        return Ok(Vec::new());
    }

    await_data(transport, code)?;
    read_response(transport, code)
}

/// Send the reset frame, realigning the device's framing state.
pub(crate) fn reset<T: Transport>(transport: &mut T) -> Result<(), HsmError> {
    execute(transport, CommandCode::Null, &frame::reset_payload(), false).map(|_| ())
}

/// Poll until at least one response byte is available or the timeout runs
/// out. The timeout itself is not an error here; the zero-byte read that
/// follows surfaces it.
fn await_data<T: Transport>(transport: &mut T, code: CommandCode) -> Result<(), HsmError> {
    let configured = transport.timeout();
    let timeout_ms = if configured.is_zero() {
        DEFAULT_TIMEOUT.as_millis()
    } else {
        configured.as_millis()
    };
    debug!("{} timeout set to {timeout_ms} ms", code.name());

    let mut slept_ms: u128 = 0;
    while slept_ms <= timeout_ms {
        thread::sleep(POLL_INTERVAL);
        slept_ms += POLL_INTERVAL.as_millis();
        match transport.bytes_available() {
            Ok(0) => {}
            Ok(_) => break,
            Err(e) => return Err(desync(transport, ProtocolError::Io(e))),
        }
    }
    debug!("{} polled for {slept_ms} ms", code.name());
    Ok(())
}

/// Read and validate the two-byte header, then the payload.
fn read_response<T: Transport>(transport: &mut T, code: CommandCode) -> Result<Vec<u8>, HsmError> {
    let header = match transport.bytes_available() {
        Ok(0) => Vec::new(),
        Ok(_) => match transport.read(2) {
            Ok(header) => header,
            Err(e) => return Err(desync(transport, ProtocolError::Io(e))),
        },
        Err(e) => return Err(desync(transport, ProtocolError::Io(e))),
    };
    if header.len() < 2 {
        return Err(desync(transport, ProtocolError::NoData));
    }

    let echoed = header[1];
    if echoed != code.response_byte() {
        return Err(desync(
            transport,
            ProtocolError::WrongCommand {
                expected: code.name(),
                got: echoed_command_name(echoed),
            },
        ));
    }

    let len = (header[0] as usize).saturating_sub(1);
    let payload = match transport.read(len) {
        Ok(payload) => payload,
        Err(e) => return Err(desync(transport, ProtocolError::Io(e))),
    };
    debug!("{} response payload: {}", code.name(), codec::bytes_to_hex(&payload));
    Ok(payload)
}

fn write_or_desync<T: Transport>(transport: &mut T, request: &[u8]) -> Result<(), HsmError> {
    if let Err(e) = transport.write(request) {
        return Err(desync(transport, ProtocolError::Io(e)));
    }
    Ok(())
}

/// Reset the link (best effort) and wrap the protocol error.
///
/// Writes the reset frame directly rather than through [`execute`] so a
/// dead transport cannot recurse back into this path.
fn desync<T: Transport>(transport: &mut T, error: ProtocolError) -> HsmError {
    debug!("desynchronized ({error}), sending reset");
    let request = frame::build_frame(CommandCode::Null, &frame::reset_payload());
    let _ = transport.write(&request);
    thread::sleep(NO_RESPONSE_DELAY);
    HsmError::Protocol(error)
}
