//! Error types for the driver.
//!
//! Three failure kinds cross the public API, plus one for responses that
//! arrive coherently framed but internally inconsistent:
//!
//! - [`InputError`]: an argument failed validation before any I/O. Never
//!   triggers a protocol reset.
//! - [`ProtocolError`]: the exchange itself broke (timeout, wrong echoed
//!   command, transport I/O). The engine resets the link before surfacing it.
//! - [`CommandFailed`]: the device answered with an unfavourable status
//!   byte. The link is fine, so no reset.
//! - [`ResponseError`]: a well-framed response failed a consistency check
//!   (truncated payload, bad nonce/key-handle echo). No reset.

use thiserror::Error;

/// An argument failed validation before any bytes were written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Field longer than the protocol allows.
    #[error("argument '{name}' is too long, expected max {max} but got {len}")]
    TooLong {
        /// Field name.
        name: &'static str,
        /// Maximum length allowed.
        max: usize,
        /// Length supplied.
        len: usize,
    },

    /// Field is not the exact length the protocol requires.
    #[error("wrong size of argument '{name}', expected {expected} but got {len}")]
    WrongSize {
        /// Field name.
        name: &'static str,
        /// Required length.
        expected: usize,
        /// Length supplied.
        len: usize,
    },

    /// Hex string with odd length or non-hex characters.
    #[error("invalid hex string '{0}'")]
    InvalidHex(String),

    /// Data too large for a one-byte length prefix.
    #[error("data too long for a one-byte length prefix ({0} bytes)")]
    LengthOverflow(usize),

    /// OTP or digit count outside the 6-8 range.
    #[error("OTP not of required length, should be between 6-8 digits but was {0}")]
    OtpLength(usize),

    /// A zero period cannot define a time step.
    #[error("OTP period must be non-zero")]
    ZeroPeriod,
}

/// The request/response exchange broke down.
///
/// Every variant is surfaced only after the engine has sent a reset frame,
/// so the next call starts from a clean framing state.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The device never produced a byte within the timeout.
    #[error("no data received from the device")]
    NoData,

    /// The response echoed a different command than the one sent.
    #[error("device responded to the wrong command, expected {expected} but got {got}")]
    WrongCommand {
        /// Canonical name of the command sent.
        expected: &'static str,
        /// Canonical name (or hex) of the command echoed.
        got: String,
    },

    /// The underlying transport failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// A coherently framed response failed a consistency check.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponseError {
    /// Response payload shorter than the fixed layout requires.
    #[error("response truncated, needed {needed} bytes but got {len}")]
    Truncated {
        /// Bytes the layout requires.
        needed: usize,
        /// Bytes actually present.
        len: usize,
    },

    /// An echoed field does not match what was sent.
    #[error("bad {field} in response, got 0x{got} but expected 0x{expected}")]
    BadEcho {
        /// Echoed field name.
        field: &'static str,
        /// Hex of the echoed value.
        got: String,
        /// Hex of the value sent.
        expected: String,
    },

    /// A variable-length response field has an impossible length.
    #[error("bad {field} length in response, expected {expected} but got {got}")]
    FieldLength {
        /// Field name.
        field: &'static str,
        /// Length the protocol fixes.
        expected: usize,
        /// Length reported by the device.
        got: usize,
    },

    /// The device buffer does not hold what was just loaded.
    #[error("incorrect number of bytes in device buffer, got {got} but expected {expected}")]
    BufferLength {
        /// Length reported by the device.
        got: usize,
        /// Length submitted.
        expected: usize,
    },
}

/// The device executed the exchange but reported an unfavourable status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("command {command} failed: {status}")]
pub struct CommandFailed {
    /// Canonical command name.
    pub command: &'static str,
    /// Canonical status name (or hex for unknown bytes).
    pub status: String,
}

/// Top-level driver error.
#[derive(Debug, Error)]
pub enum HsmError {
    /// Argument validation failed before any I/O.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// The exchange broke down (reset already performed).
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The response failed a consistency check.
    #[error("response error: {0}")]
    Response(#[from] ResponseError),

    /// The device reported a failure status.
    #[error("{0}")]
    Command(#[from] CommandFailed),
}
