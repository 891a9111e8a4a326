//! Transport layer: wire frames, the exchange engine and the device handle.
//!
//! The device sits on a single half-duplex link, so at most one command
//! may be in flight per handle. [`DeviceHandle`] enforces that with an
//! internal lock spanning the whole write→poll→read sequence; callers that
//! need several commands to run back-to-back (the temporary-key slot is
//! device-global state) take the lock once via [`DeviceHandle::lock`].

mod engine;
pub mod frame;

use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub use frame::{CommandCode, build_frame, echoed_command_name, status};

use crate::core::error::HsmError;
use crate::core::traits::Transport;

/// Exclusive access to one device.
///
/// The handle owns the transport and serializes all exchanges on it.
/// Handles are `Sync`; share one per physical device (wrap in `Arc` for
/// multiple threads) instead of reopening the channel per call.
#[derive(Debug)]
pub struct DeviceHandle<T: Transport> {
    transport: Mutex<T>,
}

impl<T: Transport> DeviceHandle<T> {
    /// Wrap a transport in a handle.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
        }
    }

    /// Run one command exchange, holding the link for its full duration.
    ///
    /// Returns the raw response payload. Commands that expect no response
    /// return an empty payload after a short settle delay.
    pub fn execute(
        &self,
        code: CommandCode,
        payload: &[u8],
        expect_response: bool,
    ) -> Result<Vec<u8>, HsmError> {
        self.lock().execute(code, payload, expect_response)
    }

    /// Send the reset frame, realigning the device's framing state.
    pub fn reset(&self) -> Result<(), HsmError> {
        self.lock().reset()
    }

    /// Take the link for a multi-command critical section.
    ///
    /// The engine guarantees per-command atomicity on its own; sequences
    /// that rely on device-global state between commands (load the
    /// temporary key, then HMAC with it) must hold this guard across the
    /// whole sequence.
    pub fn lock(&self) -> DeviceLock<'_, T> {
        DeviceLock {
            guard: self.transport.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }

    /// Discard pending inbound bytes.
    pub fn drain(&self) -> io::Result<()> {
        self.lock().guard.drain()
    }

    /// Configured response timeout.
    pub fn timeout(&self) -> Duration {
        self.lock().guard.timeout()
    }

    /// Set the response timeout for subsequent commands.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().guard.set_timeout(timeout);
    }

    /// Recover the transport, consuming the handle.
    pub fn into_inner(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A held device link.
///
/// Obtained from [`DeviceHandle::lock`]; every exchange made through the
/// guard runs back-to-back with no other caller in between. Dropping the
/// guard releases the link.
#[derive(Debug)]
pub struct DeviceLock<'a, T: Transport> {
    guard: MutexGuard<'a, T>,
}

impl<T: Transport> DeviceLock<'_, T> {
    /// Run one command exchange on the held link.
    pub fn execute(
        &mut self,
        code: CommandCode,
        payload: &[u8],
        expect_response: bool,
    ) -> Result<Vec<u8>, HsmError> {
        engine::execute(&mut *self.guard, code, payload, expect_response)
    }

    /// Send the reset frame on the held link.
    pub fn reset(&mut self) -> Result<(), HsmError> {
        engine::reset(&mut *self.guard)
    }
}
