//! OATH HOTP/TOTP built on device-backed primitives.
//!
//! The token seed lives inside an AEAD block; validation loads it into
//! the device's temporary key slot and asks the device for HMAC-SHA1 over
//! the counter. Only RFC 4226 truncation and the counter/time-step search
//! run on the host, so the seed never exists in host memory after
//! provisioning.
//!
//! Every entry point holds the device link for its whole load-then-probe
//! sequence; the temporary key slot is device-global state and would
//! otherwise race with other users of the same handle.

use std::time::{SystemTime, UNIX_EPOCH};

use zeroize::Zeroizing;

use crate::cmd::aead::{self, AeadBlock};
use crate::cmd::{buffer, hmac, temp_key};
use crate::codec;
use crate::core::constants::{SHA1_HASH_SIZE, TEMP_KEY_HANDLE};
use crate::core::error::{HsmError, InputError};
use crate::core::traits::Transport;
use crate::transport::{CommandCode, DeviceHandle, DeviceLock};

/// Permission flag word appended to a seed before wrapping: the key may
/// only be used for HMAC-SHA1 generation.
const SEED_FLAGS: u32 = 1 << CommandCode::HmacSha1Generate as u32;

/// Wrap a raw 20-byte HOTP seed into an AEAD block for later validation.
///
/// The canonical transform: `seed ++ LE32(flags)` goes into the device
/// buffer, then the buffer is wrapped under `key_handle`. The host-side
/// copy of the seed material is wiped once the buffer load returns.
pub fn hotp_seed_aead<T: Transport>(
    device: &DeviceHandle<T>,
    nonce: &[u8],
    key_handle: u32,
    seed: &[u8],
) -> Result<AeadBlock, HsmError> {
    let seed = Zeroizing::new(codec::validate_bytes("seed", seed, 0, SHA1_HASH_SIZE, 0)?);
    let material = Zeroizing::new(codec::concat(&[&seed, &SEED_FLAGS.to_le_bytes()]));

    let mut lock = device.lock();
    buffer::load_locked(&mut lock, &material, 0)?;
    aead::generate_buffered_locked(&mut lock, nonce, key_handle)
}

/// Compute the HOTP code for one counter value.
///
/// `key_handle` must have the temporary-key-load permission and be the
/// handle `aead` was generated under. `digits` must be 6-8.
pub fn hotp_code<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    nonce: &[u8],
    aead: &[u8],
    counter: u64,
    digits: usize,
) -> Result<String, HsmError> {
    if !(6..=8).contains(&digits) {
        return Err(InputError::OtpLength(digits).into());
    }
    let mut lock = device.lock();
    temp_key::load_locked(&mut lock, nonce, key_handle, aead)?;
    probe(&mut lock, counter, digits)
}

/// Validate an HOTP code with a bounded look-ahead search.
///
/// Scans counters `[counter, counter + look_ahead)` and returns
/// `matched + 1` (the next counter to persist) on the first match, or `0`
/// when the window is exhausted. The zero sentinel collides with a
/// legitimate next counter only when the counter wraps at the 64-bit
/// boundary; that edge is accepted and documented rather than widened
/// into a separate type.
pub fn validate_hotp<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    nonce: &[u8],
    aead: &[u8],
    counter: u64,
    otp: &str,
    look_ahead: u64,
) -> Result<u64, HsmError> {
    let digits = checked_digits(otp)?;

    let mut lock = device.lock();
    temp_key::load_locked(&mut lock, nonce, key_handle, aead)?;
    for current in counter..counter.saturating_add(look_ahead) {
        if probe(&mut lock, current, digits)? == otp {
            return Ok(current.wrapping_add(1));
        }
    }
    Ok(0)
}

/// Validate a TOTP code against the current wall clock.
///
/// `period` is the step length in seconds, `drift` a persistent clock
/// offset in steps, and `backward`/`forward` the number of steps searched
/// either side of the drift-adjusted current step.
#[allow(clippy::too_many_arguments)]
pub fn validate_totp<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    nonce: &[u8],
    aead: &[u8],
    otp: &str,
    period: u64,
    drift: i64,
    backward: u64,
    forward: u64,
) -> Result<bool, HsmError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    validate_totp_at(
        device, key_handle, nonce, aead, otp, period, drift, backward, forward, now,
    )
}

/// [`validate_totp`] against an explicit Unix time, for deterministic use.
#[allow(clippy::too_many_arguments)]
pub fn validate_totp_at<T: Transport>(
    device: &DeviceHandle<T>,
    key_handle: u32,
    nonce: &[u8],
    aead: &[u8],
    otp: &str,
    period: u64,
    drift: i64,
    backward: u64,
    forward: u64,
    time: u64,
) -> Result<bool, HsmError> {
    let digits = checked_digits(otp)?;
    if period == 0 {
        return Err(InputError::ZeroPeriod.into());
    }

    let mut lock = device.lock();
    temp_key::load_locked(&mut lock, nonce, key_handle, aead)?;

    // Never probe below time step zero, whatever the backward window.
    let floor = -((time / period).min(i64::MAX as u64) as i64);
    let start = floor.max(-(backward.min(i64::MAX as u64) as i64));
    for step in start..=forward.min(i64::MAX as u64) as i64 {
        let shifted = time as i64 + drift.saturating_add(step).saturating_mul(period as i64);
        if shifted < 0 {
            continue;
        }
        let counter = shifted as u64 / period;
        if probe(&mut lock, counter, digits)? == otp {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Truncate a 20-byte HMAC-SHA1 digest to a `digits`-long OTP (RFC 4226
/// dynamic truncation).
pub fn truncate(hmac: &[u8], digits: usize) -> Result<String, InputError> {
    if !(6..=8).contains(&digits) {
        return Err(InputError::OtpLength(digits));
    }
    let hmac = codec::validate_bytes("hmac", hmac, 0, SHA1_HASH_SIZE, 0)?;

    let offset = (hmac[SHA1_HASH_SIZE - 1] & 0x0f) as usize;
    let code = u32::from_be_bytes([
        hmac[offset] & 0x7f,
        hmac[offset + 1],
        hmac[offset + 2],
        hmac[offset + 3],
    ]);
    let code = code % 10u32.pow(digits as u32);
    Ok(format!("{code:0>digits$}"))
}

/// One HOTP probe: device HMAC over the big-endian counter, then
/// truncation. The counter encoding is the protocol's one big-endian
/// field; it feeds the HMAC and is fixed by RFC 4226.
fn probe<T: Transport>(
    lock: &mut DeviceLock<'_, T>,
    counter: u64,
    digits: usize,
) -> Result<String, HsmError> {
    let digest = hmac::digest_locked(lock, TEMP_KEY_HANDLE, &counter.to_be_bytes())?;
    Ok(truncate(&digest, digits)?)
}

fn checked_digits(otp: &str) -> Result<usize, InputError> {
    let len = otp.trim().len();
    if !(6..=8).contains(&len) {
        return Err(InputError::OtpLength(len));
    }
    Ok(len)
}
