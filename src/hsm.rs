//! High-level device session.
//!
//! [`Hsm`] bundles a [`DeviceHandle`] with the session conveniences most
//! callers want: a protocol reset on construction and a cached system-info
//! query. Every typed operation is also reachable as a free function in
//! [`cmd`](crate::cmd) and [`oath`](crate::oath); the methods here only
//! delegate.

use std::io;
use std::sync::OnceLock;

use crate::cmd::aead::{self, AeadBlock};
use crate::cmd::hmac::{self, HmacOutput};
use crate::cmd::nonce::DeviceNonce;
use crate::cmd::otp_decode::OtpCounters;
use crate::cmd::system_info::{self, SystemInfo};
use crate::cmd::{aes_ecb, buffer, echo, monitor, nonce, otp_decode, random, temp_key, unlock};
use crate::core::constants::BLOCK_SIZE;
use crate::core::error::HsmError;
use crate::core::traits::Transport;
use crate::oath;
use crate::transport::DeviceHandle;

/// A session with one device.
pub struct Hsm<T: Transport> {
    device: DeviceHandle<T>,
    info: OnceLock<SystemInfo>,
}

impl<T: Transport> Hsm<T> {
    /// Open a session: wrap the transport and reset the link so the first
    /// command starts from clean framing.
    pub fn new(transport: T) -> Result<Self, HsmError> {
        let device = DeviceHandle::new(transport);
        device.reset()?;
        Ok(Self {
            device,
            info: OnceLock::new(),
        })
    }

    /// The underlying handle, for raw exchanges and multi-command locks.
    pub fn device(&self) -> &DeviceHandle<T> {
        &self.device
    }

    /// Firmware version and system id, queried once and cached for the
    /// life of the session.
    pub fn info(&self) -> Result<&SystemInfo, HsmError> {
        if let Some(info) = self.info.get() {
            return Ok(info);
        }
        let fetched = system_info::query(&self.device)?;
        Ok(self.info.get_or_init(|| fetched))
    }

    /// One-line rendering of [`Self::info`].
    pub fn info_string(&self) -> Result<String, HsmError> {
        Ok(self.info()?.to_string())
    }

    /// Round-trip `data` through the device.
    pub fn echo(&self, data: &[u8]) -> Result<Vec<u8>, HsmError> {
        echo::execute(&self.device, data)
    }

    /// Wrap caller data into an AEAD block.
    pub fn generate_aead(
        &self,
        nonce: &[u8],
        key_handle: u32,
        data: &[u8],
    ) -> Result<AeadBlock, HsmError> {
        aead::generate(&self.device, nonce, key_handle, data)
    }

    /// Wrap `size` device-random bytes into an AEAD block.
    pub fn generate_random_aead(
        &self,
        nonce: &[u8],
        key_handle: u32,
        size: u8,
    ) -> Result<AeadBlock, HsmError> {
        aead::generate_random(&self.device, nonce, key_handle, size)
    }

    /// Wrap the device buffer contents into an AEAD block.
    pub fn generate_buffer_aead(
        &self,
        nonce: &[u8],
        key_handle: u32,
    ) -> Result<AeadBlock, HsmError> {
        aead::generate_buffered(&self.device, nonce, key_handle)
    }

    /// Validate an AEAD block against a known plaintext inside the device.
    pub fn validate_aead(
        &self,
        nonce: &[u8],
        key_handle: u32,
        aead: &[u8],
        plaintext: &[u8],
    ) -> Result<bool, HsmError> {
        aead::validate(&self.device, nonce, key_handle, aead, plaintext)
    }

    /// Load data into the device buffer; returns the buffer length.
    pub fn load_buffer(&self, data: &[u8], offset: u8) -> Result<usize, HsmError> {
        buffer::load(&self.device, data, offset)
    }

    /// Fill the device buffer with device-generated random bytes.
    pub fn load_random_buffer(&self, len: u8, offset: u8) -> Result<usize, HsmError> {
        buffer::load_random(&self.device, len, offset)
    }

    /// Start an HMAC-SHA1 computation with a device-resident key.
    pub fn generate_hmac_sha1(
        &self,
        data: &[u8],
        key_handle: u32,
        last: bool,
        to_buffer: bool,
    ) -> Result<HmacOutput, HsmError> {
        hmac::generate(&self.device, key_handle, data, last, to_buffer)
    }

    /// Feed more input to an open HMAC-SHA1 computation.
    pub fn hmac_sha1_next(
        &self,
        data: &[u8],
        key_handle: u32,
        last: bool,
        to_buffer: bool,
    ) -> Result<HmacOutput, HsmError> {
        hmac::next(&self.device, key_handle, data, last, to_buffer)
    }

    /// AES-ECB encrypt one block.
    pub fn encrypt_ecb(
        &self,
        key_handle: u32,
        plaintext: &[u8],
    ) -> Result<[u8; BLOCK_SIZE], HsmError> {
        aes_ecb::encrypt(&self.device, key_handle, plaintext)
    }

    /// AES-ECB decrypt one block.
    pub fn decrypt_ecb(
        &self,
        key_handle: u32,
        ciphertext: &[u8],
    ) -> Result<[u8; BLOCK_SIZE], HsmError> {
        aes_ecb::decrypt(&self.device, key_handle, ciphertext)
    }

    /// AES-ECB decrypt and compare inside the device.
    pub fn compare_ecb(
        &self,
        key_handle: u32,
        ciphertext: &[u8],
        plaintext: &[u8],
    ) -> Result<bool, HsmError> {
        aes_ecb::compare(&self.device, key_handle, ciphertext, plaintext)
    }

    /// Unlock the key storage (legacy password form).
    pub fn key_storage_unlock(&self, password: &[u8]) -> Result<bool, HsmError> {
        unlock::key_storage_unlock(&self.device, password)
    }

    /// Decrypt the key store with the master key.
    pub fn key_store_decrypt(&self, key: &[u8]) -> Result<bool, HsmError> {
        unlock::key_store_decrypt(&self.device, key)
    }

    /// Unlock the HSM with a token OTP.
    pub fn unlock_otp(&self, public_id: &[u8], otp: &[u8]) -> Result<bool, HsmError> {
        unlock::unlock_otp(&self.device, public_id, otp)
    }

    /// Load an AEAD into the temporary key slot.
    pub fn load_temporary_key(
        &self,
        nonce: &[u8],
        key_handle: u32,
        aead: &[u8],
    ) -> Result<(), HsmError> {
        temp_key::load(&self.device, nonce, key_handle, aead)
    }

    /// Decode a token OTP against its secret AEAD.
    pub fn decode_token_otp(
        &self,
        public_id: &[u8],
        key_handle: u32,
        otp: &[u8],
        aead: &[u8],
    ) -> Result<OtpCounters, HsmError> {
        otp_decode::decode(&self.device, public_id, key_handle, otp, aead)
    }

    /// Fetch the device nonce counter, advancing it by `increment`.
    pub fn get_nonce(&self, increment: u16) -> Result<DeviceNonce, HsmError> {
        nonce::get(&self.device, increment)
    }

    /// Generate `count` random bytes on the device.
    pub fn random(&self, count: usize) -> Result<Vec<u8>, HsmError> {
        random::generate(&self.device, count)
    }

    /// Reseed the device CTR-DRBG.
    pub fn random_reseed(&self, seed: &[u8]) -> Result<(), HsmError> {
        random::reseed(&self.device, seed)
    }

    /// Tell a debug-configured device to leave monitor mode.
    pub fn exit_monitor(&self) -> Result<(), HsmError> {
        monitor::exit(&self.device)
    }

    /// Wrap a raw HOTP seed into an AEAD block for later validation.
    pub fn hotp_seed_aead(
        &self,
        nonce: &[u8],
        key_handle: u32,
        seed: &[u8],
    ) -> Result<AeadBlock, HsmError> {
        oath::hotp_seed_aead(&self.device, nonce, key_handle, seed)
    }

    /// Compute the HOTP code for one counter value.
    pub fn hotp_code(
        &self,
        key_handle: u32,
        nonce: &[u8],
        aead: &[u8],
        counter: u64,
        digits: usize,
    ) -> Result<String, HsmError> {
        oath::hotp_code(&self.device, key_handle, nonce, aead, counter, digits)
    }

    /// Validate an HOTP code with a bounded look-ahead search.
    pub fn validate_hotp(
        &self,
        key_handle: u32,
        nonce: &[u8],
        aead: &[u8],
        counter: u64,
        otp: &str,
        look_ahead: u64,
    ) -> Result<u64, HsmError> {
        oath::validate_hotp(&self.device, key_handle, nonce, aead, counter, otp, look_ahead)
    }

    /// Validate a TOTP code against the current wall clock.
    #[allow(clippy::too_many_arguments)]
    pub fn validate_totp(
        &self,
        key_handle: u32,
        nonce: &[u8],
        aead: &[u8],
        otp: &str,
        period: u64,
        drift: i64,
        backward: u64,
        forward: u64,
    ) -> Result<bool, HsmError> {
        oath::validate_totp(
            &self.device,
            key_handle,
            nonce,
            aead,
            otp,
            period,
            drift,
            backward,
            forward,
        )
    }

    /// Discard pending inbound bytes, for debugging.
    pub fn drain(&self) -> io::Result<()> {
        self.device.drain()
    }
}
