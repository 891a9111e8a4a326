//! Frame encoding and command/status naming.
//!
//! Request frame: `[len(payload)+1, command, payload...]`. The reset
//! (null) command is the one exception: its frame is the bare command byte
//! followed by `MAX_PKT_SIZE - 1` zero bytes, no length byte.
//!
//! Response frame: `[len(payload)+1, command | RESPONSE_BIT, payload...]`.

use crate::core::constants::{MAX_PKT_SIZE, RESPONSE_BIT};

/// Command codes understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandCode {
    /// Reset / no-op, realigns framing.
    Null = 0x00,
    /// Wrap caller data into an AEAD.
    AeadGenerate = 0x01,
    /// Wrap the device buffer into an AEAD.
    BufferAeadGenerate = 0x02,
    /// Wrap device-generated random data into an AEAD.
    RandomAeadGenerate = 0x03,
    /// Decrypt an AEAD inside the device and compare with a plaintext.
    AeadDecryptCmp = 0x04,
    /// Decode a token OTP against its secret AEAD.
    TokenOtpDecode = 0x06,
    /// AES-ECB encrypt one block.
    AesEcbEncrypt = 0x0d,
    /// AES-ECB decrypt one block.
    AesEcbDecrypt = 0x0e,
    /// AES-ECB decrypt one block and compare inside the device.
    AesEcbDecryptCmp = 0x0f,
    /// Incremental HMAC-SHA1.
    HmacSha1Generate = 0x10,
    /// Load an AEAD into the temporary key slot.
    TempKeyLoad = 0x11,
    /// Load data into the device buffer.
    BufferLoad = 0x20,
    /// Load device-generated random data into the buffer.
    BufferRandomLoad = 0x21,
    /// Fetch and increment the device nonce.
    NonceGet = 0x22,
    /// Echo payload back.
    Echo = 0x23,
    /// Generate random bytes.
    RandomGenerate = 0x24,
    /// Reseed the CTR-DRBG.
    RandomReseed = 0x25,
    /// Query firmware version and system id.
    SystemInfoQuery = 0x26,
    /// Unlock the key storage (legacy password form).
    KeyStorageUnlock = 0x27,
    /// Unlock the HSM with a token OTP.
    HsmUnlock = 0x28,
    /// Decrypt the key store with a master key.
    KeyStoreDecrypt = 0x29,
    /// Leave monitor mode (debug builds only).
    MonitorExit = 0x7f,
}

impl CommandCode {
    /// Parse a command code from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Null),
            0x01 => Some(Self::AeadGenerate),
            0x02 => Some(Self::BufferAeadGenerate),
            0x03 => Some(Self::RandomAeadGenerate),
            0x04 => Some(Self::AeadDecryptCmp),
            0x06 => Some(Self::TokenOtpDecode),
            0x0d => Some(Self::AesEcbEncrypt),
            0x0e => Some(Self::AesEcbDecrypt),
            0x0f => Some(Self::AesEcbDecryptCmp),
            0x10 => Some(Self::HmacSha1Generate),
            0x11 => Some(Self::TempKeyLoad),
            0x20 => Some(Self::BufferLoad),
            0x21 => Some(Self::BufferRandomLoad),
            0x22 => Some(Self::NonceGet),
            0x23 => Some(Self::Echo),
            0x24 => Some(Self::RandomGenerate),
            0x25 => Some(Self::RandomReseed),
            0x26 => Some(Self::SystemInfoQuery),
            0x27 => Some(Self::KeyStorageUnlock),
            0x28 => Some(Self::HsmUnlock),
            0x29 => Some(Self::KeyStoreDecrypt),
            0x7f => Some(Self::MonitorExit),
            _ => None,
        }
    }

    /// Wire byte of this command.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Canonical name, used in diagnostics only.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::AeadGenerate => "AEAD_GENERATE",
            Self::BufferAeadGenerate => "BUFFER_AEAD_GENERATE",
            Self::RandomAeadGenerate => "RANDOM_AEAD_GENERATE",
            Self::AeadDecryptCmp => "AEAD_DECRYPT_CMP",
            Self::TokenOtpDecode => "TOKEN_OTP_DECODE",
            Self::AesEcbEncrypt => "AES_ECB_BLOCK_ENCRYPT",
            Self::AesEcbDecrypt => "AES_ECB_BLOCK_DECRYPT",
            Self::AesEcbDecryptCmp => "AES_ECB_BLOCK_DECRYPT_CMP",
            Self::HmacSha1Generate => "HMAC_SHA1_GENERATE",
            Self::TempKeyLoad => "TEMP_KEY_LOAD",
            Self::BufferLoad => "BUFFER_LOAD",
            Self::BufferRandomLoad => "BUFFER_RANDOM_LOAD",
            Self::NonceGet => "NONCE_GET",
            Self::Echo => "ECHO",
            Self::RandomGenerate => "RANDOM_GENERATE",
            Self::RandomReseed => "RANDOM_RESEED",
            Self::SystemInfoQuery => "SYSTEM_INFO_QUERY",
            Self::KeyStorageUnlock => "KEY_STORAGE_UNLOCK",
            Self::HsmUnlock => "HSM_UNLOCK",
            Self::KeyStoreDecrypt => "KEY_STORE_DECRYPT",
            Self::MonitorExit => "MONITOR_EXIT",
        }
    }

    /// The echo byte a response to this command must carry.
    pub fn response_byte(self) -> u8 {
        self.as_byte() | RESPONSE_BIT
    }
}

/// Diagnostic name for an echoed command byte (response bit stripped).
pub fn echoed_command_name(byte: u8) -> String {
    match CommandCode::from_byte(byte & !RESPONSE_BIT) {
        Some(code) => code.name().to_string(),
        None => format!("0x{byte:02x}"),
    }
}

/// Device status bytes and their canonical names.
pub mod status {
    /// Command executed successfully.
    pub const OK: u8 = 0x80;
    /// Key handle unknown or lacks the needed permission.
    pub const KEY_HANDLE_INVALID: u8 = 0x81;
    /// AEAD failed authentication.
    pub const AEAD_INVALID: u8 = 0x82;
    /// OTP did not validate.
    pub const OTP_INVALID: u8 = 0x83;
    /// OTP already seen.
    pub const OTP_REPLAY: u8 = 0x84;
    /// Identity already stored.
    pub const ID_DUPLICATE: u8 = 0x85;
    /// Identity not found.
    pub const ID_NOT_FOUND: u8 = 0x86;
    /// Internal database full.
    pub const DB_FULL: u8 = 0x87;
    /// Device memory error.
    pub const MEMORY_ERROR: u8 = 0x88;
    /// Function disabled by configuration.
    pub const FUNCTION_DISABLED: u8 = 0x89;
    /// Key storage is locked.
    pub const KEY_STORAGE_LOCKED: u8 = 0x8a;
    /// In-device comparison failed.
    pub const MISMATCH: u8 = 0x8b;
    /// Malformed request parameter.
    pub const INVALID_PARAMETER: u8 = 0x8c;

    /// Canonical status name, used in diagnostics only.
    pub fn name(byte: u8) -> String {
        let name = match byte {
            OK => "STATUS_OK",
            KEY_HANDLE_INVALID => "KEY_HANDLE_INVALID",
            AEAD_INVALID => "AEAD_INVALID",
            OTP_INVALID => "OTP_INVALID",
            OTP_REPLAY => "OTP_REPLAY",
            ID_DUPLICATE => "ID_DUPLICATE",
            ID_NOT_FOUND => "ID_NOT_FOUND",
            DB_FULL => "DB_FULL",
            MEMORY_ERROR => "MEMORY_ERROR",
            FUNCTION_DISABLED => "FUNCTION_DISABLED",
            KEY_STORAGE_LOCKED => "KEY_STORAGE_LOCKED",
            MISMATCH => "MISMATCH",
            INVALID_PARAMETER => "INVALID_PARAMETER",
            _ => return format!("0x{byte:02x}"),
        };
        name.to_string()
    }
}

/// Build the wire frame for `code` with `payload`.
pub fn build_frame(code: CommandCode, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 2);
    if code != CommandCode::Null {
        frame.push((payload.len() + 1) as u8);
    }
    frame.push(code.as_byte());
    frame.extend_from_slice(payload);
    frame
}

/// The zero payload carried by the reset frame.
pub fn reset_payload() -> [u8; MAX_PKT_SIZE - 1] {
    [0u8; MAX_PKT_SIZE - 1]
}
