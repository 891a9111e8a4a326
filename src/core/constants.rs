//! Protocol constants fixed by the device firmware.
//!
//! These values are part of the wire contract and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// PACKET LAYOUT
// =============================================================================

/// Maximum size of a wire packet, header included.
pub const MAX_PKT_SIZE: usize = 0x60;

/// Bit set in the echoed command byte of every response.
pub const RESPONSE_BIT: u8 = 0x80;

// =============================================================================
// FIELD SIZES
// =============================================================================

/// AEAD nonce size.
pub const AEAD_NONCE_SIZE: usize = 6;

/// AEAD authentication tag size.
pub const AEAD_MAC_SIZE: usize = 8;

/// Device-internal data buffer size.
pub const DATA_BUF_SIZE: usize = 64;

/// Largest key the device stores.
pub const MAX_KEY_SIZE: usize = 32;

/// Largest AEAD the device produces (full buffer plus tag).
pub const AEAD_MAX_SIZE: usize = DATA_BUF_SIZE + AEAD_MAC_SIZE;

/// SHA-1 digest size.
pub const SHA1_HASH_SIZE: usize = 20;

/// Token public id size.
pub const PUBLIC_ID_SIZE: usize = 6;

/// Encoded OTP block size.
pub const OTP_SIZE: usize = 16;

/// AES block size.
pub const BLOCK_SIZE: usize = 16;

/// Token private uid size.
pub const UID_SIZE: usize = 6;

/// Token AES key size.
pub const KEY_SIZE: usize = 16;

/// CTR-DRBG reseed input size.
pub const CTR_DRBG_SEED_SIZE: usize = 32;

/// Size of the AEAD wrapping a token secret (key + uid + tag).
pub const TOKEN_AEAD_SIZE: usize = KEY_SIZE + UID_SIZE + AEAD_MAC_SIZE;

/// Device system id size.
pub const SYSTEM_ID_SIZE: usize = 12;

// =============================================================================
// HMAC FLAGS
// =============================================================================

/// Start a fresh HMAC computation.
pub const HMAC_SHA1_RESET: u8 = 0x01;

/// Finalize and return the digest.
pub const HMAC_SHA1_FINAL: u8 = 0x02;

/// Write the digest into the device buffer instead of the response.
pub const HMAC_SHA1_TO_BUFFER: u8 = 0x04;

// =============================================================================
// KEY HANDLES
// =============================================================================

/// Reserved handle naming the device-global temporary key slot.
pub const TEMP_KEY_HANDLE: u32 = 0xffff_ffff;

// =============================================================================
// ENGINE TIMING
// =============================================================================

/// Poll interval while awaiting a response.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Response timeout floor applied when the transport reports none.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Settle delay after a command that produces no response.
pub const NO_RESPONSE_DELAY: Duration = Duration::from_millis(10);

// =============================================================================
// MONITOR EXIT
// =============================================================================

/// Magic word armouring the monitor-exit command.
pub const MONITOR_EXIT_MAGIC: u32 = 0xbaad_beef;
