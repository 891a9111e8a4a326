//! A simulated device speaking the wire protocol over an in-memory
//! transport, plus probes for asserting on traffic.
//!
//! The simulator implements enough device behaviour for end-to-end tests:
//! real HMAC-SHA1 (so the RFC 4226 vectors come out of the OATH engine),
//! MAC-checked AEAD blocks, the internal buffer, and the unlock commands.
//! AEAD "encryption" is the identity — the host treats blocks as opaque,
//! so only the MAC binding (nonce, key handle, data) has to be honest.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ring::hmac;

use minihsm::core::traits::Transport;

/// Key handle configured with every permission in the simulator.
pub const KEY_HANDLE: u32 = 8192;

/// Key handle the simulator rejects with `KEY_HANDLE_INVALID`.
pub const BAD_HANDLE: u32 = 0xdead_beef;

/// Password accepted by the legacy key-storage unlock (pre-padding).
pub const PASSWORD: &[u8] = b"hsmpw";

/// Master key accepted by the key-store decrypt command.
pub const STORE_KEY: [u8; 32] = [0x11; 32];

/// (public id, OTP) pair accepted by the HSM unlock command.
pub const UNLOCK_ID: [u8; 6] = [0x4d; 6];
pub const UNLOCK_OTP: [u8; 16] = [0x5a; 16];

/// OTP block the token-decode command accepts.
pub const TOKEN_OTP: [u8; 16] = [0x77; 16];

/// Counters the token-decode command reports on success.
pub const TOKEN_COUNTERS: (u16, u8, u8, u16) = (37, 3, 1, 0x1234);

/// Nonce the simulator picks when asked to generate one (all-zero input).
pub const DEVICE_NONCE: [u8; 6] = [9, 9, 9, 9, 9, 9];

const OK: u8 = 0x80;
const KEY_HANDLE_INVALID: u8 = 0x81;
const AEAD_INVALID: u8 = 0x82;
const OTP_INVALID: u8 = 0x83;
const KEY_STORAGE_LOCKED: u8 = 0x8a;
const MISMATCH: u8 = 0x8b;

/// One transport operation, as recorded by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// A frame write; carries the command byte (0x00 for reset frames).
    Write(u8),
    /// A read request for `n` bytes.
    Read(usize),
}

/// Injectable misbehaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Behave normally.
    None,
    /// Swallow requests, never respond.
    Silent,
    /// Respond with the wrong echoed command byte.
    WrongEcho,
}

/// Shared handles for inspecting a simulator after it moved into a
/// `DeviceHandle`.
#[derive(Clone)]
pub struct Probe {
    log: Arc<Mutex<Vec<Op>>>,
    resets: Arc<Mutex<usize>>,
    fault: Arc<Mutex<Fault>>,
}

impl Probe {
    pub fn ops(&self) -> Vec<Op> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_ops(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn resets(&self) -> usize {
        *self.resets.lock().unwrap()
    }

    pub fn set_fault(&self, fault: Fault) {
        *self.fault.lock().unwrap() = fault;
    }
}

pub struct SimDevice {
    rx: VecDeque<u8>,
    timeout: Duration,
    log: Arc<Mutex<Vec<Op>>>,
    resets: Arc<Mutex<usize>>,
    fault: Arc<Mutex<Fault>>,

    buffer: Vec<u8>,
    temp_key: Option<Vec<u8>>,
    hmac_ctx: Option<hmac::Context>,
    nonce_volatile: u32,
    nonce_power_up: u16,
}

impl SimDevice {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            timeout: Duration::from_millis(50),
            log: Arc::new(Mutex::new(Vec::new())),
            resets: Arc::new(Mutex::new(0)),
            fault: Arc::new(Mutex::new(Fault::None)),
            buffer: Vec::new(),
            temp_key: None,
            hmac_ctx: None,
            nonce_volatile: 0x0100,
            nonce_power_up: 7,
        }
    }

    pub fn probe(&self) -> Probe {
        Probe {
            log: Arc::clone(&self.log),
            resets: Arc::clone(&self.resets),
            fault: Arc::clone(&self.fault),
        }
    }

    fn fault(&self) -> Fault {
        *self.fault.lock().unwrap()
    }

    fn respond(&mut self, command: u8, payload: &[u8]) {
        self.rx.push_back((payload.len() + 1) as u8);
        self.rx.push_back(command | 0x80);
        self.rx.extend(payload.iter().copied());
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        if frame.is_empty() {
            return;
        }
        // A leading zero byte can only be the reset frame; regular frames
        // start with a length byte of at least one.
        if frame[0] == 0x00 {
            *self.resets.lock().unwrap() += 1;
            self.hmac_ctx = None;
            return;
        }
        let command = frame[1];
        let payload = frame[2..].to_vec();
        match self.fault() {
            Fault::Silent => return,
            Fault::WrongEcho => {
                self.respond(command.wrapping_add(1), &[]);
                return;
            }
            Fault::None => {}
        }
        self.dispatch(command, &payload);
    }

    fn dispatch(&mut self, command: u8, payload: &[u8]) {
        match command {
            0x01 => self.aead_generate(payload),
            0x02 => self.buffer_aead_generate(payload),
            0x03 => self.random_aead_generate(payload),
            0x04 => self.aead_decrypt_cmp(payload),
            0x06 => self.token_otp_decode(payload),
            0x0d => self.ecb(command, payload),
            0x0e => self.ecb(command, payload),
            0x0f => self.ecb_compare(payload),
            0x10 => self.hmac_generate(payload),
            0x11 => self.temp_key_load(payload),
            0x20 => self.buffer_load(payload),
            0x21 => self.buffer_random_load(payload),
            0x22 => self.nonce_get(payload),
            0x23 => self.respond(0x23, payload),
            0x24 => {
                let count = payload[0] as usize;
                let mut resp = vec![payload[0]];
                resp.extend(pseudo_random(count));
                self.respond(0x24, &resp);
            }
            0x25 => self.respond(0x25, &[OK]),
            0x26 => {
                let mut resp = vec![1, 0, 4, 1];
                resp.extend((0..12u8).map(|i| 0xc0 + i));
                self.respond(0x26, &resp);
            }
            0x27 => {
                let mut expected = PASSWORD.to_vec();
                expected.resize(16, 0);
                let status = if payload == expected.as_slice() { OK } else { KEY_STORAGE_LOCKED };
                self.respond(0x27, &[status]);
            }
            0x28 => {
                let matches = payload[..6] == UNLOCK_ID && payload[6..22] == UNLOCK_OTP;
                let status = if matches { OK } else { OTP_INVALID };
                self.respond(0x28, &[status]);
            }
            0x29 => {
                let status = if payload == STORE_KEY { OK } else { MISMATCH };
                self.respond(0x29, &[status]);
            }
            0x7f => {} // monitor exit: no response
            _ => panic!("simulator got unknown command 0x{command:02x}"),
        }
    }

    // --- AEAD -----------------------------------------------------------

    fn aead_generate(&mut self, payload: &[u8]) {
        let (nonce, kh) = nonce_and_handle(payload);
        let len = payload[10] as usize;
        let data = payload[11..11 + len].to_vec();
        self.respond_generated(0x01, &nonce, kh, &data);
    }

    fn buffer_aead_generate(&mut self, payload: &[u8]) {
        let (nonce, kh) = nonce_and_handle(payload);
        let data = self.buffer.clone();
        self.respond_generated(0x02, &nonce, kh, &data);
    }

    fn random_aead_generate(&mut self, payload: &[u8]) {
        let (nonce, kh) = nonce_and_handle(payload);
        let data = pseudo_random(payload[10] as usize);
        self.respond_generated(0x03, &nonce, kh, &data);
    }

    fn respond_generated(&mut self, command: u8, nonce: &[u8; 6], kh: u32, data: &[u8]) {
        let nonce = if nonce.iter().all(|&b| b == 0) {
            DEVICE_NONCE
        } else {
            *nonce
        };
        let mut resp = nonce.to_vec();
        resp.extend(kh.to_le_bytes());
        if kh == BAD_HANDLE {
            resp.push(KEY_HANDLE_INVALID);
            resp.push(0);
            self.respond(command, &resp);
            return;
        }
        let aead = make_aead(&nonce, kh, data);
        resp.push(OK);
        resp.push(aead.len() as u8);
        resp.extend(&aead);
        self.respond(command, &resp);
    }

    fn aead_decrypt_cmp(&mut self, payload: &[u8]) {
        let (nonce, kh) = nonce_and_handle(payload);
        let len = payload[10] as usize;
        let plain_and_aead = &payload[11..11 + len];
        // plain ++ aead with len(aead) == len(plain) + 8
        let plain_len = (plain_and_aead.len() - 8) / 2;
        let plain = &plain_and_aead[..plain_len];
        let aead = &plain_and_aead[plain_len..];

        let status = if aead == make_aead(&nonce, kh, plain).as_slice() {
            OK
        } else {
            MISMATCH
        };
        let mut resp = nonce.to_vec();
        resp.extend(kh.to_le_bytes());
        resp.push(status);
        self.respond(0x04, &resp);
    }

    fn temp_key_load(&mut self, payload: &[u8]) {
        let (nonce, kh) = nonce_and_handle(payload);
        let len = payload[10] as usize;
        let aead = &payload[11..11 + len];

        let mut resp = nonce.to_vec();
        resp.extend(kh.to_le_bytes());
        if kh == BAD_HANDLE {
            resp.push(KEY_HANDLE_INVALID);
            self.respond(0x11, &resp);
            return;
        }
        let data = &aead[..aead.len() - 8];
        if aead == make_aead(&nonce, kh, data).as_slice() {
            // Strip the trailing permission flag word.
            self.temp_key = Some(data[..data.len() - 4].to_vec());
            resp.push(OK);
        } else {
            resp.push(AEAD_INVALID);
        }
        self.respond(0x11, &resp);
    }

    // --- HMAC and AES ---------------------------------------------------

    fn hmac_generate(&mut self, payload: &[u8]) {
        let kh = u32::from_le_bytes(payload[0..4].try_into().unwrap());
        let flags = payload[4];
        let len = payload[5] as usize;
        let data = &payload[6..6 + len];

        let mut resp = kh.to_le_bytes().to_vec();
        let key = if kh == minihsm::core::constants::TEMP_KEY_HANDLE {
            match &self.temp_key {
                Some(key) => key.clone(),
                None => {
                    resp.push(KEY_HANDLE_INVALID);
                    self.respond(0x10, &resp);
                    return;
                }
            }
        } else if kh == BAD_HANDLE {
            resp.push(KEY_HANDLE_INVALID);
            self.respond(0x10, &resp);
            return;
        } else {
            handle_key(kh)
        };

        if flags & 0x01 != 0 || self.hmac_ctx.is_none() {
            let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, &key);
            self.hmac_ctx = Some(hmac::Context::with_key(&key));
        }
        if let Some(ctx) = self.hmac_ctx.as_mut() {
            ctx.update(data);
        }

        resp.push(OK);
        resp.push(20);
        if flags & 0x02 != 0 {
            let tag = self.hmac_ctx.take().expect("hmac context").sign();
            resp.extend(tag.as_ref());
        } else {
            resp.extend([0u8; 20]);
        }
        self.respond(0x10, &resp);
    }

    fn ecb(&mut self, command: u8, payload: &[u8]) {
        let kh = u32::from_le_bytes(payload[0..4].try_into().unwrap());
        let block = &payload[4..20];
        let mut resp = kh.to_le_bytes().to_vec();
        if kh == BAD_HANDLE {
            resp.extend([0u8; 16]);
            resp.push(KEY_HANDLE_INVALID);
        } else {
            resp.extend(xor_block(kh, block));
            resp.push(OK);
        }
        self.respond(command, &resp);
    }

    fn ecb_compare(&mut self, payload: &[u8]) {
        let kh = u32::from_le_bytes(payload[0..4].try_into().unwrap());
        let ciphertext = &payload[4..20];
        let plaintext = &payload[20..36];
        let status = if xor_block(kh, ciphertext) == plaintext {
            OK
        } else {
            MISMATCH
        };
        let mut resp = kh.to_le_bytes().to_vec();
        resp.push(status);
        self.respond(0x0f, &resp);
    }

    // --- Buffer, nonce, token ------------------------------------------

    fn buffer_load(&mut self, payload: &[u8]) {
        let offset = payload[0] as usize;
        let len = payload[1] as usize;
        let data = &payload[2..2 + len];
        self.buffer_write(offset, data);
        self.respond(0x20, &[self.buffer.len() as u8]);
    }

    fn buffer_random_load(&mut self, payload: &[u8]) {
        let offset = payload[0] as usize;
        let data = pseudo_random(payload[1] as usize);
        self.buffer_write(offset, &data);
        self.respond(0x21, &[self.buffer.len() as u8]);
    }

    fn buffer_write(&mut self, offset: usize, data: &[u8]) {
        if offset == 0 {
            self.buffer.clear();
        }
        if self.buffer.len() < offset + data.len() {
            self.buffer.resize(offset + data.len(), 0);
        }
        self.buffer[offset..offset + data.len()].copy_from_slice(data);
    }

    fn nonce_get(&mut self, payload: &[u8]) {
        let increment = u16::from_le_bytes(payload[0..2].try_into().unwrap());
        let mut resp = vec![OK];
        resp.extend(self.nonce_volatile.to_le_bytes());
        resp.extend(self.nonce_power_up.to_le_bytes());
        self.nonce_volatile += u32::from(increment);
        self.respond(0x22, &resp);
    }

    fn token_otp_decode(&mut self, payload: &[u8]) {
        let (public_id, kh) = nonce_and_handle(payload);
        let otp = &payload[10..26];
        let aead = &payload[26..56];
        let data = &aead[..aead.len() - 8];

        let mut resp = public_id.to_vec();
        resp.extend(kh.to_le_bytes());
        let valid = otp == TOKEN_OTP && aead == make_aead(&public_id, kh, data).as_slice();
        if valid {
            let (use_ctr, session, ts_high, ts_low) = TOKEN_COUNTERS;
            resp.extend(use_ctr.to_le_bytes());
            resp.push(session);
            resp.push(ts_high);
            resp.extend(ts_low.to_le_bytes());
            resp.push(OK);
        } else {
            resp.extend([0u8; 6]);
            resp.push(OTP_INVALID);
        }
        self.respond(0x06, &resp);
    }
}

impl Transport for SimDevice {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let command = if data.first() == Some(&0x00) { 0x00 } else { data[1] };
        self.log.lock().unwrap().push(Op::Write(command));
        self.handle_frame(data);
        Ok(())
    }

    fn read(&mut self, n: usize) -> io::Result<Vec<u8>> {
        self.log.lock().unwrap().push(Op::Read(n));
        let n = n.min(self.rx.len());
        Ok(self.rx.drain(..n).collect())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.rx.len())
    }

    fn drain(&mut self) -> io::Result<()> {
        self.rx.clear();
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

/// Per-handle key material, derived deterministically.
fn handle_key(kh: u32) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, b"device-master-key");
    hmac::sign(&key, &kh.to_le_bytes()).as_ref().to_vec()
}

/// AEAD block: data in the clear plus an 8-byte MAC binding
/// (nonce, key handle, data). The host never looks inside.
fn make_aead(nonce: &[u8; 6], kh: u32, data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, &handle_key(kh));
    let mut message = nonce.to_vec();
    message.extend(data);
    let tag = hmac::sign(&key, &message);
    let mut aead = data.to_vec();
    aead.extend(&tag.as_ref()[..8]);
    aead
}

/// Keyed self-inverse block transform standing in for AES-ECB.
fn xor_block(kh: u32, block: &[u8]) -> Vec<u8> {
    let pad = handle_key(kh);
    block.iter().zip(pad.iter()).map(|(b, p)| b ^ p).collect()
}

fn pseudo_random(n: usize) -> Vec<u8> {
    (0..n)
        .map(|i| (i as u8).wrapping_mul(167).wrapping_add(13))
        .collect()
}

fn nonce_and_handle(payload: &[u8]) -> ([u8; 6], u32) {
    let mut nonce = [0u8; 6];
    nonce.copy_from_slice(&payload[0..6]);
    let kh = u32::from_le_bytes(payload[6..10].try_into().unwrap());
    (nonce, kh)
}
