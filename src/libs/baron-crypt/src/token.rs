//! BARON Authentication Tokens
//!
//! A token is one 16-byte cipher block. Its plaintext is a counter block:
//! 12 zero bytes followed by a 32-bit counter in little-endian order.
//!
//! Two protections are used on the wire:
//! - `seal`/`open`: full AES-128 with the core key (terminal <-> AMF)
//! - `mask`: XOR of the 4-byte tail with the first 4 bytes of the access key
//!   (terminal <-> serving gNB fast reconnection)

use std::fmt;

use rand::RngCore;

use crate::aes::Aes128;

/// 128-bit symmetric key
pub type Key128 = [u8; 16];

/// Token length in bytes
pub const TOKEN_LEN: usize = 16;

/// Offset of the counter inside a counter block
pub const COUNTER_OFFSET: usize = 12;

/// Opaque 16-byte token, copied by value
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Token([u8; TOKEN_LEN]);

impl Token {
    pub const fn from_bytes(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; TOKEN_LEN] {
        &self.0
    }

    pub const fn into_bytes(self) -> [u8; TOKEN_LEN] {
        self.0
    }

    /// Build the plaintext counter block for `counter`
    pub fn from_counter(counter: u32) -> Self {
        Self::from_tail(counter.to_le_bytes())
    }

    /// Zero prefix followed by `tail`
    pub fn from_tail(tail: [u8; 4]) -> Self {
        let mut bytes = [0u8; TOKEN_LEN];
        bytes[COUNTER_OFFSET..].copy_from_slice(&tail);
        Self(bytes)
    }

    /// Last four bytes
    pub fn tail(&self) -> [u8; 4] {
        let mut tail = [0u8; 4];
        tail.copy_from_slice(&self.0[COUNTER_OFFSET..]);
        tail
    }

    /// Counter stored in the last four bytes (prefix bytes are ignored)
    pub fn counter(&self) -> u32 {
        u32::from_le_bytes(self.tail())
    }

    /// Encrypt the counter block for `counter` under `key`
    pub fn seal(counter: u32, key: &Key128) -> Self {
        Self(Aes128::new(key).encrypt_block(&Self::from_counter(counter).0))
    }

    /// Decrypt this token under `key` and read its counter
    pub fn open(&self, key: &Key128) -> u32 {
        Self(Aes128::new(key).decrypt_block(&self.0)).counter()
    }

    /// Fast-path mask: zero prefix, tail XORed with `key[0..4]`
    ///
    /// Applying the mask twice with the same key restores the tail.
    pub fn mask(&self, key: &Key128) -> Self {
        let mut tail = self.tail();
        for (t, k) in tail.iter_mut().zip(key.iter()) {
            *t ^= k;
        }
        Self::from_tail(tail)
    }

    /// Uniformly random token
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; TOKEN_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Equality without an early exit on the first differing byte
    pub fn ct_eq(&self, other: &Token) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(")?;
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl From<[u8; TOKEN_LEN]> for Token {
    fn from(bytes: [u8; TOKEN_LEN]) -> Self {
        Self(bytes)
    }
}
