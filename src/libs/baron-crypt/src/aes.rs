//! AES-128 Block Cipher
//!
//! Self-contained implementation of the FIPS-197 block cipher restricted to
//! 128-bit keys and single-block (ECB-style) invocation. Every BARON token is
//! exactly one block, so no chaining mode is provided.
//!
//! The state is kept as a flat 16-byte array in column-major order, i.e. byte
//! `4 * c + r` holds row `r` of column `c`. Round keys use the same layout so
//! AddRoundKey is a plain byte-wise XOR.
//!
//! Control flow never depends on key or data values: there are no early exits
//! and the GF(2^8) arithmetic is branch-free.

use crate::error::{CryptError, CryptResult};

/// AES block size in bytes
pub const AES_BLOCK_SIZE: usize = 16;

/// Number of rounds for a 128-bit key
pub const AES128_ROUNDS: usize = 10;

/// Rijndael S-box
const SBOX: [u8; 256] = [
    0x63, 0x7C, 0x77, 0x7B, 0xF2, 0x6B, 0x6F, 0xC5, 0x30, 0x01, 0x67, 0x2B, 0xFE, 0xD7, 0xAB, 0x76,
    0xCA, 0x82, 0xC9, 0x7D, 0xFA, 0x59, 0x47, 0xF0, 0xAD, 0xD4, 0xA2, 0xAF, 0x9C, 0xA4, 0x72, 0xC0,
    0xB7, 0xFD, 0x93, 0x26, 0x36, 0x3F, 0xF7, 0xCC, 0x34, 0xA5, 0xE5, 0xF1, 0x71, 0xD8, 0x31, 0x15,
    0x04, 0xC7, 0x23, 0xC3, 0x18, 0x96, 0x05, 0x9A, 0x07, 0x12, 0x80, 0xE2, 0xEB, 0x27, 0xB2, 0x75,
    0x09, 0x83, 0x2C, 0x1A, 0x1B, 0x6E, 0x5A, 0xA0, 0x52, 0x3B, 0xD6, 0xB3, 0x29, 0xE3, 0x2F, 0x84,
    0x53, 0xD1, 0x00, 0xED, 0x20, 0xFC, 0xB1, 0x5B, 0x6A, 0xCB, 0xBE, 0x39, 0x4A, 0x4C, 0x58, 0xCF,
    0xD0, 0xEF, 0xAA, 0xFB, 0x43, 0x4D, 0x33, 0x85, 0x45, 0xF9, 0x02, 0x7F, 0x50, 0x3C, 0x9F, 0xA8,
    0x51, 0xA3, 0x40, 0x8F, 0x92, 0x9D, 0x38, 0xF5, 0xBC, 0xB6, 0xDA, 0x21, 0x10, 0xFF, 0xF3, 0xD2,
    0xCD, 0x0C, 0x13, 0xEC, 0x5F, 0x97, 0x44, 0x17, 0xC4, 0xA7, 0x7E, 0x3D, 0x64, 0x5D, 0x19, 0x73,
    0x60, 0x81, 0x4F, 0xDC, 0x22, 0x2A, 0x90, 0x88, 0x46, 0xEE, 0xB8, 0x14, 0xDE, 0x5E, 0x0B, 0xDB,
    0xE0, 0x32, 0x3A, 0x0A, 0x49, 0x06, 0x24, 0x5C, 0xC2, 0xD3, 0xAC, 0x62, 0x91, 0x95, 0xE4, 0x79,
    0xE7, 0xC8, 0x37, 0x6D, 0x8D, 0xD5, 0x4E, 0xA9, 0x6C, 0x56, 0xF4, 0xEA, 0x65, 0x7A, 0xAE, 0x08,
    0xBA, 0x78, 0x25, 0x2E, 0x1C, 0xA6, 0xB4, 0xC6, 0xE8, 0xDD, 0x74, 0x1F, 0x4B, 0xBD, 0x8B, 0x8A,
    0x70, 0x3E, 0xB5, 0x66, 0x48, 0x03, 0xF6, 0x0E, 0x61, 0x35, 0x57, 0xB9, 0x86, 0xC1, 0x1D, 0x9E,
    0xE1, 0xF8, 0x98, 0x11, 0x69, 0xD9, 0x8E, 0x94, 0x9B, 0x1E, 0x87, 0xE9, 0xCE, 0x55, 0x28, 0xDF,
    0x8C, 0xA1, 0x89, 0x0D, 0xBF, 0xE6, 0x42, 0x68, 0x41, 0x99, 0x2D, 0x0F, 0xB0, 0x54, 0xBB, 0x16,
];

/// Inverse S-box, derived from [`SBOX`] at compile time
const INV_SBOX: [u8; 256] = invert_sbox(&SBOX);

/// Round constants for the key schedule (index 0 unused)
const RCON: [u8; AES128_ROUNDS + 1] = [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1B, 0x36];

const fn invert_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut inv = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        inv[sbox[i] as usize] = i as u8;
        i += 1;
    }
    inv
}

/// Multiply by x in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1
#[inline]
fn xtime(v: u8) -> u8 {
    (v << 1) ^ (((v >> 7) & 1) * 0x1B)
}

/// General GF(2^8) multiplication, fixed 8 iterations
#[inline]
fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    for _ in 0..8 {
        p ^= a & 0u8.wrapping_sub(b & 1);
        a = xtime(a);
        b >>= 1;
    }
    p
}

fn sub_bytes(state: &mut [u8; AES_BLOCK_SIZE]) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

fn inv_sub_bytes(state: &mut [u8; AES_BLOCK_SIZE]) {
    for b in state.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

/// Row `r` is rotated left by `r` positions
fn shift_rows(state: &mut [u8; AES_BLOCK_SIZE]) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[4 * c + r] = old[4 * ((c + r) % 4) + r];
        }
    }
}

fn inv_shift_rows(state: &mut [u8; AES_BLOCK_SIZE]) {
    let old = *state;
    for r in 1..4 {
        for c in 0..4 {
            state[4 * c + r] = old[4 * ((c + 4 - r) % 4) + r];
        }
    }
}

fn mix_columns(state: &mut [u8; AES_BLOCK_SIZE]) {
    for c in 0..4 {
        let a0 = state[4 * c];
        let a1 = state[4 * c + 1];
        let a2 = state[4 * c + 2];
        let a3 = state[4 * c + 3];

        state[4 * c] = xtime(a0) ^ (xtime(a1) ^ a1) ^ a2 ^ a3;
        state[4 * c + 1] = a0 ^ xtime(a1) ^ (xtime(a2) ^ a2) ^ a3;
        state[4 * c + 2] = a0 ^ a1 ^ xtime(a2) ^ (xtime(a3) ^ a3);
        state[4 * c + 3] = (xtime(a0) ^ a0) ^ a1 ^ a2 ^ xtime(a3);
    }
}

fn inv_mix_columns(state: &mut [u8; AES_BLOCK_SIZE]) {
    for c in 0..4 {
        let a0 = state[4 * c];
        let a1 = state[4 * c + 1];
        let a2 = state[4 * c + 2];
        let a3 = state[4 * c + 3];

        state[4 * c] = gmul(a0, 0x0E) ^ gmul(a1, 0x0B) ^ gmul(a2, 0x0D) ^ gmul(a3, 0x09);
        state[4 * c + 1] = gmul(a0, 0x09) ^ gmul(a1, 0x0E) ^ gmul(a2, 0x0B) ^ gmul(a3, 0x0D);
        state[4 * c + 2] = gmul(a0, 0x0D) ^ gmul(a1, 0x09) ^ gmul(a2, 0x0E) ^ gmul(a3, 0x0B);
        state[4 * c + 3] = gmul(a0, 0x0B) ^ gmul(a1, 0x0D) ^ gmul(a2, 0x09) ^ gmul(a3, 0x0E);
    }
}

fn add_round_key(state: &mut [u8; AES_BLOCK_SIZE], round_key: &[u8; AES_BLOCK_SIZE]) {
    for (s, k) in state.iter_mut().zip(round_key.iter()) {
        *s ^= k;
    }
}

/// Expanded AES-128 key
///
/// Holds the 11 round keys derived from the cipher key. Building the schedule
/// once lets a caller encrypt and decrypt any number of blocks with it.
#[derive(Clone)]
pub struct Aes128 {
    round_keys: [[u8; AES_BLOCK_SIZE]; AES128_ROUNDS + 1],
}

impl Aes128 {
    /// Expand a 16-byte cipher key into the round-key schedule
    ///
    /// Round key `j` is built from round key `j - 1`: its last word is rotated
    /// one byte, substituted and combined with `RCON[j]` to form the first
    /// word, and the remaining three words are chained XORs.
    pub fn new(key: &[u8; 16]) -> Self {
        let mut round_keys = [[0u8; AES_BLOCK_SIZE]; AES128_ROUNDS + 1];
        round_keys[0] = *key;

        for j in 1..=AES128_ROUNDS {
            let prev = round_keys[j - 1];

            let mut temp = [prev[13], prev[14], prev[15], prev[12]];
            for b in temp.iter_mut() {
                *b = SBOX[*b as usize];
            }
            temp[0] ^= RCON[j];

            let mut next = [0u8; AES_BLOCK_SIZE];
            for i in 0..4 {
                next[i] = prev[i] ^ temp[i];
            }
            for i in 4..AES_BLOCK_SIZE {
                next[i] = prev[i] ^ next[i - 4];
            }
            round_keys[j] = next;
        }

        Self { round_keys }
    }

    /// Round key `round` (0 is the cipher key itself)
    pub fn round_key(&self, round: usize) -> Option<&[u8; AES_BLOCK_SIZE]> {
        self.round_keys.get(round)
    }

    /// Encrypt a single 16-byte block
    pub fn encrypt_block(&self, plaintext: &[u8; AES_BLOCK_SIZE]) -> [u8; AES_BLOCK_SIZE] {
        let mut state = *plaintext;
        add_round_key(&mut state, &self.round_keys[0]);

        for round in 1..AES128_ROUNDS {
            sub_bytes(&mut state);
            shift_rows(&mut state);
            mix_columns(&mut state);
            add_round_key(&mut state, &self.round_keys[round]);
        }

        // Final round omits MixColumns
        sub_bytes(&mut state);
        shift_rows(&mut state);
        add_round_key(&mut state, &self.round_keys[AES128_ROUNDS]);

        state
    }

    /// Decrypt a single 16-byte block
    pub fn decrypt_block(&self, ciphertext: &[u8; AES_BLOCK_SIZE]) -> [u8; AES_BLOCK_SIZE] {
        let mut state = *ciphertext;
        add_round_key(&mut state, &self.round_keys[AES128_ROUNDS]);

        for round in (1..AES128_ROUNDS).rev() {
            inv_shift_rows(&mut state);
            inv_sub_bytes(&mut state);
            add_round_key(&mut state, &self.round_keys[round]);
            inv_mix_columns(&mut state);
        }

        inv_shift_rows(&mut state);
        inv_sub_bytes(&mut state);
        add_round_key(&mut state, &self.round_keys[0]);

        state
    }
}

impl std::fmt::Debug for Aes128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("Aes128").finish_non_exhaustive()
    }
}

/// Zero-extend `plaintext` on the most-significant side to a full block
///
/// The input bytes land at the end of the block in their original order.
pub fn pad_block(plaintext: &[u8]) -> CryptResult<[u8; AES_BLOCK_SIZE]> {
    if plaintext.len() > AES_BLOCK_SIZE {
        return Err(CryptError::PlaintextTooLong { len: plaintext.len() });
    }
    let mut block = [0u8; AES_BLOCK_SIZE];
    block[AES_BLOCK_SIZE - plaintext.len()..].copy_from_slice(plaintext);
    Ok(block)
}

/// AES-128 encryption of up to one block
///
/// # Arguments
/// * `plaintext` - At most 16 bytes; shorter input is front-padded with zeros
/// * `key` - 16-byte cipher key
///
/// # Returns
/// * `Ok([u8; 16])` - The ciphertext block
/// * `Err(CryptError::PlaintextTooLong)` - If the input exceeds one block
pub fn aes128_encrypt(plaintext: &[u8], key: &[u8; 16]) -> CryptResult<[u8; AES_BLOCK_SIZE]> {
    let block = pad_block(plaintext)?;
    Ok(Aes128::new(key).encrypt_block(&block))
}

/// AES-128 decryption of exactly one block
pub fn aes128_decrypt(ciphertext: &[u8; AES_BLOCK_SIZE], key: &[u8; 16]) -> [u8; AES_BLOCK_SIZE] {
    Aes128::new(key).decrypt_block(ciphertext)
}
