//! BARON Cryptographic Library
//!
//! This crate provides the primitives the BARON handover protection is built on:
//! a self-contained AES-128 single-block cipher, the 16-byte token type carried
//! inside protocol messages, and the counter ratchet used to authenticate a
//! request/response round.

pub mod aes;        // AES-128 block cipher (key schedule, rounds, inverse)
pub mod error;      // Error types
pub mod ratchet;    // Counter ratchet (+1 request, +2 accept)
pub mod token;      // Authentication / reconnection tokens

#[cfg(test)]
mod property_tests; // Property-based tests for the cipher and ratchet

pub use aes::{aes128_decrypt, aes128_encrypt, Aes128, AES_BLOCK_SIZE};
pub use error::{CryptError, CryptResult};
pub use ratchet::Ratchet;
pub use token::{Key128, Token, TOKEN_LEN};
