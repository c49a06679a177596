//! Cryptographic error types

use thiserror::Error;

/// Error type for cipher operations
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptError {
    /// Plaintext does not fit in a single AES block
    #[error("Plaintext too long: {len} bytes, a single block holds 16")]
    PlaintextTooLong { len: usize },
}

/// Cipher result type
pub type CryptResult<T> = Result<T, CryptError>;
