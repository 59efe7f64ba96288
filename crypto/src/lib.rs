//! Paywire Cryptographic Helpers
//!
//! Hashing and the default address generator used by ledgers when the
//! embedding application does not supply its own.

pub mod hash;
pub mod address;

pub use address::{AddressGenerator, HashedAddressGenerator};
pub use hash::{double_sha256, sha256};

/// Errors from cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Randomness unavailable: {0}")]
    Randomness(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
