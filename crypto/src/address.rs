//! Payable address generation.
//!
//! The ledger treats addresses as opaque strings. [`HashedAddressGenerator`]
//! produces checksummed, network-tagged strings so that a debit destination
//! for the wrong network can be rejected early; it performs no key
//! derivation.

use rand::rngs::OsRng;
use rand::RngCore;

use paywire_common::{Address, Network};

use crate::hash::{double_sha256, sha256};
use crate::{CryptoError, Result};

/// Length of the hashed body of an address.
const BODY_LEN: usize = 20;

/// Length of the trailing checksum.
const CHECKSUM_LEN: usize = 4;

/// Total decoded length: version byte, body, checksum.
const DECODED_LEN: usize = 1 + BODY_LEN + CHECKSUM_LEN;

/// Source of fresh payable addresses for a network.
pub trait AddressGenerator: Send + Sync {
    /// Produce a fresh, previously unused address for `network`.
    fn generate(&self, network: Network) -> Result<Address>;

    /// Check that `address` is well-formed for `network`.
    fn is_valid(&self, network: Network, address: &str) -> bool;
}

/// Version byte prefixed to addresses of each network.
fn version_byte(network: Network) -> u8 {
    match network {
        Network::MainNet => 0x00,
        Network::TestNet3 => 0x6f,
    }
}

/// Generates hex addresses of the form `version || sha256(seed)[..20] || checksum`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedAddressGenerator;

impl HashedAddressGenerator {
    /// Create a new generator.
    pub fn new() -> Self {
        Self
    }

    /// Encode a body for `network`, appending the checksum.
    pub fn encode(network: Network, body: &[u8; BODY_LEN]) -> Address {
        let mut bytes = Vec::with_capacity(DECODED_LEN);
        bytes.push(version_byte(network));
        bytes.extend_from_slice(body);
        let checksum = double_sha256(&bytes);
        bytes.extend_from_slice(&checksum[..CHECKSUM_LEN]);
        Address::new(hex::encode(bytes))
    }

    /// Decode an address and check version and checksum.
    pub fn decode(network: Network, address: &str) -> Result<[u8; BODY_LEN]> {
        let bytes = hex::decode(address)
            .map_err(|e| CryptoError::InvalidAddress(format!("not hex: {}", e)))?;

        if bytes.len() != DECODED_LEN {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                DECODED_LEN,
                bytes.len()
            )));
        }

        if bytes[0] != version_byte(network) {
            return Err(CryptoError::InvalidAddress(format!(
                "address for wrong network, expected {}",
                network
            )));
        }

        let (payload, checksum) = bytes.split_at(1 + BODY_LEN);
        if double_sha256(payload)[..CHECKSUM_LEN] != *checksum {
            return Err(CryptoError::InvalidAddress("bad checksum".to_string()));
        }

        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&payload[1..]);
        Ok(body)
    }
}

impl AddressGenerator for HashedAddressGenerator {
    fn generate(&self, network: Network) -> Result<Address> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CryptoError::Randomness(e.to_string()))?;

        let digest = sha256(&seed);
        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&digest[..BODY_LEN]);

        Ok(Self::encode(network, &body))
    }

    fn is_valid(&self, network: Network, address: &str) -> bool {
        Self::decode(network, address).is_ok()
    }
}
