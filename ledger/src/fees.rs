//! Network fee estimates.

use serde::{Deserialize, Serialize};

/// Fee charged per byte of an outbound payment.
pub const FEE_PER_BYTE: i64 = 100;

/// Block height the fixed estimate is quoted at.
pub const FEE_BLOCK_HEIGHT: i64 = 451_000;

/// A fee quote at a block height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Fee per byte.
    pub fee_per_byte: i64,
    /// Block height the quote applies from.
    pub block_height: i64,
}

/// Fee schedule reported by every ledger.
pub fn fee_schedule() -> Vec<FeeEstimate> {
    vec![FeeEstimate {
        fee_per_byte: FEE_PER_BYTE,
        block_height: FEE_BLOCK_HEIGHT,
    }]
}
