//! Ledger-wide balance totals.

use paywire_common::Amount;
use serde::{Deserialize, Serialize};

/// Aggregate value flows of one ledger.
///
/// Credits are the only inflow and debits the only outflow, so a consistent
/// ledger always has `balances == credited - debited`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTotals {
    /// Sum of all account balances.
    pub balances: i128,
    /// Sum of all credit transactions.
    pub credited: i128,
    /// Sum of all debit transactions.
    pub debited: i128,
    /// Sum of all transfer transactions.
    pub transferred: i128,
}

impl LedgerTotals {
    /// Add one account balance.
    pub fn add_balance(&mut self, balance: Amount) {
        self.balances += i128::from(balance);
    }

    /// Check that value was conserved.
    pub fn is_balanced(&self) -> bool {
        self.balances == self.credited - self.debited
    }
}
