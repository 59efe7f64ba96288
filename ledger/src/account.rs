//! Account definitions for ledger.

use paywire_common::{AccountId, Amount, LedgerError, Result};
use serde::{Deserialize, Serialize};

/// A ledger account. Balances never go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier.
    pub id: AccountId,
    /// Current balance.
    pub balance: Amount,
}

impl Account {
    /// Create a new account with a zero balance.
    pub fn new(id: AccountId) -> Self {
        Self { id, balance: 0 }
    }

    /// Check if account has sufficient funds for a debit of `amount`.
    pub fn has_sufficient_funds(&self, amount: Amount) -> bool {
        self.balance >= amount
    }

    /// Balance after crediting `amount`, or an error on overflow.
    pub fn credited(&self, amount: Amount) -> Result<Amount> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::invalid("value", "balance overflow"))
    }

    /// Balance after debiting `amount`, or an error if funds are short.
    pub fn debited(&self, amount: Amount) -> Result<Amount> {
        if !self.has_sufficient_funds(amount) {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: self.balance,
            });
        }
        Ok(self.balance - amount)
    }
}
