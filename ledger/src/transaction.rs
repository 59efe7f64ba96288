//! Committed transaction records.

use paywire_common::{AccountId, Address, Amount, Timestamp, TransactionId};
use serde::{Deserialize, Serialize};

/// Kind of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Value entering the ledger at a bound address.
    Credit,
    /// Value moved between two accounts.
    Transfer,
    /// Value leaving the ledger to an external address.
    Debit,
}

impl TransactionKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "credit",
            TransactionKind::Transfer => "transfer",
            TransactionKind::Debit => "debit",
        }
    }
}

/// An immutable ledger transaction.
///
/// Credits carry only a destination account (and the credited address),
/// debits only a source account and the external address, transfers both
/// accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction id (the consumed reservation for transfers and debits).
    pub id: TransactionId,
    /// Kind.
    pub kind: TransactionKind,
    /// Source account.
    pub from_account_id: Option<AccountId>,
    /// Destination account.
    pub to_account_id: Option<AccountId>,
    /// Address involved: credited address or debit destination.
    pub to_address: Option<Address>,
    /// Value moved, always positive.
    pub value: Amount,
    /// When the transaction was committed.
    pub created_at: Timestamp,
}

impl Transaction {
    /// Record a credit to `to_account` through `address`.
    pub fn credit(
        id: TransactionId,
        to_account: AccountId,
        address: Address,
        value: Amount,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Credit,
            from_account_id: None,
            to_account_id: Some(to_account),
            to_address: Some(address),
            value,
            created_at,
        }
    }

    /// Record a transfer between two accounts.
    pub fn transfer(
        id: TransactionId,
        from_account: AccountId,
        to_account: AccountId,
        value: Amount,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Transfer,
            from_account_id: Some(from_account),
            to_account_id: Some(to_account),
            to_address: None,
            value,
            created_at,
        }
    }

    /// Record a debit to an external address.
    pub fn debit(
        id: TransactionId,
        from_account: AccountId,
        to_address: Address,
        value: Amount,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind: TransactionKind::Debit,
            from_account_id: Some(from_account),
            to_account_id: None,
            to_address: Some(to_address),
            value,
            created_at,
        }
    }

    /// Check whether the account is the source or the destination.
    pub fn involves(&self, account: AccountId) -> bool {
        self.from_account_id == Some(account) || self.to_account_id == Some(account)
    }
}
