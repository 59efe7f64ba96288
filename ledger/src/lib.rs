//! Paywire Ledger Engine
//!
//! In-memory account ledger for one network: accounts, deposit addresses,
//! reserved-id transfers and debits, paged history and webhook subscribers.

pub mod allocator;
pub mod engine;
pub mod account;
pub mod transaction;
pub mod pagination;
pub mod hooks;
pub mod fees;
pub mod balance;

pub use allocator::IdAllocator;
pub use engine::{Ledger, LedgerConfig, FEE_LABEL, MAX_RESERVATION_BATCH};
pub use account::Account;
pub use transaction::{Transaction, TransactionKind};
pub use pagination::{PageLimits, PageRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
pub use hooks::{validate_hook_url, HookLimits, HookRegistry, MAX_HOOKS, MAX_HOOK_URL_LENGTH};
pub use fees::{fee_schedule, FeeEstimate};
pub use balance::LedgerTotals;
