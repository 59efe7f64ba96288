//! Error types for Paywire ledger operations.

use crate::{AccountId, Amount, TransactionId};
use thiserror::Error;

/// Coarse error classification an API layer maps onto its responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Account, address, transaction, label or reservation absent.
    NotFound,
    /// Non-positive value, empty destination, malformed request.
    InvalidArgument,
    /// Balance too low for a debit-producing operation.
    InsufficientFunds,
    /// Duplicate hook registration.
    Conflict,
    /// Hook registry full.
    ResourceExhausted,
    /// A collaborator failed.
    Internal,
}

/// Main error type for ledger operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Account does not exist.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// No account is bound to the label.
    #[error("Account with label {0} not found")]
    LabelNotFound(String),

    /// Transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Reservation is unknown or was already committed.
    #[error("Invalid reservation: {0}")]
    InvalidReservation(TransactionId),

    /// Invalid argument.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        message: String,
        field: Option<String>,
    },

    /// Insufficient funds.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Amount, available: Amount },

    /// Hook URL already registered.
    #[error("Hook already registered: {0}")]
    HookExists(String),

    /// Hook registry is full.
    #[error("Hook limit of {max} reached")]
    HookLimitReached { max: usize },

    /// The address generator failed.
    #[error("Address generation failed: {0}")]
    AddressGeneration(String),
}

impl LedgerError {
    /// Build an invalid argument error for a named field.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_)
            | LedgerError::LabelNotFound(_)
            | LedgerError::TransactionNotFound(_)
            | LedgerError::InvalidReservation(_) => ErrorKind::NotFound,
            LedgerError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            LedgerError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LedgerError::HookExists(_) => ErrorKind::Conflict,
            LedgerError::HookLimitReached { .. } => ErrorKind::ResourceExhausted,
            LedgerError::AddressGeneration(_) => ErrorKind::Internal,
        }
    }

    /// Get error code for wire messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            LedgerError::LabelNotFound(_) => "LABEL_NOT_FOUND",
            LedgerError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            LedgerError::InvalidReservation(_) => "INVALID_RESERVATION",
            LedgerError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::HookExists(_) => "HOOK_EXISTS",
            LedgerError::HookLimitReached { .. } => "MAX_HOOKS",
            LedgerError::AddressGeneration(_) => "ADDRESS_GENERATION_FAILED",
        }
    }
}

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
