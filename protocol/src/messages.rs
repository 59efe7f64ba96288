//! Wire message types.
//!
//! Every message is an [`Envelope`] naming its payload type, with an
//! optional cursor to the next page.

use chrono::{DateTime, Utc};
use paywire_common::{AccountId, Address, Amount, LedgerError, TransactionId};
use paywire_ledger::{Account, FeeEstimate, Transaction, TransactionKind};
use serde::{Deserialize, Serialize};

/// Payload type carried by an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Accounts,
    Addresses,
    Transactions,
    Hooks,
    Fees,
    Errors,
}

/// Top-level JSON message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Payload type.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Cursor of the following page, when there may be one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<String>,
    /// Payload items.
    pub payload: Vec<T>,
}

impl<T> Envelope<T> {
    /// Create an envelope without a next cursor.
    pub fn new(message_type: MessageType, payload: Vec<T>) -> Self {
        Self {
            message_type,
            next: None,
            payload,
        }
    }

    /// Attach a next-page cursor.
    pub fn with_next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }
}

/// Account as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub id: AccountId,
    pub balance: Amount,
}

impl From<&Account> for AccountPayload {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            balance: account.balance,
        }
    }
}

/// Freshly issued deposit address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressPayload {
    pub address: Address,
}

/// Transaction as sent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(rename = "fromAccountID", skip_serializing_if = "Option::is_none", default)]
    pub from_account_id: Option<AccountId>,
    #[serde(rename = "toAccountID", skip_serializing_if = "Option::is_none", default)]
    pub to_account_id: Option<AccountId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to_address: Option<Address>,
    pub value: Amount,
    pub created: DateTime<Utc>,
    /// Chain transaction hashes; always empty for in-ledger credits.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tx_hashes: Option<Vec<String>>,
}

impl From<&Transaction> for TransactionPayload {
    fn from(tx: &Transaction) -> Self {
        let tx_hashes = match tx.kind {
            TransactionKind::Credit => Some(Vec::new()),
            _ => None,
        };

        Self {
            id: tx.id,
            kind: tx.kind,
            from_account_id: tx.from_account_id,
            to_account_id: tx.to_account_id,
            to_address: tx.to_address.clone(),
            value: tx.value,
            created: tx.created_at,
            tx_hashes,
        }
    }
}

/// Registered webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookPayload {
    pub url: String,
}

/// Fee estimate as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeePayload {
    pub fee_per_byte: i64,
    pub block_height: i64,
}

impl From<&FeeEstimate> for FeePayload {
    fn from(fee: &FeeEstimate) -> Self {
        Self {
            fee_per_byte: fee.fee_per_byte,
            block_height: fee.block_height,
        }
    }
}

/// Error description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

impl From<&LedgerError> for ErrorPayload {
    fn from(err: &LedgerError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Build the notification sent to hooks after a credit.
pub fn credit_notification(tx: &Transaction) -> Envelope<TransactionPayload> {
    Envelope::new(MessageType::Transactions, vec![TransactionPayload::from(tx)])
}

/// Build an error message.
pub fn error_message(err: &LedgerError) -> Envelope<ErrorPayload> {
    Envelope::new(MessageType::Errors, vec![ErrorPayload::from(err)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use paywire_common::now;
    use serde_json::json;

    #[test]
    fn test_credit_notification_shape() {
        let tx = Transaction::credit(
            TransactionId::new(77),
            AccountId::new(5),
            Address::new("addr"),
            1000,
            now(),
        );

        let value = serde_json::to_value(credit_notification(&tx)).unwrap();

        assert_eq!(value["type"], "transactions");
        assert!(value.get("next").is_none());
        let payload = &value["payload"][0];
        assert_eq!(payload["id"], 77);
        assert_eq!(payload["type"], "credit");
        assert_eq!(payload["toAccountID"], 5);
        assert_eq!(payload["toAddress"], "addr");
        assert_eq!(payload["value"], 1000);
        assert_eq!(payload["txHashes"], json!([]));
        assert!(payload.get("fromAccountID").is_none());
    }

    #[test]
    fn test_transfer_payload_has_both_accounts() {
        let tx = Transaction::transfer(
            TransactionId::new(9),
            AccountId::new(1),
            AccountId::new(2),
            40,
            now(),
        );

        let value = serde_json::to_value(TransactionPayload::from(&tx)).unwrap();
        assert_eq!(value["fromAccountID"], 1);
        assert_eq!(value["toAccountID"], 2);
        assert!(value.get("txHashes").is_none());
        assert!(value.get("toAddress").is_none());
    }

    #[test]
    fn test_envelope_with_next() {
        let accounts = vec![AccountPayload {
            id: AccountId::new(3),
            balance: 10,
        }];
        let envelope = Envelope::new(MessageType::Accounts, accounts).with_next("/v1/mainnet/accounts/?next=1");

        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["next"], "/v1/mainnet/accounts/?next=1");
        assert_eq!(value["payload"][0]["balance"], 10);

        let back: Envelope<AccountPayload> = serde_json::from_value(value).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_fee_and_error_payloads() {
        let fee = FeePayload::from(&FeeEstimate {
            fee_per_byte: 100,
            block_height: 451_000,
        });
        let value = serde_json::to_value(fee).unwrap();
        assert_eq!(value, json!({"feePerByte": 100, "blockHeight": 451000}));

        let err = LedgerError::HookLimitReached { max: 4 };
        let value = serde_json::to_value(error_message(&err)).unwrap();
        assert_eq!(value["type"], "errors");
        assert_eq!(value["payload"][0]["message"], "Hook limit of 4 reached");
    }
}
