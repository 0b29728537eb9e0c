//! Validated transaction record.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account identifier as it appears in the input batch.
pub type AccountId = String;

/// Exact column set of the input wire format, in order.
pub const EXPECTED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

/// Strict timestamp format of the input wire format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single validated transaction: directed transfer of `amount` from
/// `sender` to `receiver` at `timestamp`. Self-transfers are permitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Globally unique id within a batch.
    pub id: String,
    /// Sending account.
    pub sender: AccountId,
    /// Receiving account.
    pub receiver: AccountId,
    /// Non-negative transfer amount.
    pub amount: Decimal,
    /// Zone-free timestamp parsed from `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: NaiveDateTime,
}

impl Transaction {
    /// Create a transaction record.
    pub fn new(
        id: impl Into<String>,
        sender: impl Into<AccountId>,
        receiver: impl Into<AccountId>,
        amount: Decimal,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
            timestamp,
        }
    }

    /// Whether the given account is either endpoint of this transaction.
    pub fn involves(&self, account: &str) -> bool {
        self.sender == account || self.receiver == account
    }
}
