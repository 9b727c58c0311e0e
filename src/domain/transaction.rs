use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WalletError;

/// Metadata key one provider uses to carry its own transaction reference.
/// Looked up as a fallback when the primary reference does not match.
pub const META_TRANSACTION_REF: &str = "transactionRef";

/// A positive monetary amount for transactions.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WalletError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Settlement state of a transaction.
///
/// `Success` and `Refunded` are terminal: once reached, no further transition
/// is permitted. A `Failed` transaction can still be refunded.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Success | TransactionStatus::Refunded)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum PaymentMethod {
    VirtualAccount,
    DedicatedAccount,
    OwnAccount,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    Funding,
    Airtime,
    Bill,
    Data,
    Exam,
    RechargeCard,
}

/// A record of money movement, created `pending` by an out-of-scope
/// initiation flow and settled exactly once by the reconciler.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    /// Unique external reference correlating this record with provider-side
    /// events.
    pub tx_ref: String,
    pub amount: Amount,
    pub note: Option<String>,
    pub status: TransactionStatus,
    pub payment_method: PaymentMethod,
    pub kind: TransactionKind,
    pub user_id: Uuid,
    pub account_id: String,
    /// Provider-specific payload, stored verbatim with no schema validation.
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// String value under `key` in the provider metadata, if any.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key)?.as_str()
    }
}
