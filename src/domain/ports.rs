use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::account::{BankPartner, DedicatedAccount};
use crate::domain::transaction::{Amount, Transaction, TransactionStatus};
use crate::domain::user::User;
use crate::error::Result;

pub type UserStoreRef = Arc<dyn UserStore>;
pub type AccountStoreRef = Arc<dyn AccountStore>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
pub type VirtualAccountProviderRef = Arc<dyn VirtualAccountProvider>;
pub type MailerRef = Arc<dyn Mailer>;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn store(&self, user: User) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
    /// Active, email-verified users, in creation order.
    async fn all_active(&self) -> Result<Vec<User>>;
    /// Atomically adds `amount` to the user's balance and returns the updated
    /// user, or `None` if the user does not exist.
    async fn credit(&self, id: Uuid, amount: Amount) -> Result<Option<User>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn store(&self, account: DedicatedAccount) -> Result<()>;
    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<DedicatedAccount>>;
    /// Ids of users that already hold a dedicated account.
    async fn provisioned_user_ids(&self) -> Result<Vec<Uuid>>;
}

/// Result of an atomic settle attempt on a transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum SettleOutcome {
    /// The transition was applied; carries the settled transaction.
    Applied(Transaction),
    /// The transaction was already in a terminal status; nothing changed.
    AlreadyTerminal(TransactionStatus),
    Missing,
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, tx: Transaction) -> Result<()>;
    async fn get_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Transaction>>;
    /// Fallback lookup against a string field of the provider metadata.
    async fn get_by_meta_ref(&self, key: &str, value: &str) -> Result<Option<Transaction>>;
    /// Transitions the transaction to `to` only if its current status is not
    /// already terminal. Implementations must make the check-and-write
    /// atomic so concurrent webhook deliveries cannot settle twice.
    async fn settle(&self, tx_ref: &str, to: TransactionStatus) -> Result<SettleOutcome>;
}

/// Account-creation request sent to the aggregator, in its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvisionRequest {
    pub bank: BankPartner,
    pub email: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub phone: String,
    /// Idempotency reference; the user's internal id.
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedBankAccount {
    pub account_number: String,
    pub account_name: String,
    pub bank_id: String,
    pub bank_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderAccountData {
    pub reference: String,
    pub account: Vec<IssuedBankAccount>,
}

/// The aggregator's `generateVirtualAccount` response. `status == false`
/// reports a logical failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub status: bool,
    pub message: String,
    pub data: Option<ProviderAccountData>,
}

#[async_trait]
pub trait VirtualAccountProvider: Send + Sync {
    /// Calls the aggregator's account-creation endpoint for one partner.
    /// Transport-level failures surface as `Err`; logical failures come back
    /// as `Ok` with `status == false`.
    async fn create_virtual_account(&self, request: &ProvisionRequest) -> Result<ProviderResponse>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub recipients: Vec<String>,
    pub html_body: String,
    pub subject: String,
    pub reply_to: Option<String>,
}

/// Fire-and-forget email transport. Callers log failures and move on;
/// nothing in the core retries a send.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<()>;
}
