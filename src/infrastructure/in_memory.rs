use crate::domain::account::DedicatedAccount;
use crate::domain::ports::{
    AccountStore, Mailer, OutboundEmail, SettleOutcome, TransactionStore, UserStore,
};
use crate::domain::transaction::{Amount, Transaction, TransactionStatus};
use crate::domain::user::User;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for users.
///
/// Uses `Arc<RwLock<HashMap>>` to allow shared concurrent access. Ideal for
/// testing or replay runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn store(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn all_active(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        let mut active: Vec<User> = users
            .values()
            .filter(|user| user.is_provisionable())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn credit(&self, id: Uuid, amount: Amount) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.credit(amount);
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }
}

/// A thread-safe in-memory store for dedicated accounts, keyed by owner.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<RwLock<HashMap<Uuid, DedicatedAccount>>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn store(&self, account: DedicatedAccount) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.user_id, account);
        Ok(())
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<DedicatedAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&user_id).cloned())
    }

    async fn provisioned_user_ids(&self) -> Result<Vec<Uuid>> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .filter(|account| account.has_dedicated_account)
            .map(|account| account.user_id)
            .collect())
    }
}

/// A thread-safe in-memory store for transactions, keyed by `tx_ref`.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.tx_ref.clone(), tx);
        Ok(())
    }

    async fn get_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(tx_ref).cloned())
    }

    async fn get_by_meta_ref(&self, key: &str, value: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .values()
            .find(|tx| tx.meta_str(key) == Some(value))
            .cloned())
    }

    async fn settle(&self, tx_ref: &str, to: TransactionStatus) -> Result<SettleOutcome> {
        // Check and write under one write lock: this is the settle atomicity
        // the reconciler relies on.
        let mut transactions = self.transactions.write().await;
        match transactions.get_mut(tx_ref) {
            Some(tx) if tx.status.is_terminal() => Ok(SettleOutcome::AlreadyTerminal(tx.status)),
            Some(tx) => {
                tx.status = to;
                Ok(SettleOutcome::Applied(tx.clone()))
            }
            None => Ok(SettleOutcome::Missing),
        }
    }
}

/// Records outbound email instead of delivering it. Stands in for the SMTP
/// relay in replays and tests.
#[derive(Default, Clone)]
pub struct InMemoryMailer {
    sent: Arc<RwLock<Vec<OutboundEmail>>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, email: OutboundEmail) -> Result<()> {
        let mut sent = self.sent.write().await;
        sent.push(email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{PaymentMethod, TransactionKind, META_TRANSACTION_REF};
    use crate::domain::user::{Balance, UserRole, UserStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+2348011111111".to_string(),
            country: "nigeria".to_string(),
            balance: Balance::new(dec!(500.00)),
            role: UserRole::User,
            is_email_verified: true,
            is_phone_verified: true,
            can_transact: true,
            status: UserStatus::Active,
            ref_code: None,
            created_at: Utc::now(),
        }
    }

    fn sample_tx(tx_ref: &str, user_id: Uuid) -> Transaction {
        Transaction {
            tx_ref: tx_ref.to_string(),
            amount: Amount::new(dec!(1000.00)).unwrap(),
            note: None,
            status: TransactionStatus::Pending,
            payment_method: PaymentMethod::DedicatedAccount,
            kind: TransactionKind::Funding,
            user_id,
            account_id: "acct-1".to_string(),
            meta: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_user_store_credit() {
        let store = InMemoryUserStore::new();
        let user = sample_user();
        let id = user.id;
        store.store(user).await.unwrap();

        let updated = store
            .credit(id, Amount::new(dec!(250.00)).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.balance, Balance::new(dec!(750.00)));

        assert!(
            store
                .credit(Uuid::new_v4(), Amount::new(dec!(1.00)).unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_all_active_filters_and_orders() {
        let store = InMemoryUserStore::new();

        let mut first = sample_user();
        first.created_at = Utc::now() - chrono::Duration::hours(2);
        let mut second = sample_user();
        second.email = "obi@example.com".to_string();
        let mut unverified = sample_user();
        unverified.email = "new@example.com".to_string();
        unverified.is_email_verified = false;
        let mut inactive = sample_user();
        inactive.email = "gone@example.com".to_string();
        inactive.status = UserStatus::Inactive;

        let first_id = first.id;
        for user in [first, second, unverified, inactive] {
            store.store(user).await.unwrap();
        }

        let active = store.all_active().await.unwrap();
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].id, first_id);
    }

    #[tokio::test]
    async fn test_account_store_by_user() {
        let store = InMemoryAccountStore::new();
        let user_id = Uuid::new_v4();
        let account = DedicatedAccount {
            user_id,
            account_number: "1234567890".to_string(),
            account_name: "ADA OBI".to_string(),
            bank_name: "PALMPAY".to_string(),
            bank_code: "PALMPAY".to_string(),
            provider_ref: "ref-1".to_string(),
            has_dedicated_account: true,
            order_ref: user_id.to_string(),
            created_at: Utc::now(),
        };

        store.store(account.clone()).await.unwrap();
        assert_eq!(store.get_by_user(user_id).await.unwrap(), Some(account));
        assert_eq!(store.provisioned_user_ids().await.unwrap(), vec![user_id]);
        assert!(store.get_by_user(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transaction_lookup_by_meta_ref() {
        let store = InMemoryTransactionStore::new();
        let mut tx = sample_tx("KNT-1", Uuid::new_v4());
        tx.meta.insert(
            META_TRANSACTION_REF.to_string(),
            serde_json::Value::String("prov-42".to_string()),
        );
        store.store(tx.clone()).await.unwrap();

        let by_meta = store
            .get_by_meta_ref(META_TRANSACTION_REF, "prov-42")
            .await
            .unwrap();
        assert_eq!(by_meta, Some(tx));

        assert!(
            store
                .get_by_meta_ref(META_TRANSACTION_REF, "other")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_settle_is_conditional() {
        let store = InMemoryTransactionStore::new();
        let tx = sample_tx("KNT-1", Uuid::new_v4());
        store.store(tx).await.unwrap();

        let first = store
            .settle("KNT-1", TransactionStatus::Refunded)
            .await
            .unwrap();
        assert!(matches!(first, SettleOutcome::Applied(ref t) if t.status == TransactionStatus::Refunded));

        // second delivery loses the claim
        let second = store
            .settle("KNT-1", TransactionStatus::Refunded)
            .await
            .unwrap();
        assert_eq!(
            second,
            SettleOutcome::AlreadyTerminal(TransactionStatus::Refunded)
        );

        assert_eq!(
            store
                .settle("missing", TransactionStatus::Success)
                .await
                .unwrap(),
            SettleOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_settle_allows_refund_of_failed() {
        let store = InMemoryTransactionStore::new();
        let mut tx = sample_tx("KNT-1", Uuid::new_v4());
        tx.status = TransactionStatus::Failed;
        store.store(tx).await.unwrap();

        let outcome = store
            .settle("KNT-1", TransactionStatus::Refunded)
            .await
            .unwrap();
        assert!(matches!(outcome, SettleOutcome::Applied(_)));
    }

    #[tokio::test]
    async fn test_mailer_records_sends() {
        let mailer = InMemoryMailer::new();
        mailer
            .send(OutboundEmail {
                recipients: vec!["ada@example.com".to_string()],
                html_body: "<p>hi</p>".to_string(),
                subject: "subject".to_string(),
                reply_to: None,
            })
            .await
            .unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, vec!["ada@example.com".to_string()]);
    }
}
