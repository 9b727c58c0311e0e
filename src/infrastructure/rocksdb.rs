use crate::domain::account::DedicatedAccount;
use crate::domain::ports::{AccountStore, SettleOutcome, TransactionStore, UserStore};
use crate::domain::transaction::{Amount, Transaction, TransactionStatus};
use crate::domain::user::User;
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for user records.
pub const CF_USERS: &str = "users";
/// Column Family for dedicated accounts, keyed by owning user.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family for transactions, keyed by `tx_ref`.
pub const CF_TRANSACTIONS: &str = "transactions";

/// A persistent store implementation using RocksDB.
///
/// Serves all three collection ports from one database with a column family
/// per collection and JSON-encoded values. `Clone` shares the underlying
/// `Arc<DB>`. Read-modify-write updates (balance credit, settle) go through
/// a single writer guard, which is what makes the settle conditional under
/// concurrent webhook deliveries.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
    write_guard: Arc<Mutex<()>>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_USERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            write_guard: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| WalletError::StorageError(format!("column family {name} not found")))
    }

    fn put_json<T: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        self.db.put_cf(cf, key, serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl UserStore for RocksDbStore {
    async fn store(&self, user: User) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        self.put_json(CF_USERS, user.id.as_bytes(), &user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.get_json(CF_USERS, id.as_bytes())
    }

    async fn all_active(&self) -> Result<Vec<User>> {
        let mut active: Vec<User> = self
            .scan::<User>(CF_USERS)?
            .into_iter()
            .filter(|user| user.is_provisionable())
            .collect();
        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(active)
    }

    async fn credit(&self, id: Uuid, amount: Amount) -> Result<Option<User>> {
        let _guard = self.write_guard.lock().await;
        match self.get_json::<User>(CF_USERS, id.as_bytes())? {
            Some(mut user) => {
                user.credit(amount);
                self.put_json(CF_USERS, id.as_bytes(), &user)?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AccountStore for RocksDbStore {
    async fn store(&self, account: DedicatedAccount) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        self.put_json(CF_ACCOUNTS, account.user_id.as_bytes(), &account)
    }

    async fn get_by_user(&self, user_id: Uuid) -> Result<Option<DedicatedAccount>> {
        self.get_json(CF_ACCOUNTS, user_id.as_bytes())
    }

    async fn provisioned_user_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .scan::<DedicatedAccount>(CF_ACCOUNTS)?
            .into_iter()
            .filter(|account| account.has_dedicated_account)
            .map(|account| account.user_id)
            .collect())
    }
}

#[async_trait]
impl TransactionStore for RocksDbStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let _guard = self.write_guard.lock().await;
        self.put_json(CF_TRANSACTIONS, tx.tx_ref.as_bytes(), &tx)
    }

    async fn get_by_tx_ref(&self, tx_ref: &str) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, tx_ref.as_bytes())
    }

    async fn get_by_meta_ref(&self, key: &str, value: &str) -> Result<Option<Transaction>> {
        Ok(self
            .scan::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .find(|tx| tx.meta_str(key) == Some(value)))
    }

    async fn settle(&self, tx_ref: &str, to: TransactionStatus) -> Result<SettleOutcome> {
        let _guard = self.write_guard.lock().await;
        match self.get_json::<Transaction>(CF_TRANSACTIONS, tx_ref.as_bytes())? {
            Some(tx) if tx.status.is_terminal() => Ok(SettleOutcome::AlreadyTerminal(tx.status)),
            Some(mut tx) => {
                tx.status = to;
                self.put_json(CF_TRANSACTIONS, tx_ref.as_bytes(), &tx)?;
                Ok(SettleOutcome::Applied(tx))
            }
            None => Ok(SettleOutcome::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::{PaymentMethod, TransactionKind};
    use crate::domain::user::{Balance, UserRole, UserStatus};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone_number: "+2348011111111".to_string(),
            country: "nigeria".to_string(),
            balance: Balance::new(dec!(100.00)),
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
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_USERS).is_some());
        assert!(store.db.cf_handle(CF_ACCOUNTS).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
    }

    #[tokio::test]
    async fn test_user_round_trip_and_credit() {
        let dir = tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();

        let user = sample_user();
        let id = user.id;
        UserStore::store(&store, user.clone()).await.unwrap();

        let retrieved = UserStore::get(&store, id).await.unwrap().unwrap();
        assert_eq!(retrieved, user);

        let credited = store
            .credit(id, Amount::new(dec!(50.00)).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credited.balance, Balance::new(dec!(150.00)));

        assert!(
            store
                .credit(Uuid::new_v4(), Amount::new(dec!(1.00)).unwrap())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_settle_survives_reopen() {
        let dir = tempdir().unwrap();
        let user_id = Uuid::new_v4();

        {
            let store = RocksDbStore::open(dir.path()).unwrap();
            TransactionStore::store(&store, sample_tx("KNT-1", user_id))
                .await
                .unwrap();
            let outcome = store
                .settle("KNT-1", TransactionStatus::Refunded)
                .await
                .unwrap();
            assert!(matches!(outcome, SettleOutcome::Applied(_)));
        }

        let store = RocksDbStore::open(dir.path()).unwrap();
        let tx = store.get_by_tx_ref("KNT-1").await.unwrap().unwrap();
        assert_eq!(tx.status, TransactionStatus::Refunded);

        let again = store
            .settle("KNT-1", TransactionStatus::Success)
            .await
            .unwrap();
        assert_eq!(
            again,
            SettleOutcome::AlreadyTerminal(TransactionStatus::Refunded)
        );
    }
}
