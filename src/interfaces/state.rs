use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::domain::account::DedicatedAccount;
use crate::domain::ports::{AccountStore, TransactionStore, UserStore};
use crate::domain::transaction::Transaction;
use crate::domain::user::User;
use crate::error::Result;

/// On-disk snapshot of the wallet collections, consumed by the replay
/// binary to seed its stores before running an operation.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub accounts: Vec<DedicatedAccount>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl StateSnapshot {
    pub fn from_reader(source: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    pub async fn seed(
        &self,
        users: &dyn UserStore,
        accounts: &dyn AccountStore,
        transactions: &dyn TransactionStore,
    ) -> Result<()> {
        for user in &self.users {
            users.store(user.clone()).await?;
        }
        for account in &self.accounts {
            accounts.store(account.clone()).await?;
        }
        for tx in &self.transactions {
            transactions.store(tx.clone()).await?;
        }
        Ok(())
    }
}
