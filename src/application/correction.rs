use tracing::{error, instrument, warn};

use crate::domain::ports::{TransactionStoreRef, UserStoreRef};
use crate::domain::user::Balance;
use crate::error::Result;

/// Outcome of an operator balance correction.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionOutcome {
    Corrected {
        old_balance: Balance,
        new_balance: Balance,
    },
    AlreadyCorrect {
        balance: Balance,
    },
    TransactionNotFound,
    UserNotFound,
    InternalError,
}

impl CorrectionOutcome {
    pub fn http_status(&self) -> u16 {
        match self {
            CorrectionOutcome::Corrected { .. } | CorrectionOutcome::AlreadyCorrect { .. } => 200,
            CorrectionOutcome::TransactionNotFound | CorrectionOutcome::UserNotFound => 404,
            CorrectionOutcome::InternalError => 500,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            CorrectionOutcome::Corrected { .. } => "User balance corrected successfully",
            CorrectionOutcome::AlreadyCorrect { .. } => "User balance is already correct",
            CorrectionOutcome::TransactionNotFound => "Transaction not found",
            CorrectionOutcome::UserNotFound => "User associated with transaction not found",
            CorrectionOutcome::InternalError => {
                "Internal server error occurred while correcting balance"
            }
        }
    }
}

/// Operator escape hatch: overwrite a user's balance from a transaction
/// reference. Not part of the automated reconciliation path.
///
/// The write is unconditional; no optimistic-concurrency check is performed
/// and the last writer wins. Correcting also re-enables the user's
/// transaction flag.
pub struct BalanceCorrection {
    users: UserStoreRef,
    transactions: TransactionStoreRef,
}

impl BalanceCorrection {
    pub fn new(users: UserStoreRef, transactions: TransactionStoreRef) -> Self {
        Self { users, transactions }
    }

    #[instrument(skip(self))]
    pub async fn correct(&self, tx_ref: &str, new_balance: Balance) -> CorrectionOutcome {
        match self.apply(tx_ref, new_balance).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("balance correction failed: {e}");
                CorrectionOutcome::InternalError
            }
        }
    }

    async fn apply(&self, tx_ref: &str, new_balance: Balance) -> Result<CorrectionOutcome> {
        let Some(tx) = self.transactions.get_by_tx_ref(tx_ref).await? else {
            return Ok(CorrectionOutcome::TransactionNotFound);
        };

        let Some(mut user) = self.users.get(tx.user_id).await? else {
            return Ok(CorrectionOutcome::UserNotFound);
        };

        if user.balance == new_balance {
            return Ok(CorrectionOutcome::AlreadyCorrect {
                balance: user.balance,
            });
        }

        let old_balance = user.balance;
        user.balance = new_balance;
        user.can_transact = true;
        self.users.store(user).await?;

        warn!(
            tx_ref,
            old = %old_balance.0,
            new = %new_balance.0,
            "operator balance correction applied"
        );
        Ok(CorrectionOutcome::Corrected {
            old_balance,
            new_balance,
        })
    }
}
