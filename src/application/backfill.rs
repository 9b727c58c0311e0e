use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::notifications;
use crate::application::provisioner::AccountProvisioner;
use crate::domain::ports::{AccountStoreRef, MailerRef, UserStoreRef};
use crate::error::Result;

/// Users processed per invocation. The rest wait for the next scheduled run.
pub const MAX_USERS_PER_RUN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BackfillReport {
    /// Eligible users without a dedicated account at the start of the run.
    pub total_missing: usize,
    pub processed: usize,
    pub succeeded: usize,
    /// Left for future runs; recomputed from scratch next time.
    pub remaining: usize,
}

/// One capped pass over the users that still lack a dedicated account.
///
/// The missing set is recomputed fresh on every run by set-difference over
/// active users and existing accounts; there is no persisted cursor. Users
/// are processed sequentially and independently: one failure never aborts
/// the rest of the batch.
pub struct BackfillJob {
    users: UserStoreRef,
    accounts: AccountStoreRef,
    provisioner: AccountProvisioner,
    mailer: MailerRef,
    batch_size: usize,
}

impl BackfillJob {
    pub fn new(
        users: UserStoreRef,
        accounts: AccountStoreRef,
        provisioner: AccountProvisioner,
        mailer: MailerRef,
    ) -> Self {
        Self {
            users,
            accounts,
            provisioner,
            mailer,
            batch_size: MAX_USERS_PER_RUN,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<BackfillReport> {
        let active = self.users.all_active().await?;
        let provisioned: HashSet<Uuid> = self
            .accounts
            .provisioned_user_ids()
            .await?
            .into_iter()
            .collect();

        let missing: Vec<_> = active
            .into_iter()
            .filter(|user| !provisioned.contains(&user.id))
            .collect();

        if missing.is_empty() {
            info!("all active users already have dedicated accounts");
            return Ok(BackfillReport::default());
        }

        let batch = missing.len().min(self.batch_size);
        info!(
            total_missing = missing.len(),
            batch, "starting dedicated-account backfill"
        );

        let mut succeeded = 0;
        for user in &missing[..batch] {
            let outcome = self.provisioner.provision(user).await;
            if outcome.created {
                succeeded += 1;
                notifications::send_account_ready(self.mailer.as_ref(), user).await;
            } else {
                warn!(
                    user_id = %user.id,
                    error = outcome.error.as_deref().unwrap_or("Unknown error"),
                    "dedicated account creation failed"
                );
            }
        }

        let report = BackfillReport {
            total_missing: missing.len(),
            processed: batch,
            succeeded,
            remaining: missing.len() - batch,
        };
        info!(?report, "backfill run completed");
        Ok(report)
    }
}
