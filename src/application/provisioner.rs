use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::application::notifications;
use crate::domain::account::{BankPartner, DedicatedAccount};
use crate::domain::ports::{
    AccountStoreRef, MailerRef, ProvisionRequest, UserStoreRef, VirtualAccountProviderRef,
};
use crate::domain::user::User;
use crate::error::Result;

/// Result of one provisioning run for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub created: bool,
    /// Last observed failure message when no partner succeeded.
    pub error: Option<String>,
}

/// Obtains a dedicated virtual account number for a user by trying the
/// partner list in order until one succeeds.
///
/// There is no retry of the same partner, only fallback to the next; a run
/// that exhausts the list reports the last failure it saw. The provisioner
/// itself keeps no cross-invocation state: callers are expected to check
/// whether the user already holds an account before invoking it.
pub struct AccountProvisioner {
    provider: VirtualAccountProviderRef,
    accounts: AccountStoreRef,
    partners: Vec<BankPartner>,
}

impl AccountProvisioner {
    pub fn new(provider: VirtualAccountProviderRef, accounts: AccountStoreRef) -> Self {
        Self {
            provider,
            accounts,
            partners: BankPartner::PRIORITY.to_vec(),
        }
    }

    /// Overrides the partner priority list. Order is preserved.
    pub fn with_partners(mut self, partners: Vec<BankPartner>) -> Self {
        self.partners = partners;
        self
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn provision(&self, user: &User) -> ProvisionOutcome {
        let (first_name, last_name) = user.split_name();
        let mut last_error: Option<String> = None;

        for partner in &self.partners {
            let request = ProvisionRequest {
                bank: *partner,
                email: user.email.clone(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                phone: user.phone_number.clone(),
                reference: user.id.to_string(),
            };

            let response = match self.provider.create_virtual_account(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(partner = %partner, "provider call failed: {e}");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            if !response.status {
                warn!(partner = %partner, "provider declined: {}", response.message);
                last_error = Some(response.message);
                continue;
            }

            // A logical success that carries no account entry is unusable;
            // treat it like a declined partner.
            let Some(data) = response.data else {
                last_error = Some("provider returned success without account data".to_string());
                continue;
            };
            let Some(issued) = data.account.first() else {
                last_error = Some("provider returned an empty account list".to_string());
                continue;
            };

            let account = DedicatedAccount {
                user_id: user.id,
                account_number: issued.account_number.clone(),
                account_name: issued.account_name.clone(),
                bank_name: issued.bank_name.clone(),
                bank_code: issued.bank_id.clone(),
                provider_ref: data.reference.clone(),
                has_dedicated_account: true,
                order_ref: user.id.to_string(),
                created_at: Utc::now(),
            };

            if let Err(e) = self.accounts.store(account).await {
                error!(partner = %partner, "failed to persist dedicated account: {e}");
                return ProvisionOutcome {
                    created: false,
                    error: Some(e.to_string()),
                };
            }

            info!(partner = %partner, "dedicated account provisioned");
            return ProvisionOutcome {
                created: true,
                error: None,
            };
        }

        ProvisionOutcome {
            created: false,
            error: last_error,
        }
    }
}

/// Outcome of a user-initiated account request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    Created,
    AlreadyExists,
    UserNotFound,
    Failed { error: String },
}

impl RequestOutcome {
    pub fn http_status(&self) -> u16 {
        match self {
            RequestOutcome::Created => 200,
            RequestOutcome::AlreadyExists => 400,
            RequestOutcome::UserNotFound => 404,
            RequestOutcome::Failed { .. } => 500,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RequestOutcome::Created => "Account number generated successfully",
            RequestOutcome::AlreadyExists => "Account number already generated",
            RequestOutcome::UserNotFound => "User does not exist",
            RequestOutcome::Failed { .. } => "Failed to generate account number",
        }
    }
}

/// The user-initiated provisioning flow: guard, provision, notify.
pub struct AccountRequestFlow {
    users: UserStoreRef,
    accounts: AccountStoreRef,
    provisioner: AccountProvisioner,
    mailer: MailerRef,
}

impl AccountRequestFlow {
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
        }
    }

    /// Provisions a dedicated account for `user_id` unless one from the
    /// primary partner already exists. An account issued by any other
    /// partner does not block: re-provisioning those is a separate flow.
    #[instrument(skip(self))]
    pub async fn request_account(&self, user_id: Uuid) -> RequestOutcome {
        match self.run(user_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("account request failed: {e}");
                RequestOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, user_id: Uuid) -> Result<RequestOutcome> {
        let Some(user) = self.users.get(user_id).await? else {
            return Ok(RequestOutcome::UserNotFound);
        };

        if let Some(existing) = self.accounts.get_by_user(user.id).await?
            && existing.is_primary_partner()
        {
            return Ok(RequestOutcome::AlreadyExists);
        }

        let outcome = self.provisioner.provision(&user).await;
        if !outcome.created {
            return Ok(RequestOutcome::Failed {
                error: outcome
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        notifications::send_account_ready(self.mailer.as_ref(), &user).await;
        Ok(RequestOutcome::Created)
    }
}
