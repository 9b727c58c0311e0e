use tracing::{error, info, instrument};

use crate::domain::ports::{SettleOutcome, TransactionStoreRef, UserStoreRef};
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::Result;

/// Provider status string that triggers a refund on the status-based variant.
pub const FAILED_STATUS: &str = "failed";

/// Maps provider terminal codes to reconciliation actions. The defaults are
/// the provider's production constants and must be preserved verbatim for
/// compatibility; deployments can still swap the map out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeMap {
    pub refund_codes: Vec<String>,
    pub success_codes: Vec<String>,
}

impl Default for CodeMap {
    fn default() -> Self {
        Self {
            refund_codes: vec!["040".to_string(), "016".to_string()],
            success_codes: vec!["000".to_string()],
        }
    }
}

impl CodeMap {
    fn classify(&self, code: &str) -> Trigger {
        if self.refund_codes.iter().any(|c| c == code) {
            Trigger::Refund
        } else if self.success_codes.iter().any(|c| c == code) {
            Trigger::Success
        } else {
            Trigger::Ignore
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Refund,
    Success,
    Ignore,
}

/// One candidate for resolving the local transaction from a provider event.
/// Candidates are tried strictly in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceCandidate {
    /// Match against the transaction's own `tx_ref`.
    TxRef(String),
    /// Match against a string field of the transaction metadata.
    MetaRef { key: String, value: String },
}

/// What the provider reported: an explicit status string or a terminal code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementSignal {
    Status(String),
    Code(String),
}

/// A provider webhook reduced to the parts reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub references: Vec<ReferenceCandidate>,
    pub signal: SettlementSignal,
}

/// Result of reconciling one webhook. The HTTP-style status is for
/// observability only; providers retry on 5xx per standard semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A terminal transition was applied.
    Updated,
    /// The webhook was recognized but carried no actionable code or status.
    Acknowledged,
    /// The transaction already reached a terminal status; nothing changed.
    AlreadyCompleted,
    TransactionNotFound,
    UserNotFound,
    InternalError,
}

impl ReconcileOutcome {
    pub fn updated(&self) -> bool {
        matches!(self, ReconcileOutcome::Updated)
    }

    pub fn http_status(&self) -> u16 {
        match self {
            ReconcileOutcome::Updated | ReconcileOutcome::Acknowledged => 200,
            ReconcileOutcome::AlreadyCompleted => 400,
            ReconcileOutcome::TransactionNotFound | ReconcileOutcome::UserNotFound => 404,
            ReconcileOutcome::InternalError => 500,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ReconcileOutcome::Updated | ReconcileOutcome::Acknowledged => {
                "Transaction updated successfully"
            }
            ReconcileOutcome::AlreadyCompleted => {
                "Transaction with this reference has already been completed."
            }
            ReconcileOutcome::TransactionNotFound => {
                "Transaction with this reference not found."
            }
            ReconcileOutcome::UserNotFound => "User not found.",
            ReconcileOutcome::InternalError => "Internal server error",
        }
    }
}

/// Applies inbound payment-status webhooks to transaction and balance state.
///
/// Settlement goes through the store's conditional transition, so a webhook
/// delivered twice (or two racing deliveries for the same reference) credits
/// the user at most once: the transaction is claimed first, and only the
/// claim winner touches the balance.
pub struct WebhookReconciler {
    users: UserStoreRef,
    transactions: TransactionStoreRef,
    codes: CodeMap,
}

impl WebhookReconciler {
    pub fn new(users: UserStoreRef, transactions: TransactionStoreRef) -> Self {
        Self {
            users,
            transactions,
            codes: CodeMap::default(),
        }
    }

    pub fn with_code_map(mut self, codes: CodeMap) -> Self {
        self.codes = codes;
        self
    }

    #[instrument(skip(self, event))]
    pub async fn reconcile(&self, event: &WebhookEvent) -> ReconcileOutcome {
        match self.apply(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("webhook reconciliation failed: {e}");
                ReconcileOutcome::InternalError
            }
        }
    }

    async fn apply(&self, event: &WebhookEvent) -> Result<ReconcileOutcome> {
        let Some(tx) = self.resolve(&event.references).await? else {
            return Ok(ReconcileOutcome::TransactionNotFound);
        };

        // Webhooks may be delivered more than once; anything after the first
        // terminal transition is ignorable by contract.
        if tx.status.is_terminal() {
            return Ok(ReconcileOutcome::AlreadyCompleted);
        }

        match self.classify(&event.signal) {
            Trigger::Refund => self.refund(tx).await,
            Trigger::Success => {
                match self
                    .transactions
                    .settle(&tx.tx_ref, TransactionStatus::Success)
                    .await?
                {
                    SettleOutcome::Applied(settled) => {
                        info!(tx_ref = %settled.tx_ref, "transaction settled as success");
                        Ok(ReconcileOutcome::Updated)
                    }
                    SettleOutcome::AlreadyTerminal(_) => Ok(ReconcileOutcome::AlreadyCompleted),
                    SettleOutcome::Missing => Ok(ReconcileOutcome::TransactionNotFound),
                }
            }
            Trigger::Ignore => Ok(ReconcileOutcome::Acknowledged),
        }
    }

    async fn refund(&self, tx: Transaction) -> Result<ReconcileOutcome> {
        if self.users.get(tx.user_id).await?.is_none() {
            return Ok(ReconcileOutcome::UserNotFound);
        }

        // Claim the transition before crediting: of two racing deliveries,
        // only the one that wins the settle may touch the balance.
        match self
            .transactions
            .settle(&tx.tx_ref, TransactionStatus::Refunded)
            .await?
        {
            SettleOutcome::Applied(settled) => {
                if self
                    .users
                    .credit(settled.user_id, settled.amount)
                    .await?
                    .is_none()
                {
                    return Ok(ReconcileOutcome::UserNotFound);
                }
                info!(tx_ref = %settled.tx_ref, "transaction refunded, balance credited");
                Ok(ReconcileOutcome::Updated)
            }
            SettleOutcome::AlreadyTerminal(_) => Ok(ReconcileOutcome::AlreadyCompleted),
            SettleOutcome::Missing => Ok(ReconcileOutcome::TransactionNotFound),
        }
    }

    async fn resolve(&self, references: &[ReferenceCandidate]) -> Result<Option<Transaction>> {
        for candidate in references {
            let found = match candidate {
                ReferenceCandidate::TxRef(value) => {
                    self.transactions.get_by_tx_ref(value).await?
                }
                ReferenceCandidate::MetaRef { key, value } => {
                    self.transactions.get_by_meta_ref(key, value).await?
                }
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }

    fn classify(&self, signal: &SettlementSignal) -> Trigger {
        match signal {
            SettlementSignal::Status(status) => {
                if status == FAILED_STATUS {
                    Trigger::Refund
                } else {
                    Trigger::Ignore
                }
            }
            SettlementSignal::Code(code) => self.codes.classify(code),
        }
    }
}
