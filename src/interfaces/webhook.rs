use serde::{Deserialize, Serialize};

use crate::application::reconciler::{ReferenceCandidate, SettlementSignal, WebhookEvent};
use crate::domain::transaction::META_TRANSACTION_REF;
use crate::error::{Result, WalletError};

/// The only event type the code-based provider delivers to this surface.
pub const TRANSACTION_UPDATE: &str = "transaction-update";

/// Status-based provider payload. The customer reference takes priority over
/// the provider's own reference when resolving the local transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmePlugWebhook {
    pub transaction: SmePlugTransaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmePlugTransaction {
    pub status: String,
    pub reference: String,
    pub customer_reference: Option<String>,
}

impl SmePlugWebhook {
    pub fn into_event(self) -> WebhookEvent {
        let SmePlugTransaction {
            status,
            reference,
            customer_reference,
        } = self.transaction;

        let mut references = Vec::new();
        if let Some(customer_reference) = customer_reference {
            references.push(ReferenceCandidate::TxRef(customer_reference));
        }
        references.push(ReferenceCandidate::TxRef(reference));

        WebhookEvent {
            references,
            signal: SettlementSignal::Status(status),
        }
    }
}

/// Code-based provider payload. `request_id` is matched against the local
/// `tx_ref` first, then against the provider reference kept in transaction
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtPassWebhook {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: VtPassData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VtPassData {
    pub code: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
}

impl VtPassWebhook {
    pub fn into_event(self) -> Result<WebhookEvent> {
        if self.kind != TRANSACTION_UPDATE {
            return Err(WalletError::ValidationError(
                "Invalid webhook type.".to_string(),
            ));
        }

        let VtPassData { code, request_id } = self.data;
        Ok(WebhookEvent {
            references: vec![
                ReferenceCandidate::TxRef(request_id.clone()),
                ReferenceCandidate::MetaRef {
                    key: META_TRANSACTION_REF.to_string(),
                    value: request_id,
                },
            ],
            signal: SettlementSignal::Code(code),
        })
    }
}

/// A webhook from either provider, tagged by origin for replay streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingWebhook {
    SmePlug(SmePlugWebhook),
    VtPass(VtPassWebhook),
}

impl IncomingWebhook {
    pub fn into_event(self) -> Result<WebhookEvent> {
        match self {
            IncomingWebhook::SmePlug(payload) => Ok(payload.into_event()),
            IncomingWebhook::VtPass(payload) => payload.into_event(),
        }
    }
}
