use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::domain::ports::{ProvisionRequest, ProviderResponse, VirtualAccountProvider};
use crate::error::{Result, WalletError};

/// One canned aggregator answer: either a wire response or a transport
/// failure before a response was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedResponse {
    Reply(ProviderResponse),
    TransportError(String),
}

/// Replays canned aggregator responses in order and records every request
/// it receives. Stands in for the account-provisioning aggregator in
/// replay runs and tests.
#[derive(Default)]
pub struct ScriptedAccountProvider {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    calls: Mutex<Vec<ProvisionRequest>>,
}

impl ScriptedAccountProvider {
    pub fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, response: ScriptedResponse) {
        self.responses
            .lock()
            .expect("scripted responses lock poisoned")
            .push_back(response);
    }

    /// Requests seen so far, in call order.
    pub fn calls(&self) -> Vec<ProvisionRequest> {
        self.calls
            .lock()
            .expect("scripted calls lock poisoned")
            .clone()
    }
}

#[async_trait]
impl VirtualAccountProvider for ScriptedAccountProvider {
    async fn create_virtual_account(&self, request: &ProvisionRequest) -> Result<ProviderResponse> {
        self.calls
            .lock()
            .expect("scripted calls lock poisoned")
            .push(request.clone());

        let next = self
            .responses
            .lock()
            .expect("scripted responses lock poisoned")
            .pop_front();

        match next {
            Some(ScriptedResponse::Reply(response)) => Ok(response),
            Some(ScriptedResponse::TransportError(message)) => {
                Err(WalletError::ProviderError(message))
            }
            None => Err(WalletError::ProviderError(
                "scripted provider has no responses left".to_string(),
            )),
        }
    }
}
