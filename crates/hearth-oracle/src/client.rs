use crate::error::OracleError;
use crate::types::{ConversationRequest, ConversationResponse};
use crate::Result;
use async_trait::async_trait;
use hearth_core::config::OracleConfig;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Oracle trait
// ---------------------------------------------------------------------------

/// One conversational exchange with the synthesis oracle. Implementations
/// are stateless per call; all conversation state travels in the request.
#[async_trait]
pub trait Oracle: Send + Sync {
    async fn converse(&self, request: &ConversationRequest) -> Result<ConversationResponse>;
}

// ---------------------------------------------------------------------------
// HttpOracle
// ---------------------------------------------------------------------------

/// Oracle backed by an HTTP endpoint speaking the JSON wire protocol.
pub struct HttpOracle {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpOracle {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(u64::from(config.timeout_seconds)))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn converse(&self, request: &ConversationRequest) -> Result<ConversationResponse> {
        tracing::debug!(
            mode = request.mode.as_str(),
            conversation = request.conversation_id.as_deref().unwrap_or("<new>"),
            "oracle request"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(OracleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: ConversationResponse =
            serde_json::from_str(&body).map_err(|source| OracleError::Parse { body, source })?;
        tracing::debug!(
            conversation = %parsed.conversation_id,
            kind = ?parsed.kind,
            turn = parsed.turn_count,
            "oracle response"
        );
        Ok(parsed)
    }
}
