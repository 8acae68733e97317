use crate::client::Oracle;
use crate::error::OracleError;
use crate::types::{ConversationMode, ConversationRequest, ConversationResponse, Turn};
use crate::Result;
use serde_json::{Map, Value};

/// Message sent when the user asks the oracle to wrap up early. The
/// oracle treats it as a signal, not as transcript content to probe.
pub const SYNTHESIS_NUDGE: &str =
    "I think we've covered enough. Please pull together what you've learned so far.";

// ---------------------------------------------------------------------------
// ConversationSession
// ---------------------------------------------------------------------------

/// One conversation with the oracle, held as an explicit value rather
/// than ambient state. The session owns the transcript and enforces the
/// protocol: the oracle speaks first, turns then alternate, and a
/// synthesis turn is terminal.
///
/// `send` takes `&mut self`, so at most one call is in flight per
/// session and turns append in strict request order.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    mode: ConversationMode,
    family_id: String,
    conversation_id: Option<String>,
    turns: Vec<Turn>,
    last_response: Option<ConversationResponse>,
    error: Option<String>,
}

impl ConversationSession {
    pub fn new(mode: ConversationMode, family_id: impl Into<String>) -> Self {
        Self {
            mode,
            family_id: family_id.into(),
            conversation_id: None,
            turns: Vec::new(),
            last_response: None,
            error: None,
        }
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn mode(&self) -> &ConversationMode {
        &self.mode
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_response(&self) -> Option<&ConversationResponse> {
        self.last_response.as_ref()
    }

    /// Error string from the most recent failed call, cleared by the
    /// next successful one. The transcript up to the failure is kept so
    /// the user can retry without losing anything.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn started(&self) -> bool {
        !self.turns.is_empty()
    }

    /// Terminal state: the oracle has synthesized and the transcript is
    /// closed. The payload now goes through review, not more turns.
    pub fn awaiting_review(&self) -> bool {
        self.last_response
            .as_ref()
            .is_some_and(ConversationResponse::is_synthesis)
    }

    /// The synthesis payload, once the session is awaiting review.
    pub fn synthesis(&self) -> Option<&Map<String, Value>> {
        self.last_response
            .as_ref()
            .filter(|r| r.is_synthesis())
            .and_then(|r| r.structured_data.as_ref())
    }

    // ---------------------------------------------------------------------------
    // Protocol
    // ---------------------------------------------------------------------------

    /// Open the conversation. The oracle speaks first; its greeting
    /// becomes the first transcript turn.
    pub async fn start(&mut self, oracle: &dyn Oracle) -> Result<&ConversationResponse> {
        if self.started() {
            return Err(OracleError::AlreadyStarted);
        }
        let request = self.request(None);
        match oracle.converse(&request).await {
            Ok(response) => Ok(self.record(response)),
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Send one user message. The user turn is appended before the
    /// round-trip so the transcript reflects what was said even when the
    /// oracle is unreachable; on failure the error string is recorded
    /// and the session stays open for retry.
    pub async fn send(
        &mut self,
        oracle: &dyn Oracle,
        text: impl Into<String>,
    ) -> Result<&ConversationResponse> {
        if !self.started() {
            return Err(OracleError::NotStarted);
        }
        if self.awaiting_review() {
            return Err(OracleError::SessionComplete);
        }
        let text = text.into();
        self.turns.push(Turn::user(text.clone()));

        let request = self.request(Some(text));
        match oracle.converse(&request).await {
            Ok(response) => Ok(self.record(response)),
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Ask the oracle to synthesize now instead of asking more
    /// questions. Only meaningful once `past_minimum` holds on the last
    /// response; the oracle may still decline with another question.
    pub async fn request_synthesis(&mut self, oracle: &dyn Oracle) -> Result<&ConversationResponse> {
        self.send(oracle, SYNTHESIS_NUDGE).await
    }

    fn request(&self, message: Option<String>) -> ConversationRequest {
        ConversationRequest {
            family_id: self.family_id.clone(),
            conversation_id: self.conversation_id.clone(),
            message,
            mode: self.mode.clone(),
        }
    }

    fn record(&mut self, response: ConversationResponse) -> &ConversationResponse {
        self.error = None;
        self.conversation_id = Some(response.conversation_id.clone());
        self.turns.push(Turn::assistant(&response));
        self.last_response.insert(response)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
