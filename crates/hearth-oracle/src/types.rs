use chrono::{DateTime, Utc};
use hearth_core::types::{DomainId, PhaseId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// ConversationMode
// ---------------------------------------------------------------------------

/// What kind of conversation the oracle should run. Always carried
/// explicitly on the wire; the oracle never infers it from prior state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConversationMode {
    /// Elicit the two domains of one onboarding phase. `previous_domains`
    /// seeds the oracle with data gathered in earlier phases.
    Onboarding {
        phase_id: PhaseId,
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        previous_domains: Map<String, Value>,
    },
    /// Revisit a single existing domain, seeded with its current value.
    Refresh {
        domain_id: DomainId,
        #[serde(default, skip_serializing_if = "Value::is_null")]
        current_domain_data: Value,
    },
}

impl ConversationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationMode::Onboarding { .. } => "onboarding",
            ConversationMode::Refresh { .. } => "refresh",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ConversationRequest {
    pub family_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Absent on the opening call; the oracle speaks first.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub mode: ConversationMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Question,
    Synthesis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub kind: ResponseKind,
    pub message: String,
    /// Present iff `kind` is `Synthesis`: domain id → structured value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_data: Option<Map<String, Value>>,
    pub turn_count: u32,
    pub min_turns: u32,
    pub max_turns: u32,
}

impl ConversationResponse {
    pub fn is_synthesis(&self) -> bool {
        self.kind == ResponseKind::Synthesis
    }

    /// Whether the user may nudge the oracle to synthesize now. The
    /// bounds are oracle-owned; clients only read them.
    pub fn past_minimum(&self) -> bool {
        self.turn_count >= self.min_turns
    }
}

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    Assistant,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Synthesis payload, present only on the terminal assistant turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<Map<String, Value>>,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            extracted_data: None,
        }
    }

    pub fn assistant(response: &ConversationResponse) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: response.message.clone(),
            timestamp: Utc::now(),
            extracted_data: if response.is_synthesis() {
                response.structured_data.clone()
            } else {
                None
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
