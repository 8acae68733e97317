use crate::error::EngineError;
use crate::Result;
use hearth_core::types::DomainId;
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// SynthesisReview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Reviewing,
    Editing,
}

/// The oracle's synthesis held for user review before anything is
/// persisted. The original payload is never mutated; edits go to a
/// deep-cloned draft, so cancelling an edit restores the exact pre-edit
/// display.
#[derive(Debug, Clone)]
pub struct SynthesisReview {
    summary: String,
    original: Map<String, Value>,
    draft: Option<Map<String, Value>>,
}

impl SynthesisReview {
    pub fn new(summary: impl Into<String>, original: Map<String, Value>) -> Self {
        Self {
            summary: summary.into(),
            original,
            draft: None,
        }
    }

    pub fn state(&self) -> ReviewState {
        if self.draft.is_some() {
            ReviewState::Editing
        } else {
            ReviewState::Reviewing
        }
    }

    /// The oracle's conversational summary accompanying the payload.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn original(&self) -> &Map<String, Value> {
        &self.original
    }

    /// What the user currently sees: the draft while editing, the
    /// untouched original otherwise.
    pub fn display(&self) -> &Map<String, Value> {
        self.draft.as_ref().unwrap_or(&self.original)
    }

    /// Switch to editing. The draft starts as a structural copy of the
    /// original; beginning again while already editing keeps the
    /// in-progress draft.
    pub fn begin_edit(&mut self) {
        if self.draft.is_none() {
            self.draft = Some(self.original.clone());
        }
    }

    /// Discard the draft and return to reviewing. A no-op when not
    /// editing.
    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    /// Replace one domain's value in the draft.
    pub fn set_domain(&mut self, domain: DomainId, value: Value) -> Result<()> {
        let draft = self.draft.as_mut().ok_or(EngineError::NotEditing)?;
        draft.insert(domain.as_str().to_string(), value);
        Ok(())
    }

    /// Consume the review: `Some(draft)` when the user edited,
    /// `None` to signal the original payload should be used verbatim.
    /// Never a mix of the two.
    pub fn approve(self) -> Option<Map<String, Value>> {
        self.draft
    }

    /// Payload that approval would persist right now, without consuming
    /// the review. Lets callers attempt persistence and keep the review
    /// intact on failure.
    pub fn approved_payload(&self) -> &Map<String, Value> {
        self.display()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
