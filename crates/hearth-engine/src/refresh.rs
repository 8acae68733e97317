use crate::error::EngineError;
use crate::phase::EngineState;
use crate::review::SynthesisReview;
use crate::Result;
use hearth_core::manual::{empty_domain_value, Manual};
use hearth_core::types::{DomainId, UpdateSource};
use hearth_oracle::{ConversationMode, ConversationResponse, ConversationSession, Oracle};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// RefreshEngine
// ---------------------------------------------------------------------------

/// Single-domain analogue of the phase engine: `Conversation → Review →
/// Done`. Revisits one existing domain without any phase bookkeeping.
pub struct RefreshEngine {
    root: PathBuf,
    manual_id: String,
    domain: DomainId,
    session: ConversationSession,
    review: Option<SynthesisReview>,
    done: bool,
}

impl RefreshEngine {
    /// Open a refresh conversation seeded with the domain's current
    /// value, so the oracle asks about what changed rather than starting
    /// over.
    pub async fn start(
        root: &Path,
        manual_id: &str,
        domain: DomainId,
        oracle: &dyn Oracle,
    ) -> Result<Self> {
        let manual = Manual::load(root, manual_id)?;
        let current = manual
            .domains
            .get(&domain)
            .cloned()
            .unwrap_or_else(|| empty_domain_value(domain));

        let mut session = ConversationSession::new(
            ConversationMode::Refresh {
                domain_id: domain,
                current_domain_data: current,
            },
            manual.family_id.clone(),
        );
        session.start(oracle).await?;
        tracing::info!(%domain, manual = manual_id, "refresh conversation started");

        Ok(Self {
            root: root.to_path_buf(),
            manual_id: manual_id.to_string(),
            domain,
            session,
            review: None,
            done: false,
        })
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        if self.done {
            EngineState::Finished
        } else if self.review.is_some() {
            EngineState::Review
        } else {
            EngineState::Conversation
        }
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn review(&self) -> Option<&SynthesisReview> {
        self.review.as_ref()
    }

    // ---------------------------------------------------------------------------
    // Conversation
    // ---------------------------------------------------------------------------

    pub async fn send_turn(
        &mut self,
        oracle: &dyn Oracle,
        text: &str,
    ) -> Result<ConversationResponse> {
        if self.done {
            return Err(EngineError::Finished);
        }
        let response = self.session.send(oracle, text).await?.clone();
        self.maybe_enter_review(&response)?;
        Ok(response)
    }

    pub async fn request_synthesis(&mut self, oracle: &dyn Oracle) -> Result<ConversationResponse> {
        if self.done {
            return Err(EngineError::Finished);
        }
        let response = self.session.request_synthesis(oracle).await?.clone();
        self.maybe_enter_review(&response)?;
        Ok(response)
    }

    fn maybe_enter_review(&mut self, response: &ConversationResponse) -> Result<()> {
        if !response.is_synthesis() {
            return Ok(());
        }
        let payload = response
            .structured_data
            .clone()
            .ok_or(EngineError::EmptySynthesis)?;
        self.review = Some(SynthesisReview::new(response.message.clone(), payload));
        tracing::info!(domain = %self.domain, "synthesis received, entering review");
        Ok(())
    }

    // ---------------------------------------------------------------------------
    // Review
    // ---------------------------------------------------------------------------

    pub fn request_edit(&mut self) -> Result<()> {
        self.review
            .as_mut()
            .ok_or(EngineError::NotInReview)?
            .begin_edit();
        Ok(())
    }

    pub fn cancel_edit(&mut self) -> Result<()> {
        self.review
            .as_mut()
            .ok_or(EngineError::NotInReview)?
            .cancel_edit();
        Ok(())
    }

    pub fn set_domain(&mut self, value: serde_json::Value) -> Result<()> {
        self.review
            .as_mut()
            .ok_or(EngineError::NotInReview)?
            .set_domain(self.domain, value)
    }

    /// Persist the refreshed domain. The payload is filtered to the
    /// target domain's key, so a stray extra key from the oracle can
    /// never touch another domain. On failure the review stays intact
    /// with the attempted edit still displayed.
    pub fn approve(&mut self) -> Result<()> {
        let review = self.review.as_ref().ok_or(EngineError::NotInReview)?;
        let value = review
            .approved_payload()
            .get(self.domain.as_str())
            .cloned()
            .ok_or(EngineError::EmptySynthesis)?;

        let mut manual = Manual::load(&self.root, &self.manual_id)?;
        manual.update_domain(self.domain, value, UpdateSource::Refresh);
        manual.save(&self.root)?;

        self.review = None;
        self.done = true;
        tracing::info!(domain = %self.domain, manual = %self.manual_id, "domain refreshed");
        Ok(())
    }
}
