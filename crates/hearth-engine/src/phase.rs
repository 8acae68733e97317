use crate::error::EngineError;
use crate::review::SynthesisReview;
use crate::Result;
use hearth_core::config::Config;
use hearth_core::manual::Manual;
use hearth_core::status::OnboardingStatus;
use hearth_core::types::{DomainId, PhaseId, UpdateSource};
use hearth_oracle::{ConversationMode, ConversationResponse, ConversationSession, Oracle};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// EngineState / PhaseOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Conversation,
    Review,
    Finished,
}

/// Where the flow goes after a phase is approved, decided from the
/// post-completion phase set.
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    /// Below the launch threshold: continue straight into the next phase.
    AutoAdvance { next: PhaseId },
    /// Enough phases for launch: the user picks between continuing and
    /// launching with what they have.
    ChooseNext {
        next: PhaseId,
        remaining: Vec<PhaseId>,
    },
    /// Every phase is complete.
    Launch,
}

// ---------------------------------------------------------------------------
// PhaseEngine
// ---------------------------------------------------------------------------

/// Drives one onboarding phase end to end: oracle conversation, synthesis
/// review, persistence, and the advance decision.
///
/// `Conversation → Review → (AutoAdvance | ChooseNext | Launch)`. The
/// review step can dip into editing and back without restarting the
/// oracle session. Async methods take `&mut self`, so submissions are
/// serialized by construction.
pub struct PhaseEngine {
    root: PathBuf,
    config: Config,
    user_id: String,
    manual_id: String,
    phase: PhaseId,
    session: ConversationSession,
    review: Option<SynthesisReview>,
    finished: bool,
}

impl PhaseEngine {
    /// Open the phase conversation. Domain data from already-completed
    /// phases seeds the oracle so it builds on earlier answers.
    pub async fn start(
        root: &Path,
        config: Config,
        user_id: &str,
        manual_id: &str,
        phase: PhaseId,
        oracle: &dyn Oracle,
    ) -> Result<Self> {
        let manual = Manual::load(root, manual_id)?;
        let status = OnboardingStatus::load_or_new(root, user_id)?;
        let seed = manual.domains_for_phases(&status.phases_completed);

        let mut session = ConversationSession::new(
            ConversationMode::Onboarding {
                phase_id: phase,
                previous_domains: seed,
            },
            manual.family_id.clone(),
        );
        session.start(oracle).await?;
        tracing::info!(%phase, manual = manual_id, "phase conversation started");

        Ok(Self {
            root: root.to_path_buf(),
            config,
            user_id: user_id.to_string(),
            manual_id: manual_id.to_string(),
            phase,
            session,
            review: None,
            finished: false,
        })
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn state(&self) -> EngineState {
        if self.finished {
            EngineState::Finished
        } else if self.review.is_some() {
            EngineState::Review
        } else {
            EngineState::Conversation
        }
    }

    pub fn phase(&self) -> PhaseId {
        self.phase
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

    /// Forward one user message. The engine flips to `Review` the
    /// instant a synthesis arrives.
    pub async fn send_turn(
        &mut self,
        oracle: &dyn Oracle,
        text: &str,
    ) -> Result<ConversationResponse> {
        if self.finished {
            return Err(EngineError::Finished);
        }
        let response = self.session.send(oracle, text).await?.clone();
        self.maybe_enter_review(&response)?;
        Ok(response)
    }

    /// Nudge the oracle to synthesize now.
    pub async fn request_synthesis(&mut self, oracle: &dyn Oracle) -> Result<ConversationResponse> {
        if self.finished {
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
        tracing::info!(phase = %self.phase, "synthesis received, entering review");
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

    pub fn set_domain(&mut self, domain: DomainId, value: serde_json::Value) -> Result<()> {
        self.review
            .as_mut()
            .ok_or(EngineError::NotInReview)?
            .set_domain(domain, value)
    }

    /// Persist the approved synthesis and complete the phase.
    ///
    /// Only domains present in the approved payload are written, tagged
    /// as onboarding updates. The domain write happens before the phase
    /// completion, and completion is idempotent, so any failure leaves
    /// the review intact and re-approval safe.
    pub fn approve(&mut self) -> Result<PhaseOutcome> {
        let review = self.review.as_ref().ok_or(EngineError::NotInReview)?;
        let payload = review.approved_payload().clone();

        let mut manual = Manual::load(&self.root, &self.manual_id)?;
        manual.apply_phase_data(self.phase, &payload, UpdateSource::Onboarding);
        manual.save(&self.root)?;

        let mut status = OnboardingStatus::load_or_new(&self.root, &self.user_id)?;
        let completion = status.complete_phase(self.phase);
        status.set_manual(&self.manual_id);
        status.save(&self.root)?;

        self.review = None;
        self.finished = true;

        let outcome = match completion.next_phase {
            None => PhaseOutcome::Launch,
            Some(next)
                if completion.completed_phases.len()
                    >= self.config.onboarding.min_phases_for_launch =>
            {
                let remaining = PhaseId::all()
                    .iter()
                    .copied()
                    .filter(|p| !completion.completed_phases.contains(p))
                    .collect();
                PhaseOutcome::ChooseNext { next, remaining }
            }
            Some(next) => PhaseOutcome::AutoAdvance { next },
        };
        tracing::info!(phase = %self.phase, outcome = ?outcome, "phase approved");
        Ok(outcome)
    }
}
