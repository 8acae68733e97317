use crate::error::{HearthError, Result};
use crate::paths;
use crate::types::PhaseId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// PhaseCompletion
// ---------------------------------------------------------------------------

/// Result of the atomic complete-and-advance operation. Carries the
/// authoritative post-completion set so callers never recompute "what's
/// next" from state captured before the mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseCompletion {
    pub completed_phases: Vec<PhaseId>,
    pub next_phase: Option<PhaseId>,
}

// ---------------------------------------------------------------------------
// OnboardingStatus
// ---------------------------------------------------------------------------

/// Per-user onboarding progress. `phases_completed` is ordered by
/// completion and duplicate-free; `current_phase` is never a member of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingStatus {
    pub user_id: String,
    pub intro_completed: bool,
    pub phases_completed: Vec<PhaseId>,
    pub current_phase: Option<PhaseId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl OnboardingStatus {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            intro_completed: false,
            phases_completed: Vec::new(),
            current_phase: Some(PhaseId::Foundation),
            manual_id: None,
            updated_at: Utc::now(),
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn load(root: &Path, user_id: &str) -> Result<Self> {
        paths::validate_id(user_id)?;
        let path = paths::status_path(root, user_id);
        if !path.exists() {
            return Err(HearthError::StatusNotFound(user_id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let status: OnboardingStatus = serde_yaml::from_str(&data)?;
        Ok(status)
    }

    /// Load the user's status, creating a fresh one if none exists yet.
    pub fn load_or_new(root: &Path, user_id: &str) -> Result<Self> {
        match Self::load(root, user_id) {
            Ok(status) => Ok(status),
            Err(HearthError::StatusNotFound(_)) => Ok(Self::new(user_id)),
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::status_path(root, &self.user_id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Mark `phase` complete and advance. The next phase is computed from
    /// the post-mutation completed set, in fixed phase order, and both are
    /// returned so the caller acts on authoritative state. Idempotent:
    /// completing an already-completed phase does not duplicate it.
    pub fn complete_phase(&mut self, phase: PhaseId) -> PhaseCompletion {
        if !self.phases_completed.contains(&phase) {
            self.phases_completed.push(phase);
        }
        let next_phase = PhaseId::next_uncompleted(&self.phases_completed);

        self.intro_completed = true;
        self.current_phase = next_phase;
        self.updated_at = Utc::now();
        tracing::info!(%phase, completed = self.phases_completed.len(), "phase completed");

        PhaseCompletion {
            completed_phases: self.phases_completed.clone(),
            next_phase,
        }
    }

    pub fn set_manual(&mut self, manual_id: impl Into<String>) {
        self.manual_id = Some(manual_id.into());
        self.updated_at = Utc::now();
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    pub fn is_phase_complete(&self, phase: PhaseId) -> bool {
        self.phases_completed.contains(&phase)
    }

    /// Onboarding counts as complete once the minimum phase count is met.
    pub fn is_onboarding_complete(&self, min_phases: usize) -> bool {
        self.phases_completed.len() >= min_phases
    }

    pub fn next_phase(&self) -> Option<PhaseId> {
        PhaseId::next_uncompleted(&self.phases_completed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
