use crate::error::{HearthError, Result};
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// LayerId
// ---------------------------------------------------------------------------

/// One layer of the journey, worked top-down: values first, triggers last.
/// Declaration order is journey order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerId {
    ValuesPrinciples,
    OutputsGrowth,
    ExecutionStrategies,
    MemoryStructure,
    ProcessingRegulation,
    InputsTriggers,
}

impl LayerId {
    pub fn all() -> &'static [LayerId] {
        &[
            LayerId::ValuesPrinciples,
            LayerId::OutputsGrowth,
            LayerId::ExecutionStrategies,
            LayerId::MemoryStructure,
            LayerId::ProcessingRegulation,
            LayerId::InputsTriggers,
        ]
    }

    /// Layer number, 6 (values) down to 1 (triggers).
    pub fn number(self) -> u8 {
        6 - self as u8
    }

    pub fn from_number(n: u8) -> Result<LayerId> {
        match n {
            6 => Ok(LayerId::ValuesPrinciples),
            5 => Ok(LayerId::OutputsGrowth),
            4 => Ok(LayerId::ExecutionStrategies),
            3 => Ok(LayerId::MemoryStructure),
            2 => Ok(LayerId::ProcessingRegulation),
            1 => Ok(LayerId::InputsTriggers),
            _ => Err(HearthError::InvalidLayer(n)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerId::ValuesPrinciples => "Values & Principles",
            LayerId::OutputsGrowth => "Outputs & Growth",
            LayerId::ExecutionStrategies => "Execution & Strategies",
            LayerId::MemoryStructure => "Memory & Structure",
            LayerId::ProcessingRegulation => "Processing & Co-Regulation",
            LayerId::InputsTriggers => "Inputs & Triggers",
        }
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// LayerState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerState {
    pub status: LayerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl LayerState {
    fn new() -> Self {
        Self {
            status: LayerStatus::NotStarted,
            started_at: None,
            completed_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneId {
    FirstLayer,
    Halfway,
    Graduation,
}

impl MilestoneId {
    pub fn all() -> &'static [MilestoneId] {
        &[
            MilestoneId::FirstLayer,
            MilestoneId::Halfway,
            MilestoneId::Graduation,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneId::FirstLayer => "first_layer",
            MilestoneId::Halfway => "halfway",
            MilestoneId::Graduation => "graduation",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MilestoneId::FirstLayer => "Foundation Set",
            MilestoneId::Halfway => "Halfway There",
            MilestoneId::Graduation => "Ready to Breathe",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            MilestoneId::FirstLayer => "Completed the values layer",
            MilestoneId::Halfway => "Completed three of six layers",
            MilestoneId::Graduation => "Completed every layer of the journey",
        }
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achieved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub acknowledged: bool,
}

// ---------------------------------------------------------------------------
// JourneyProgress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Household,
    Person,
}

/// Layer-by-layer journey progress for one manual, independent of the
/// phase engine. Terminal state is graduation, after which the journey
/// view is bypassed in favor of the living document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyProgress {
    pub manual_id: String,
    pub family_id: String,
    pub subject_kind: SubjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub layers: BTreeMap<LayerId, LayerState>,
    pub completed_layers: Vec<LayerId>,
    pub milestones: Vec<Milestone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graduated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl JourneyProgress {
    pub fn new(
        manual_id: impl Into<String>,
        family_id: impl Into<String>,
        subject_kind: SubjectKind,
        subject_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let layers = LayerId::all().iter().map(|&l| (l, LayerState::new())).collect();
        let milestones = MilestoneId::all()
            .iter()
            .map(|&id| Milestone {
                id,
                achieved_at: None,
                acknowledged: false,
            })
            .collect();
        Self {
            manual_id: manual_id.into(),
            family_id: family_id.into(),
            subject_kind,
            subject_id,
            started_at: now,
            layers,
            completed_layers: Vec::new(),
            milestones,
            graduated_at: None,
            updated_at: now,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn initialize(
        root: &Path,
        manual_id: &str,
        family_id: &str,
        subject_kind: SubjectKind,
        subject_id: Option<String>,
    ) -> Result<Self> {
        paths::validate_id(manual_id)?;
        if paths::journey_path(root, manual_id).exists() {
            return Err(HearthError::JourneyExists(manual_id.to_string()));
        }
        let journey = Self::new(manual_id, family_id, subject_kind, subject_id);
        journey.save(root)?;
        Ok(journey)
    }

    pub fn load(root: &Path, manual_id: &str) -> Result<Self> {
        paths::validate_id(manual_id)?;
        let path = paths::journey_path(root, manual_id);
        if !path.exists() {
            return Err(HearthError::JourneyNotFound(manual_id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let journey: JourneyProgress = serde_yaml::from_str(&data)?;
        Ok(journey)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::journey_path(root, &self.manual_id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // ---------------------------------------------------------------------------
    // Layer operations
    // ---------------------------------------------------------------------------

    /// First layer in journey order not yet completed.
    pub fn current_layer(&self) -> Option<LayerId> {
        LayerId::all()
            .iter()
            .copied()
            .find(|l| !self.completed_layers.contains(l))
    }

    pub fn layer_status(&self, layer: LayerId) -> LayerStatus {
        self.layers
            .get(&layer)
            .map(|s| s.status)
            .unwrap_or(LayerStatus::NotStarted)
    }

    pub fn start_layer(&mut self, layer: LayerId) -> Result<()> {
        let now = Utc::now();
        let state = self.layers.entry(layer).or_insert_with(LayerState::new);
        match state.status {
            LayerStatus::NotStarted => {
                state.status = LayerStatus::InProgress;
                state.started_at = Some(now);
                self.updated_at = now;
                tracing::debug!(%layer, "layer started");
                Ok(())
            }
            LayerStatus::InProgress => Ok(()),
            LayerStatus::Completed => Err(HearthError::InvalidTransition {
                from: "completed".to_string(),
                to: "in_progress".to_string(),
                reason: format!("layer {layer} is already complete"),
            }),
        }
    }

    /// Complete a layer, then run milestone checks against the new state.
    pub fn complete_layer(&mut self, layer: LayerId) -> Result<Vec<MilestoneId>> {
        let now = Utc::now();
        let state = self.layers.entry(layer).or_insert_with(LayerState::new);
        if state.status != LayerStatus::Completed {
            state.status = LayerStatus::Completed;
            state.completed_at = Some(now);
            if state.started_at.is_none() {
                state.started_at = Some(now);
            }
        }
        if !self.completed_layers.contains(&layer) {
            self.completed_layers.push(layer);
        }
        self.updated_at = now;
        tracing::info!(%layer, completed = self.completed_layers.len(), "layer completed");
        Ok(self.check_milestones())
    }

    // ---------------------------------------------------------------------------
    // Milestone operations
    // ---------------------------------------------------------------------------

    fn milestone_achieved(&self, id: MilestoneId) -> bool {
        self.milestones
            .iter()
            .any(|m| m.id == id && m.achieved_at.is_some())
    }

    fn trigger_holds(&self, id: MilestoneId) -> bool {
        match id {
            MilestoneId::FirstLayer => {
                self.layer_status(LayerId::ValuesPrinciples) == LayerStatus::Completed
            }
            MilestoneId::Halfway => self.completed_layers.len() >= 3,
            MilestoneId::Graduation => self.completed_layers.len() == LayerId::all().len(),
        }
    }

    /// Achieve any milestone whose trigger now holds. Returns the newly
    /// achieved ids so callers can surface celebrations.
    pub fn check_milestones(&mut self) -> Vec<MilestoneId> {
        let now = Utc::now();
        let mut achieved = Vec::new();
        for i in 0..self.milestones.len() {
            let id = self.milestones[i].id;
            if self.milestones[i].achieved_at.is_none() && self.trigger_holds(id) {
                self.milestones[i].achieved_at = Some(now);
                achieved.push(id);
            }
        }
        if !achieved.is_empty() {
            self.updated_at = now;
        }
        achieved
    }

    /// Mark a milestone's celebration as seen. Acknowledging an already
    /// acknowledged milestone is a no-op, not an error.
    pub fn acknowledge_milestone(&mut self, id: MilestoneId) {
        let now = Utc::now();
        for m in &mut self.milestones {
            if m.id == id && !m.acknowledged {
                m.acknowledged = true;
                if m.achieved_at.is_none() {
                    m.achieved_at = Some(now);
                }
                self.updated_at = now;
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Graduation
    // ---------------------------------------------------------------------------

    pub fn is_graduated(&self) -> bool {
        self.graduated_at.is_some()
    }

    pub fn can_graduate(&self) -> bool {
        !self.is_graduated() && self.completed_layers.len() == LayerId::all().len()
    }

    /// One-way transition. After graduation the journey view is bypassed
    /// for this manual.
    pub fn graduate(&mut self) -> Result<()> {
        if self.is_graduated() {
            return Err(HearthError::AlreadyGraduated);
        }
        if !self.can_graduate() {
            return Err(HearthError::NotReadyToGraduate(format!(
                "{} of {} layers complete",
                self.completed_layers.len(),
                LayerId::all().len()
            )));
        }
        let now = Utc::now();
        self.graduated_at = Some(now);
        for m in &mut self.milestones {
            if m.id == MilestoneId::Graduation && m.achieved_at.is_none() {
                m.achieved_at = Some(now);
            }
        }
        self.updated_at = now;
        tracing::info!(manual = %self.manual_id, "journey graduated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
