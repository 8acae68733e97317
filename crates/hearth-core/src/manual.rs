use crate::error::{HearthError, Result};
use crate::paths;
use crate::types::{DomainId, PhaseId, UpdateSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualKind {
    Household,
    Individual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainMeta {
    pub updated_at: DateTime<Utc>,
    pub updated_by: UpdateSource,
}

/// How recently a domain was updated. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessLabel {
    Fresh,
    Aging,
    Stale,
}

impl fmt::Display for FreshnessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FreshnessLabel::Fresh => "fresh",
            FreshnessLabel::Aging => "aging",
            FreshnessLabel::Stale => "stale",
        };
        f.write_str(s)
    }
}

impl FreshnessLabel {
    pub fn from_age(age: chrono::Duration) -> Self {
        if age.num_days() < 30 {
            FreshnessLabel::Fresh
        } else if age.num_days() < 90 {
            FreshnessLabel::Aging
        } else {
            FreshnessLabel::Stale
        }
    }
}

/// The empty default value for a domain that has not been elicited yet.
/// Domains are always present in a manual, never absent.
pub fn empty_domain_value(domain: DomainId) -> Value {
    match domain {
        DomainId::Values => json!({
            "values": [],
            "identity_statements": [],
            "non_negotiables": [],
            "narratives": [],
        }),
        DomainId::Communication => json!({
            "strengths": [],
            "patterns": [],
            "challenges": [],
            "repair_strategies": [],
            "goals": [],
        }),
        DomainId::Connection => json!({
            "rituals": [],
            "bonding_activities": [],
            "strengths": [],
            "challenges": [],
            "goals": [],
        }),
        DomainId::Roles => json!({
            "assignments": [],
            "decision_areas": [],
            "pain_points": [],
            "goals": [],
        }),
        DomainId::Organization => json!({
            "spaces": [],
            "systems": [],
            "routines": [],
            "pain_points": [],
            "goals": [],
        }),
        DomainId::Adaptability => json!({
            "stressors": [],
            "coping_strategies": [],
            "strengths": [],
            "challenges": [],
            "goals": [],
        }),
        DomainId::ProblemSolving => json!({
            "decision_style": "",
            "conflict_patterns": [],
            "strengths": [],
            "challenges": [],
            "goals": [],
        }),
        DomainId::Resources => json!({
            "principles": [],
            "tensions": [],
            "strengths": [],
            "challenges": [],
            "goals": [],
        }),
    }
}

// ---------------------------------------------------------------------------
// Manual
// ---------------------------------------------------------------------------

/// The persistent aggregate: every domain of one household or individual,
/// each a free-form structured value with its own update metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manual {
    pub manual_id: String,
    pub family_id: String,
    pub kind: ManualKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub domains: BTreeMap<DomainId, Value>,
    #[serde(default)]
    pub domain_meta: BTreeMap<DomainId, DomainMeta>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Manual {
    pub fn new(family_id: impl Into<String>, kind: ManualKind, title: impl Into<String>) -> Self {
        let now = Utc::now();
        let domains = DomainId::all()
            .iter()
            .map(|&d| (d, empty_domain_value(d)))
            .collect();
        Self {
            manual_id: format!("m-{}", uuid::Uuid::new_v4()),
            family_id: family_id.into(),
            kind,
            person_id: None,
            title: title.into(),
            subtitle: None,
            domains,
            domain_meta: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ---------------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------------

    pub fn create(
        root: &Path,
        family_id: impl Into<String>,
        kind: ManualKind,
        title: impl Into<String>,
    ) -> Result<Self> {
        let manual = Self::new(family_id, kind, title);
        if paths::manual_dir(root, &manual.manual_id).exists() {
            return Err(HearthError::ManualExists(manual.manual_id));
        }
        manual.save(root)?;
        Ok(manual)
    }

    pub fn load(root: &Path, manual_id: &str) -> Result<Self> {
        paths::validate_id(manual_id)?;
        let path = paths::manual_path(root, manual_id);
        if !path.exists() {
            return Err(HearthError::ManualNotFound(manual_id.to_string()));
        }
        let data = std::fs::read_to_string(&path)?;
        let mut manual: Manual = serde_yaml::from_str(&data)?;
        // Older documents may predate a domain; backfill its empty default.
        for &domain in DomainId::all() {
            manual
                .domains
                .entry(domain)
                .or_insert_with(|| empty_domain_value(domain));
        }
        Ok(manual)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::manual_path(root, &self.manual_id);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn list(root: &Path) -> Result<Vec<Self>> {
        let manuals_dir = root.join(paths::MANUALS_DIR);
        if !manuals_dir.exists() {
            return Ok(Vec::new());
        }

        let mut manuals = Vec::new();
        for entry in std::fs::read_dir(&manuals_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let id = entry.file_name().to_string_lossy().into_owned();
                match Self::load(root, &id) {
                    Ok(m) => manuals.push(m),
                    // stray directories are not manuals
                    Err(HearthError::ManualNotFound(_) | HearthError::InvalidId(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        manuals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(manuals)
    }

    // ---------------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------------

    /// Replace one domain's value and stamp its metadata. No other domain
    /// is touched.
    pub fn update_domain(&mut self, domain: DomainId, value: Value, source: UpdateSource) {
        let now = Utc::now();
        self.domains.insert(domain, value);
        self.domain_meta.insert(
            domain,
            DomainMeta {
                updated_at: now,
                updated_by: source,
            },
        );
        self.updated_at = now;
        tracing::debug!(%domain, %source, "domain updated");
    }

    /// Write the domains of `phase` that are present in `payload`, leaving
    /// absent domains untouched. Payload keys outside the phase's two
    /// domains are ignored.
    pub fn apply_phase_data(
        &mut self,
        phase: PhaseId,
        payload: &Map<String, Value>,
        source: UpdateSource,
    ) {
        for domain in phase.domains() {
            if let Some(value) = payload.get(domain.as_str()) {
                self.update_domain(domain, value.clone(), source);
            }
        }
    }

    // ---------------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------------

    /// Age of a domain's data: time since its last update, or since the
    /// manual's creation when it was never elicited.
    pub fn domain_age(&self, domain: DomainId, now: DateTime<Utc>) -> chrono::Duration {
        let updated = self
            .domain_meta
            .get(&domain)
            .map(|m| m.updated_at)
            .unwrap_or(self.created_at);
        now - updated
    }

    pub fn domain_freshness(&self, domain: DomainId, now: DateTime<Utc>) -> FreshnessLabel {
        FreshnessLabel::from_age(self.domain_age(domain, now))
    }

    /// Domain values for every domain covered by the given completed phases,
    /// used to seed later conversations with earlier answers.
    pub fn domains_for_phases(&self, phases: &[PhaseId]) -> Map<String, Value> {
        let mut out = Map::new();
        for phase in phases {
            for domain in phase.domains() {
                if let Some(value) = self.domains.get(&domain) {
                    out.insert(domain.as_str().to_string(), value.clone());
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
