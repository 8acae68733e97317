use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// PhaseId
// ---------------------------------------------------------------------------

/// One onboarding phase. Each phase elicits exactly two domains in a single
/// conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Foundation,
    Relationships,
    Operations,
    Strategy,
}

impl PhaseId {
    pub fn all() -> &'static [PhaseId] {
        &[
            PhaseId::Foundation,
            PhaseId::Relationships,
            PhaseId::Operations,
            PhaseId::Strategy,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<PhaseId> {
        let all = PhaseId::all();
        let i = self.index();
        all.get(i + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseId::Foundation => "foundation",
            PhaseId::Relationships => "relationships",
            PhaseId::Operations => "operations",
            PhaseId::Strategy => "strategy",
        }
    }

    /// The two domains this phase covers. Fixed table: every domain belongs
    /// to exactly one phase.
    pub fn domains(self) -> [DomainId; 2] {
        match self {
            PhaseId::Foundation => [DomainId::Values, DomainId::Communication],
            PhaseId::Relationships => [DomainId::Connection, DomainId::Roles],
            PhaseId::Operations => [DomainId::Organization, DomainId::Adaptability],
            PhaseId::Strategy => [DomainId::ProblemSolving, DomainId::Resources],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseId::Foundation => "Foundation",
            PhaseId::Relationships => "Relationships",
            PhaseId::Operations => "Operations",
            PhaseId::Strategy => "Strategy",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PhaseId::Foundation => "Your values, identity, and how you communicate",
            PhaseId::Relationships => "How you connect and share responsibilities",
            PhaseId::Operations => "Your spaces, systems, and how you handle change",
            PhaseId::Strategy => "How you solve problems and manage resources",
        }
    }

    /// The first phase in fixed order not present in `completed`.
    pub fn next_uncompleted(completed: &[PhaseId]) -> Option<PhaseId> {
        PhaseId::all().iter().copied().find(|p| !completed.contains(p))
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PhaseId {
    type Err = crate::error::HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "foundation" => Ok(PhaseId::Foundation),
            "relationships" => Ok(PhaseId::Relationships),
            "operations" => Ok(PhaseId::Operations),
            "strategy" => Ok(PhaseId::Strategy),
            _ => Err(crate::error::HearthError::InvalidPhase(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DomainId
// ---------------------------------------------------------------------------

/// One named facet of a manual, holding a structured, domain-specific value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainId {
    Values,
    Communication,
    Connection,
    Roles,
    Organization,
    Adaptability,
    ProblemSolving,
    Resources,
}

impl DomainId {
    pub fn all() -> &'static [DomainId] {
        &[
            DomainId::Values,
            DomainId::Communication,
            DomainId::Connection,
            DomainId::Roles,
            DomainId::Organization,
            DomainId::Adaptability,
            DomainId::ProblemSolving,
            DomainId::Resources,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DomainId::Values => "values",
            DomainId::Communication => "communication",
            DomainId::Connection => "connection",
            DomainId::Roles => "roles",
            DomainId::Organization => "organization",
            DomainId::Adaptability => "adaptability",
            DomainId::ProblemSolving => "problem_solving",
            DomainId::Resources => "resources",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DomainId::Values => "Values & Identity",
            DomainId::Communication => "Communication",
            DomainId::Connection => "Connection",
            DomainId::Roles => "Roles & Responsibilities",
            DomainId::Organization => "Organization & Spaces",
            DomainId::Adaptability => "Adaptability",
            DomainId::ProblemSolving => "Problem Solving",
            DomainId::Resources => "Resource Management",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DomainId::Values => "What we believe, who we are, what matters most",
            DomainId::Communication => "How we talk, listen, and repair",
            DomainId::Connection => "Emotional bonds, rituals, and quality time",
            DomainId::Roles => "Who does what and how decisions get made",
            DomainId::Organization => "Physical spaces, systems, and routines",
            DomainId::Adaptability => "How we handle change, stress, and transitions",
            DomainId::ProblemSolving => "How we face challenges and resolve conflicts",
            DomainId::Resources => "How we manage money, time, and energy",
        }
    }

    /// The phase that elicits this domain.
    pub fn phase(self) -> PhaseId {
        match self {
            DomainId::Values | DomainId::Communication => PhaseId::Foundation,
            DomainId::Connection | DomainId::Roles => PhaseId::Relationships,
            DomainId::Organization | DomainId::Adaptability => PhaseId::Operations,
            DomainId::ProblemSolving | DomainId::Resources => PhaseId::Strategy,
        }
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DomainId {
    type Err = crate::error::HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "values" => Ok(DomainId::Values),
            "communication" => Ok(DomainId::Communication),
            "connection" => Ok(DomainId::Connection),
            "roles" => Ok(DomainId::Roles),
            "organization" => Ok(DomainId::Organization),
            "adaptability" => Ok(DomainId::Adaptability),
            "problem_solving" | "problemSolving" => Ok(DomainId::ProblemSolving),
            "resources" => Ok(DomainId::Resources),
            _ => Err(crate::error::HearthError::InvalidDomain(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// UpdateSource
// ---------------------------------------------------------------------------

/// Which flow last wrote a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    Onboarding,
    Refresh,
    ManualEdit,
}

impl fmt::Display for UpdateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateSource::Onboarding => "onboarding",
            UpdateSource::Refresh => "refresh",
            UpdateSource::ManualEdit => "manual_edit",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
