use thiserror::Error;

#[derive(Debug, Error)]
pub enum HearthError {
    #[error("manual not found: {0}")]
    ManualNotFound(String),

    #[error("manual already exists: {0}")]
    ManualExists(String),

    #[error("onboarding status not found for user: {0}")]
    StatusNotFound(String),

    #[error("journey not found for manual: {0}")]
    JourneyNotFound(String),

    #[error("journey already exists for manual: {0}")]
    JourneyExists(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),

    #[error("invalid domain: {0}")]
    InvalidDomain(String),

    #[error("invalid layer: {0}")]
    InvalidLayer(u8),

    #[error("invalid id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidId(String),

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("already graduated")]
    AlreadyGraduated,

    #[error("graduation requirements not met: {0}")]
    NotReadyToGraduate(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HearthError>;
