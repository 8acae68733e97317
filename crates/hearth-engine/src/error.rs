use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] hearth_core::HearthError),

    #[error(transparent)]
    Oracle(#[from] hearth_oracle::OracleError),

    #[error("no synthesis awaiting review")]
    NotInReview,

    #[error("review is not in editing mode")]
    NotEditing,

    #[error("oracle synthesized no structured data")]
    EmptySynthesis,

    #[error("engine already finished")]
    Finished,
}
