use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse oracle response: {source}\n  body: {body}")]
    Parse {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("conversation not started")]
    NotStarted,

    #[error("conversation already started")]
    AlreadyStarted,

    #[error("conversation already complete; synthesis is awaiting review")]
    SessionComplete,
}
