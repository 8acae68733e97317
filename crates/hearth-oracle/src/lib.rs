//! `hearth-oracle` — client for the conversational synthesis oracle.
//!
//! The oracle runs phased onboarding and single-domain refresh
//! conversations over a JSON wire protocol. This crate owns the wire
//! types, the [`Oracle`] trait with its HTTP implementation, and
//! [`ConversationSession`], the value that holds one conversation's
//! transcript and enforces its protocol.
//!
//! ```text
//! ConversationSession ← transcript + protocol (start, send, synthesis)
//!     │
//!     ▼
//! Oracle trait        ← one exchange; mockable in tests
//!     │
//!     ▼
//! HttpOracle          ← posts ConversationRequest JSON to the endpoint
//! ```

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::{HttpOracle, Oracle};
pub use error::OracleError;
pub use session::{ConversationSession, SYNTHESIS_NUDGE};
pub use types::{
    ConversationMode, ConversationRequest, ConversationResponse, ResponseKind, Turn, TurnRole,
};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, OracleError>;
