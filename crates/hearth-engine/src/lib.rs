//! `hearth-engine` — orchestration for onboarding and refresh flows.
//!
//! Ties the oracle conversation protocol (`hearth-oracle`) to the
//! persistent model (`hearth-core`):
//!
//! ```text
//! PhaseEngine     ← one onboarding phase: conversation, review,
//!     │             persistence, advance decision
//! RefreshEngine   ← single-domain revisit, no phase bookkeeping
//!     │
//!     ▼
//! SynthesisReview ← approve-as-is, or edit a deep-cloned draft
//! ```

pub mod error;
pub mod phase;
pub mod refresh;
pub mod review;

pub use error::EngineError;
pub use phase::{EngineState, PhaseEngine, PhaseOutcome};
pub use refresh::RefreshEngine;
pub use review::{ReviewState, SynthesisReview};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, EngineError>;
