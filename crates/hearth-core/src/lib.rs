//! `hearth-core` — domain model and YAML persistence for hearth manuals.
//!
//! Everything lives under a `.hearth/` directory at a chosen root:
//! manuals (the domain aggregates), per-user onboarding status, journey
//! progress, and configuration. All writes are atomic.

pub mod config;
pub mod error;
pub mod io;
pub mod journey;
pub mod manual;
pub mod paths;
pub mod status;
pub mod types;

pub use error::{HearthError, Result};
