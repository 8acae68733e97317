use crate::error::{HearthError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MANUALS_DIR: &str = ".hearth/manuals";
pub const STATUS_DIR: &str = ".hearth/status";
pub const JOURNEYS_DIR: &str = ".hearth/journeys";

pub const CONFIG_FILE: &str = ".hearth/config.yaml";
pub const MANUAL_FILE: &str = "manual.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn manual_dir(root: &Path, manual_id: &str) -> PathBuf {
    root.join(MANUALS_DIR).join(manual_id)
}

pub fn manual_path(root: &Path, manual_id: &str) -> PathBuf {
    manual_dir(root, manual_id).join(MANUAL_FILE)
}

pub fn status_path(root: &Path, user_id: &str) -> PathBuf {
    root.join(STATUS_DIR).join(format!("{user_id}.yaml"))
}

pub fn journey_path(root: &Path, manual_id: &str) -> PathBuf {
    root.join(JOURNEYS_DIR)
        .join(format!("progress-{manual_id}.yaml"))
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(HearthError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
