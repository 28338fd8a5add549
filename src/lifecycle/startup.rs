//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: a missing or malformed initial configuration is fatal
//! - The resolver starts only once a configuration is active

use std::path::Path;

use crate::config::{ConfigError, ConfigStore};

/// Read the initial configuration.
///
/// The caller exits the process on error; there is nothing to fall back to.
pub fn read_initial_config(path: &Path) -> Result<ConfigStore, ConfigError> {
    ConfigStore::load(path).inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Can't read initial configuration, aborting");
    })
}
