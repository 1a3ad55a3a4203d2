//! Persistence configuration module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;

/// Where the command-line tool keeps its filter snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistenceSettings {
    /// Snapshot file; `.txt` selects the text format, anything else JSON
    pub path: Option<PathBuf>,
}

impl Validate for PersistenceSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(ConfigError::ValidationError(
                "persistence.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
