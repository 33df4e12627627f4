//! Optional YAML configuration for defaults the CLI does not repeat.

use crate::source::DEFAULT_EXTENSIONS;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Folder holding ledger snapshots
    pub metadata_folder: Option<PathBuf>,
    /// Media extensions picked up from the source, lowercase
    pub extensions: Vec<String>,
    /// Follow symlinks while walking the source
    pub follow_links: bool,
    /// Copy thread count; `None` uses one per core
    pub workers: Option<usize>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            metadata_folder: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_links: false,
            workers: None,
        }
    }
}

impl ImportConfig {
    /// Load from `path`, or from the user config directory when it has one.
    ///
    /// An explicit path must exist; the implicit location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// `<config dir>/dcim-import/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dcim-import").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(Error::configuration("extension list must not be empty"));
        }
        if self.workers == Some(0) {
            return Err(Error::configuration("workers must be greater than 0"));
        }
        Ok(())
    }
}
