// Standard library imports
use std::fs;
use std::path::{Path, PathBuf};

// External crate imports
use tracing::debug;

// Internal imports
use crate::config::BuildConfig;
use nb_core::error::{BuildError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/nodebuild.yaml";

/// Finds and loads the configuration file.
///
/// Priority:
/// 1. **Explicit path:** must exist.
/// 2. **System file:** `/etc/nodebuild.yaml`, if present.
/// 3. **Built-in defaults.**
pub struct ConfigLoader {
    system_path: PathBuf,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            system_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_path(path: impl Into<PathBuf>) -> Self {
        Self {
            system_path: path.into(),
        }
    }

    pub fn load(&self, explicit: Option<&Path>) -> Result<BuildConfig> {
        let config = if let Some(path) = explicit {
            if !path.exists() {
                return Err(BuildError::Config(format!(
                    "configuration file {} does not exist",
                    path.display()
                )));
            }
            self.load_file(path)?
        } else if self.system_path.exists() {
            self.load_file(&self.system_path)?
        } else {
            debug!("No configuration file found, using defaults");
            BuildConfig::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn load_file(&self, path: &Path) -> Result<BuildConfig> {
        debug!("Loading config from: {}", path.display());
        let contents = fs::read_to_string(path).map_err(|e| {
            BuildError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut config: BuildConfig = if contents.trim().is_empty() {
            BuildConfig::default()
        } else {
            serde_yaml_ng::from_str(&contents).map_err(|e| {
                BuildError::Config(format!("{}: {}", path.display(), e))
            })?
        };
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }
}
