use crate::Ingest::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Run settings of an ingestion.
///
/// ```json
/// {
///   "debug": false,
///   "update": true,
///   "energy_limit": 5.0,
///   "userhandle": "jdoe",
///   "verbose": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// permissive mode: fatal folder errors are logged and the run continues
    pub debug: bool,
    /// overwrite records that are already in the store
    pub update: bool,
    /// bound (eV) for |ΔE| and for Ea
    pub energy_limit: f64,
    pub userhandle: String,
    /// log every emitted record
    pub verbose: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            debug: false,
            update: true,
            energy_limit: 5.0,
            userhandle: String::new(),
            verbose: false,
        }
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.energy_limit.is_finite() && self.energy_limit > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "energy_limit must be a positive number, got {}",
                self.energy_limit
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: IngestConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
