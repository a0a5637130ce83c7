//! Configuration object (spec §6). Every row of the spec's configuration
//! table has a field here; nothing is read from the environment directly.
//!
//! Ground: `drift_core::config::ScanConfig` — `Option<T>` fields with
//! `effective_*()` accessors supplying the documented default, so a config
//! file only needs to mention the values it overrides.

mod cache_config;
mod detectors_config;
mod paths_config;
mod thresholds;
mod workers_config;

pub use cache_config::CacheConfig;
pub use detectors_config::{DetectorOverride, DetectorsConfig};
pub use paths_config::PathsConfig;
pub use thresholds::Thresholds;
pub use workers_config::WorkersConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Root configuration object for an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: Thresholds,
    pub detectors: DetectorsConfig,
    pub allowlist: AllowList,
    pub paths: PathsConfig,
    pub cache: CacheConfig,
    pub workers: WorkersConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AllowList {
    /// FQNs exempted from god-object detection.
    pub god_objects: Vec<String>,
    /// Names excluded from CoN (connascence of name).
    pub identifiers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub limit_mb: Option<u64>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { limit_mb: None }
    }
}

impl MemoryConfig {
    pub fn effective_limit_mb(&self) -> u64 {
        self.limit_mb.unwrap_or(crate::constants::DEFAULT_MEMORY_LIMIT_MB)
    }
}

impl AnalysisConfig {
    /// Load a config from a TOML or JSON file, chosen by extension.
    /// Missing/unknown fields take their defaults (forward-compatible).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&raw).map_err(|e| ConfigError::JsonParse {
                message: e.to_string(),
            }),
            _ => toml::from_str(&raw).map_err(|e| ConfigError::TomlParse {
                message: e.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds.effective_nasa_compliance(), 0.90);
    }

    #[test]
    fn load_toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scrutiny.toml");
        std::fs::write(
            &path,
            r#"
            [thresholds]
            nasa_compliance = 0.5

            [workers]
            count = 4
            "#,
        )
        .unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert_eq!(config.thresholds.effective_nasa_compliance(), 0.5);
        assert_eq!(config.workers.effective_count(), 4);
        // unspecified fields keep defaults
        assert_eq!(config.thresholds.effective_mece_score(), 0.75);
    }
}
