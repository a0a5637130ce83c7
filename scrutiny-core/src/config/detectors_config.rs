//! Per-detector configuration: which detector ids are active, severity
//! overrides, and free-form detector-specific threshold knobs
//! (`param_count_limit`, `function_line_budget`, `similarity_threshold`, …).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorsConfig {
    /// Detector ids active this run. Empty means "all detectors enabled" —
    /// matching spec §4.3's CoC policy ("empty config -> no findings") for
    /// CoC specifically, while for the enabled-set as a whole empty means
    /// "use every registered detector".
    pub enabled: Vec<String>,
    /// Per-detector overrides, keyed by detector/rule id (e.g. "CoM", "CoP").
    pub overrides: HashMap<String, DetectorOverride>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DetectorOverride {
    pub severity_override: Option<String>,
    pub thresholds: HashMap<String, f64>,
}

impl DetectorsConfig {
    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|e| e == id)
    }

    pub fn severity_override(&self, id: &str) -> Option<&str> {
        self.overrides
            .get(id)
            .and_then(|o| o.severity_override.as_deref())
    }

    pub fn threshold(&self, id: &str, key: &str) -> Option<f64> {
        self.overrides.get(id).and_then(|o| o.thresholds.get(key)).copied()
    }

    pub fn threshold_or(&self, id: &str, key: &str, default: f64) -> f64 {
        self.threshold(id, key).unwrap_or(default)
    }

    pub fn threshold_usize_or(&self, id: &str, key: &str, default: usize) -> usize {
        self.threshold(id, key).map(|v| v as usize).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_enabled_set_means_all_on() {
        let config = DetectorsConfig::default();
        assert!(config.is_enabled("CoM"));
        assert!(config.is_enabled("anything"));
    }

    #[test]
    fn non_empty_enabled_set_is_a_whitelist() {
        let config = DetectorsConfig {
            enabled: vec!["CoM".to_string(), "CoP".to_string()],
            ..Default::default()
        };
        assert!(config.is_enabled("CoM"));
        assert!(!config.is_enabled("CoV"));
    }

    #[test]
    fn threshold_override_reads_back() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "CoP".to_string(),
            DetectorOverride {
                severity_override: Some("low".to_string()),
                thresholds: HashMap::from([("param_count_limit".to_string(), 5.0)]),
            },
        );
        let config = DetectorsConfig {
            enabled: vec![],
            overrides,
        };
        assert_eq!(config.severity_override("CoP"), Some("low"));
        assert_eq!(config.threshold_usize_or("CoP", "param_count_limit", 3), 5);
        assert_eq!(config.threshold_usize_or("CoM", "anything", 9), 9);
    }
}
