//! Quality-gate thresholds (spec §4.10 / §6 configuration table).

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::errors::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Thresholds {
    pub nasa_compliance: Option<f64>,
    pub mece_score: Option<f64>,
    pub god_objects: Option<usize>,
    pub critical: Option<usize>,
    pub high: Option<usize>,
}

impl Thresholds {
    pub fn effective_nasa_compliance(&self) -> f64 {
        self.nasa_compliance
            .unwrap_or(constants::GATE_NASA_COMPLIANCE_MIN)
    }

    pub fn effective_mece_score(&self) -> f64 {
        self.mece_score.unwrap_or(constants::GATE_MECE_SCORE_MIN)
    }

    pub fn effective_god_objects(&self) -> usize {
        self.god_objects.unwrap_or(constants::GATE_GOD_OBJECTS_MAX)
    }

    pub fn effective_critical(&self) -> usize {
        self.critical.unwrap_or(constants::GATE_CRITICAL_MAX)
    }

    pub fn effective_high(&self) -> usize {
        self.high.unwrap_or(constants::GATE_HIGH_MAX)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(v) = self.nasa_compliance {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::ThresholdOutOfRange {
                    field: "thresholds.nasa_compliance".to_string(),
                    value: v,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if let Some(v) = self.mece_score {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::ThresholdOutOfRange {
                    field: "thresholds.mece_score".to_string(),
                    value: v,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        Ok(())
    }
}
