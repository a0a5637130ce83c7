//! Configuration errors — fatal per spec §7 ("invalid config" aborts the run).

use super::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },

    #[error("failed to parse config as TOML: {message}")]
    TomlParse { message: String },

    #[error("failed to parse config as JSON: {message}")]
    JsonParse { message: String },

    #[error("invalid threshold {field}: {value} is out of range {min}..={max}")]
    ThresholdOutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unknown detector id in config: {id}")]
    UnknownDetector { id: String },
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO",
            Self::TomlParse { .. } => "CONFIG_TOML_PARSE",
            Self::JsonParse { .. } => "CONFIG_JSON_PARSE",
            Self::ThresholdOutOfRange { .. } => "CONFIG_THRESHOLD_OUT_OF_RANGE",
            Self::UnknownDetector { .. } => "CONFIG_UNKNOWN_DETECTOR",
        }
    }
}
