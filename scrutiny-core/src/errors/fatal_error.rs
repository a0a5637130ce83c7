//! The top-level fatal error returned from the orchestrator entry point
//! (spec §7: exit code 3). Everything else is folded into violations before
//! it gets this far.

use super::error_code::ErrorCode;
use super::{ConfigError, ScanError};

#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("internal invariant violated: {message}")]
    InvariantViolation { message: String },
}

impl ErrorCode for FatalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Scan(e) => e.error_code(),
            Self::InvariantViolation { .. } => "FATAL_INVARIANT_VIOLATION",
        }
    }
}
