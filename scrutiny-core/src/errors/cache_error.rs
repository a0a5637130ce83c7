//! Cache I/O errors — never fatal (spec §7): any cache failure downgrades
//! the affected file to a cold-path (re-parse, re-detect) run.

use super::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("sqlite error: {message}")]
    Sqlite { message: String },

    #[error("cache directory {path} could not be created: {message}")]
    DirCreate { path: String, message: String },

    #[error("failed to (de)serialize cache entry: {message}")]
    Serde { message: String },

    #[error("unknown cache schema version {version}, ignoring entry")]
    UnknownVersion { version: u32 },
}

impl ErrorCode for CacheError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => super::error_code::CACHE_DEGRADED,
            Self::DirCreate { .. } => super::error_code::CACHE_DEGRADED,
            Self::Serde { .. } => super::error_code::CACHE_DEGRADED,
            Self::UnknownVersion { .. } => super::error_code::CACHE_DEGRADED,
        }
    }
}
