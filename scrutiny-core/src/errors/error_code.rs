//! Shared `ErrorCode` trait so every error enum exposes a stable, greppable
//! code string independent of its `Display` message.
//!
//! Ground: `drift_core::errors::error_code::DriftErrorCode`.

pub trait ErrorCode {
    fn error_code(&self) -> &'static str;
}

pub const PARSE_FAILED: &str = "PARSE_FAILED";
pub const FILE_TIMEOUT: &str = "FILE_TIMEOUT";
pub const POOL_STARVATION: &str = "POOL_STARVATION";
pub const DETECTOR_FAILURE: &str = "DETECTOR_FAILURE";
pub const ENCODING_ERROR: &str = "ENCODING_ERROR";
pub const CACHE_DEGRADED: &str = "CACHE_DEGRADED";
pub const PARSE_DEGRADED: &str = "PARSE_DEGRADED";
