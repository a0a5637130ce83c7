//! Detector pool errors (spec §4.7). Starvation is per-file recoverable:
//! the orchestrator fails that one file and continues.

use super::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("acquire timed out after {waited_ms}ms (limit {limit_ms}ms)")]
    AcquireTimeout { waited_ms: u64, limit_ms: u64 },

    #[error("pool is shut down")]
    ShutDown,
}

impl ErrorCode for PoolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AcquireTimeout { .. } => super::error_code::POOL_STARVATION,
            Self::ShutDown => "POOL_SHUT_DOWN",
        }
    }
}
