//! Discovery/walk errors — fatal only when the repo root itself is
//! unreadable; individual file read failures are handled per-file by the
//! scanner and never surface here.

use super::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("repo root {path} is not readable: {message}")]
    RootUnreadable { path: String, message: String },

    #[error("scan cancelled before discovery completed")]
    Cancelled,

    #[error("walker error: {message}")]
    Walker { message: String },
}

impl ErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::RootUnreadable { .. } => "SCAN_ROOT_UNREADABLE",
            Self::Cancelled => "SCAN_CANCELLED",
            Self::Walker { .. } => "SCAN_WALKER_ERROR",
        }
    }
}
