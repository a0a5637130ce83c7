//! Parse errors — always per-file recoverable (spec §7): a failed parse
//! yields a `PARSE_FAILED` info violation and short-circuits AST-only
//! detectors for that file, but never aborts the run.

use super::error_code::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("tree-sitter failed to produce a tree for {file}")]
    TreeSitterFailure { file: String },

    #[error("file {file} is not valid UTF-8 and no encoding fallback matched")]
    Encoding { file: String },

    #[error("file {file} exceeds the configured size limit ({size} > {limit} bytes)")]
    TooLarge { file: String, size: u64, limit: u64 },
}

impl ErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedLanguage { .. } => "PARSE_UNSUPPORTED_LANGUAGE",
            Self::TreeSitterFailure { .. } => super::error_code::PARSE_FAILED,
            Self::Encoding { .. } => super::error_code::ENCODING_ERROR,
            Self::TooLarge { .. } => "PARSE_TOO_LARGE",
        }
    }
}
