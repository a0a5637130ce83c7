//! Source spans — shared by `VisitorEvent`, `Violation`, and SARIF output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub file: String,
    pub line: u32,
    pub end_line: u32,
    pub col: u32,
    pub end_col: u32,
}

impl Span {
    pub fn point(file: impl Into<String>, line: u32, col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            end_line: line,
            col,
            end_col: col,
        }
    }

    pub fn range(file: impl Into<String>, line: u32, end_line: u32, col: u32, end_col: u32) -> Self {
        Self {
            file: file.into(),
            line,
            end_line,
            col,
            end_col,
        }
    }
}
