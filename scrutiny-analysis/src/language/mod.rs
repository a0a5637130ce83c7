//! Language Strategy Set (spec §4.1, C1). Each strategy is polymorphic over
//! `{strip_comments, extract_functions, extract_parameters, classify_literal,
//! is_identifier, tokenize_block}`. Registered once at startup in a static
//! table (ground: teacher's `ParserManager::parser_for` match dispatch) — no
//! runtime plugin loading, per spec §9.

mod c_cpp;
mod generic;
mod javascript;
mod python;

use crate::types::{CallSite, FunctionInfo, LiteralKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    C,
    Cpp,
    Other,
}

impl Language {
    /// Ground: `drift_analysis::parsers::manager::ParserManager::parser_for`
    /// extension dispatch.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "py" | "pyi" => Self::Python,
            "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
            "ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
            "c" | "h" => Self::C,
            "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
            _ => Self::Other,
        }
    }

    pub fn ts_language(&self) -> Option<tree_sitter::Language> {
        match self {
            Self::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Self::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Self::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Self::C => Some(tree_sitter_c::LANGUAGE.into()),
            Self::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
            Self::Other => None,
        }
    }

    pub fn strategy(&self) -> &'static dyn LanguageStrategy {
        match self {
            Self::Python => &python::PythonStrategy,
            Self::JavaScript | Self::TypeScript => &javascript::JavaScriptStrategy,
            Self::C | Self::Cpp => &c_cpp::CFamilyStrategy,
            Self::Other => &generic::GenericStrategy,
        }
    }
}

/// `FunctionDecl` from spec §4.1's contract, folded into `FunctionInfo` here
/// since the two carry identical fields once params are populated.
pub type FunctionDecl = FunctionInfo;

/// Node-kind name tables used by the unified visitor (`engine::visitor`) to
/// dispatch tree-sitter node kinds into `VisitorEvent`s without a per-
/// language `match` scattered across the engine. Ground: teacher's
/// `VisitorRegistry`, which indexes handlers by node-type string rather than
/// by language.
pub struct NodeKinds {
    pub function_def: &'static [&'static str],
    pub class_def: &'static [&'static str],
    pub call: &'static [&'static str],
    pub string_literal: &'static [&'static str],
    pub numeric_literal: &'static [&'static str],
    pub assignment: &'static [&'static str],
    pub return_stmt: &'static [&'static str],
    pub control_flow: &'static [&'static str],
    pub import: &'static [&'static str],
    pub attribute: &'static [&'static str],
    pub identity_comparison: &'static [&'static str],
}

/// Contract per spec §4.1. The `Generic` variant never raises for
/// ill-formed input; its failures are folded into a `PARSE_DEGRADED`
/// info-level violation by the caller, not surfaced as a `Result::Err`.
pub trait LanguageStrategy: Send + Sync {
    fn node_kinds(&self) -> &'static NodeKinds;

    /// Must preserve line numbers: replace comment bytes with spaces/
    /// newlines, never delete lines.
    fn strip_comments(&self, source: &str) -> String;

    /// Regex fallback used when no tree-sitter tree is available (either
    /// because the language is `Generic`, or because parsing failed and the
    /// pipeline still wants partial results).
    fn extract_functions_regex(&self, source: &str) -> Vec<FunctionInfo>;

    fn extract_parameters(&self, function: &FunctionInfo) -> Vec<crate::types::Parameter> {
        function.params.clone()
    }

    fn classify_literal(&self, token: &str) -> (LiteralKind, String) {
        classify_literal_default(token)
    }

    fn is_identifier(&self, token: &str) -> bool {
        is_identifier_default(token)
    }

    /// True if the callee name belongs to the "must-check return value" set
    /// NASA R7 cares about. Config can extend this per spec §6.
    fn is_must_check_call(&self, call: &CallSite) -> bool {
        let _ = call;
        false
    }

    /// Known-method allow-list used by CoT to avoid flagging attribute
    /// access on well-known stdlib/builtin types.
    fn is_known_method(&self, _type_hint: &str, _attr: &str) -> bool {
        false
    }
}

pub fn classify_literal_default(token: &str) -> (LiteralKind, String) {
    let trimmed = token.trim();
    if trimmed == "true" || trimmed == "false" || trimmed == "True" || trimmed == "False" {
        return (LiteralKind::Bool, trimmed.to_ascii_lowercase());
    }
    if trimmed == "null" || trimmed == "None" || trimmed == "nil" || trimmed == "undefined" {
        return (LiteralKind::Null, "null".to_string());
    }
    if trimmed.starts_with('"') || trimmed.starts_with('\'') || trimmed.starts_with('`') {
        let inner = trimmed.trim_matches(|c| c == '"' || c == '\'' || c == '`');
        return (LiteralKind::String, inner.to_string());
    }
    if trimmed.parse::<f64>().is_ok() {
        return (LiteralKind::Numeric, trimmed.to_string());
    }
    (LiteralKind::Other, trimmed.to_string())
}

pub fn is_identifier_default(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Blanks a comment's byte range with spaces, preserving newlines so line
/// numbers never shift. Shared by every strategy's tree-sitter-backed
/// `strip_comments`.
pub fn blank_range(buf: &mut Vec<u8>, start: usize, end: usize) {
    for b in &mut buf[start..end] {
        if *b != b'\n' {
            *b = b' ';
        }
    }
}

/// Whether a literal's value is exempt from "meaning" per spec §4.3 CoM:
/// `{0, 1, -1, "", empty collections}`.
pub fn is_exempt_literal_value(kind: LiteralKind, canonical: &str) -> bool {
    match kind {
        LiteralKind::Numeric => matches!(canonical, "0" | "1" | "-1" | "0.0" | "1.0" | "-1.0"),
        LiteralKind::String => canonical.is_empty(),
        LiteralKind::Bool | LiteralKind::Null => true,
        LiteralKind::Other => canonical.is_empty() || canonical == "[]" || canonical == "{}",
    }
}
