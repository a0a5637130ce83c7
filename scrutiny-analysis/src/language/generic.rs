use regex::Regex;
use std::sync::OnceLock;

use super::{LanguageStrategy, NodeKinds};
use crate::types::FunctionInfo;
use scrutiny_core::types::span::Span;

/// Regex fallback for languages with no tree-sitter grammar wired (spec
/// §4.1). Must never raise for ill-formed input; the caller downgrades a
/// `Generic`-strategy parse to a `PARSE_DEGRADED` info violation, not an
/// error return from here.
pub struct GenericStrategy;

static NODE_KINDS: NodeKinds = NodeKinds {
    function_def: &[],
    class_def: &[],
    call: &[],
    string_literal: &[],
    numeric_literal: &[],
    assignment: &[],
    return_stmt: &[],
    control_flow: &[],
    import: &[],
    attribute: &[],
    identity_comparison: &[],
};

static LOOSE_FUNC_RE: OnceLock<Regex> = OnceLock::new();

fn loose_func_re() -> &'static Regex {
    LOOSE_FUNC_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:\w+\s+)*([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*\{?\s*$").unwrap()
    })
}

impl LanguageStrategy for GenericStrategy {
    fn node_kinds(&self) -> &'static NodeKinds {
        &NODE_KINDS
    }

    fn strip_comments(&self, source: &str) -> String {
        source.to_string()
    }

    fn extract_functions_regex(&self, source: &str) -> Vec<FunctionInfo> {
        let mut out = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if let Some(caps) = loose_func_re().captures(line) {
                let name = caps[1].to_string();
                let line_no = (idx + 1) as u32;
                out.push(FunctionInfo {
                    name,
                    span: Span::point("", line_no, 0),
                    body_span: Span::range("", line_no, line_no, 0, 0),
                    params: Vec::new(),
                    enclosing_class: None,
                    is_method: false,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_panics_on_empty_or_garbage_input() {
        assert!(GenericStrategy.extract_functions_regex("").is_empty());
        assert!(GenericStrategy.extract_functions_regex("{{{ not code at all )))").is_empty());
    }
}
