use regex::Regex;
use std::sync::OnceLock;

use super::{LanguageStrategy, NodeKinds};
use crate::types::{FunctionInfo, Parameter};
use scrutiny_core::types::span::Span;

/// Covers both C and C++ (spec §4.1 lists them as one variant). Tree-sitter
/// grammars differ but the regex fallback and comment stripping are shared.
pub struct CFamilyStrategy;

static NODE_KINDS: NodeKinds = NodeKinds {
    function_def: &["function_definition"],
    class_def: &["struct_specifier", "class_specifier"],
    call: &["call_expression"],
    string_literal: &["string_literal"],
    numeric_literal: &["number_literal"],
    assignment: &["assignment_expression", "init_declarator"],
    return_stmt: &["return_statement"],
    control_flow: &["if_statement", "for_statement", "while_statement", "switch_statement"],
    import: &["preproc_include"],
    attribute: &["field_expression"],
    identity_comparison: &["binary_expression"],
};

static FUNC_RE: OnceLock<Regex> = OnceLock::new();

fn func_re() -> &'static Regex {
    FUNC_RE.get_or_init(|| {
        Regex::new(r"(?m)^[A-Za-z_][\w:<>\*\s]*\s[\*&]?([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*\{?\s*$").unwrap()
    })
}

impl LanguageStrategy for CFamilyStrategy {
    fn node_kinds(&self) -> &'static NodeKinds {
        &NODE_KINDS
    }

    fn strip_comments(&self, source: &str) -> String {
        let mut buf = source.as_bytes().to_vec();
        let mut i = 0;
        let mut in_string = false;
        while i < buf.len() {
            let c = buf[i];
            if in_string {
                if c == b'"' {
                    in_string = false;
                }
                i += 1;
                continue;
            }
            match c {
                b'"' => {
                    in_string = true;
                    i += 1;
                }
                b'/' if i + 1 < buf.len() && buf[i + 1] == b'/' => {
                    let start = i;
                    while i < buf.len() && buf[i] != b'\n' {
                        i += 1;
                    }
                    super::blank_range(&mut buf, start, i);
                }
                b'/' if i + 1 < buf.len() && buf[i + 1] == b'*' => {
                    let start = i;
                    i += 2;
                    while i + 1 < buf.len() && !(buf[i] == b'*' && buf[i + 1] == b'/') {
                        i += 1;
                    }
                    i = (i + 2).min(buf.len());
                    super::blank_range(&mut buf, start, i);
                }
                _ => i += 1,
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn extract_functions_regex(&self, source: &str) -> Vec<FunctionInfo> {
        let mut out = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            if let Some(caps) = func_re().captures(line) {
                let name = caps[1].to_string();
                if matches!(name.as_str(), "if" | "for" | "while" | "switch" | "return") {
                    continue;
                }
                let params = parse_params(&caps[2]);
                let line_no = (idx + 1) as u32;
                out.push(FunctionInfo {
                    name,
                    span: Span::point("", line_no, 0),
                    body_span: Span::range("", line_no, line_no, 0, 0),
                    params,
                    enclosing_class: None,
                    is_method: false,
                });
            }
        }
        out
    }
}

fn parse_params(raw: &str) -> Vec<Parameter> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "void" {
        return Vec::new();
    }
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(position, part)| {
            let name = part.rsplit(|c: char| c.is_whitespace() || c == '*' || c == '&').next().unwrap_or(part).to_string();
            Parameter { name, has_default: false, position }
        })
        .collect()
}
