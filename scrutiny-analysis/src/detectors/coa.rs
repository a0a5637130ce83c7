//! CoA — Connascence of Algorithm, intra-file only. Functions within the
//! same file whose bodies normalize to the same token shingle are flagged
//! as duplicated logic. Cross-file algorithmic duplication is left to the
//! MECE analyzer (C5) rather than building a second cross-file clustering
//! pass here.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashMap;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{FunctionInfo, Violation, ViolationKind};

#[derive(Default)]
pub struct CoADetector {
    min_block_lines: usize,
    severity_override: Option<Severity>,
    functions: Vec<FunctionInfo>,
}

fn is_accessor(info: &FunctionInfo) -> bool {
    let short_body = info.body_lines() <= 2;
    let name_hints = info.name.starts_with("get_")
        || info.name.starts_with("set_")
        || info.name.starts_with("is_")
        || info.name == "__repr__"
        || info.name == "__str__";
    short_body && (name_hints || info.params.len() <= 1)
}

fn normalized_body(source: &str, info: &FunctionInfo) -> String {
    source
        .lines()
        .skip(info.body_span.line.saturating_sub(1) as usize)
        .take((info.body_span.end_line.saturating_sub(info.body_span.line) + 1) as usize)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

impl Detector for CoADetector {
    fn id(&self) -> &'static str {
        "CoA"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.min_block_lines = config.detectors.threshold_usize_or("CoA", "min_duplicate_block_lines", scrutiny_core::constants::MIN_BLOCK_LINES);
        self.severity_override = config.detectors.severity_override("CoA").and_then(Severity::parse);
    }

    fn consume(&mut self, _ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        if let crate::types::VisitorEvent::FunctionDef { info } = event {
            self.functions.push(info.clone());
        }
    }

    fn finalize(&mut self, ctx: &DetectionContext) -> Vec<Violation> {
        let functions = std::mem::take(&mut self.functions);
        if functions.len() < 2 {
            return Vec::new();
        }
        let mut groups: FxHashMap<u64, Vec<&FunctionInfo>> = FxHashMap::default();
        for info in &functions {
            if (info.body_lines() as usize) < self.min_block_lines || is_accessor(info) {
                continue;
            }
            let body = normalized_body(&ctx.unit.stripped_source, info);
            if body.is_empty() {
                continue;
            }
            let hash = xxhash_rust::xxh3::xxh3_64(body.as_bytes());
            groups.entry(hash).or_default().push(info);
        }
        let mut out = Vec::new();
        let severity = self.severity_override.unwrap_or(Severity::High);
        for members in groups.into_values() {
            if members.len() < 2 {
                continue;
            }
            let mut sorted = members;
            sorted.sort_by_key(|f| std::cmp::Reverse(f.body_lines()));
            let canonical = sorted[0].name.clone();
            for dup in &sorted[1..] {
                out.push(Violation::new(
                    ViolationKind::ConnascenceOfAlgorithm,
                    severity,
                    Span::point(ctx.file, dup.span.line, dup.span.col),
                    format!("function `{}` duplicates the logic of `{}`", dup.name, canonical),
                    serde_json::json!({ "duplicate_of": canonical, "lines": dup.body_lines() }),
                ));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParsedUnit, SourceFile};
    use scrutiny_core::types::identifiers::FileId;
    use scrutiny_core::types::span::Span as CoreSpan;
    use std::sync::Arc;

    fn unit(source: &str) -> ParsedUnit {
        ParsedUnit {
            file: SourceFile::new(FileId::new(1), "a.py".into(), crate::language::Language::Python, source.as_bytes(), 0),
            source: source.into(),
            stripped_source: source.into(),
            tree: None,
            events: Arc::new(Vec::new()),
            functions: Vec::new(),
            classes: Vec::new(),
            calls: Vec::new(),
            imports: Vec::new(),
            string_literals: Vec::new(),
            numeric_literals: Vec::new(),
            attribute_accesses: Vec::new(),
            identity_comparisons: Vec::new(),
        }
    }

    fn body_span(start: u32, end: u32) -> CoreSpan {
        let mut span = CoreSpan::point("a.py", start, 0);
        span.end_line = end;
        span
    }

    #[test]
    fn flags_two_identical_long_bodies() {
        let source = "def a():\n    x = 1\n    y = 2\n    z = 3\n    w = 4\n    v = 5\n    return v\n\
                       def b():\n    x = 1\n    y = 2\n    z = 3\n    w = 4\n    v = 5\n    return v\n";
        let unit = unit(source);
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoADetector::default();
        detector.configure(&config);
        let make = |name: &str, line: u32| FunctionInfo {
            name: name.into(),
            span: CoreSpan::point("a.py", line, 0),
            body_span: body_span(line + 1, line + 6),
            params: Vec::new(),
            enclosing_class: None,
            is_method: false,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info: make("a", 1) });
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info: make("b", 8) });
        let found = detector.finalize(&ctx);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn skips_short_accessor_functions() {
        let source = "def get_x():\n    return self.x\ndef get_y():\n    return self.y\n";
        let unit = unit(source);
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoADetector::default();
        detector.configure(&config);
        let make = |name: &str, line: u32| FunctionInfo {
            name: name.into(),
            span: CoreSpan::point("a.py", line, 0),
            body_span: body_span(line + 1, line + 1),
            params: Vec::new(),
            enclosing_class: None,
            is_method: true,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info: make("get_x", 1) });
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info: make("get_y", 3) });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
