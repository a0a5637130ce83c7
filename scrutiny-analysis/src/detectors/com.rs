//! CoM — Connascence of Meaning (magic literal). Flags numeric/string
//! literals with "meaning" outside `{0, 1, -1, "", empty collections}` used
//! in non-declaration contexts (spec §4.3). Exempt: const-style assignments,
//! test files, one-line functions.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::language::is_exempt_literal_value;
use crate::types::{LiteralInfo, Violation, ViolationKind};

#[derive(Default)]
pub struct CoMDetector {
    severity_override: Option<Severity>,
    found: Vec<Violation>,
}

impl CoMDetector {
    fn is_one_line_function(&self, ctx: &DetectionContext, name: &Option<String>) -> bool {
        let Some(name) = name else { return false };
        ctx.functions.iter().any(|f| &f.name == name && f.body_lines() <= 1)
    }

    fn check(&mut self, ctx: &DetectionContext, literal: &LiteralInfo) {
        if ctx.is_test_file || ctx.is_generated {
            return;
        }
        if literal.in_declaration {
            return;
        }
        if is_exempt_literal_value(literal.kind, &literal.canonical_value) {
            return;
        }
        if self.is_one_line_function(ctx, &literal.enclosing_function) {
            return;
        }
        let severity = self.severity_override.unwrap_or(Severity::Medium);
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfMeaning,
            severity,
            Span::point(ctx.file, literal.line, literal.column),
            format!("magic literal `{}` used without a named constant", literal.raw),
            serde_json::json!({ "value": literal.canonical_value, "in_predicate": literal.in_predicate }),
        ));
    }
}

impl Detector for CoMDetector {
    fn id(&self) -> &'static str {
        "CoM"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.severity_override = config.detectors.severity_override("CoM").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        use crate::types::VisitorEvent::*;
        match event {
            LiteralNumber { literal } | LiteralString { literal } => self.check(ctx, literal),
            _ => {}
        }
    }

    fn finalize(&mut self, _ctx: &DetectionContext) -> Vec<Violation> {
        std::mem::take(&mut self.found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LiteralKind, ParsedUnit, SourceFile};
    use scrutiny_core::types::identifiers::FileId;
    use std::sync::Arc;

    fn unit() -> ParsedUnit {
        ParsedUnit {
            file: SourceFile::new(FileId::new(1), "a.py".into(), crate::language::Language::Python, b"x", 0),
            source: String::new(),
            stripped_source: String::new(),
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

    #[test]
    fn flags_non_exempt_literal_in_predicate() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoMDetector::default();
        detector.configure(&config);
        let literal = LiteralInfo {
            kind: LiteralKind::Numeric,
            raw: "100".into(),
            canonical_value: "100".into(),
            line: 2,
            column: 3,
            in_predicate: true,
            in_declaration: false,
            enclosing_function: None,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::LiteralNumber { literal });
        let found = detector.finalize(&ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Medium);
    }

    #[test]
    fn exempts_zero_and_one() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoMDetector::default();
        detector.configure(&config);
        let literal = LiteralInfo {
            kind: LiteralKind::Numeric,
            raw: "1".into(),
            canonical_value: "1".into(),
            line: 2,
            column: 3,
            in_predicate: false,
            in_declaration: false,
            enclosing_function: None,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::LiteralNumber { literal });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
