//! CoV — Connascence of Value. Same literal value appearing ≥3 times across
//! a file without a named constant (spec §4.3). Suppresses occurrences CoM
//! would already flag, to avoid double-counting the same literal.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashMap;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::language::is_exempt_literal_value;
use crate::types::{LiteralInfo, Violation, ViolationKind};

const REPETITION_THRESHOLD_KEY: &str = "value_repetition_threshold";

#[derive(Default)]
pub struct CoVDetector {
    threshold: usize,
    severity_override: Option<Severity>,
    occurrences: FxHashMap<String, Vec<(u32, u32)>>,
}

impl CoVDetector {
    /// True when CoM would already flag this occurrence (non-exempt value,
    /// non-declaration, non-test-file) — CoV skips those per spec's
    /// suppression rule.
    fn com_would_flag(&self, ctx: &DetectionContext, literal: &LiteralInfo) -> bool {
        !ctx.is_test_file
            && !ctx.is_generated
            && !literal.in_declaration
            && !is_exempt_literal_value(literal.kind, &literal.canonical_value)
    }
}

impl Detector for CoVDetector {
    fn id(&self) -> &'static str {
        "CoV"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.threshold = config.detectors.threshold_usize_or("CoV", REPETITION_THRESHOLD_KEY, scrutiny_core::constants::VALUE_REPETITION_THRESHOLD);
        self.severity_override = config.detectors.severity_override("CoV").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        use crate::types::VisitorEvent::*;
        let literal = match event {
            LiteralNumber { literal } | LiteralString { literal } => literal,
            _ => return,
        };
        if self.com_would_flag(ctx, literal) {
            return;
        }
        if literal.canonical_value.is_empty() {
            return;
        }
        self.occurrences
            .entry(literal.canonical_value.clone())
            .or_default()
            .push((literal.line, literal.column));
    }

    fn finalize(&mut self, ctx: &DetectionContext) -> Vec<Violation> {
        let mut out = Vec::new();
        for (value, spots) in self.occurrences.drain() {
            if spots.len() < self.threshold {
                continue;
            }
            let severity = self.severity_override.unwrap_or(Severity::Medium);
            for (line, col) in &spots {
                out.push(Violation::new(
                    ViolationKind::ConnascenceOfValue,
                    severity,
                    Span::point(ctx.file, *line, *col),
                    format!("value `{value}` repeated {} times without a named constant", spots.len()),
                    serde_json::json!({ "value": value, "occurrences": spots.len() }),
                ));
            }
        }
        out
    }
}
