//! CoI — Connascence of Identity. `is`/`==` identity comparisons between two
//! non-literal expressions, outside a small allow-list of singleton-style
//! names (`None`, `True`, `False`, `null`, `undefined`, `nil`) which compare
//! safely by identity/value interchangeably (spec §4.3).

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashSet;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{IdentityComparison, Violation, ViolationKind};

const DEFAULT_ALLOWLIST: &[&str] = &["None", "True", "False", "null", "undefined", "nil", "NULL"];

#[derive(Default)]
pub struct CoIDetector {
    allowlist: FxHashSet<String>,
    severity_override: Option<Severity>,
    found: Vec<Violation>,
}

impl CoIDetector {
    fn is_allowed(&self, side: &str) -> bool {
        self.allowlist.contains(side)
    }

    fn check(&mut self, ctx: &DetectionContext, comparison: &IdentityComparison) {
        if self.is_allowed(&comparison.lhs) || self.is_allowed(&comparison.rhs) {
            return;
        }
        let severity = self.severity_override.unwrap_or(Severity::Medium);
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfIdentity,
            severity,
            Span::point(ctx.file, comparison.line, 0),
            format!("identity comparison `{} is {}` couples callers to object identity rather than value", comparison.lhs, comparison.rhs),
            serde_json::json!({ "lhs": comparison.lhs, "rhs": comparison.rhs }),
        ));
    }
}

impl Detector for CoIDetector {
    fn id(&self) -> &'static str {
        "CoI"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.allowlist = DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect();
        self.severity_override = config.detectors.severity_override("CoI").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        if let crate::types::VisitorEvent::IdentityComparison { comparison } = event {
            self.check(ctx, comparison);
        }
    }

    fn finalize(&mut self, _ctx: &DetectionContext) -> Vec<Violation> {
        std::mem::take(&mut self.found)
    }
}
