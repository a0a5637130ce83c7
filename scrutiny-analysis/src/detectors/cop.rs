//! CoP — Connascence of Position. Functions with more than `param_count_limit`
//! positional parameters, or call sites with more than that many positional
//! arguments (spec §4.3). Severity escalates to `high` past
//! `position_high_severity_limit`.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{CallSite, FunctionInfo, Violation, ViolationKind};

#[derive(Default)]
pub struct CoPDetector {
    param_limit: usize,
    high_limit: usize,
    severity_override: Option<Severity>,
    found: Vec<Violation>,
}

impl CoPDetector {
    fn severity_for(&self, count: usize) -> Severity {
        if let Some(s) = self.severity_override {
            return s;
        }
        if count > self.high_limit {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    fn check_function(&mut self, ctx: &DetectionContext, info: &FunctionInfo) {
        let count = info.param_count();
        if count <= self.param_limit {
            return;
        }
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfPosition,
            self.severity_for(count),
            Span::point(ctx.file, info.span.line, info.span.col),
            format!("function `{}` takes {count} positional parameters (limit {})", info.name, self.param_limit),
            serde_json::json!({ "function": info.name, "param_count": count }),
        ));
    }

    fn check_call(&mut self, ctx: &DetectionContext, call: &CallSite) {
        if call.arg_count <= self.param_limit {
            return;
        }
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfPosition,
            self.severity_for(call.arg_count),
            Span::point(ctx.file, call.line, call.column),
            format!("call to `{}` passes {} positional arguments (limit {})", call.callee_name, call.arg_count, self.param_limit),
            serde_json::json!({ "callee": call.callee_name, "arg_count": call.arg_count }),
        ));
    }
}

impl Detector for CoPDetector {
    fn id(&self) -> &'static str {
        "CoP"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.param_limit = config.detectors.threshold_usize_or("CoP", "param_count_limit", scrutiny_core::constants::POSITION_PARAM_LIMIT);
        self.high_limit = config.detectors.threshold_usize_or("CoP", "position_high_severity_limit", scrutiny_core::constants::POSITION_HIGH_SEVERITY_LIMIT);
        self.severity_override = config.detectors.severity_override("CoP").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        match event {
            crate::types::VisitorEvent::FunctionDef { info } => self.check_function(ctx, info),
            crate::types::VisitorEvent::Call { call } => self.check_call(ctx, call),
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
    use crate::types::{Parameter, ParsedUnit, SourceFile};
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

    fn params(n: usize) -> Vec<Parameter> {
        (0..n).map(|i| Parameter { name: format!("p{i}"), has_default: false, position: i }).collect()
    }

    #[test]
    fn five_params_is_high_severity() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoPDetector::default();
        detector.configure(&config);
        let info = FunctionInfo {
            name: "f".into(),
            span: scrutiny_core::types::span::Span::point("a.py", 1, 0),
            body_span: scrutiny_core::types::span::Span::point("a.py", 1, 0),
            params: params(5),
            enclosing_class: None,
            is_method: false,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info });
        let found = detector.finalize(&ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::High);
    }

    #[test]
    fn three_params_is_not_flagged() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoPDetector::default();
        detector.configure(&config);
        let info = FunctionInfo {
            name: "f".into(),
            span: scrutiny_core::types::span::Span::point("a.py", 1, 0),
            body_span: scrutiny_core::types::span::Span::point("a.py", 1, 0),
            params: params(3),
            enclosing_class: None,
            is_method: false,
        };
        detector.consume(&ctx, &crate::types::VisitorEvent::FunctionDef { info });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
