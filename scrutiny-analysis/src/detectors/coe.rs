//! CoE — Connascence of Execution. Two or more calls against the same
//! receiver with no intervening assignment/return/control-flow between them
//! imply the caller must know the receiver's internal call order (spec
//! §4.3). Always severity `low` — ordering dependence is real but rarely
//! urgent.

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{CallSite, Violation, ViolationKind};

#[derive(Default)]
pub struct CoEDetector {
    min_run: usize,
    last_receiver: Option<String>,
    run: Vec<CallSite>,
    found: Vec<Violation>,
}

impl CoEDetector {
    fn flush(&mut self, ctx: &DetectionContext) {
        if self.run.len() >= self.min_run {
            let receiver = self.last_receiver.clone().unwrap_or_default();
            let first = &self.run[0];
            let callees: Vec<&str> = self.run.iter().map(|c| c.callee_name.as_str()).collect();
            self.found.push(Violation::new(
                ViolationKind::ConnascenceOfExecution,
                Severity::Low,
                Span::point(ctx.file, first.line, first.column),
                format!("calls {} on `{receiver}` must execute in this order with no intervening step", callees.join(" -> ")),
                serde_json::json!({ "receiver": receiver, "sequence": callees }),
            ));
        }
        self.run.clear();
    }

    fn break_run(&mut self, ctx: &DetectionContext) {
        self.flush(ctx);
        self.last_receiver = None;
    }
}

impl Detector for CoEDetector {
    fn id(&self) -> &'static str {
        "CoE"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.min_run = config.detectors.threshold_usize_or("CoE", "min_call_run", 2);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        use crate::types::VisitorEvent::*;
        match event {
            Call { call } => {
                let Some(receiver) = &call.receiver else {
                    self.break_run(ctx);
                    return;
                };
                if self.last_receiver.as_deref() == Some(receiver.as_str()) {
                    self.run.push(call.clone());
                } else {
                    self.flush(ctx);
                    self.last_receiver = Some(receiver.clone());
                    self.run.push(call.clone());
                }
            }
            Assignment { .. } | Return { .. } | ControlFlow { .. } | FunctionEnd { .. } | FunctionDef { .. } => {
                self.break_run(ctx);
            }
            _ => {}
        }
    }

    fn finalize(&mut self, ctx: &DetectionContext) -> Vec<Violation> {
        self.flush(ctx);
        self.last_receiver = None;
        std::mem::take(&mut self.found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ParsedUnit, SourceFile};
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

    fn call(name: &str, receiver: &str, line: u32) -> CallSite {
        CallSite {
            callee_name: name.into(),
            receiver: Some(receiver.into()),
            arg_count: 0,
            line,
            column: 0,
            enclosing_function: None,
            result_used: false,
        }
    }

    #[test]
    fn flags_consecutive_same_receiver_calls() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoEDetector::default();
        detector.configure(&config);
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("open", "conn", 1) });
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("write", "conn", 2) });
        let found = detector.finalize(&ctx);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Low);
    }

    #[test]
    fn assignment_between_calls_breaks_the_run() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoEDetector::default();
        detector.configure(&config);
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("open", "conn", 1) });
        detector.consume(&ctx, &crate::types::VisitorEvent::Assignment { target: "x".into(), line: 2, enclosing_function: None });
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("write", "conn", 3) });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
