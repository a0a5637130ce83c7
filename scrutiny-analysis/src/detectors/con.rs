//! CoN — Connascence of Name. A call site whose callee name is also
//! imported or defined in several other files accumulates "name fan-out":
//! every one of those files must agree on the name's spelling to stay
//! working (spec §4.3). Flags names referenced from at least
//! `name_fan_out_limit` distinct files, which requires the repo-wide name
//! index the orchestrator builds in its first pass (`ctx.name_file_counts`).

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashSet;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{CallSite, Violation, ViolationKind};

#[derive(Default)]
pub struct CoNDetector {
    fan_out_limit: usize,
    severity_override: Option<Severity>,
    seen: FxHashSet<String>,
    found: Vec<Violation>,
}

impl CoNDetector {
    fn check(&mut self, ctx: &DetectionContext, call: &CallSite) {
        if !self.seen.insert(call.callee_name.clone()) {
            return;
        }
        let file_count = ctx.name_file_counts.get(&call.callee_name).copied().unwrap_or(0);
        if file_count < self.fan_out_limit {
            return;
        }
        let severity = self.severity_override.unwrap_or(Severity::Low);
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfName,
            severity,
            Span::point(ctx.file, call.line, call.column),
            format!("name `{}` is referenced from {file_count} files; a rename here would ripple across all of them", call.callee_name),
            serde_json::json!({ "name": call.callee_name, "file_count": file_count }),
        ));
    }
}

impl Detector for CoNDetector {
    fn id(&self) -> &'static str {
        "CoN"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.fan_out_limit = config.detectors.threshold_usize_or("CoN", "name_fan_out_limit", 2);
        self.severity_override = config.detectors.severity_override("CoN").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        if let crate::types::VisitorEvent::Call { call } = event {
            self.check(ctx, call);
        }
    }

    fn finalize(&mut self, _ctx: &DetectionContext) -> Vec<Violation> {
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

    fn call(name: &str) -> CallSite {
        CallSite {
            callee_name: name.into(),
            receiver: None,
            arg_count: 0,
            line: 3,
            column: 0,
            enclosing_function: None,
            result_used: false,
        }
    }

    #[test]
    fn flags_name_referenced_across_multiple_files() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let mut index = scrutiny_core::types::collections::FxHashMap::default();
        index.insert("process_order".to_string(), 3usize);
        let ctx = DetectionContext::with_name_index(&unit, &config, &index);
        let mut detector = CoNDetector::default();
        detector.configure(&config);
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("process_order") });
        assert_eq!(detector.finalize(&ctx).len(), 1);
    }

    #[test]
    fn ignores_name_local_to_one_file() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoNDetector::default();
        detector.configure(&config);
        detector.consume(&ctx, &crate::types::VisitorEvent::Call { call: call("helper") });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
