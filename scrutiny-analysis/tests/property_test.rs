//! Property tests for detector threshold behavior (spec §4.3, §8 property 3:
//! a detector's output depends only on its configured thresholds and the
//! events it consumes, never on call order across files).

use std::sync::Arc;

use proptest::prelude::*;

use scrutiny_analysis::detectors::cop::CoPDetector;
use scrutiny_analysis::detectors::Detector;
use scrutiny_analysis::engine::DetectionContext;
use scrutiny_analysis::language::Language;
use scrutiny_analysis::types::{FunctionInfo, Parameter, ParsedUnit, SourceFile, VisitorEvent};
use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::identifiers::FileId;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

fn empty_unit() -> ParsedUnit {
    ParsedUnit {
        file: SourceFile::new(FileId::new(1), "a.py".into(), Language::Python, b"x", 0),
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

proptest! {
    /// CoP fires iff the parameter count exceeds the configured limit
    /// (default 3), regardless of how many params there actually are above
    /// or below that line.
    #[test]
    fn cop_fires_exactly_past_the_configured_limit(param_count in 0usize..20) {
        let unit = empty_unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoPDetector::default();
        detector.configure(&config);

        let info = FunctionInfo {
            name: "f".into(),
            span: Span::point("a.py", 1, 0),
            body_span: Span::point("a.py", 1, 0),
            params: params(param_count),
            enclosing_class: None,
            is_method: false,
        };
        detector.consume(&ctx, &VisitorEvent::FunctionDef { info });
        let found = detector.finalize(&ctx);

        let limit = scrutiny_core::constants::POSITION_PARAM_LIMIT;
        if param_count > limit {
            prop_assert_eq!(found.len(), 1);
        } else {
            prop_assert!(found.is_empty());
        }
    }

    /// Severity escalates to `high` only once the count passes the
    /// high-severity limit, never before.
    #[test]
    fn cop_severity_escalates_monotonically(param_count in 0usize..30) {
        let unit = empty_unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoPDetector::default();
        detector.configure(&config);

        let info = FunctionInfo {
            name: "f".into(),
            span: Span::point("a.py", 1, 0),
            body_span: Span::point("a.py", 1, 0),
            params: params(param_count),
            enclosing_class: None,
            is_method: false,
        };
        detector.consume(&ctx, &VisitorEvent::FunctionDef { info });
        let found = detector.finalize(&ctx);

        let high_limit = scrutiny_core::constants::POSITION_HIGH_SEVERITY_LIMIT;
        if let Some(violation) = found.first() {
            if param_count > high_limit {
                prop_assert_eq!(violation.severity, Severity::High);
            } else {
                prop_assert_eq!(violation.severity, Severity::Medium);
            }
        }
    }
}
