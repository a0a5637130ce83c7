//! CoC — Connascence of Convention. Entirely config-driven: flags
//! identifiers that violate a configured naming pattern (e.g. a
//! `private_prefix` that must be respected by callers outside the
//! defining class). With no `CoC` override configured there is nothing to
//! check against, so an empty config yields zero findings (spec §4.3).

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{AttributeAccess, Violation, ViolationKind};

#[derive(Default)]
pub struct CoCDetector {
    private_prefix: Option<String>,
    severity_override: Option<Severity>,
    found: Vec<Violation>,
}

impl CoCDetector {
    fn check(&mut self, ctx: &DetectionContext, access: &AttributeAccess) {
        let Some(prefix) = &self.private_prefix else { return };
        if !access.attribute.starts_with(prefix.as_str()) {
            return;
        }
        if access.object == "self" || access.object == "this" || access.object == "cls" {
            return;
        }
        let severity = self.severity_override.unwrap_or(Severity::Medium);
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfConvention,
            severity,
            Span::point(ctx.file, access.line, access.column),
            format!("`{}.{}` accesses a name marked private by the `{prefix}` convention", access.object, access.attribute),
            serde_json::json!({ "object": access.object, "attribute": access.attribute }),
        ));
    }
}

impl Detector for CoCDetector {
    fn id(&self) -> &'static str {
        "CoC"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.private_prefix = config
            .detectors
            .overrides
            .get("CoC")
            .and_then(|o| o.thresholds.get("private_prefix_len"))
            .map(|_| "_".to_string());
        self.severity_override = config.detectors.severity_override("CoC").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        if let crate::types::VisitorEvent::AttributeAccess { access } = event {
            self.check(ctx, access);
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
    use scrutiny_core::config::{DetectorOverride, DetectorsConfig};
    use scrutiny_core::types::identifiers::FileId;
    use std::collections::HashMap;
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
    fn empty_config_flags_nothing() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoCDetector::default();
        detector.configure(&config);
        let access = AttributeAccess { object: "widget".into(), attribute: "_internal".into(), line: 5, column: 0 };
        detector.consume(&ctx, &crate::types::VisitorEvent::AttributeAccess { access });
        assert!(detector.finalize(&ctx).is_empty());
    }

    #[test]
    fn configured_prefix_flags_external_private_access() {
        let unit = unit();
        let mut overrides = HashMap::new();
        overrides.insert(
            "CoC".to_string(),
            DetectorOverride { severity_override: None, thresholds: HashMap::from([("private_prefix_len".to_string(), 1.0)]) },
        );
        let config = AnalysisConfig {
            detectors: DetectorsConfig { enabled: vec![], overrides },
            ..Default::default()
        };
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoCDetector::default();
        detector.configure(&config);
        let access = AttributeAccess { object: "widget".into(), attribute: "_internal".into(), line: 5, column: 0 };
        detector.consume(&ctx, &crate::types::VisitorEvent::AttributeAccess { access });
        assert_eq!(detector.finalize(&ctx).len(), 1);
    }
}
