//! CoT — Connascence of Type. Attribute access (`obj.attr`) on an object
//! bound to an imported name, where `attr` is not in the language's
//! known-method allow-list, means the caller depends on that imported
//! type's internal shape rather than a documented interface (spec §4.3).

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashSet;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::traits::{Detector, DetectorCategory};
use crate::engine::DetectionContext;
use crate::types::{AttributeAccess, Violation, ViolationKind};

#[derive(Default)]
pub struct CoTDetector {
    imported_names: FxHashSet<String>,
    severity_override: Option<Severity>,
    found: Vec<Violation>,
}

impl CoTDetector {
    fn check(&mut self, ctx: &DetectionContext, access: &AttributeAccess) {
        if !self.imported_names.contains(&access.object) {
            return;
        }
        let strategy = ctx.unit.file.language.strategy();
        if strategy.is_known_method(&access.object, &access.attribute) {
            return;
        }
        let severity = self.severity_override.unwrap_or(Severity::Medium);
        self.found.push(Violation::new(
            ViolationKind::ConnascenceOfType,
            severity,
            Span::point(ctx.file, access.line, access.column),
            format!("`{}.{}` reaches into an imported type's internals", access.object, access.attribute),
            serde_json::json!({ "object": access.object, "attribute": access.attribute }),
        ));
    }
}

impl Detector for CoTDetector {
    fn id(&self) -> &'static str {
        "CoT"
    }

    fn category(&self) -> DetectorCategory {
        DetectorCategory::Connascence
    }

    fn configure(&mut self, config: &AnalysisConfig) {
        self.severity_override = config.detectors.severity_override("CoT").and_then(Severity::parse);
    }

    fn consume(&mut self, ctx: &DetectionContext, event: &crate::types::VisitorEvent) {
        use crate::types::VisitorEvent::*;
        match event {
            Import { info } => {
                self.imported_names.insert(info.imported_name.clone());
            }
            AttributeAccess { access } => self.check(ctx, access),
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
    use crate::types::{ImportInfo, ParsedUnit, SourceFile};
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
    fn flags_internal_attribute_access_on_imported_object() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoTDetector::default();
        detector.configure(&config);
        let import = ImportInfo { imported_name: "widget".into(), source_module: "widgets".into(), line: 1 };
        detector.consume(&ctx, &crate::types::VisitorEvent::Import { info: import });
        let access = AttributeAccess { object: "widget".into(), attribute: "_internal_cache".into(), line: 5, column: 0 };
        detector.consume(&ctx, &crate::types::VisitorEvent::AttributeAccess { access });
        assert_eq!(detector.finalize(&ctx).len(), 1);
    }

    #[test]
    fn ignores_access_on_non_imported_object() {
        let unit = unit();
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let mut detector = CoTDetector::default();
        detector.configure(&config);
        let access = AttributeAccess { object: "local_var".into(), attribute: "_internal_cache".into(), line: 5, column: 0 };
        detector.consume(&ctx, &crate::types::VisitorEvent::AttributeAccess { access });
        assert!(detector.finalize(&ctx).is_empty());
    }
}
