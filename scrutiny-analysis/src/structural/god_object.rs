//! God Object Analyzer (C4, spec §4.4). Flags a class as a god object when
//! it is both large (methods/LOC) and heavily coupled (responsibility
//! score), unless it is allow-listed by fully-qualified name. Runs
//! per-file: fan-in/fan-out are approximated from calls observed within the
//! same file, since cross-file call graphs are out of scope for this
//! analyzer (the MECE analyzer and incremental cache are the only
//! cross-file structures this repo builds).

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::engine::DetectionContext;
use crate::types::{ClassInfo, GodObjectFinding, Violation, ViolationKind};

fn fqn(file: &str, class: &str) -> String {
    format!("{file}::{class}")
}

/// "Normalized by module size" (spec §4.4) taken as coupling per method:
/// a class with many methods needs proportionally more fan-in/fan-out
/// before its responsibility score crosses the gate.
fn responsibility_score(fan_out: usize, fan_in: usize, public_fields: usize, method_count: usize) -> f64 {
    let raw = fan_out as f64 + 0.5 * fan_in as f64 + 0.2 * public_fields as f64;
    raw / method_count.max(1) as f64
}

fn class_loc(class: &ClassInfo) -> usize {
    (class.span.end_line.saturating_sub(class.span.line) + 1) as usize
}

fn analyze_one(ctx: &DetectionContext, class: &ClassInfo, min_methods: usize, min_loc: usize, min_score: f64, allowlist: &[String]) -> Option<(GodObjectFinding, Violation)> {
    let id = fqn(ctx.file, &class.name);
    if allowlist.iter().any(|a| a == &id) {
        return None;
    }

    let loc = class_loc(class);
    if class.methods.len() < min_methods && loc < min_loc {
        return None;
    }

    let fan_out = ctx
        .call_sites
        .iter()
        .filter(|c| c.enclosing_function.as_deref().is_some_and(|f| class.methods.iter().any(|m| m == f)))
        .filter(|c| !class.methods.iter().any(|m| m == &c.callee_name))
        .count();
    let fan_in = ctx.call_sites.iter().filter(|c| class.methods.iter().any(|m| m == &c.callee_name)).count();

    let score = responsibility_score(fan_out, fan_in, class.public_fields.len(), class.methods.len());
    if score < min_score {
        return None;
    }

    let finding = GodObjectFinding {
        class_or_module_id: id.clone(),
        methods: class.methods.len(),
        fields: class.public_fields.len(),
        loc,
        fan_in,
        fan_out,
        responsibility_score: score,
        file: ctx.file.to_string(),
    };
    let violation = Violation::new(
        ViolationKind::GodObject,
        Severity::High,
        Span::point(ctx.file, class.span.line, class.span.col),
        format!("`{}` is a god object: {} methods, {loc} lines, responsibility score {score:.2}", class.name, class.methods.len()),
        serde_json::json!({ "class": id, "methods": class.methods.len(), "loc": loc, "responsibility_score": score }),
    );
    Some((finding, violation))
}

pub fn detect_god_objects(ctx: &DetectionContext, config: &AnalysisConfig) -> Vec<(GodObjectFinding, Violation)> {
    let min_methods = config.detectors.threshold_usize_or("GOD_OBJECT", "min_methods", scrutiny_core::constants::GOD_OBJECT_MIN_METHODS);
    let min_loc = config.detectors.threshold_usize_or("GOD_OBJECT", "min_loc", scrutiny_core::constants::GOD_OBJECT_MIN_LOC);
    let min_score = config.detectors.threshold_or("GOD_OBJECT", "min_responsibility_score", scrutiny_core::constants::GOD_OBJECT_MIN_RESPONSIBILITY_SCORE);

    ctx.classes
        .iter()
        .filter_map(|class| analyze_one(ctx, class, min_methods, min_loc, min_score, &config.allowlist.god_objects))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CallSite, ParsedUnit, SourceFile};
    use scrutiny_core::types::identifiers::FileId;
    use scrutiny_core::types::span::Span as CoreSpan;
    use std::sync::Arc;

    fn big_class() -> ClassInfo {
        let methods: Vec<String> = (0..25).map(|i| format!("m{i}")).collect();
        let mut span = CoreSpan::point("a.py", 1, 0);
        span.end_line = 600;
        ClassInfo { name: "Big".into(), span, methods, public_fields: vec!["a".into(), "b".into()] }
    }

    fn unit(class: ClassInfo, calls: Vec<CallSite>) -> ParsedUnit {
        ParsedUnit {
            file: SourceFile::new(FileId::new(1), "a.py".into(), crate::language::Language::Python, b"x", 0),
            source: String::new(),
            stripped_source: String::new(),
            tree: None,
            events: Arc::new(Vec::new()),
            functions: Vec::new(),
            classes: vec![class],
            calls,
            imports: Vec::new(),
            string_literals: Vec::new(),
            numeric_literals: Vec::new(),
            attribute_accesses: Vec::new(),
            identity_comparisons: Vec::new(),
        }
    }

    fn call(callee: &str, enclosing: &str) -> CallSite {
        CallSite { callee_name: callee.into(), receiver: None, arg_count: 0, line: 1, column: 0, enclosing_function: Some(enclosing.into()), result_used: true }
    }

    #[test]
    fn flags_large_highly_coupled_class() {
        let calls: Vec<CallSite> = (0..20).map(|i| call(&format!("external_{i}"), "m0")).collect();
        let unit = unit(big_class(), calls);
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        let findings = detect_god_objects(&ctx, &config);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].0.methods, 25);
    }

    #[test]
    fn allowlisted_class_is_skipped() {
        let calls: Vec<CallSite> = (0..20).map(|i| call(&format!("external_{i}"), "m0")).collect();
        let unit = unit(big_class(), calls);
        let mut config = AnalysisConfig::default();
        config.allowlist.god_objects.push("a.py::Big".into());
        let ctx = DetectionContext::new(&unit, &config);
        assert!(detect_god_objects(&ctx, &config).is_empty());
    }

    #[test]
    fn small_class_is_never_flagged() {
        let span = CoreSpan::point("a.py", 1, 0);
        let class = ClassInfo { name: "Small".into(), span, methods: vec!["m".into()], public_fields: Vec::new() };
        let unit = unit(class, Vec::new());
        let config = AnalysisConfig::default();
        let ctx = DetectionContext::new(&unit, &config);
        assert!(detect_god_objects(&ctx, &config).is_empty());
    }
}
