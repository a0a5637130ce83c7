//! Ground: `drift_analysis::detectors::registry::DetectorRegistry`. Runs
//! every registered detector over one file's event sequence, isolating each
//! detector behind `catch_unwind` so a panicking detector degrades to a
//! `DETECTOR_FAILURE` info violation instead of aborting the file (spec
//! §4.3's failure semantics).

use std::panic::{catch_unwind, AssertUnwindSafe};

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::errors::error_code::DETECTOR_FAILURE;
use scrutiny_core::types::identifiers::RuleId;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::detectors::coa::CoADetector;
use crate::detectors::coc::CoCDetector;
use crate::detectors::coe::CoEDetector;
use crate::detectors::coi::CoIDetector;
use crate::detectors::com::CoMDetector;
use crate::detectors::con::CoNDetector;
use crate::detectors::cop::CoPDetector;
use crate::detectors::cot::CoTDetector;
use crate::detectors::cov::CoVDetector;
use crate::detectors::traits::Detector;
use crate::engine::DetectionContext;
use crate::structural::nasa::NasaRuleEngine;
use crate::types::{Violation, ViolationKind};

pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
    nasa: NasaRuleEngine,
}

/// Builds the closed set of nine connascence detectors plus the NASA rule
/// engine (ground: `create_default_registry`), filtered by
/// `detectors.enabled`.
pub fn create_default_registry(config: &AnalysisConfig) -> DetectorRegistry {
    let mut all: Vec<Box<dyn Detector>> = vec![
        Box::new(CoNDetector::default()),
        Box::new(CoTDetector::default()),
        Box::new(CoMDetector::default()),
        Box::new(CoPDetector::default()),
        Box::new(CoADetector::default()),
        Box::new(CoEDetector::default()),
        Box::new(CoVDetector::default()),
        Box::new(CoIDetector::default()),
        Box::new(CoCDetector::default()),
    ];
    all.retain(|d| config.detectors.is_enabled(d.id()));
    for detector in &mut all {
        detector.configure(config);
    }
    let mut nasa = NasaRuleEngine::default();
    nasa.configure(config);
    DetectorRegistry { detectors: all, nasa }
}

impl DetectorRegistry {
    /// Runs every enabled detector over `ctx`'s event sequence in a single
    /// pass (spec §4.2's amortization: one `Vec` scan per detector, zero
    /// additional AST walks), isolating panics per detector.
    pub fn run_all(&mut self, ctx: &DetectionContext) -> Vec<Violation> {
        let mut violations = Vec::new();

        for detector in &mut self.detectors {
            let id = detector.id();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                for event in ctx.events {
                    detector.consume(ctx, event);
                }
                detector.finalize(ctx)
            }));
            match outcome {
                Ok(mut found) => violations.append(&mut found),
                Err(_) => {
                    tracing::error!(detector = id, file = ctx.file, "detector panicked, degrading to info violation");
                    violations.push(detector_failure_violation(ctx.file, id));
                }
            }
        }

        let nasa_outcome = catch_unwind(AssertUnwindSafe(|| {
            for event in ctx.events {
                self.nasa.consume(ctx, event);
            }
            self.nasa.finalize(ctx)
        }));
        match nasa_outcome {
            Ok(mut found) => violations.append(&mut found),
            Err(_) => {
                tracing::error!(detector = "nasa", file = ctx.file, "NASA rule engine panicked");
                violations.push(detector_failure_violation(ctx.file, "NASA"));
            }
        }

        violations
    }

    /// `(evaluable_sites, weighted_violations)` accumulated by the NASA rule
    /// engine across every file this registry instance has run — the
    /// aggregator sums these across every pooled instance to compute the
    /// repo-wide `nasa_compliance` score.
    pub fn nasa_metrics(&self) -> (usize, f64) {
        (self.nasa.evaluable_sites(), self.nasa.weighted_violations())
    }
}

fn detector_failure_violation(file: &str, detector_id: &str) -> Violation {
    let mut v = Violation::new(
        ViolationKind::DetectorFailure,
        Severity::Info,
        Span::point(file, 0, 0),
        format!("detector {detector_id} failed on {file}"),
        serde_json::json!({ "detector_id": detector_id, "error_code": DETECTOR_FAILURE }),
    );
    v.rule_id = RuleId::new(DETECTOR_FAILURE);
    v
}
