//! `Detector` — the `DetectorBase` contract (spec §4.3). Reconstructed from
//! call sites since the pack's copy of
//! `drift_analysis::detectors::traits::Detector` was filtered out; its
//! shape here is inferred from `detectors/registry.rs`'s dispatch and
//! `detectors/security/mod.rs`'s `fn detect(&self, ctx: &DetectionContext)
//! -> Vec<PatternMatch>` signature, adapted to the spec's
//! configure/consume/finalize split (stateful single-pass instead of the
//! teacher's stateless-per-call `detect`).

use scrutiny_core::config::AnalysisConfig;

use crate::engine::DetectionContext;
use crate::types::{Violation, VisitorEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCategory {
    Connascence,
    Nasa,
}

/// Detectors are **stateless across files**: `finalize` must leave the
/// instance ready for reuse without a fresh allocation (required by the
/// pool, spec §4.7). Detectors must not perform I/O; logging goes through
/// `tracing` only, never a side channel that could race with the
/// single-writer aggregator.
pub trait Detector: Send {
    fn id(&self) -> &'static str;
    fn category(&self) -> DetectorCategory;

    fn configure(&mut self, config: &AnalysisConfig);

    /// Update internal state for one event. Implementations buffer
    /// `Violation`s internally rather than returning per-call, since most
    /// detectors need end-of-file context (e.g. CoV's repetition count) to
    /// decide severity.
    fn consume(&mut self, ctx: &DetectionContext, event: &VisitorEvent);

    /// Emit any deferred violations and leave `self` in a freshly-reset
    /// state, ready for the next file (spec §4.3, §8 property 3).
    fn finalize(&mut self, ctx: &DetectionContext) -> Vec<Violation>;
}
