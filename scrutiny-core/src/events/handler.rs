//! `AnalysisEventHandler` — the progress-reporting collaborator.
//!
//! CLI/dashboard front-ends are out of scope (spec §1); this trait is the
//! contract they would implement against. Every method has a no-op default
//! so the core never depends on a front-end existing.

use super::types::*;

pub trait AnalysisEventHandler: Send + Sync {
    fn on_scan_started(&self, _event: &ScanStartedEvent) {}
    fn on_scan_progress(&self, _event: &ScanProgressEvent) {}
    fn on_scan_complete(&self, _event: &ScanCompleteEvent) {}
    fn on_scan_error(&self, _event: &ScanErrorEvent) {}
    fn on_file_analyzed(&self, _event: &FileAnalyzedEvent) {}
    fn on_run_complete(&self, _event: &RunCompleteEvent) {}
    fn on_pool_contention(&self, _event: &ContentionEvent) {}
}

/// Default handler used when the caller doesn't care about progress
/// (ground: `drift_core::traits::decomposition::NoOpPriorProvider`'s
/// no-op-by-default idiom).
pub struct NoOpEventHandler;

impl AnalysisEventHandler for NoOpEventHandler {}
