//! Event payloads for scan/analysis progress reporting.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ScanStartedEvent {
    pub root: PathBuf,
    pub file_count: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ScanProgressEvent {
    pub processed: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ScanCompleteEvent {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ScanErrorEvent {
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct FileAnalyzedEvent {
    pub file: String,
    pub violations_found: usize,
    pub duration_us: u64,
}

#[derive(Debug, Clone)]
pub struct RunCompleteEvent {
    pub files_analyzed: usize,
    pub total_violations: usize,
    pub partial: bool,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ContentionEvent {
    pub detector_kind: String,
    pub wait_ms: u64,
}
