//! Default thresholds, mirroring spec §4 and §6 exactly. Every value here is
//! overridable through `AnalysisConfig`; nothing is hard-coded into detector
//! logic (spec §9 note 2).

/// CoP: functions/call sites with more than this many positional args/params
/// are flagged (severity escalates further past `POSITION_HIGH_SEVERITY`).
pub const POSITION_PARAM_LIMIT: usize = 3;
pub const POSITION_HIGH_SEVERITY_LIMIT: usize = 5;

/// CoA / MECE: minimum statement count for a block to be fingerprinted.
pub const MIN_BLOCK_STATEMENTS: usize = 6;
pub const MIN_BLOCK_LINES: usize = 6;

/// MECE: Jaccard similarity threshold for clustering near-duplicate blocks.
pub const MECE_SIMILARITY_THRESHOLD: f64 = 0.82;
pub const MECE_SHINGLE_K: usize = 5;

/// CoV: literal value repetition threshold before flagging.
pub const VALUE_REPETITION_THRESHOLD: usize = 3;

/// God object: size/responsibility defaults (spec §4.4).
pub const GOD_OBJECT_MIN_METHODS: usize = 20;
pub const GOD_OBJECT_MIN_LOC: usize = 500;
pub const GOD_OBJECT_MIN_RESPONSIBILITY_SCORE: f64 = 0.6;

/// NASA POT10 defaults (spec §4.6).
pub const NASA_FUNCTION_LINE_BUDGET: usize = 60;
pub const NASA_MIN_ASSERTION_DENSITY: f64 = 0.02;

/// Quality gate defaults (spec §4.10 / §6).
pub const GATE_NASA_COMPLIANCE_MIN: f64 = 0.90;
pub const GATE_MECE_SCORE_MIN: f64 = 0.75;
pub const GATE_GOD_OBJECTS_MAX: usize = 25;
pub const GATE_CRITICAL_MAX: usize = 0;
pub const GATE_HIGH_MAX: usize = 5;

/// Detector pool defaults (spec §4.7).
pub const POOL_MIN_SIZE: usize = 2;
pub const POOL_MAX_SIZE: usize = 16;
pub const POOL_ACQUIRE_TIMEOUT_MS: u64 = 500;
pub const POOL_SCALE_UP_UTILIZATION: f64 = 0.90;
pub const POOL_SCALE_UP_WINDOW_SECS: u64 = 10;
pub const POOL_SCALE_DOWN_UTILIZATION: f64 = 0.30;
pub const POOL_SCALE_DOWN_WINDOW_SECS: u64 = 60;
pub const POOL_CONTENTION_LOG_THRESHOLD_MS: u64 = 3;

/// Orchestrator defaults (spec §4.9 / §6).
pub const DEFAULT_PER_FILE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MEMORY_LIMIT_MB: u64 = 200;

/// Incremental cache design target (spec §4.8 / §8).
pub const CACHE_TARGET_HIT_RATE: f64 = 0.90;

pub const ANALYZER_VERSION: &str = env!("CARGO_PKG_VERSION");
