//! Core data model (spec §3): `SourceFile`, `ParsedUnit`, `VisitorEvent`,
//! `Violation`, `DetectorResult`, `GodObjectFinding`, `DuplicationCluster`,
//! `RepoReport`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use scrutiny_core::types::identifiers::{FileId, RuleId};
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;

use crate::language::Language;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: FileId,
    pub path: String,
    pub language: Language,
    pub content_hash: u64,
    pub sha256: [u8; 32],
    pub size_loc: usize,
    pub mtime: u64,
}

impl SourceFile {
    pub fn new(id: FileId, path: String, language: Language, content: &[u8], mtime: u64) -> Self {
        let content_hash = xxhash_rust::xxh3::xxh3_64(content);
        let sha256 = {
            let mut hasher = Sha256::new();
            hasher.update(content);
            hasher.finalize().into()
        };
        let size_loc = bytecount::count_lines(content);
        Self {
            id,
            path,
            language,
            content_hash,
            sha256,
            size_loc,
            mtime,
        }
    }

    pub fn sha256_hex(&self) -> String {
        self.sha256.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// A minimal line-counting helper; kept local rather than pulling in the
/// `bytecount` crate for one call site.
mod bytecount {
    pub fn count_lines(content: &[u8]) -> usize {
        content.iter().filter(|&&b| b == b'\n').count() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub has_default: bool,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub span: Span,
    pub body_span: Span,
    pub params: Vec<Parameter>,
    pub enclosing_class: Option<String>,
    pub is_method: bool,
}

impl FunctionInfo {
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn body_lines(&self) -> u32 {
        self.body_span.end_line.saturating_sub(self.body_span.line) + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub span: Span,
    pub methods: Vec<String>,
    pub public_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee_name: String,
    pub receiver: Option<String>,
    pub arg_count: usize,
    pub line: u32,
    pub column: u32,
    pub enclosing_function: Option<String>,
    pub result_used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiteralKind {
    Numeric,
    String,
    Bool,
    Null,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralInfo {
    pub kind: LiteralKind,
    pub raw: String,
    pub canonical_value: String,
    pub line: u32,
    pub column: u32,
    pub in_predicate: bool,
    pub in_declaration: bool,
    pub enclosing_function: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    pub imported_name: String,
    pub source_module: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityComparison {
    pub lhs: String,
    pub rhs: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeAccess {
    pub object: String,
    pub attribute: String,
    pub line: u32,
    pub column: u32,
}

/// One entry of the tagged `VisitorEvent` sequence (spec §3). Materialized
/// as a finite `Vec` per `ParsedUnit` rather than streamed, per spec §9's
/// "materialize the event sequence as a finite list" redesign note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitorEvent {
    ModuleStart { file: String },
    ModuleEnd { file: String },
    FunctionDef { info: FunctionInfo },
    FunctionEnd { name: String },
    ClassDef { info: ClassInfo },
    ClassEnd { name: String },
    Parameter { function: String, param: Parameter },
    Call { call: CallSite },
    LiteralNumber { literal: LiteralInfo },
    LiteralString { literal: LiteralInfo },
    Assignment { target: String, line: u32, enclosing_function: Option<String> },
    Return { line: u32, enclosing_function: Option<String> },
    ControlFlow { kind: String, line: u32, enclosing_function: Option<String> },
    Import { info: ImportInfo },
    AttributeAccess { access: AttributeAccess },
    IdentityComparison { comparison: IdentityComparison },
}

impl VisitorEvent {
    pub fn line(&self) -> u32 {
        match self {
            Self::ModuleStart { .. } | Self::ModuleEnd { .. } => 0,
            Self::FunctionDef { info } => info.span.line,
            Self::FunctionEnd { .. } => 0,
            Self::ClassDef { info } => info.span.line,
            Self::ClassEnd { .. } => 0,
            Self::Parameter { .. } => 0,
            Self::Call { call } => call.line,
            Self::LiteralNumber { literal } | Self::LiteralString { literal } => literal.line,
            Self::Assignment { line, .. } => *line,
            Self::Return { line, .. } => *line,
            Self::ControlFlow { line, .. } => *line,
            Self::Import { info } => info.line,
            Self::AttributeAccess { access } => access.line,
            Self::IdentityComparison { comparison } => comparison.line,
        }
    }
}

/// `ParsedUnit` (spec §3): owned by the cache, shared read-only with
/// visitors and detectors. `ast_root` is non-null iff the parser succeeded.
pub struct ParsedUnit {
    pub file: SourceFile,
    pub source: String,
    pub stripped_source: String,
    pub tree: Option<tree_sitter::Tree>,
    pub events: Arc<Vec<VisitorEvent>>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportInfo>,
    pub string_literals: Vec<LiteralInfo>,
    pub numeric_literals: Vec<LiteralInfo>,
    pub attribute_accesses: Vec<AttributeAccess>,
    pub identity_comparisons: Vec<IdentityComparison>,
}

impl ParsedUnit {
    pub fn parsed_ok(&self) -> bool {
        self.tree.is_some()
    }

    /// The serializable projection of a `ParsedUnit` that the disk-tier
    /// cache persists: every derived fact except the raw `tree_sitter::Tree`
    /// (which isn't `Serialize`) and the original `source` (cheap to reread
    /// from disk on a cache hit, since the file's content already matched
    /// the cache key). `events` is rebuilt from the flat tables on load
    /// rather than stored twice.
    pub fn to_cached(&self) -> CachedUnit {
        CachedUnit {
            file: self.file.clone(),
            stripped_source: self.stripped_source.clone(),
            functions: self.functions.clone(),
            classes: self.classes.clone(),
            calls: self.calls.clone(),
            imports: self.imports.clone(),
            string_literals: self.string_literals.clone(),
            numeric_literals: self.numeric_literals.clone(),
            attribute_accesses: self.attribute_accesses.clone(),
            identity_comparisons: self.identity_comparisons.clone(),
        }
    }
}

/// Disk-cacheable projection of `ParsedUnit` (see `ParsedUnit::to_cached`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedUnit {
    pub file: SourceFile,
    pub stripped_source: String,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub calls: Vec<CallSite>,
    pub imports: Vec<ImportInfo>,
    pub string_literals: Vec<LiteralInfo>,
    pub numeric_literals: Vec<LiteralInfo>,
    pub attribute_accesses: Vec<AttributeAccess>,
    pub identity_comparisons: Vec<IdentityComparison>,
}

impl From<CachedUnit> for ParsedUnit {
    /// Reconstitutes a stand-in `ParsedUnit` from a cache hit. `source` and
    /// `tree`/`events` can't round-trip, so this is only valid for consumers
    /// that read the flat tables directly (god-object detection, MECE) —
    /// never for a detector that walks `events`, since on a full cache hit
    /// the per-file detectors aren't re-run at all.
    fn from(cached: CachedUnit) -> Self {
        ParsedUnit {
            file: cached.file,
            source: String::new(),
            stripped_source: cached.stripped_source,
            tree: None,
            events: Arc::new(Vec::new()),
            functions: cached.functions,
            classes: cached.classes,
            calls: cached.calls,
            imports: cached.imports,
            string_literals: cached.string_literals,
            numeric_literals: cached.numeric_literals,
            attribute_accesses: cached.attribute_accesses,
            identity_comparisons: cached.identity_comparisons,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViolationKind {
    ConnascenceOfName,
    ConnascenceOfType,
    ConnascenceOfMeaning,
    ConnascenceOfPosition,
    ConnascenceOfAlgorithm,
    ConnascenceOfExecution,
    ConnascenceOfValue,
    ConnascenceOfIdentity,
    ConnascenceOfConvention,
    GodObject,
    Duplication,
    NasaRuleViolation,
    ParseFailed,
    ParseDegraded,
    FileTimeout,
    PoolStarvation,
    DetectorFailure,
    EncodingError,
    CacheDegraded,
}

impl ViolationKind {
    pub fn rule_id_str(&self) -> &'static str {
        match self {
            Self::ConnascenceOfName => "CoN",
            Self::ConnascenceOfType => "CoT",
            Self::ConnascenceOfMeaning => "CoM",
            Self::ConnascenceOfPosition => "CoP",
            Self::ConnascenceOfAlgorithm => "CoA",
            Self::ConnascenceOfExecution => "CoE",
            Self::ConnascenceOfValue => "CoV",
            Self::ConnascenceOfIdentity => "CoI",
            Self::ConnascenceOfConvention => "CoC",
            Self::GodObject => "GOD_OBJECT",
            Self::Duplication => "DUPLICATION",
            Self::NasaRuleViolation => "NASA",
            Self::ParseFailed => "PARSE_FAILED",
            Self::ParseDegraded => "PARSE_DEGRADED",
            Self::FileTimeout => "FILE_TIMEOUT",
            Self::PoolStarvation => "POOL_STARVATION",
            Self::DetectorFailure => "DETECTOR_FAILURE",
            Self::EncodingError => "ENCODING_ERROR",
            Self::CacheDegraded => "CACHE_DEGRADED",
        }
    }
}

/// A single finding (spec §3). `id` is a stable hash of
/// `(kind, canonical_span, canonical_payload)` so unrelated edits elsewhere
/// in the file never change it (spec §8 property 4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub id: u64,
    pub kind: ViolationKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
    pub evidence: serde_json::Value,
    pub rule_id: RuleId,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        severity: Severity,
        span: Span,
        message: impl Into<String>,
        evidence: serde_json::Value,
    ) -> Self {
        let rule_id = RuleId::new(kind.rule_id_str());
        let id = Self::stable_id(kind, &span, &evidence);
        Self {
            id,
            kind,
            severity,
            span,
            message: message.into(),
            evidence,
            rule_id,
        }
    }

    fn stable_id(kind: ViolationKind, span: &Span, evidence: &serde_json::Value) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        use std::hash::{Hash, Hasher};
        (kind as u8).hash(&mut hasher);
        span.file.hash(&mut hasher);
        span.line.hash(&mut hasher);
        span.col.hash(&mut hasher);
        evidence.to_string().hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectorMetrics {
    pub evaluable_sites: usize,
    pub flagged_sites: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorResult {
    pub detector_id: String,
    pub file_id: FileId,
    pub violations: Vec<Violation>,
    pub metrics: DetectorMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GodObjectFinding {
    pub class_or_module_id: String,
    pub methods: usize,
    pub fields: usize,
    pub loc: usize,
    pub fan_in: usize,
    pub fan_out: usize,
    pub responsibility_score: f64,
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationBlock {
    pub file: String,
    pub line_start: u32,
    pub line_end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicationCluster {
    pub cluster_id: u64,
    pub similarity: f64,
    pub blocks: Vec<DuplicationBlock>,
    pub canonical_block: DuplicationBlock,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub files_analyzed: usize,
    pub nasa_compliance: f64,
    pub mece_score: f64,
    pub god_object_count: usize,
    pub violations_by_severity: std::collections::BTreeMap<String, usize>,
    pub violations_by_rule: std::collections::BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateFailure {
    pub gate: String,
    pub actual: serde_json::Value,
    pub threshold: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateVerdict {
    pub verdict: &'static str,
    pub failures: Vec<GateFailure>,
}

/// `RepoReport` (spec §3 / §6): produced once per run, immutable, serialized
/// to JSON and SARIF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoReport {
    pub analyzer_version: String,
    pub run_id: String,
    pub partial: bool,
    pub summary: Summary,
    pub gate: GateVerdict,
    pub violations: Vec<Violation>,
    pub god_objects: Vec<GodObjectFinding>,
    pub duplication_clusters: Vec<DuplicationCluster>,
}
