//! `DetectionContext` — the read-only view detectors see of one file. Field
//! names (`call_sites`, `file`, `string_literals`) mirror the teacher's
//! `detectors::security::mod::SecurityDetector::detect` call-site idiom
//! (`ctx.call_sites`, `ctx.parse_result.string_literals`).

use std::sync::OnceLock;

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::types::collections::FxHashMap;

use crate::types::{AttributeAccess, CallSite, ClassInfo, FunctionInfo, IdentityComparison, ImportInfo, LiteralInfo, ParsedUnit, VisitorEvent};

fn empty_name_index() -> &'static FxHashMap<String, usize> {
    static EMPTY: OnceLock<FxHashMap<String, usize>> = OnceLock::new();
    EMPTY.get_or_init(FxHashMap::default)
}

pub struct DetectionContext<'a> {
    pub file: &'a str,
    pub unit: &'a ParsedUnit,
    pub config: &'a AnalysisConfig,
    pub events: &'a [VisitorEvent],
    pub functions: &'a [FunctionInfo],
    pub classes: &'a [ClassInfo],
    pub call_sites: &'a [CallSite],
    pub imports: &'a [ImportInfo],
    pub string_literals: &'a [LiteralInfo],
    pub numeric_literals: &'a [LiteralInfo],
    pub attribute_accesses: &'a [AttributeAccess],
    pub identity_comparisons: &'a [IdentityComparison],
    pub is_test_file: bool,
    pub is_generated: bool,
    /// Repo-wide count of distinct files importing each name, built by a
    /// cheap first pass over every `ParsedUnit`'s imports before the
    /// detector fan-out starts (ground: teacher's two-pass
    /// `LearningDetectorHandler` idiom, generalized from pattern learning
    /// to cross-file name-usage counting). Empty outside the orchestrator.
    pub name_file_counts: &'a FxHashMap<String, usize>,
}

impl<'a> DetectionContext<'a> {
    pub fn new(unit: &'a ParsedUnit, config: &'a AnalysisConfig) -> Self {
        Self::with_name_index(unit, config, empty_name_index())
    }

    pub fn with_name_index(
        unit: &'a ParsedUnit,
        config: &'a AnalysisConfig,
        name_file_counts: &'a FxHashMap<String, usize>,
    ) -> Self {
        let is_test_file = config.paths.is_test_file(&unit.file.path);
        let is_generated = config.paths.is_generated(&unit.file.path);
        Self {
            file: &unit.file.path,
            unit,
            config,
            events: &unit.events,
            functions: &unit.functions,
            classes: &unit.classes,
            call_sites: &unit.calls,
            imports: &unit.imports,
            string_literals: &unit.string_literals,
            numeric_literals: &unit.numeric_literals,
            attribute_accesses: &unit.attribute_accesses,
            identity_comparisons: &unit.identity_comparisons,
            is_test_file,
            is_generated,
            name_file_counts,
        }
    }
}
