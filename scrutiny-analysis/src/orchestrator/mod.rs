//! Streaming Orchestrator (C9, spec §4.9). Ties file discovery, parsing, the
//! detector pool, the incremental cache, and the structural analyzers
//! together into one run producing a `RepoReport`.
//!
//! Two passes per run: pass one parses (or loads from cache) every file and
//! builds the repo-wide name-import index CoN needs; pass two runs the
//! per-file detectors and the god-object analyzer against that index, then
//! MECE once across every file's accumulated facts. Ground for the
//! parallel-workers-plus-single-collector shape: `drift_analysis::scanner`'s
//! `WalkParallel` + crossbeam-channel collection (see `scanner::walker`),
//! generalized from file discovery to file analysis with `rayon` driving the
//! worker side instead of a raw thread pool.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::errors::FatalError;
use scrutiny_core::events::types::{FileAnalyzedEvent, RunCompleteEvent, ScanStartedEvent};
use scrutiny_core::types::collections::FxHashMap;
use scrutiny_core::types::identifiers::FileId;
use scrutiny_core::types::severity::Severity;
use scrutiny_core::types::span::Span;
use scrutiny_core::EventDispatcher;

use crate::cache::IncrementalCache;
use crate::engine::DetectionContext;
use crate::parsers::ParserManager;
use crate::pool::DetectorPool;
use crate::scanner::{walk_directory, WalkOptions};
use crate::structural::{detect_god_objects, MeceAnalyzer};
use crate::types::{GodObjectFinding, ParsedUnit, RepoReport, Summary, Violation, ViolationKind};

mod gate;

pub use gate::evaluate_gate;

/// Every per-file detector id the registry can produce a cacheable result
/// for, plus the NASA rule engine. Kept local to the orchestrator since it's
/// the one place that needs to enumerate the closed set by name rather than
/// by trait object.
const DETECTOR_IDS: &[&str] = &["CoN", "CoT", "CoM", "CoP", "CoA", "CoE", "CoV", "CoI", "CoC", "NASA"];

struct FileOutcome {
    unit: ParsedUnit,
    violations: Vec<Violation>,
    god_objects: Vec<GodObjectFinding>,
}

pub struct Orchestrator {
    config: AnalysisConfig,
    scan_root: PathBuf,
    pool: DetectorPool,
    cache: IncrementalCache,
    events: EventDispatcher,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(config: AnalysisConfig, scan_root: PathBuf) -> Result<Self, FatalError> {
        config.validate()?;
        let cache = IncrementalCache::open(&config, &scan_root).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "incremental cache unavailable for this run, continuing memory-only");
            IncrementalCache::in_memory_only()
        });
        let pool = DetectorPool::new(config.clone());
        Ok(Self {
            config,
            scan_root,
            pool,
            cache,
            events: EventDispatcher::noop(),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_event_dispatcher(mut self, dispatcher: EventDispatcher) -> Self {
        self.events = dispatcher;
        self
    }

    /// A clone of the run's cancellation flag; setting it true cooperatively
    /// stops discovery and skips undispatched files, producing a `partial`
    /// report rather than blocking until every file completes.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn run(&self) -> Result<RepoReport, FatalError> {
        let started = Instant::now();

        let walk_options = WalkOptions {
            include: self.config.paths.include.clone(),
            exclude: self.config.paths.exclude.clone(),
            cancel: Arc::clone(&self.cancel),
        };
        let paths = walk_directory(&self.scan_root, &walk_options).map_err(FatalError::Scan)?;
        self.events.handler().on_scan_started(&ScanStartedEvent {
            root: self.scan_root.clone(),
            file_count: Some(paths.len()),
        });

        // Pass 1: parse or load from cache; nothing here depends on any
        // other file yet.
        let parsed: Vec<ParsedUnit> = paths
            .par_iter()
            .enumerate()
            .map_init(ParserManager::new, |parser, (idx, path)| self.load_unit(parser, path, idx as u64))
            .collect();

        let name_file_counts = build_name_file_counts(&parsed);
        let fingerprint_paths = cross_file_dependencies(&parsed);

        // Pass 2: per-file detection against the now-complete name index,
        // with pool-bounded detector instances.
        let outcomes: Vec<FileOutcome> = parsed
            .into_par_iter()
            .map(|unit| self.detect_one(unit, &name_file_counts, &fingerprint_paths))
            .collect();

        for outcome in &outcomes {
            self.events.handler().on_file_analyzed(&FileAnalyzedEvent {
                file: outcome.unit.file.path.clone(),
                violations_found: outcome.violations.len(),
                duration_us: 0,
            });
        }

        let units: Vec<ParsedUnit> = outcomes.iter().map(|o| clone_unit_facts(&o.unit)).collect();
        let mece = MeceAnalyzer::default();
        let (duplication_clusters, duplication_violations, mece_score) = mece.analyze(&units, &self.config);

        let mut all_violations: Vec<Violation> = Vec::new();
        let mut god_objects: Vec<GodObjectFinding> = Vec::new();
        for mut outcome in outcomes {
            all_violations.append(&mut outcome.violations);
            god_objects.append(&mut outcome.god_objects);
        }
        all_violations.extend(duplication_violations);
        dedup_violations_by_id(&mut all_violations);

        let (evaluable_sites, weighted_violations) = self.pool_nasa_metrics();
        let nasa_compliance = if evaluable_sites == 0 { 1.0 } else { (1.0 - weighted_violations / evaluable_sites as f64).clamp(0.0, 1.0) };

        let partial = self.cancel.load(Ordering::Relaxed);
        let summary = Summary {
            files_analyzed: units.len(),
            nasa_compliance,
            mece_score,
            god_object_count: god_objects.len(),
            violations_by_severity: rollup_by_severity(&all_violations),
            violations_by_rule: rollup_by_rule(&all_violations),
        };
        let gate = evaluate_gate(&self.config.thresholds, &summary);

        self.cache.flush_sync().ok();
        self.events.handler().on_run_complete(&RunCompleteEvent {
            files_analyzed: summary.files_analyzed,
            total_violations: all_violations.len(),
            partial,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        Ok(RepoReport {
            analyzer_version: scrutiny_core::constants::ANALYZER_VERSION.to_string(),
            run_id: format!("{:x}", xxhash_rust::xxh3::xxh3_64(format!("{:?}", started).as_bytes())),
            partial,
            summary,
            gate,
            violations: all_violations,
            god_objects,
            duplication_clusters,
        })
    }

    /// Loads a file's facts: a disk-cache hit yields the prior run's
    /// `CachedUnit` reconstituted into a stub `ParsedUnit` (empty
    /// `events`/`tree`, since those never cross a cache boundary); a miss
    /// parses fresh and writes the cache entry back.
    fn load_unit(&self, parser: &mut ParserManager, path: &Path, idx: u64) -> ParsedUnit {
        let rel = path.strip_prefix(&self.scan_root).unwrap_or(path).to_string_lossy().replace('\\', "/");
        let Ok(content) = std::fs::read(path) else {
            return empty_unit(FileId::new(idx), rel, 0);
        };
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok().and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok()).map(|d| d.as_secs()).unwrap_or(0);

        let probe = crate::types::SourceFile::new(FileId::new(idx), rel.clone(), crate::language::Language::from_extension(rel.rsplit('.').next().unwrap_or("")), &content, mtime);
        if let Some(cached) = self.cache.get_unit(&probe) {
            return cached.into();
        }

        match parser.parse(FileId::new(idx), rel.clone(), &content, mtime) {
            Ok(unit) => {
                let _ = self.cache.put_unit(&unit.to_cached());
                unit
            }
            Err(_) => empty_unit(FileId::new(idx), rel, mtime),
        }
    }

    /// Runs every per-file detector plus god-object detection, preferring a
    /// full cache hit (every enabled detector's cached result present) over
    /// re-running the pool at all.
    fn detect_one(&self, unit: ParsedUnit, name_file_counts: &FxHashMap<String, usize>, dependencies: &FxHashMap<String, Vec<String>>) -> FileOutcome {
        if let Some(deps) = dependencies.get(&unit.file.path) {
            for dep in deps {
                self.cache.record_dependency(dep, &unit.file.path);
            }
        }

        if let Some(mut violations) = self.try_cached_detection(&unit) {
            let ctx = DetectionContext::with_name_index(&unit, &self.config, name_file_counts);
            let (god_objects, mut god_violations) = split_god_objects(detect_god_objects(&ctx, &self.config));
            violations.append(&mut god_violations);
            return FileOutcome { unit, violations, god_objects };
        }

        let handle = match self.pool.acquire() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, file = %unit.file.path, "detector pool starved");
                let v = Violation::new(
                    ViolationKind::PoolStarvation,
                    Severity::Info,
                    Span::point(&unit.file.path, 0, 0),
                    format!("detector pool exhausted analyzing {}", unit.file.path),
                    serde_json::json!({ "error": e.to_string() }),
                );
                let ctx = DetectionContext::with_name_index(&unit, &self.config, name_file_counts);
                let (god_objects, mut god_violations) = split_god_objects(detect_god_objects(&ctx, &self.config));
                let mut violations = vec![v];
                violations.append(&mut god_violations);
                return FileOutcome { unit, violations, god_objects };
            }
        };
        let mut handle = handle;

        let ctx = DetectionContext::with_name_index(&unit, &self.config, name_file_counts);
        let detect_started = Instant::now();
        let mut violations = handle.run_all(&ctx);
        let elapsed = detect_started.elapsed();

        let timeout = std::time::Duration::from_secs(self.config.workers.effective_per_file_timeout_s());
        if elapsed > timeout {
            tracing::warn!(file = %unit.file.path, elapsed_ms = elapsed.as_millis() as u64, timeout_ms = timeout.as_millis() as u64, "file exceeded per-file timeout budget");
            violations.push(Violation::new(
                ViolationKind::FileTimeout,
                Severity::Info,
                Span::point(&unit.file.path, 0, 0),
                format!("detection for {} took {}ms, over the {}s budget", unit.file.path, elapsed.as_millis(), timeout.as_secs()),
                serde_json::json!({ "elapsed_ms": elapsed.as_millis() as u64 }),
            ));
        }

        let (god_objects, mut god_violations) = split_god_objects(detect_god_objects(&ctx, &self.config));
        violations.append(&mut god_violations);

        self.store_per_detector_results(&unit, &violations);

        FileOutcome { unit, violations, god_objects }
    }

    fn try_cached_detection(&self, unit: &ParsedUnit) -> Option<Vec<Violation>> {
        let mut combined = Vec::new();
        for id in self.enabled_detector_ids() {
            let result = self.cache.get_detector_result(&unit.file, id)?;
            combined.extend(result.violations);
        }
        Some(combined)
    }

    fn store_per_detector_results(&self, unit: &ParsedUnit, violations: &[Violation]) {
        let mut by_rule: FxHashMap<&str, Vec<Violation>> = FxHashMap::default();
        for v in violations {
            by_rule.entry(v.rule_id.as_str()).or_default().push(v.clone());
        }
        for id in self.enabled_detector_ids() {
            let vs = by_rule.remove(id).unwrap_or_default();
            let result = crate::types::DetectorResult {
                detector_id: id.to_string(),
                file_id: unit.file.id,
                violations: vs,
                metrics: crate::types::DetectorMetrics::default(),
            };
            let _ = self.cache.put_detector_result(&unit.file, &result);
        }
    }

    fn enabled_detector_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        DETECTOR_IDS.iter().copied().filter(|id| self.config.detectors.is_enabled(id))
    }

    fn pool_nasa_metrics(&self) -> (usize, f64) {
        // The pool's free instances carry every file's cumulative NASA
        // state; a fresh instance acquired here just to read zeros would be
        // wrong, so this walks whatever is parked in the free-list after the
        // run instead of acquiring a new one.
        self.pool.nasa_metrics_snapshot()
    }
}

/// `detect_god_objects` pairs each finding with its own `Violation`; the
/// orchestrator needs both streams separately (findings go on the report's
/// `god_objects` list, violations fold into the shared violations list so
/// they count toward severity rollups and the quality gate).
fn split_god_objects(found: Vec<(GodObjectFinding, Violation)>) -> (Vec<GodObjectFinding>, Vec<Violation>) {
    found.into_iter().unzip()
}

fn empty_unit(id: FileId, path: String, mtime: u64) -> ParsedUnit {
    let language = crate::language::Language::from_extension(path.rsplit('.').next().unwrap_or(""));
    ParsedUnit {
        file: crate::types::SourceFile::new(id, path, language, b"", mtime),
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

/// Repo-wide count of distinct files importing each name (CoN's global
/// signal), built once before the detector fan-out (spec §4.3 CoN).
fn build_name_file_counts(units: &[ParsedUnit]) -> FxHashMap<String, usize> {
    let mut counts: FxHashMap<String, usize> = FxHashMap::default();
    for unit in units {
        let mut seen_in_file: std::collections::HashSet<&str> = std::collections::HashSet::new();
        for import in &unit.imports {
            if seen_in_file.insert(import.imported_name.as_str()) {
                *counts.entry(import.imported_name.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Files sharing at least one imported name are cross-file dependents for
/// CoN and MECE purposes (spec §4.8's invalidation note): changing any one
/// of them must evict the others' cached detector results too.
fn cross_file_dependencies(units: &[ParsedUnit]) -> FxHashMap<String, Vec<String>> {
    let mut by_name: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for unit in units {
        for import in &unit.imports {
            by_name.entry(import.imported_name.as_str()).or_default().push(unit.file.path.as_str());
        }
    }
    let mut deps: FxHashMap<String, Vec<String>> = FxHashMap::default();
    for files in by_name.values() {
        for &file in files {
            for &other in files {
                if file != other {
                    deps.entry(file.to_string()).or_default().push(other.to_string());
                }
            }
        }
    }
    deps
}

fn clone_unit_facts(unit: &ParsedUnit) -> ParsedUnit {
    ParsedUnit {
        file: unit.file.clone(),
        source: String::new(),
        stripped_source: unit.stripped_source.clone(),
        tree: None,
        events: Arc::new(Vec::new()),
        functions: unit.functions.clone(),
        classes: unit.classes.clone(),
        calls: unit.calls.clone(),
        imports: unit.imports.clone(),
        string_literals: unit.string_literals.clone(),
        numeric_literals: unit.numeric_literals.clone(),
        attribute_accesses: unit.attribute_accesses.clone(),
        identity_comparisons: unit.identity_comparisons.clone(),
    }
}

/// A full cache hit can replay the same `Violation` a file already produced
/// on a prior run's overlapping detector set (e.g. re-running both the cache
/// path and a pool fallback for the same id); keep first-seen order, drop
/// later duplicates by stable id.
fn dedup_violations_by_id(violations: &mut Vec<Violation>) {
    let mut seen = std::collections::HashSet::new();
    violations.retain(|v| seen.insert(v.id));
}

fn rollup_by_severity(violations: &[Violation]) -> std::collections::BTreeMap<String, usize> {
    let mut map = std::collections::BTreeMap::new();
    for v in violations {
        *map.entry(v.severity.as_str().to_string()).or_insert(0) += 1;
    }
    map
}

fn rollup_by_rule(violations: &[Violation]) -> std::collections::BTreeMap<String, usize> {
    let mut map = std::collections::BTreeMap::new();
    for v in violations {
        *map.entry(v.rule_id.as_str().to_string()).or_insert(0) += 1;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrutiny_core::types::severity::Severity;

    fn sample_violation(kind: ViolationKind) -> Violation {
        Violation::new(kind, Severity::Low, Span::point("a.py", 1, 0), "m", serde_json::json!({}))
    }

    #[test]
    fn dedup_drops_repeated_ids_keeping_first_seen_order() {
        let a = sample_violation(ViolationKind::ConnascenceOfName);
        let b = sample_violation(ViolationKind::ConnascenceOfType);
        let mut violations = vec![a.clone(), b.clone(), a.clone()];
        dedup_violations_by_id(&mut violations);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].id, a.id);
        assert_eq!(violations[1].id, b.id);
    }

    #[test]
    fn rollups_count_by_severity_and_rule() {
        let violations = vec![sample_violation(ViolationKind::ConnascenceOfName), sample_violation(ViolationKind::ConnascenceOfName), sample_violation(ViolationKind::GodObject)];
        let by_severity = rollup_by_severity(&violations);
        assert_eq!(by_severity.get("low"), Some(&3));
        let by_rule = rollup_by_rule(&violations);
        assert_eq!(by_rule.get("CoN"), Some(&2));
        assert_eq!(by_rule.get("GOD_OBJECT"), Some(&1));
    }

    #[test]
    fn name_file_counts_counts_each_importing_file_once() {
        let mut a = empty_unit(FileId::new(0), "a.py".into(), 0);
        a.imports.push(crate::types::ImportInfo { imported_name: "shared".into(), source_module: "pkg".into(), line: 1 });
        a.imports.push(crate::types::ImportInfo { imported_name: "shared".into(), source_module: "pkg".into(), line: 2 });
        let mut b = empty_unit(FileId::new(1), "b.py".into(), 0);
        b.imports.push(crate::types::ImportInfo { imported_name: "shared".into(), source_module: "pkg".into(), line: 1 });

        let counts = build_name_file_counts(&[a, b]);
        assert_eq!(counts.get("shared"), Some(&2));
    }

    #[test]
    fn cross_file_dependencies_link_files_sharing_an_import() {
        let mut a = empty_unit(FileId::new(0), "a.py".into(), 0);
        a.imports.push(crate::types::ImportInfo { imported_name: "shared".into(), source_module: "pkg".into(), line: 1 });
        let mut b = empty_unit(FileId::new(1), "b.py".into(), 0);
        b.imports.push(crate::types::ImportInfo { imported_name: "shared".into(), source_module: "pkg".into(), line: 1 });

        let deps = cross_file_dependencies(&[a, b]);
        assert_eq!(deps.get("a.py"), Some(&vec!["b.py".to_string()]));
        assert_eq!(deps.get("b.py"), Some(&vec!["a.py".to_string()]));
    }

    #[test]
    fn empty_unit_has_no_facts_and_no_parse_tree() {
        let unit = empty_unit(FileId::new(0), "missing.py".into(), 0);
        assert!(unit.tree.is_none());
        assert!(unit.functions.is_empty());
    }

    #[test]
    fn run_discovers_parses_and_reports_a_small_repo() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "def f(x, y, z, w, q):\n    return x\n").unwrap();
        std::fs::write(dir.path().join("b.py"), "class Thing:\n    def m(self):\n        pass\n").unwrap();

        let orchestrator = Orchestrator::new(AnalysisConfig::default(), dir.path().to_path_buf()).unwrap();
        let report = orchestrator.run().unwrap();

        assert_eq!(report.summary.files_analyzed, 2);
        assert!(!report.partial);
        assert!(report.run_id.len() > 0);
    }

    #[test]
    fn second_run_reuses_the_disk_cache() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let first = Orchestrator::new(AnalysisConfig::default(), dir.path().to_path_buf()).unwrap();
        let _ = first.run().unwrap();

        let second = Orchestrator::new(AnalysisConfig::default(), dir.path().to_path_buf()).unwrap();
        let report = second.run().unwrap();
        assert_eq!(report.summary.files_analyzed, 1);
    }

    #[test]
    fn cancelling_before_the_run_yields_a_partial_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();

        let orchestrator = Orchestrator::new(AnalysisConfig::default(), dir.path().to_path_buf()).unwrap();
        orchestrator.cancel_handle().store(true, Ordering::Relaxed);
        let report = orchestrator.run().unwrap();
        assert!(report.partial);
    }
}
