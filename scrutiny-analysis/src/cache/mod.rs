//! Incremental Cache (C8, spec §4.8). Two tiers: an in-memory
//! `parsers::cache::ParseCache` (this run's re-parses) and an on-disk
//! `scrutiny_storage::CacheStore` (cross-run `CachedUnit` facts and
//! per-file `DetectorResult`s). Ground for the composition: the teacher
//! layers `drift_analysis::parsers::cache::ParseCache` (memory) in front of
//! `drift_storage::engine::DriftStorageEngine` (disk) the same way.
//!
//! Open design decision: the raw `tree_sitter::Tree` never crosses a
//! process boundary (it isn't `Serialize`), so a disk-cache hit means a
//! `CachedUnit` plus a cheap re-strip of the source, not a recovered AST —
//! AST reuse across restarts is out of scope. Parsed-tree reuse within one
//! run is still fully covered by `ParseCache`.

mod dependencies;
mod key;

pub use dependencies::FileDependencies;
pub use key::{RunFingerprint, SCHEMA_DETECTOR_RESULT, SCHEMA_UNIT};

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use scrutiny_core::config::AnalysisConfig;
use scrutiny_core::constants::ANALYZER_VERSION;
use scrutiny_core::errors::CacheError;

use scrutiny_storage::CacheStore;

use crate::types::{CachedUnit, DetectorResult, SourceFile};

/// The composed two-tier cache an orchestrator run owns for its lifetime.
pub struct IncrementalCache {
    disk: Option<CacheStore>,
    fingerprint: RunFingerprint,
    dependencies: Mutex<FileDependencies>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IncrementalCache {
    /// Opens (or creates) the on-disk tier under `config.cache.effective_dir(scan_root)`
    /// when caching is enabled; runs memory-only otherwise.
    pub fn open(config: &AnalysisConfig, scan_root: &Path) -> Result<Self, CacheError> {
        let disk = if config.cache.effective_enabled() {
            let dir = config.cache.effective_dir(scan_root);
            Some(CacheStore::open(&dir.join("cache.db"))?)
        } else {
            None
        };
        Ok(Self {
            disk,
            fingerprint: RunFingerprint::compute(config),
            dependencies: Mutex::new(FileDependencies::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn in_memory_only() -> Self {
        Self {
            disk: None,
            fingerprint: RunFingerprint::compute(&AnalysisConfig::default()),
            dependencies: Mutex::new(FileDependencies::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    #[cfg(test)]
    fn for_tests(config: &AnalysisConfig) -> Result<Self, CacheError> {
        Ok(Self {
            disk: Some(CacheStore::open_in_memory()?),
            fingerprint: RunFingerprint::compute(config),
            dependencies: Mutex::new(FileDependencies::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn get_unit(&self, file: &SourceFile) -> Option<CachedUnit> {
        let Some(disk) = &self.disk else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let key = key::unit_key(file, ANALYZER_VERSION, self.fingerprint);
        let found = disk.get(&key).ok().flatten().and_then(|blob| {
            if blob.schema_version != SCHEMA_UNIT {
                tracing::debug!(schema_version = blob.schema_version, "unrecognized cached unit schema, treating as miss");
                return None;
            }
            serde_json::from_slice::<CachedUnit>(&blob.payload).ok()
        });
        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn put_unit(&self, unit: &CachedUnit) -> Result<(), CacheError> {
        let Some(disk) = &self.disk else { return Ok(()) };
        let key = key::unit_key(&unit.file, ANALYZER_VERSION, self.fingerprint);
        let payload = serde_json::to_vec(unit).map_err(|e| CacheError::Serde { message: e.to_string() })?;
        disk.put(&key, SCHEMA_UNIT, payload, Some(&unit.file.path), now_unix())
    }

    pub fn get_detector_result(&self, file: &SourceFile, detector_id: &str) -> Option<DetectorResult> {
        let Some(disk) = &self.disk else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        let key = key::detector_key(file, detector_id, ANALYZER_VERSION, self.fingerprint);
        let found = disk.get(&key).ok().flatten().and_then(|blob| {
            if blob.schema_version != SCHEMA_DETECTOR_RESULT {
                tracing::debug!(schema_version = blob.schema_version, "unrecognized cached detector result schema, treating as miss");
                return None;
            }
            serde_json::from_slice::<DetectorResult>(&blob.payload).ok()
        });
        match &found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    pub fn put_detector_result(&self, file: &SourceFile, result: &DetectorResult) -> Result<(), CacheError> {
        let Some(disk) = &self.disk else { return Ok(()) };
        let key = key::detector_key(file, &result.detector_id, ANALYZER_VERSION, self.fingerprint);
        let payload = serde_json::to_vec(result).map_err(|e| CacheError::Serde { message: e.to_string() })?;
        disk.put(&key, SCHEMA_DETECTOR_RESULT, payload, Some(&file.path), now_unix())
    }

    /// Records that `dependent`'s cached result incorporated facts from
    /// `depends_on`, so changing `depends_on` must also evict `dependent`.
    pub fn record_dependency(&self, depends_on: &str, dependent: &str) {
        self.dependencies.lock().expect("file dependency map poisoned").record(depends_on, dependent);
    }

    /// File-content-change eviction (spec §4.8): drops `file_path`'s own
    /// entries, then walks the dependency graph evicting every file whose
    /// cached result was built using `file_path`'s facts.
    pub fn invalidate_file(&self, file_path: &str) -> Result<(), CacheError> {
        let Some(disk) = &self.disk else { return Ok(()) };

        let mut seen = std::collections::HashSet::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(file_path.to_string());
        seen.insert(file_path.to_string());

        while let Some(next) = queue.pop_front() {
            disk.delete_by_file_path(&next)?;
            let dependents = self.dependencies.lock().expect("file dependency map poisoned").dependents_of(&next);
            for dependent in dependents {
                if seen.insert(dependent.clone()) {
                    queue.push_back(dependent);
                }
            }
        }
        Ok(())
    }

    /// Full flush on analyzer-version or config change (spec §4.8).
    pub fn flush_all(&self) -> Result<(), CacheError> {
        self.dependencies.lock().expect("file dependency map poisoned").clear();
        match &self.disk {
            Some(disk) => disk.clear_all(),
            None => Ok(()),
        }
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed) as f64;
        let misses = self.misses.load(Ordering::Relaxed) as f64;
        if hits + misses == 0.0 {
            1.0
        } else {
            hits / (hits + misses)
        }
    }

    pub fn flush_sync(&self) -> Result<(), CacheError> {
        match &self.disk {
            Some(disk) => disk.flush_sync(),
            None => Ok(()),
        }
    }
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use scrutiny_core::types::identifiers::FileId;
    use scrutiny_core::types::severity::Severity;
    use scrutiny_core::types::span::Span;
    use crate::types::{DetectorMetrics, Violation, ViolationKind};

    fn file(path: &str, content: &[u8]) -> SourceFile {
        SourceFile::new(FileId::new(1), path.into(), Language::Python, content, 0)
    }

    fn unit(path: &str, content: &[u8]) -> CachedUnit {
        CachedUnit {
            file: file(path, content),
            stripped_source: String::new(),
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
    fn unit_roundtrips_through_the_disk_tier() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        let u = unit("a.py", b"x = 1");
        cache.put_unit(&u).unwrap();
        cache.flush_sync().unwrap();
        let found = cache.get_unit(&u.file).expect("cache hit");
        assert_eq!(found.file.path, "a.py");
    }

    #[test]
    fn miss_on_unseen_file_is_none() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        assert!(cache.get_unit(&file("never.py", b"x")).is_none());
    }

    #[test]
    fn detector_result_is_keyed_per_detector() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        let f = file("a.py", b"x = 1");
        let result = DetectorResult {
            detector_id: "CoN".into(),
            file_id: f.id,
            violations: vec![Violation::new(ViolationKind::ConnascenceOfName, Severity::Low, Span::point("a.py", 1, 0), "m", serde_json::json!({}))],
            metrics: DetectorMetrics::default(),
        };
        cache.put_detector_result(&f, &result).unwrap();
        cache.flush_sync().unwrap();
        assert!(cache.get_detector_result(&f, "CoN").is_some());
        assert!(cache.get_detector_result(&f, "CoT").is_none());
    }

    #[test]
    fn invalidating_a_file_evicts_its_recorded_dependents() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        let a = unit("a.py", b"import shared");
        let b = unit("b.py", b"import shared");
        cache.put_unit(&a).unwrap();
        cache.put_unit(&b).unwrap();
        cache.flush_sync().unwrap();
        cache.record_dependency("a.py", "b.py");

        cache.invalidate_file("a.py").unwrap();
        cache.flush_sync().unwrap();

        assert!(cache.get_unit(&a.file).is_none());
        assert!(cache.get_unit(&b.file).is_none());
    }

    #[test]
    fn flush_all_clears_the_dependency_graph_too() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        cache.record_dependency("a.py", "b.py");
        cache.flush_all().unwrap();
        assert!(cache.dependencies.lock().unwrap().dependents_of("a.py").is_empty());
    }

    #[test]
    fn hit_rate_reflects_hits_and_misses() {
        let config = AnalysisConfig::default();
        let cache = IncrementalCache::for_tests(&config).unwrap();
        let u = unit("a.py", b"x = 1");
        cache.put_unit(&u).unwrap();
        cache.flush_sync().unwrap();
        cache.get_unit(&u.file);
        cache.get_unit(&file("missing.py", b"y"));
        assert_eq!(cache.hit_rate(), 0.5);
    }
}
