//! Composite cache keys (spec §4.8): `content_hash(file) || analyzer_version
//! || detector_set_hash || config_hash`, hashed into the hex digest the
//! "directory of blobs keyed by hex(hash)" storage model expects (spec §6).

use sha2::{Digest, Sha256};

use scrutiny_core::config::AnalysisConfig;

use crate::types::SourceFile;

/// Schema version for a cached `CachedUnit` payload.
pub const SCHEMA_UNIT: u32 = 1;
/// Schema version for a cached `DetectorResult` payload.
pub const SCHEMA_DETECTOR_RESULT: u32 = 1;

fn hex_digest(parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let digest: [u8; 32] = hasher.finalize().into();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// A run's stable fingerprint: the active detector set plus the effective
/// config, pre-hashed once per run rather than re-hashed per file.
#[derive(Debug, Clone, Copy)]
pub struct RunFingerprint {
    pub detector_set_hash: u64,
    pub config_hash: u64,
}

impl RunFingerprint {
    pub fn compute(config: &AnalysisConfig) -> Self {
        let mut enabled: Vec<&str> = config.detectors.enabled.iter().map(String::as_str).collect();
        enabled.sort_unstable();
        let detector_set_hash = xxhash_rust::xxh3::xxh3_64(enabled.join(",").as_bytes());

        let config_bytes = serde_json::to_vec(config).unwrap_or_default();
        let config_hash = xxhash_rust::xxh3::xxh3_64(&config_bytes);

        Self { detector_set_hash, config_hash }
    }
}

/// Key for a file's cached `CachedUnit` (the parsed facts, minus the AST).
pub fn unit_key(file: &SourceFile, analyzer_version: &str, fingerprint: RunFingerprint) -> String {
    hex_digest(&[
        &file.content_hash.to_le_bytes(),
        analyzer_version.as_bytes(),
        &fingerprint.config_hash.to_le_bytes(),
    ])
}

/// Key for one detector's cached `DetectorResult` on a file.
pub fn detector_key(file: &SourceFile, detector_id: &str, analyzer_version: &str, fingerprint: RunFingerprint) -> String {
    hex_digest(&[
        &file.content_hash.to_le_bytes(),
        detector_id.as_bytes(),
        analyzer_version.as_bytes(),
        &fingerprint.detector_set_hash.to_le_bytes(),
        &fingerprint.config_hash.to_le_bytes(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use scrutiny_core::types::identifiers::FileId;

    fn file(content: &[u8]) -> SourceFile {
        SourceFile::new(FileId::new(1), "a.py".into(), Language::Python, content, 0)
    }

    #[test]
    fn same_content_and_fingerprint_yields_same_key() {
        let config = AnalysisConfig::default();
        let fp = RunFingerprint::compute(&config);
        let a = unit_key(&file(b"x = 1"), "0.1.0", fp);
        let b = unit_key(&file(b"x = 1"), "0.1.0", fp);
        assert_eq!(a, b);
    }

    #[test]
    fn different_content_yields_different_key() {
        let config = AnalysisConfig::default();
        let fp = RunFingerprint::compute(&config);
        let a = unit_key(&file(b"x = 1"), "0.1.0", fp);
        let b = unit_key(&file(b"x = 2"), "0.1.0", fp);
        assert_ne!(a, b);
    }

    #[test]
    fn detector_key_differs_per_detector_on_the_same_file() {
        let config = AnalysisConfig::default();
        let fp = RunFingerprint::compute(&config);
        let f = file(b"x = 1");
        let con = detector_key(&f, "CoN", "0.1.0", fp);
        let cot = detector_key(&f, "CoT", "0.1.0", fp);
        assert_ne!(con, cot);
    }

    #[test]
    fn config_change_changes_the_fingerprint() {
        let mut config = AnalysisConfig::default();
        let fp_a = RunFingerprint::compute(&config);
        config.thresholds.mece_score = Some(0.5);
        let fp_b = RunFingerprint::compute(&config);
        assert_ne!(fp_a.config_hash, fp_b.config_hash);
    }
}
