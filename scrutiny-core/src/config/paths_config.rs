//! Path filtering configuration (spec §6 `paths.*` rows).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    /// Globs to scan. Empty means "everything `ignore` would walk".
    pub include: Vec<String>,
    /// Globs excluded outright, in addition to `.gitignore`/`.ignore` rules.
    pub exclude: Vec<String>,
    /// Globs identifying test files; detectors may relax thresholds here
    /// (spec §4.3 CoM/CoA edge policies reference "test file" explicitly).
    pub test_globs: Vec<String>,
    /// Globs identifying generated files, always skipped for god-object and
    /// MECE analysis regardless of `include`.
    pub generated_globs: Vec<String>,
}

impl PathsConfig {
    fn matches_any(globs: &[String], path: &str) -> bool {
        globs.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|p| p.matches(path))
                .unwrap_or(false)
        })
    }

    pub fn is_included(&self, path: &str) -> bool {
        self.include.is_empty() || Self::matches_any(&self.include, path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        Self::matches_any(&self.exclude, path)
    }

    pub fn is_test_file(&self, path: &str) -> bool {
        Self::matches_any(&self.test_globs, path)
    }

    pub fn is_generated(&self, path: &str) -> bool {
        Self::matches_any(&self.generated_globs, path)
    }
}
