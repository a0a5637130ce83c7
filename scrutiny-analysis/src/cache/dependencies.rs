//! Cross-file invalidation graph (spec §4.8, §9 redesign note): when a
//! cross-file detector (CoN's shared name index, MECE's duplication
//! clusters) folds file A's facts into file B's cached result, B depends on
//! A. Changing A must evict B too, even though B's own content is
//! unchanged. CoA stayed intra-file in this design, so it never registers a
//! dependency here.

use scrutiny_core::types::collections::{FxHashMap, FxHashSet};

#[derive(Default)]
pub struct FileDependencies {
    /// file path -> set of file paths whose cached results depend on it.
    dependents: FxHashMap<String, FxHashSet<String>>,
}

impl FileDependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent`'s cached result used facts from `depends_on`.
    pub fn record(&mut self, depends_on: &str, dependent: &str) {
        if depends_on == dependent {
            return;
        }
        self.dependents.entry(depends_on.to_string()).or_default().insert(dependent.to_string());
    }

    pub fn dependents_of(&self, file_path: &str) -> Vec<String> {
        self.dependents.get(file_path).map(|set| set.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.dependents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_dependents() {
        let mut deps = FileDependencies::new();
        deps.record("a.py", "b.py");
        deps.record("a.py", "c.py");
        let mut found = deps.dependents_of("a.py");
        found.sort();
        assert_eq!(found, vec!["b.py".to_string(), "c.py".to_string()]);
    }

    #[test]
    fn a_file_is_never_its_own_dependent() {
        let mut deps = FileDependencies::new();
        deps.record("a.py", "a.py");
        assert!(deps.dependents_of("a.py").is_empty());
    }

    #[test]
    fn unrelated_file_has_no_dependents() {
        let deps = FileDependencies::new();
        assert!(deps.dependents_of("z.py").is_empty());
    }
}
