//! In-process parse cache. Ground: `drift_analysis::parsers::cache::ParseCache`
//! — a `moka::sync::Cache` keyed on `(content_hash, language_discriminant)`
//! so identical byte content in two different languages never collides.
//! This is distinct from the incremental cache in `crate::cache` (C8),
//! which additionally persists `DetectorResult`s to disk; this cache only
//! ever holds the current run's re-parsed trees in memory.

use std::mem::Discriminant;
use std::sync::Arc;

use moka::sync::Cache;

use crate::language::Language;
use crate::types::VisitorEvent;

/// Cached shape of a parse: the discriminant key can't carry a borrowed
/// `tree_sitter::Tree` cheaply across threads, so the cache stores the
/// derived facts (events + flat tables) rather than the tree itself —
/// those are what every downstream consumer actually reads.
#[derive(Clone)]
pub struct CachedParse {
    pub events: Arc<Vec<VisitorEvent>>,
    pub parsed_ok: bool,
}

pub struct ParseCache {
    cache: Cache<(u64, Discriminant<Language>), CachedParse>,
}

impl ParseCache {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    pub fn get(&self, content_hash: u64, language: Language) -> Option<CachedParse> {
        self.cache.get(&(content_hash, std::mem::discriminant(&language)))
    }

    pub fn insert(&self, content_hash: u64, language: Language, parse: CachedParse) {
        self.cache.insert((content_hash, std::mem::discriminant(&language)), parse);
    }

    pub fn invalidate(&self, content_hash: u64, language: Language) {
        self.cache.invalidate(&(content_hash, std::mem::discriminant(&language)));
    }

    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_languages_never_collide_on_identical_content_hash() {
        let cache = ParseCache::default();
        let parse_py = CachedParse { events: Arc::new(Vec::new()), parsed_ok: true };
        let parse_js = CachedParse { events: Arc::new(Vec::new()), parsed_ok: false };
        cache.insert(42, Language::Python, parse_py);
        cache.insert(42, Language::JavaScript, parse_js);
        assert!(cache.get(42, Language::Python).unwrap().parsed_ok);
        assert!(!cache.get(42, Language::JavaScript).unwrap().parsed_ok);
    }
}
