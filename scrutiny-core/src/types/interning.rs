//! Path interning — repo-relative paths are repeated across thousands of
//! `Violation`s; intern them once per run instead of cloning `String`s.

use lasso::{Spur, ThreadedRodeo};

/// A thread-safe interner for repo-relative file paths.
///
/// Ground: the teacher interns paths the same way across its call-graph and
/// resolution-index modules, via `lasso::ThreadedRodeo`, so many workers can
/// intern concurrently without a central lock per lookup.
pub struct PathInterner {
    rodeo: ThreadedRodeo,
}

/// A handle into the interner. Cheap to copy, compare, and hash.
pub type PathKey = Spur;

impl PathInterner {
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    pub fn intern(&self, path: &str) -> PathKey {
        self.rodeo.get_or_intern(path)
    }

    pub fn resolve(&self, key: PathKey) -> &str {
        self.rodeo.resolve(&key)
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.len() == 0
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrips() {
        let interner = PathInterner::new();
        let a = interner.intern("src/a.py");
        let b = interner.intern("src/b.py");
        let a2 = interner.intern("src/a.py");
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(a), "src/a.py");
    }
}
