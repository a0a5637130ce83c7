//! Incremental-cache configuration (spec §6 `cache.*` rows, §4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: Option<bool>,
    /// Directory holding the SQLite blob store. Defaults to
    /// `.scrutiny/cache` under the scan root when unset.
    pub dir: Option<String>,
}

impl CacheConfig {
    pub fn effective_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn effective_dir(&self, scan_root: &std::path::Path) -> std::path::PathBuf {
        match &self.dir {
            Some(dir) => std::path::PathBuf::from(dir),
            None => scan_root.join(".scrutiny").join("cache"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_enabled() {
        assert!(CacheConfig::default().effective_enabled());
    }

    #[test]
    fn explicit_disable_is_honored() {
        let config = CacheConfig {
            enabled: Some(false),
            dir: None,
        };
        assert!(!config.effective_enabled());
    }

    #[test]
    fn default_dir_is_under_scan_root() {
        let config = CacheConfig::default();
        let root = std::path::Path::new("/tmp/project");
        assert_eq!(
            config.effective_dir(root),
            std::path::PathBuf::from("/tmp/project/.scrutiny/cache")
        );
    }
}
