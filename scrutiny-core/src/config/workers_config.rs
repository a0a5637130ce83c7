//! Parallelism configuration (spec §6 `workers.*` rows, §4.9).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkersConfig {
    pub count: Option<usize>,
    pub per_file_timeout_s: Option<u64>,
}

impl WorkersConfig {
    /// Defaults to the available parallelism, capped at 8 so a single run
    /// doesn't starve the rest of a shared CI box.
    pub fn effective_count(&self) -> usize {
        self.count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4)
        })
    }

    pub fn effective_per_file_timeout_s(&self) -> u64 {
        self.per_file_timeout_s
            .unwrap_or(crate::constants::DEFAULT_PER_FILE_TIMEOUT_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_count_wins() {
        let workers = WorkersConfig {
            count: Some(4),
            per_file_timeout_s: None,
        };
        assert_eq!(workers.effective_count(), 4);
    }

    #[test]
    fn default_timeout_matches_constant() {
        let workers = WorkersConfig::default();
        assert_eq!(workers.effective_per_file_timeout_s(), 30);
    }
}
