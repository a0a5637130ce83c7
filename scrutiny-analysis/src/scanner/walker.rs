//! Parallel file discovery. Ground:
//! `drift_analysis::scanner::walker::walk_directory` — `ignore::WalkBuilder`
//! + `WalkParallel` + `OverrideBuilder` for include/exclude globs, a
//! `.scrutinyignore` file honored like `.gitignore` (the teacher's
//! `.driftignore` renamed), crossbeam-channel collection from worker
//! threads, `Arc<AtomicBool>` cooperative cancellation, and a final
//! deterministic path sort so discovery order never leaks into report
//! ordering (spec §5 determinism).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use scrutiny_core::errors::ScanError;

/// Directories skipped unconditionally, mirroring the teacher's
/// `DEFAULT_IGNORES` list.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    "vendor",
    ".next",
    ".nuxt",
    "coverage",
    ".idea",
    ".vscode",
    "out",
];

pub struct WalkOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub cancel: Arc<AtomicBool>,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Enumerates files under `root` honoring include/exclude globs,
/// `.gitignore`/`.ignore`/`.scrutinyignore`, and `DEFAULT_IGNORES`. Returns a
/// deterministically sorted `Vec<PathBuf>` (spec §5: discovery order must not
/// leak into report ordering, but a stable discovery order still makes
/// worker scheduling deterministic run-to-run).
pub fn walk_directory(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootUnreadable {
            path: root.display().to_string(),
            message: "path does not exist".to_string(),
        });
    }

    let mut overrides = OverrideBuilder::new(root);
    for pattern in &options.exclude {
        overrides
            .add(&format!("!{pattern}"))
            .map_err(|e| ScanError::Walker { message: e.to_string() })?;
    }
    for pattern in &options.include {
        overrides
            .add(pattern)
            .map_err(|e| ScanError::Walker { message: e.to_string() })?;
    }
    let overrides = overrides.build().map_err(|e| ScanError::Walker { message: e.to_string() })?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_exclude(true)
        .add_custom_ignore_filename(".scrutinyignore")
        .overrides(overrides);
    for dir in DEFAULT_IGNORES {
        builder.filter_entry({
            let dir = dir.to_string();
            move |entry| {
                !entry
                    .path()
                    .components()
                    .any(|c| c.as_os_str().to_string_lossy() == dir)
            }
        });
    }

    let (tx, rx) = crossbeam_channel::unbounded();
    let cancel = options.cancel.clone();
    builder.build_parallel().run(|| {
        let tx = tx.clone();
        let cancel = cancel.clone();
        Box::new(move |result| {
            if cancel.load(Ordering::Relaxed) {
                return ignore::WalkState::Quit;
            }
            if let Ok(entry) = result {
                if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    let _ = tx.send(entry.into_path());
                }
            }
            ignore::WalkState::Continue
        })
    });
    drop(tx);

    let mut paths: Vec<PathBuf> = rx.iter().collect();
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_unreadable() {
        let options = WalkOptions::default();
        let err = walk_directory(Path::new("/no/such/path/at/all"), &options).unwrap_err();
        assert!(matches!(err, ScanError::RootUnreadable { .. }));
    }

    #[test]
    fn walks_and_sorts_files_deterministically() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();
        std::fs::write(dir.path().join("a.py"), "y = 2\n").unwrap();
        let options = WalkOptions::default();
        let files = walk_directory(dir.path(), &options).unwrap();
        let names: Vec<_> = files.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }

    #[test]
    fn honors_default_ignores() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/lib.js"), "x").unwrap();
        std::fs::write(dir.path().join("main.js"), "x").unwrap();
        let options = WalkOptions::default();
        let files = walk_directory(dir.path(), &options).unwrap();
        assert_eq!(files.len(), 1);
    }
}
