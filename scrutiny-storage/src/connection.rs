//! Connection management: one write-serialized connection, a small pool of
//! read-only connections. Ground: `drift_storage::connection::DatabaseManager`
//! (write-serialized + read-pooled), simplified — the teacher sizes its read
//! pool off `num_cpus`; this cache reads far less often than it writes, so a
//! fixed pool of `READ_POOL_SIZE` is enough.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use scrutiny_core::errors::CacheError;

const READ_POOL_SIZE: usize = 4;

static MEMORY_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A fresh, process-unique `cache=shared` URI so every `open_in_memory()`
/// call gets its own isolated in-memory database, while still letting a
/// separate connection (the batch writer's) see the same data — a plain
/// `Connection::open_in_memory()` would instead hand back a private,
/// unshareable database per connection.
fn fresh_memory_uri() -> String {
    let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("file:scrutiny_cache_mem_{n}?mode=memory&cache=shared")
}

fn open_shared_memory(uri: &str) -> Result<Connection, CacheError> {
    Connection::open_with_flags(
        uri,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_URI,
    )
    .map_err(|e| CacheError::Sqlite { message: e.to_string() })
}

pub struct DatabaseManager {
    path: Option<PathBuf>,
    /// Set only in `open_in_memory` mode — lets `CacheStore` open further
    /// connections (its batch writer) onto the same shared-cache database.
    memory_uri: Option<String>,
    writer: Mutex<Connection>,
    readers: Mutex<Vec<Connection>>,
}

impl DatabaseManager {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::DirCreate {
                path: parent.display().to_string(),
                message: e.to_string(),
            })?;
        }
        let writer = Connection::open(path).map_err(|e| CacheError::Sqlite { message: e.to_string() })?;
        crate::migrations::apply_pragmas(&writer)?;
        crate::migrations::apply(&writer)?;

        let mut readers = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let conn = Connection::open(path).map_err(|e| CacheError::Sqlite { message: e.to_string() })?;
            crate::migrations::apply_pragmas(&conn)?;
            readers.push(conn);
        }

        Ok(Self { path: Some(path.to_path_buf()), memory_uri: None, writer: Mutex::new(writer), readers: Mutex::new(readers) })
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let uri = fresh_memory_uri();
        let writer = open_shared_memory(&uri)?;
        crate::migrations::apply(&writer)?;

        // A second connection to the same shared-cache URI keeps the
        // in-memory database alive even if the writer connection is ever
        // swapped out, and gives `with_reader` a real reader to pop.
        let reader = open_shared_memory(&uri)?;
        Ok(Self { path: None, memory_uri: Some(uri), writer: Mutex::new(writer), readers: Mutex::new(vec![reader]) })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `Some(uri)` in `open_in_memory` mode; lets callers open additional
    /// connections onto the same shared in-memory database.
    pub fn memory_uri(&self) -> Option<&str> {
        self.memory_uri.as_deref()
    }

    pub fn with_writer<F, T>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&Connection) -> Result<T, CacheError>,
    {
        let conn = self.writer.lock().expect("writer connection mutex poisoned");
        f(&conn)
    }

    pub fn with_reader<F, T>(&self, f: F) -> Result<T, CacheError>
    where
        F: FnOnce(&Connection) -> Result<T, CacheError>,
    {
        let mut pool = self.readers.lock().expect("reader pool mutex poisoned");
        match pool.pop() {
            Some(conn) => {
                let result = f(&conn);
                pool.push(conn);
                result
            }
            // in-memory mode, or a momentarily exhausted pool: fall back to the writer.
            None => self.with_writer(f),
        }
    }

    pub fn checkpoint(&self) -> Result<(), CacheError> {
        self.with_writer(|conn| {
            conn.pragma_update(None, "wal_checkpoint", "TRUNCATE")
                .map_err(|e| CacheError::Sqlite { message: format!("checkpoint: {e}") })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_manager_opens_and_migrates() {
        let db = DatabaseManager::open_in_memory().unwrap();
        db.with_reader(|conn| {
            conn.query_row("SELECT count(*) FROM cache_blobs", [], |row| row.get::<_, i64>(0))
                .map_err(|e| CacheError::Sqlite { message: e.to_string() })
        })
        .unwrap();
    }

    #[test]
    fn file_backed_manager_creates_parent_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");
        let db = DatabaseManager::open(&path).unwrap();
        assert_eq!(db.path(), Some(path.as_path()));
    }
}
