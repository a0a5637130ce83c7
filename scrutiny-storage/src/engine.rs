//! `CacheStore` — the single owner of both `DatabaseManager` (reads) and
//! `BatchWriter` (writes) for the disk-tier cache. Ground:
//! `drift_storage::engine::DriftStorageEngine`, simplified to the one
//! blob table this cache needs instead of the teacher's seven storage
//! traits.

use std::path::Path;

use rusqlite::OptionalExtension;

use scrutiny_core::errors::CacheError;

use crate::batch::commands::BatchCommand;
use crate::batch::BatchWriter;
use crate::connection::DatabaseManager;

/// A stored cache entry: the schema version it was written under, and the
/// raw payload (typically a `serde_json`-encoded `ParsedUnit` or
/// `DetectorResult`, decoded by the caller).
pub struct CachedBlob {
    pub schema_version: u32,
    pub payload: Vec<u8>,
}

pub struct CacheStore {
    db: DatabaseManager,
    batch: BatchWriter,
}

impl CacheStore {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let db = DatabaseManager::open(path)?;
        let writer_conn = rusqlite::Connection::open(path).map_err(|e| CacheError::Sqlite { message: e.to_string() })?;
        crate::migrations::apply_pragmas(&writer_conn)?;
        let batch = BatchWriter::new(writer_conn);
        Ok(Self { db, batch })
    }

    pub fn open_in_memory() -> Result<Self, CacheError> {
        let db = DatabaseManager::open_in_memory()?;
        let uri = db.memory_uri().expect("open_in_memory always sets a shared-cache URI");
        let batch_conn = rusqlite::Connection::open_with_flags(
            uri,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_CREATE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|e| CacheError::Sqlite { message: e.to_string() })?;
        let batch = BatchWriter::new(batch_conn);
        Ok(Self { db, batch })
    }

    /// Look up a blob by its composite cache key. A row with an unrecognized
    /// `schema_version` is still returned — the caller decides whether it
    /// can decode it (spec §6's forward-compat requirement: unknown schema
    /// versions are ignored as a miss, never treated as corruption).
    pub fn get(&self, key: &str) -> Result<Option<CachedBlob>, CacheError> {
        self.db.with_reader(|conn| {
            conn.query_row(
                "SELECT schema_version, payload FROM cache_blobs WHERE key = ?1",
                [key],
                |row| Ok(CachedBlob { schema_version: row.get(0)?, payload: row.get(1)? }),
            )
            .optional()
            .map_err(|e| CacheError::Sqlite { message: format!("get {key}: {e}") })
        })
    }

    /// Queue a write. Returns once the command is enqueued, not once it is
    /// durable — call `flush_sync` to wait for a commit.
    pub fn put(&self, key: &str, schema_version: u32, payload: Vec<u8>, file_path: Option<&str>, created_at: i64) -> Result<(), CacheError> {
        self.batch.send(BatchCommand::Put {
            key: key.to_string(),
            schema_version,
            payload,
            file_path: file_path.map(str::to_string),
            created_at,
        })
    }

    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.batch.send(BatchCommand::Delete { key: key.to_string() })
    }

    /// Evicts every entry whose `file_path` matches, used when a file's
    /// content changes (spec §4.8: that file's entries, plus anything
    /// depending on it, are evicted).
    pub fn delete_by_file_path(&self, file_path: &str) -> Result<(), CacheError> {
        self.batch.send(BatchCommand::DeleteByFilePath { file_path: file_path.to_string() })
    }

    pub fn flush(&self) -> Result<(), CacheError> {
        self.batch.flush()
    }

    pub fn flush_sync(&self) -> Result<(), CacheError> {
        self.batch.flush_sync()
    }

    /// Drops every row. Used on config or analyzer-version change (spec
    /// §4.8: "full flush").
    pub fn clear_all(&self) -> Result<(), CacheError> {
        self.flush_sync()?;
        self.db.with_writer(|conn| {
            conn.execute("DELETE FROM cache_blobs", [])
                .map(|_| ())
                .map_err(|e| CacheError::Sqlite { message: format!("clear_all: {e}") })
        })
    }

    pub fn count(&self) -> Result<i64, CacheError> {
        self.flush_sync()?;
        self.db.with_reader(|conn| {
            conn.query_row("SELECT count(*) FROM cache_blobs", [], |row| row.get(0))
                .map_err(|e| CacheError::Sqlite { message: format!("count: {e}") })
        })
    }

    pub fn checkpoint(&self) -> Result<(), CacheError> {
        self.flush_sync()?;
        self.db.checkpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_roundtrips_the_payload() {
        let store = CacheStore::open_in_memory().unwrap();
        store.put("abc123", 1, vec![9, 9, 9], Some("a.py"), 1_700_000_000).unwrap();
        store.flush_sync().unwrap();
        let blob = store.get("abc123").unwrap().unwrap();
        assert_eq!(blob.schema_version, 1);
        assert_eq!(blob.payload, vec![9, 9, 9]);
    }

    #[test]
    fn missing_key_is_none() {
        let store = CacheStore::open_in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn delete_by_file_path_evicts_all_its_entries() {
        let store = CacheStore::open_in_memory().unwrap();
        store.put("k1", 1, vec![1], Some("a.py"), 0).unwrap();
        store.put("k2", 1, vec![2], Some("a.py"), 0).unwrap();
        store.put("k3", 1, vec![3], Some("b.py"), 0).unwrap();
        store.flush_sync().unwrap();
        store.delete_by_file_path("a.py").unwrap();
        store.flush_sync().unwrap();
        assert!(store.get("k1").unwrap().is_none());
        assert!(store.get("k2").unwrap().is_none());
        assert!(store.get("k3").unwrap().is_some());
    }

    #[test]
    fn clear_all_empties_the_table() {
        let store = CacheStore::open_in_memory().unwrap();
        store.put("k1", 1, vec![1], None, 0).unwrap();
        store.flush_sync().unwrap();
        assert_eq!(store.count().unwrap(), 1);
        store.clear_all().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
