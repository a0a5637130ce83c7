//! Schema setup. One table, created idempotently; no migration chain is
//! needed because the cache is disposable — an unreadable or out-of-date
//! database is just dropped and rebuilt from a cold run (spec §4.8's
//! "the cache is authoritative" still holds: a rebuilt cache reproduces
//! the same `DetectorResult`s, it's just a hit-rate hit, not a bug).

use rusqlite::Connection;

use scrutiny_core::errors::CacheError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_blobs (
    key TEXT PRIMARY KEY,
    schema_version INTEGER NOT NULL,
    payload BLOB NOT NULL,
    file_path TEXT,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_cache_blobs_file_path ON cache_blobs(file_path);
";

pub fn apply(conn: &Connection) -> Result<(), CacheError> {
    conn.execute_batch(SCHEMA).map_err(|e| CacheError::Sqlite {
        message: format!("schema migration failed: {e}"),
    })
}

pub fn apply_pragmas(conn: &Connection) -> Result<(), CacheError> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| CacheError::Sqlite { message: format!("set WAL mode: {e}") })?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .map_err(|e| CacheError::Sqlite { message: format!("set synchronous: {e}") })?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| CacheError::Sqlite { message: format!("set foreign_keys: {e}") })?;
    Ok(())
}
