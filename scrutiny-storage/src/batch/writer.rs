//! Dedicated writer thread with a bounded `crossbeam_channel`. Batches
//! writes into single transactions for throughput. Ground:
//! `drift_storage::batch::writer::BatchWriter` / `writer_loop`.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::Connection;

use scrutiny_core::errors::CacheError;

use super::commands::BatchCommand;

const CHANNEL_BOUND: usize = 1024;
const BATCH_SIZE: usize = 256;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone)]
pub struct WriteStats {
    pub puts: usize,
    pub deletes: usize,
    pub flushes: usize,
}

pub struct BatchWriter {
    tx: Sender<BatchCommand>,
    handle: Option<JoinHandle<Result<WriteStats, CacheError>>>,
}

impl BatchWriter {
    /// `conn` is moved to the dedicated writer thread; no other code should
    /// hold a connection that writes to the same cache table concurrently.
    pub fn new(conn: Connection) -> Self {
        let (tx, rx) = bounded(CHANNEL_BOUND);
        let handle = thread::Builder::new()
            .name("scrutiny-cache-writer".to_string())
            .spawn(move || writer_loop(conn, rx))
            .expect("failed to spawn cache batch writer thread");
        Self { tx, handle: Some(handle) }
    }

    pub fn send(&self, cmd: BatchCommand) -> Result<(), CacheError> {
        self.tx.send(cmd).map_err(|_| CacheError::Sqlite {
            message: "cache batch writer channel disconnected".to_string(),
        })
    }

    /// Fire-and-forget flush.
    pub fn flush(&self) -> Result<(), CacheError> {
        self.send(BatchCommand::Flush)
    }

    /// Flush and block until the writer thread confirms the commit.
    pub fn flush_sync(&self) -> Result<(), CacheError> {
        let (tx, rx) = std::sync::mpsc::sync_channel(0);
        self.send(BatchCommand::FlushSync(tx))?;
        rx.recv().map_err(|_| CacheError::Sqlite {
            message: "cache batch writer thread did not respond to flush_sync".to_string(),
        })
    }

    pub fn shutdown(mut self) -> Result<WriteStats, CacheError> {
        let _ = self.tx.send(BatchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| CacheError::Sqlite {
                message: "cache batch writer thread panicked".to_string(),
            })?
        } else {
            Ok(WriteStats::default())
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(BatchCommand::Shutdown);
    }
}

fn writer_loop(conn: Connection, rx: Receiver<BatchCommand>) -> Result<WriteStats, CacheError> {
    let mut buffer: Vec<BatchCommand> = Vec::with_capacity(BATCH_SIZE);
    let mut stats = WriteStats::default();

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(BatchCommand::Shutdown) => {
                flush_buffer(&conn, &mut buffer, &mut stats)?;
                break;
            }
            Ok(BatchCommand::Flush) => {
                flush_buffer(&conn, &mut buffer, &mut stats)?;
            }
            Ok(BatchCommand::FlushSync(done_tx)) => {
                flush_buffer(&conn, &mut buffer, &mut stats)?;
                let _ = done_tx.send(());
            }
            Ok(cmd) => {
                buffer.push(cmd);
                if buffer.len() >= BATCH_SIZE {
                    flush_buffer(&conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if !buffer.is_empty() {
                    flush_buffer(&conn, &mut buffer, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_buffer(&conn, &mut buffer, &mut stats)?;
                break;
            }
        }
    }

    Ok(stats)
}

fn flush_buffer(conn: &Connection, buffer: &mut Vec<BatchCommand>, stats: &mut WriteStats) -> Result<(), CacheError> {
    if buffer.is_empty() {
        return Ok(());
    }

    let tx = conn.unchecked_transaction().map_err(|e| CacheError::Sqlite {
        message: format!("begin transaction: {e}"),
    })?;

    for cmd in buffer.iter() {
        match cmd {
            BatchCommand::Put { key, schema_version, payload, file_path, created_at } => {
                tx.execute(
                    "INSERT INTO cache_blobs (key, schema_version, payload, file_path, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(key) DO UPDATE SET schema_version = excluded.schema_version,
                         payload = excluded.payload, file_path = excluded.file_path, created_at = excluded.created_at",
                    rusqlite::params![key, schema_version, payload, file_path, created_at],
                )
                .map_err(|e| CacheError::Sqlite { message: format!("put {key}: {e}") })?;
                stats.puts += 1;
            }
            BatchCommand::Delete { key } => {
                tx.execute("DELETE FROM cache_blobs WHERE key = ?1", [key])
                    .map_err(|e| CacheError::Sqlite { message: format!("delete {key}: {e}") })?;
                stats.deletes += 1;
            }
            BatchCommand::DeleteByFilePath { file_path } => {
                tx.execute("DELETE FROM cache_blobs WHERE file_path = ?1", [file_path])
                    .map_err(|e| CacheError::Sqlite { message: format!("delete by file_path {file_path}: {e}") })?;
                stats.deletes += 1;
            }
            BatchCommand::Flush | BatchCommand::FlushSync(_) | BatchCommand::Shutdown => unreachable!(
                "Flush/FlushSync/Shutdown are handled by writer_loop before reaching the buffer"
            ),
        }
    }

    tx.commit().map_err(|e| CacheError::Sqlite { message: format!("commit: {e}") })?;
    stats.flushes += 1;
    buffer.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply(&conn).unwrap();
        conn
    }

    #[test]
    fn put_then_flush_sync_acknowledges_commit() {
        let conn = open();
        let writer = BatchWriter::new(conn);
        writer
            .send(BatchCommand::Put {
                key: "abc".into(),
                schema_version: 1,
                payload: vec![1, 2, 3],
                file_path: Some("a.py".into()),
                created_at: 0,
            })
            .unwrap();
        writer.flush_sync().unwrap();
        writer.shutdown().unwrap();
    }
}
