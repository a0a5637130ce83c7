//! Commands accepted by the batch writer thread. Ground:
//! `drift_storage::batch::commands::BatchCommand`, collapsed to the one
//! blob table this cache needs instead of the teacher's ~30 row kinds.

use std::sync::mpsc::SyncSender;

#[derive(Debug)]
pub enum BatchCommand {
    Put { key: String, schema_version: u32, payload: Vec<u8>, file_path: Option<String>, created_at: i64 },
    Delete { key: String },
    DeleteByFilePath { file_path: String },
    Flush,
    FlushSync(SyncSender<()>),
    Shutdown,
}
