//! # scrutiny-storage
//!
//! Disk tier for the incremental analysis cache (spec §4.8). A single
//! SQLite table keyed by the cache's composite key string, written through
//! a dedicated batch-writer thread and read through a small pool of
//! read-only connections under WAL mode.
//!
//! Simplified from the teacher's multi-table, multi-trait `drift-storage`
//! down to the one table this cache actually needs: a directory of blobs
//! keyed by hex(hash), as spec §6 specifies for the disk tier.

pub mod batch;
pub mod connection;
pub mod engine;
pub mod migrations;

pub use connection::DatabaseManager;
pub use batch::BatchWriter;
pub use engine::CacheStore;
