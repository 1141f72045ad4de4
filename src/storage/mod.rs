//! Storage module for persisting crawl progress and extracted hashes
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite connection setup and schema management
//! - The work ledger: active collection jobs and the done log
//! - The hash recorder: leaf items and their content hashes
//! - File filtering and SHA-1 digest decoding

mod digest;
mod hashes;
mod ledger;
mod schema;
mod traits;

pub use digest::{decode_sha1, is_generated_artifact, ContentHash, DigestError, THUMBNAIL_NAME};
pub use hashes::SqliteHashStore;
pub use ledger::SqliteLedger;
pub use traits::{HashRecorder, RecordError, StorageError, StorageResult, WorkLedger};

use rusqlite::Connection;
use std::path::Path;

/// Page number every newly queued collection starts from
pub const FIRST_PAGE: u32 = 1;

/// A pending scan of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub collection: String,
    pub page: u32,
}

/// Represents a retired collection in the done log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneRecord {
    pub collection: String,
    pub page: u32,
    pub reason: String,
    pub resolved_at: String,
}

impl DoneRecord {
    /// Interprets the stored reason
    pub fn resolution(&self) -> crate::state::Resolution {
        crate::state::Resolution::from_reason(&self.reason)
    }
}

/// One file of a leaf item, as listed by the metadata service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFile {
    pub name: String,
    /// Hex-encoded SHA-1; empty when the service listed none
    pub sha1: String,
}

impl ItemFile {
    pub fn new(name: impl Into<String>, sha1: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sha1: sha1.into(),
        }
    }
}

/// Opens a SQLite database file with the crawler's pragmas applied
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
pub(crate) fn open_connection(path: &Path) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA temp_store = MEMORY;
    ",
    )?;

    Ok(conn)
}

/// Opens an in-memory database (for testing)
pub(crate) fn open_in_memory_connection() -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

/// Prepares every statement once so a broken one fails at startup
pub(crate) fn warm_statements(
    conn: &Connection,
    statements: &[&str],
) -> Result<(), rusqlite::Error> {
    for sql in statements {
        conn.prepare_cached(sql)?;
    }
    Ok(())
}
