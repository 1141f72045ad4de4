//! SQLite hash recorder implementation
//!
//! Each leaf item gets one row in `archive_items` and one row in `hashes` per
//! original file. The item row and its hash rows are written in a single
//! transaction; an item that ends up with no hashes leaves no trace.

use crate::storage::digest::{decode_sha1, is_generated_artifact};
use crate::storage::schema::initialize_hashes_schema;
use crate::storage::traits::{HashRecorder, RecordError, StorageResult};
use crate::storage::{open_connection, open_in_memory_connection, warm_statements, ItemFile};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use std::path::Path;

const INSERT_ITEM_SQL: &str = "INSERT INTO archive_items (name, recorded_at) VALUES (?1, ?2)";
const INSERT_HASH_SQL: &str = "INSERT INTO hashes (hash, item) VALUES (?1, ?2)";

/// SQLite hash store
pub struct SqliteHashStore {
    conn: Connection,
}

impl SqliteHashStore {
    /// Opens or creates the hash database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = open_connection(path)?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory hash store (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = open_in_memory_connection()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        initialize_hashes_schema(&conn)?;
        warm_statements(&conn, &[INSERT_ITEM_SQL, INSERT_HASH_SQL])?;
        Ok(Self { conn })
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

impl HashRecorder for SqliteHashStore {
    fn record(&mut self, item: &str, files: &[ItemFile]) -> Result<usize, RecordError> {
        if files.is_empty() {
            return Err(RecordError::NoFiles);
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let item_id = match tx.prepare_cached(INSERT_ITEM_SQL)?.insert(params![item, now]) {
            Ok(id) => id,
            Err(e) if is_constraint_violation(&e) => {
                return Err(RecordError::AlreadyRecorded(item.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut inserted = 0;
        for file in files {
            if is_generated_artifact(item, &file.name) {
                continue;
            }

            let digest = match decode_sha1(&file.sha1) {
                Ok(digest) => digest,
                Err(e) => {
                    tracing::warn!("item {}: file {}: {}", item, file.name, e);
                    continue;
                }
            };

            // A failed statement leaves the rest of the transaction intact
            match tx
                .prepare_cached(INSERT_HASH_SQL)?
                .execute(params![&digest[..], item_id])
            {
                Ok(_) => inserted += 1,
                Err(e) => tracing::warn!("item {}: file {}: {}", item, file.name, e),
            }
        }

        if inserted == 0 {
            tx.rollback()?;
            return Err(RecordError::NoValidContent);
        }

        tx.commit()?;
        tracing::debug!("Recorded {} hashes for {}", inserted, item);
        Ok(inserted)
    }

    fn contains_item(&self, item: &str) -> StorageResult<bool> {
        let found: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM archive_items WHERE name = ?1)",
            params![item],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn hashes_for(&self, item: &str) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT h.hash FROM hashes h
             JOIN archive_items i ON i.id = h.item
             WHERE i.name = ?1 ORDER BY h.hash",
        )?;

        let hashes = stmt
            .query_map(params![item], |row| row.get::<_, Vec<u8>>(0))?
            .map(|row| row.map(hex::encode))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hashes)
    }

    fn item_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM archive_items", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn hash_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM hashes", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
