//! Database schema definitions
//!
//! This module contains the SQL schemas for the two Archive-Hasher databases.
//! They live in separate files so each can be committed independently.

/// SQL schema for the work ledger database
pub const LEDGER_SCHEMA_SQL: &str = r#"
-- Collections still being paged through
CREATE TABLE IF NOT EXISTS jobs (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    page INTEGER NOT NULL CHECK (page >= 1)
);

CREATE INDEX IF NOT EXISTS idx_jobs_page_seq ON jobs(page, seq);

-- Collections that reached a terminal outcome; rows are never updated
CREATE TABLE IF NOT EXISTS done (
    name TEXT PRIMARY KEY,
    page INTEGER NOT NULL,
    reason TEXT NOT NULL,
    resolved_at TEXT NOT NULL
);
"#;

/// SQL schema for the content hash database
pub const HASHES_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS archive_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    recorded_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS hashes (
    hash BLOB PRIMARY KEY CHECK (length(hash) = 20),
    item INTEGER NOT NULL REFERENCES archive_items(id)
);

CREATE INDEX IF NOT EXISTS idx_hashes_item ON hashes(item);
"#;

/// Initializes the work ledger schema
pub fn initialize_ledger_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(LEDGER_SCHEMA_SQL)?;
    Ok(())
}

/// Initializes the content hash schema
pub fn initialize_hashes_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(HASHES_SCHEMA_SQL)?;
    Ok(())
}
