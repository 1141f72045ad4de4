//! SQLite work ledger implementation
//!
//! This module provides the SQLite-backed implementation of the `WorkLedger`
//! trait: the queue of collections still being paged through and the
//! append-only log of collections that reached a terminal outcome.

use crate::storage::schema::initialize_ledger_schema;
use crate::storage::traits::{StorageError, StorageResult, WorkLedger};
use crate::storage::{
    open_connection, open_in_memory_connection, warm_statements, DoneRecord, Job, FIRST_PAGE,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const NEXT_JOB_SQL: &str = "SELECT name, page FROM jobs ORDER BY page ASC, seq ASC LIMIT 1";
const INSERT_JOB_SQL: &str =
    "INSERT INTO jobs (name, page) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING";
const INCREMENT_JOB_SQL: &str = "UPDATE jobs SET page = page + 1 WHERE name = ?1";
const DELETE_JOB_SQL: &str = "DELETE FROM jobs WHERE name = ?1";
const INSERT_DONE_SQL: &str =
    "INSERT INTO done (name, page, reason, resolved_at) VALUES (?1, ?2, ?3, ?4)";
const IS_DONE_SQL: &str = "SELECT EXISTS(SELECT 1 FROM done WHERE name = ?1)";
const COUNT_JOBS_SQL: &str = "SELECT COUNT(*) FROM jobs";

const LEDGER_STATEMENTS: [&str; 7] = [
    NEXT_JOB_SQL,
    INSERT_JOB_SQL,
    INCREMENT_JOB_SQL,
    DELETE_JOB_SQL,
    INSERT_DONE_SQL,
    IS_DONE_SQL,
    COUNT_JOBS_SQL,
];

/// SQLite work ledger
pub struct SqliteLedger {
    conn: Connection,
    active: usize,
}

impl SqliteLedger {
    /// Opens or creates the ledger database at `path`
    ///
    /// Fails if the schema cannot be created, any ledger statement fails to
    /// prepare, or the active jobs cannot be counted.
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = open_connection(path)?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory ledger (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = open_in_memory_connection()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        initialize_ledger_schema(&conn)?;
        warm_statements(&conn, &LEDGER_STATEMENTS)?;

        let active: i64 = conn
            .prepare_cached(COUNT_JOBS_SQL)?
            .query_row([], |row| row.get(0))?;

        Ok(Self {
            conn,
            active: active as usize,
        })
    }
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    Ok(Job {
        collection: row.get(0)?,
        page: row.get(1)?,
    })
}

fn done_from_row(row: &Row<'_>) -> rusqlite::Result<DoneRecord> {
    Ok(DoneRecord {
        collection: row.get(0)?,
        page: row.get(1)?,
        reason: row.get(2)?,
        resolved_at: row.get(3)?,
    })
}

impl WorkLedger for SqliteLedger {
    // ===== Queue Operations =====

    fn add(&mut self, name: &str) -> StorageResult<bool> {
        if self.is_done(name)? {
            tracing::debug!("Skipping {}: already resolved", name);
            return Ok(false);
        }

        let inserted = self
            .conn
            .prepare_cached(INSERT_JOB_SQL)?
            .execute(params![name, FIRST_PAGE])?;

        if inserted == 0 {
            return Ok(false);
        }

        self.active += 1;
        Ok(true)
    }

    fn next(&self) -> StorageResult<Job> {
        self.conn
            .prepare_cached(NEXT_JOB_SQL)?
            .query_row([], job_from_row)
            .optional()?
            .ok_or(StorageError::LedgerEmpty)
    }

    fn increment(&mut self, name: &str) -> StorageResult<()> {
        let updated = self
            .conn
            .prepare_cached(INCREMENT_JOB_SQL)?
            .execute(params![name])?;

        if updated == 0 {
            return Err(StorageError::JobNotFound(name.to_string()));
        }
        Ok(())
    }

    fn remove(&mut self, job: &Job, reason: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let deleted = tx
            .prepare_cached(DELETE_JOB_SQL)?
            .execute(params![job.collection])?;
        if deleted == 0 {
            return Err(StorageError::JobNotFound(job.collection.clone()));
        }

        tx.prepare_cached(INSERT_DONE_SQL)?
            .execute(params![job.collection, job.page, reason, now])?;
        tx.commit()?;

        self.active = self.active.saturating_sub(1);
        Ok(())
    }

    fn len(&self) -> usize {
        self.active
    }

    // ===== Inspection =====

    fn is_done(&self, name: &str) -> StorageResult<bool> {
        let done: bool = self
            .conn
            .prepare_cached(IS_DONE_SQL)?
            .query_row(params![name], |row| row.get(0))?;
        Ok(done)
    }

    fn job(&self, name: &str) -> StorageResult<Option<Job>> {
        let job = self
            .conn
            .query_row(
                "SELECT name, page FROM jobs WHERE name = ?1",
                params![name],
                job_from_row,
            )
            .optional()?;
        Ok(job)
    }

    fn jobs(&self) -> StorageResult<Vec<Job>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, page FROM jobs ORDER BY page ASC, seq ASC")?;

        let jobs = stmt
            .query_map([], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn done_record(&self, name: &str) -> StorageResult<Option<DoneRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT name, page, reason, resolved_at FROM done WHERE name = ?1",
                params![name],
                done_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn done_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM done", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn failed_records(&self) -> StorageResult<Vec<DoneRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, page, reason, resolved_at FROM done
             WHERE reason != '' ORDER BY resolved_at ASC, name ASC",
        )?;

        let records = stmt
            .query_map([], done_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}
