//! Storage traits and error types
//!
//! This module defines the trait interfaces for the two durable stores and
//! their associated error types. The work ledger and the hash recorder are
//! independent transactional boundaries; nothing here spans both.

use crate::storage::{DoneRecord, ItemFile, Job};
use thiserror::Error;

/// Errors that can occur during work ledger operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Work ledger has no active jobs")]
    LedgerEmpty,

    #[error("Job not found: {0}")]
    JobNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that abort recording a single item
///
/// Per-file problems never surface here; they are logged and the file is skipped.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("no files")]
    NoFiles,

    #[error("no valid content")]
    NoValidContent,

    #[error("item already recorded: {0}")]
    AlreadyRecorded(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Durable queue of collection scans plus the write-once log of retired collections
pub trait WorkLedger {
    // ===== Queue Operations =====

    /// Queues a collection for scanning starting at page 1
    ///
    /// Does nothing if the collection already has a done record or an active job.
    ///
    /// # Returns
    ///
    /// `true` if a new job was inserted
    fn add(&mut self, name: &str) -> StorageResult<bool>;

    /// Returns the active job with the smallest page, oldest first on ties
    ///
    /// # Errors
    ///
    /// `StorageError::LedgerEmpty` if there are no active jobs
    fn next(&self) -> StorageResult<Job>;

    /// Advances the named job's page by one
    fn increment(&mut self, name: &str) -> StorageResult<()>;

    /// Retires a job, appending a done record with the given reason
    ///
    /// An empty reason marks the collection as fully scanned.
    fn remove(&mut self, job: &Job, reason: &str) -> StorageResult<()>;

    /// Number of active jobs
    fn len(&self) -> usize;

    /// Returns whether there are no active jobs
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ===== Inspection =====

    /// Checks whether a collection has reached a terminal outcome
    fn is_done(&self, name: &str) -> StorageResult<bool>;

    /// Gets the active job for a collection
    fn job(&self, name: &str) -> StorageResult<Option<Job>>;

    /// Gets all active jobs in scheduling order
    fn jobs(&self) -> StorageResult<Vec<Job>>;

    /// Gets the done record for a collection
    fn done_record(&self, name: &str) -> StorageResult<Option<DoneRecord>>;

    /// Counts done records
    fn done_count(&self) -> StorageResult<u64>;

    /// Gets every done record with a non-empty reason, oldest first
    fn failed_records(&self) -> StorageResult<Vec<DoneRecord>>;
}

/// Durable map from item name to the content hashes of its files
pub trait HashRecorder {
    /// Records the valid content hashes of one item atomically
    ///
    /// # Returns
    ///
    /// The number of hash rows inserted (always at least one on success)
    fn record(&mut self, item: &str, files: &[ItemFile]) -> Result<usize, RecordError>;

    /// Checks whether an item has been recorded
    fn contains_item(&self, item: &str) -> StorageResult<bool>;

    /// Gets the hex-encoded hashes recorded for an item
    fn hashes_for(&self, item: &str) -> StorageResult<Vec<String>>;

    /// Counts recorded items
    fn item_count(&self) -> StorageResult<u64>;

    /// Counts recorded hashes
    fn hash_count(&self) -> StorageResult<u64>;
}
