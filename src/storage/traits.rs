//! Storage traits and error types
//!
//! This module defines the trait interface for catalog backends and
//! associated error types.

use crate::model::{Job, JobDraft};
use crate::storage::{RunRecord, SourceStats, WriteOutcome};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Catalog lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for catalog backend implementations
///
/// Every mutating operation is transactional: a failure leaves either the
/// previous or the new state of a record, never a partial one.
pub trait Storage {
    // ===== Jobs =====

    /// Looks up a job by its identity hash
    fn find_by_hash(&self, source_hash: &str) -> StorageResult<Option<Job>>;

    /// Inserts or updates a job keyed by `source_hash`
    ///
    /// A write whose `last_fetched_at` is older than the stored one is
    /// discarded, keeping the timestamp monotonic. Child rows (skills,
    /// accessibility options) are replaced wholesale on every applied write.
    ///
    /// # Returns
    ///
    /// The outcome of the write and the record as stored afterwards
    fn upsert_job(&mut self, draft: &JobDraft) -> StorageResult<(WriteOutcome, Job)>;

    /// Deletes the jobs of `source_id` whose canonical URL is not in `live_urls`
    ///
    /// Records owned by other sources are never touched. An empty
    /// `live_urls` deletes every record of the source; callers guard that.
    ///
    /// # Returns
    ///
    /// The number of deleted jobs
    fn delete_missing(&mut self, source_id: &str, live_urls: &[String]) -> StorageResult<usize>;

    /// Lists jobs ordered by most recent fetch, optionally for one source
    fn list_jobs(&self, source_id: Option<&str>, limit: usize) -> StorageResult<Vec<Job>>;

    /// Counts jobs, optionally for one source
    fn count_jobs(&self, source_id: Option<&str>) -> StorageResult<u64>;

    // ===== Statistics =====

    /// Per-source job counts and freshness
    fn source_stats(&self) -> StorageResult<Vec<SourceStats>>;

    // ===== Sync runs =====

    /// Persists a finished cycle summary and returns its ID
    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64>;

    /// Most recent cycle summaries, newest first
    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>>;
}
