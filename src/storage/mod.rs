//! Storage module for the job catalog
//!
//! This module handles all database operations for the pipeline, including:
//! - SQLite database initialization and schema management
//! - Atomic hash-keyed job upserts
//! - Source-scoped pruning
//! - Sync run history

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SyncError;
use chrono::{DateTime, SecondsFormat, Utc};
use std::path::Path;

/// Initializes or opens a catalog database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SyncError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SyncError> {
    SqliteStorage::new(path)
}

/// What an upsert did to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
    /// A newer write already landed; nothing changed
    Stale,
}

/// Per-source catalog statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub source_id: String,
    pub jobs: u64,
    pub oldest_fetch: Option<DateTime<Utc>>,
    pub newest_fetch: Option<DateTime<Utc>>,
}

/// Persisted summary of one sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub sources: u64,
    pub enumerated: u64,
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub pruned: u64,
    pub warnings: u64,
}

/// Renders a timestamp in a fixed-width form that sorts lexicographically
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}
