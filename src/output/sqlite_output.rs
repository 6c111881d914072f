//! SQLite-backed report sink
//!
//! Persists every cycle summary to the `sync_runs` table so run history can
//! be inspected with `--stats`.

use crate::output::{CycleReport, ReportSink};
use crate::storage::Storage;
use crate::sync::{lock_storage, SharedStorage};
use crate::SyncError;
use tracing::debug;

/// Records cycle summaries in the catalog database
pub struct SqliteReportSink {
    storage: SharedStorage,
    config_hash: String,
}

impl SqliteReportSink {
    /// Creates a new sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The catalog to write to
    /// * `config_hash` - Hash of the configuration the cycles run with
    pub fn new(storage: SharedStorage, config_hash: impl Into<String>) -> Self {
        Self {
            storage,
            config_hash: config_hash.into(),
        }
    }
}

impl ReportSink for SqliteReportSink {
    fn publish(&self, report: &CycleReport) -> Result<(), SyncError> {
        let record = report.to_run_record(&self.config_hash);
        let id = lock_storage(&self.storage)?.record_run(&record)?;
        debug!("Recorded sync run {}", id);
        Ok(())
    }
}
