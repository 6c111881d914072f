//! Per-cycle counters

use crate::storage::RunRecord;
use crate::sync::PruneOutcome;
use chrono::{DateTime, Utc};

/// What one cycle did for one source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source_id: String,

    /// Listing URLs returned by enumeration
    pub enumerated: u64,
    pub created: u64,
    pub updated: u64,

    /// Records skipped because they were still fresh
    pub unchanged: u64,

    /// URLs whose scrape, extraction or write failed
    pub skipped: u64,
    pub pruned: u64,
    pub prune_skipped: bool,

    /// Enumeration warning for a partial live set
    pub warning: Option<String>,
}

impl SourceReport {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Default::default()
        }
    }

    pub fn record_prune(&mut self, outcome: PruneOutcome) {
        match outcome {
            PruneOutcome::Deleted(n) => self.pruned = n as u64,
            PruneOutcome::Skipped => self.prune_skipped = true,
        }
    }

    /// Number of URLs that went through the upsert engine
    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.unchanged + self.skipped
    }
}

/// Summary of one full sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            sources: Vec::new(),
        }
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = finished_at;
    }

    fn sum(&self, field: impl Fn(&SourceReport) -> u64) -> u64 {
        self.sources.iter().map(field).sum()
    }

    pub fn enumerated(&self) -> u64 {
        self.sum(|s| s.enumerated)
    }

    pub fn created(&self) -> u64 {
        self.sum(|s| s.created)
    }

    pub fn updated(&self) -> u64 {
        self.sum(|s| s.updated)
    }

    pub fn unchanged(&self) -> u64 {
        self.sum(|s| s.unchanged)
    }

    pub fn skipped(&self) -> u64 {
        self.sum(|s| s.skipped)
    }

    pub fn pruned(&self) -> u64 {
        self.sum(|s| s.pruned)
    }

    /// Sources with a partial enumeration or a skipped prune
    pub fn warnings(&self) -> u64 {
        self.sum(|s| u64::from(s.warning.is_some() || s.prune_skipped))
    }

    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Converts the report into a persistable run row
    pub fn to_run_record(&self, config_hash: &str) -> RunRecord {
        RunRecord {
            id: 0,
            started_at: self.started_at,
            finished_at: self.finished_at,
            config_hash: config_hash.to_string(),
            sources: self.sources.len() as u64,
            enumerated: self.enumerated(),
            created: self.created(),
            updated: self.updated(),
            unchanged: self.unchanged(),
            skipped: self.skipped(),
            pruned: self.pruned(),
            warnings: self.warnings(),
        }
    }
}
