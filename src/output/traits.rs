//! Report sink trait and the logging sink

use crate::output::CycleReport;
use crate::SyncError;
use tracing::{info, warn};

/// Receives the summary of every finished cycle
///
/// Implementations must be thread-safe; the scheduler shares them.
pub trait ReportSink: Send + Sync {
    fn publish(&self, report: &CycleReport) -> Result<(), SyncError>;
}

/// Writes cycle summaries to the log
#[derive(Debug, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn publish(&self, report: &CycleReport) -> Result<(), SyncError> {
        for source in &report.sources {
            info!(
                "Source {}: {} enumerated, {} created, {} updated, {} fresh, {} skipped, {} pruned",
                source.source_id,
                source.enumerated,
                source.created,
                source.updated,
                source.unchanged,
                source.skipped,
                source.pruned
            );
            if let Some(warning) = &source.warning {
                warn!("Source {}: {}", source.source_id, warning);
            }
        }
        info!(
            "Cycle finished in {}s: {} created, {} updated, {} fresh, {} skipped, {} pruned",
            report.duration_secs(),
            report.created(),
            report.updated(),
            report.unchanged(),
            report.skipped(),
            report.pruned()
        );
        Ok(())
    }
}
