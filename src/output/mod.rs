//! Output module for cycle reports and catalog statistics
//!
//! This module handles:
//! - Counting what each sync cycle did per source
//! - Publishing cycle reports to the log and the run history table
//! - Printing catalog statistics

mod report;
mod sqlite_output;
pub mod stats;
mod traits;

pub use report::{CycleReport, SourceReport};
pub use sqlite_output::SqliteReportSink;
pub use stats::{load_statistics, print_statistics, CatalogStatistics};
pub use traits::{LogReportSink, ReportSink};
