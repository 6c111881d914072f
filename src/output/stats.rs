//! Catalog statistics for the `--stats` command

use crate::storage::{RunRecord, SourceStats, Storage};
use crate::SyncError;

/// Catalog statistics summary
#[derive(Debug, Clone)]
pub struct CatalogStatistics {
    pub total_jobs: u64,
    pub sources: Vec<SourceStats>,
    pub recent_runs: Vec<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The catalog to query
/// * `runs` - How many recent sync runs to include
pub fn load_statistics(storage: &dyn Storage, runs: usize) -> Result<CatalogStatistics, SyncError> {
    Ok(CatalogStatistics {
        total_jobs: storage.count_jobs(None)?,
        sources: storage.source_stats()?,
        recent_runs: storage.recent_runs(runs)?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    println!("=== Catalog Statistics ===\n");

    println!("Overview:");
    println!("  Total jobs: {}", stats.total_jobs);
    println!();

    if !stats.sources.is_empty() {
        println!("Jobs by Source:");
        for source in &stats.sources {
            let percentage = if stats.total_jobs > 0 {
                (source.jobs as f64 / stats.total_jobs as f64) * 100.0
            } else {
                0.0
            };
            let newest = source
                .newest_fetch
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {}: {} ({:.1}%), last fetched {}",
                source.source_id, source.jobs, percentage, newest
            );
        }
        println!();
    }

    if stats.recent_runs.is_empty() {
        println!("No sync runs recorded yet.");
        return;
    }

    println!("Recent Runs ({}):", stats.recent_runs.len());
    for run in &stats.recent_runs {
        println!(
            "  #{} {}: {} created, {} updated, {} fresh, {} skipped, {} pruned, {} warnings",
            run.id,
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.created,
            run.updated,
            run.unchanged,
            run.skipped,
            run.pruned,
            run.warnings
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    #[test]
    fn test_load_statistics_empty_catalog() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let stats = load_statistics(&storage, 5).unwrap();

        assert_eq!(stats.total_jobs, 0);
        assert!(stats.sources.is_empty());
        assert!(stats.recent_runs.is_empty());
    }
}
