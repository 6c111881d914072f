//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{Job, JobDraft, WorkType};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{format_timestamp, parse_timestamp, RunRecord, SourceStats, WriteOutcome};
use crate::SyncError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::BTreeSet;
use std::path::Path;

const JOB_COLUMNS: &str = "id, source_id, title, company, source_url, source_hash, work_type, \
                           last_fetched_at, like_count, view_count";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SyncError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SyncError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SyncError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self { conn })
    }
}

/// Maps a `jobs` row (selected with `JOB_COLUMNS`) to a job without children
fn job_from_row(row: &Row<'_>) -> rusqlite::Result<Job> {
    let fetched: String = row.get(7)?;
    let last_fetched_at = parse_timestamp(&fetched)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Job {
        id: row.get(0)?,
        source_id: row.get(1)?,
        title: row.get(2)?,
        company: row.get(3)?,
        source_url: row.get(4)?,
        source_hash: row.get(5)?,
        required_skills: BTreeSet::new(),
        accessibility_options: Vec::new(),
        work_type: WorkType::parse_lenient(&row.get::<_, String>(6)?),
        last_fetched_at,
        like_count: row.get(8)?,
        view_count: row.get(9)?,
    })
}

/// Fills the skills and accessibility options of a loaded job
fn load_children(conn: &Connection, job: &mut Job) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached("SELECT skill FROM job_skills WHERE job_id = ?1")?;
    job.required_skills = stmt
        .query_map(params![job.id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<BTreeSet<_>>>()?;

    let mut stmt = conn.prepare_cached(
        "SELECT option FROM job_accessibility WHERE job_id = ?1 ORDER BY position",
    )?;
    job.accessibility_options = stmt
        .query_map(params![job.id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(())
}

fn find_job(conn: &Connection, source_hash: &str) -> rusqlite::Result<Option<Job>> {
    let sql = format!("SELECT {} FROM jobs WHERE source_hash = ?1", JOB_COLUMNS);
    let job = conn
        .query_row(&sql, params![source_hash], job_from_row)
        .optional()?;

    match job {
        Some(mut job) => {
            load_children(conn, &mut job)?;
            Ok(Some(job))
        }
        None => Ok(None),
    }
}

fn replace_children(conn: &Connection, job_id: i64, draft: &JobDraft) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM job_skills WHERE job_id = ?1", params![job_id])?;
    conn.execute(
        "DELETE FROM job_accessibility WHERE job_id = ?1",
        params![job_id],
    )?;

    let mut stmt =
        conn.prepare_cached("INSERT OR IGNORE INTO job_skills (job_id, skill) VALUES (?1, ?2)")?;
    for skill in &draft.required_skills {
        stmt.execute(params![job_id, skill])?;
    }

    let mut stmt = conn.prepare_cached(
        "INSERT INTO job_accessibility (job_id, position, option) VALUES (?1, ?2, ?3)",
    )?;
    for (position, option) in draft.accessibility_options.iter().enumerate() {
        stmt.execute(params![job_id, position as i64, option])?;
    }

    Ok(())
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let time_at = |idx: usize| -> rusqlite::Result<DateTime<Utc>> {
        let raw: String = row.get(idx)?;
        parse_timestamp(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    };

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: time_at(1)?,
        finished_at: time_at(2)?,
        config_hash: row.get(3)?,
        sources: row.get::<_, i64>(4)? as u64,
        enumerated: row.get::<_, i64>(5)? as u64,
        created: row.get::<_, i64>(6)? as u64,
        updated: row.get::<_, i64>(7)? as u64,
        unchanged: row.get::<_, i64>(8)? as u64,
        skipped: row.get::<_, i64>(9)? as u64,
        pruned: row.get::<_, i64>(10)? as u64,
        warnings: row.get::<_, i64>(11)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Jobs =====

    fn find_by_hash(&self, source_hash: &str) -> StorageResult<Option<Job>> {
        Ok(find_job(&self.conn, source_hash)?)
    }

    fn upsert_job(&mut self, draft: &JobDraft) -> StorageResult<(WriteOutcome, Job)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existed: bool = tx
            .query_row(
                "SELECT 1 FROM jobs WHERE source_hash = ?1",
                params![draft.source_hash],
                |_| Ok(()),
            )
            .optional()?
            .is_some();

        let fetched_at = format_timestamp(&draft.last_fetched_at);
        let changed = tx.execute(
            "INSERT INTO jobs (source_id, title, company, source_url, source_hash, work_type,
                               last_fetched_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(source_hash) DO UPDATE SET
                 source_id = excluded.source_id,
                 title = excluded.title,
                 company = excluded.company,
                 source_url = excluded.source_url,
                 work_type = excluded.work_type,
                 last_fetched_at = excluded.last_fetched_at
             WHERE excluded.last_fetched_at >= jobs.last_fetched_at",
            params![
                draft.source_id,
                draft.title,
                draft.company,
                draft.source_url,
                draft.source_hash,
                draft.work_type.to_db_string(),
                fetched_at,
            ],
        )?;

        let outcome = match (existed, changed) {
            (_, 0) => WriteOutcome::Stale,
            (false, _) => WriteOutcome::Inserted,
            (true, _) => WriteOutcome::Updated,
        };

        let job_id: i64 = tx.query_row(
            "SELECT id FROM jobs WHERE source_hash = ?1",
            params![draft.source_hash],
            |row| row.get(0),
        )?;

        if outcome != WriteOutcome::Stale {
            replace_children(&tx, job_id, draft)?;
        }

        let job = find_job(&tx, &draft.source_hash)?
            .ok_or_else(|| StorageError::JobNotFound(draft.source_hash.clone()))?;

        tx.commit()?;
        Ok((outcome, job))
    }

    fn delete_missing(&mut self, source_id: &str, live_urls: &[String]) -> StorageResult<usize> {
        let live = serde_json::to_string(live_urls)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = tx.execute(
            "DELETE FROM jobs
             WHERE source_id = ?1
               AND source_url NOT IN (SELECT value FROM json_each(?2))",
            params![source_id, live],
        )?;
        tx.commit()?;

        Ok(deleted)
    }

    fn list_jobs(&self, source_id: Option<&str>, limit: usize) -> StorageResult<Vec<Job>> {
        let sql = format!(
            "SELECT {} FROM jobs
             WHERE ?1 IS NULL OR source_id = ?1
             ORDER BY last_fetched_at DESC, id DESC
             LIMIT ?2",
            JOB_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut jobs = stmt
            .query_map(params![source_id, limit as i64], job_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for job in &mut jobs {
            load_children(&self.conn, job)?;
        }
        Ok(jobs)
    }

    fn count_jobs(&self, source_id: Option<&str>) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE ?1 IS NULL OR source_id = ?1",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Statistics =====

    fn source_stats(&self) -> StorageResult<Vec<SourceStats>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_id, COUNT(*), MIN(last_fetched_at), MAX(last_fetched_at)
             FROM jobs GROUP BY source_id ORDER BY source_id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|(source_id, jobs, oldest, newest)| SourceStats {
                source_id,
                jobs: jobs as u64,
                oldest_fetch: oldest.and_then(|s| parse_timestamp(&s).ok()),
                newest_fetch: newest.and_then(|s| parse_timestamp(&s).ok()),
            })
            .collect())
    }

    // ===== Sync runs =====

    fn record_run(&mut self, run: &RunRecord) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sync_runs (started_at, finished_at, config_hash, sources, enumerated,
                                    created, updated, unchanged, skipped, pruned, warnings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                format_timestamp(&run.started_at),
                format_timestamp(&run.finished_at),
                run.config_hash,
                run.sources as i64,
                run.enumerated as i64,
                run.created as i64,
                run.updated as i64,
                run.unchanged as i64,
                run.skipped as i64,
                run.pruned as i64,
                run.warnings as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_runs(&self, limit: usize) -> StorageResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, config_hash, sources, enumerated, created,
                    updated, unchanged, skipped, pruned, warnings
             FROM sync_runs ORDER BY id DESC LIMIT ?1",
        )?;
        let runs = stmt
            .query_map(params![limit as i64], run_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(source_id: &str, url: &str, title: &str, fetched: DateTime<Utc>) -> JobDraft {
        JobDraft {
            source_id: source_id.to_string(),
            title: title.to_string(),
            company: "Acme".to_string(),
            source_url: url.to_string(),
            source_hash: crate::url::hash_canonical(url),
            required_skills: ["Rust", "SQL", "Tokio"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            accessibility_options: vec!["Elevator".to_string(), "Ramp".to_string()],
            work_type: WorkType::Hybrid,
            last_fetched_at: fetched,
        }
    }

    fn create_test_storage() -> SqliteStorage {
        SqliteStorage::new_in_memory().unwrap()
    }

    #[test]
    fn test_upsert_inserts_then_updates() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let first = draft("s1", "https://example.com/wd/1", "Engineer", now);

        let (outcome, job) = storage.upsert_job(&first).unwrap();
        assert_eq!(outcome, WriteOutcome::Inserted);
        assert_eq!(job.title, "Engineer");
        assert_eq!(job.required_skills.len(), 3);
        assert_eq!(job.accessibility_options, vec!["Elevator", "Ramp"]);
        assert_eq!(job.work_type, WorkType::Hybrid);
        assert_eq!(job.like_count, 0);

        let mut second = draft("s1", "https://example.com/wd/1", "Senior Engineer", now + Duration::hours(25));
        second.required_skills = ["Go"].iter().map(|s| s.to_string()).collect();
        second.accessibility_options = vec!["Ramp".to_string()];

        let (outcome, updated) = storage.upsert_job(&second).unwrap();
        assert_eq!(outcome, WriteOutcome::Updated);
        assert_eq!(updated.id, job.id);
        assert_eq!(updated.title, "Senior Engineer");
        assert_eq!(updated.required_skills.len(), 1);
        assert!(updated.required_skills.contains("Go"));
        assert_eq!(updated.accessibility_options, vec!["Ramp"]);
        assert_eq!(storage.count_jobs(None).unwrap(), 1);
    }

    #[test]
    fn test_upsert_keeps_last_fetched_monotonic() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        storage
            .upsert_job(&draft("s1", "https://example.com/wd/1", "Newer", now))
            .unwrap();

        let (outcome, job) = storage
            .upsert_job(&draft("s1", "https://example.com/wd/1", "Older", now - Duration::hours(1)))
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Stale);
        assert_eq!(job.title, "Newer");
        assert_eq!(job.required_skills.len(), 3);
    }

    #[test]
    fn test_upsert_preserves_counters() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        let (_, job) = storage
            .upsert_job(&draft("s1", "https://example.com/wd/1", "Engineer", now))
            .unwrap();
        storage
            .conn
            .execute(
                "UPDATE jobs SET like_count = 5, view_count = 42 WHERE id = ?1",
                params![job.id],
            )
            .unwrap();

        let (_, refreshed) = storage
            .upsert_job(&draft("s1", "https://example.com/wd/1", "Engineer", now + Duration::hours(30)))
            .unwrap();
        assert_eq!(refreshed.like_count, 5);
        assert_eq!(refreshed.view_count, 42);
    }

    #[test]
    fn test_find_by_hash() {
        let mut storage = create_test_storage();
        let job_draft = draft("s1", "https://example.com/wd/7", "Engineer", Utc::now());
        storage.upsert_job(&job_draft).unwrap();

        let found = storage.find_by_hash(&job_draft.source_hash).unwrap().unwrap();
        assert_eq!(found.source_url, "https://example.com/wd/7");
        assert!(storage.find_by_hash("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete_missing_is_scoped_to_source() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        for url in ["https://example.com/wd/1", "https://example.com/wd/2", "https://example.com/wd/3"] {
            storage.upsert_job(&draft("s1", url, "Engineer", now)).unwrap();
        }
        storage
            .upsert_job(&draft("s2", "https://other.example.com/wd/9", "Designer", now))
            .unwrap();

        let live = vec!["https://example.com/wd/2".to_string()];
        let deleted = storage.delete_missing("s1", &live).unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(storage.count_jobs(Some("s1")).unwrap(), 1);
        assert_eq!(storage.count_jobs(Some("s2")).unwrap(), 1);

        let child_rows: i64 = storage
            .conn
            .query_row("SELECT COUNT(*) FROM job_skills", [], |row| row.get(0))
            .unwrap();
        assert_eq!(child_rows, 6, "skills of deleted jobs should cascade");
    }

    #[test]
    fn test_list_jobs_and_stats() {
        let mut storage = create_test_storage();
        let now = Utc::now();
        storage
            .upsert_job(&draft("s1", "https://example.com/wd/1", "Old", now - Duration::hours(3)))
            .unwrap();
        storage
            .upsert_job(&draft("s1", "https://example.com/wd/2", "New", now))
            .unwrap();
        storage
            .upsert_job(&draft("s2", "https://other.example.com/wd/1", "Other", now))
            .unwrap();

        let jobs = storage.list_jobs(Some("s1"), 10).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].title, "New");
        assert_eq!(storage.list_jobs(None, 1).unwrap().len(), 1);

        let stats = storage.source_stats().unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].source_id, "s1");
        assert_eq!(stats[0].jobs, 2);
        assert!(stats[0].oldest_fetch < stats[0].newest_fetch);
    }

    #[test]
    fn test_record_and_read_runs() {
        let mut storage = create_test_storage();
        let started = Utc::now();
        let run = RunRecord {
            id: 0,
            started_at: started,
            finished_at: started + Duration::seconds(90),
            config_hash: "abc".to_string(),
            sources: 2,
            enumerated: 47,
            created: 5,
            updated: 2,
            unchanged: 38,
            skipped: 2,
            pruned: 1,
            warnings: 0,
        };
        let first = storage.record_run(&run).unwrap();
        let second = storage.record_run(&run).unwrap();
        assert!(second > first);

        let runs = storage.recent_runs(5).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, second);
        assert_eq!(runs[0].enumerated, 47);
        assert_eq!(runs[0].config_hash, "abc");
    }

    #[test]
    fn test_file_backed_storage_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        {
            let mut storage = SqliteStorage::new(&path).unwrap();
            storage
                .upsert_job(&draft("s1", "https://example.com/wd/1", "Engineer", Utc::now()))
                .unwrap();
        }
        let storage = SqliteStorage::new(&path).unwrap();
        assert_eq!(storage.count_jobs(None).unwrap(), 1);
    }
}
