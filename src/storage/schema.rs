//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Listing-Sync catalog.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Catalog records, one per canonical listing URL
CREATE TABLE IF NOT EXISTS jobs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id TEXT NOT NULL,
    title TEXT NOT NULL,
    company TEXT NOT NULL,
    source_url TEXT NOT NULL,
    source_hash TEXT NOT NULL UNIQUE,
    work_type TEXT NOT NULL DEFAULT 'UNKNOWN',
    last_fetched_at TEXT NOT NULL,
    like_count INTEGER NOT NULL DEFAULT 0,
    view_count INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_jobs_source ON jobs(source_id);
CREATE INDEX IF NOT EXISTS idx_jobs_source_url ON jobs(source_url);

-- Required skills (a set per job)
CREATE TABLE IF NOT EXISTS job_skills (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_id INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    skill TEXT NOT NULL,
    UNIQUE(job_id, skill)
);

CREATE INDEX IF NOT EXISTS idx_job_skills_job ON job_skills(job_id);

-- Accessibility options (an ordered list per job)
CREATE TABLE IF NOT EXISTS job_accessibility (
    job_id INTEGER NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    option TEXT NOT NULL,
    PRIMARY KEY(job_id, position)
);

-- One row per completed sync cycle
CREATE TABLE IF NOT EXISTS sync_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    sources INTEGER NOT NULL,
    enumerated INTEGER NOT NULL,
    created INTEGER NOT NULL,
    updated INTEGER NOT NULL,
    unchanged INTEGER NOT NULL,
    skipped INTEGER NOT NULL,
    pruned INTEGER NOT NULL,
    warnings INTEGER NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
