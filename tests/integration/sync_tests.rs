//! Integration tests for the sync pipeline
//!
//! These tests use wiremock to stand in for the listing API, the listing
//! pages and the extraction service, and drive full cycles against a
//! catalog on disk.

use chrono::Utc;
use listing_sync::config::{parse_config, Config};
use listing_sync::model::JobDraft;
use listing_sync::output::SqliteReportSink;
use listing_sync::storage::{SqliteStorage, Storage};
use listing_sync::sync::{share, Coordinator, Scheduler};
use listing_sync::url::ListingIdentity;
use listing_sync::WorkType;
use serde_json::json;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY_ENV: &str = "LISTING_SYNC_IT_API_KEY";
const SOURCE_ID: &str = "mock-board";

/// Creates a test configuration pointing every endpoint at the mock server
fn create_test_config(server: &MockServer, db_path: &Path) -> Config {
    std::env::set_var(API_KEY_ENV, "integration-key");
    let uri = server.uri();
    let toml = format!(
        r#"
[scheduler]
max-concurrent-scrapes = 2

[enumerator]
page-size = 2
max-pages = 5
timeout-secs = 5

[scraper]
timeout-secs = 5
min-content-length = 50
allowed-hosts = ["127.0.0.1"]
headless = false

[extractor]
base-url = "{uri}"
api-key-env = "{API_KEY_ENV}"
timeout-secs = 5

[storage]
database-path = "{db}"

[[source]]
id = "{SOURCE_ID}"
company = "Mock Board Co"
platform = "wanted"
list-url = "{uri}/api/jobs"
listing-url-template = "{uri}/wd/{{id}}"
"#,
        db = db_path.display()
    );
    parse_config(&toml).expect("test config is valid")
}

async fn mount_listing_page(server: &MockServer, offset: u32, ids: &[u32]) {
    let items: Vec<_> = ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .and(query_param("offset", offset.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": items })))
        .mount(server)
        .await;
}

async fn mount_posting(server: &MockServer, id: u32, title: &str) {
    let html = format!(
        r#"<html><head><meta property="og:title" content="{title}"></head>
        <body><h1>{title}</h1><p>We are looking for an engineer to build and run our
        listing services. Experience with Rust and SQL is expected.</p></body></html>"#
    );
    Mock::given(method("GET"))
        .and(path(format!("/wd/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

async fn mount_extractor(server: &MockServer, expected_calls: u64) {
    let answer = json!({
        "title": "Extracted Title",
        "company": "Mock Corp",
        "requiredSkills": ["Rust", "SQL"],
        "accessibilityOptions": ["Elevator"],
        "workType": "REMOTE"
    });
    Mock::given(method("POST"))
        .and(path("/responses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "output": [{
                "type": "message",
                "content": [{ "type": "output_text", "text": answer.to_string() }]
            }]
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn seed(db_path: &Path, source_id: &str, url: &str) {
    let mut storage = SqliteStorage::new(db_path).unwrap();
    let identity = ListingIdentity::of(url).unwrap();
    storage
        .upsert_job(&JobDraft {
            source_id: source_id.to_string(),
            title: "Seeded".to_string(),
            company: "Seeded Co".to_string(),
            source_url: identity.canonical,
            source_hash: identity.hash,
            required_skills: BTreeSet::new(),
            accessibility_options: Vec::new(),
            work_type: WorkType::Unknown,
            last_fetched_at: Utc::now(),
        })
        .unwrap();
}

#[tokio::test]
async fn test_full_cycle_creates_skips_and_prunes() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    // Three listings over two pages; the third page is short and ends the walk
    mount_listing_page(&server, 0, &[1, 2]).await;
    mount_listing_page(&server, 2, &[3]).await;
    mount_posting(&server, 1, "Backend Engineer").await;
    mount_posting(&server, 2, "Data Engineer").await;
    Mock::given(method("GET"))
        .and(path("/wd/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // Two listings scraped in the first cycle, none in the second
    mount_extractor(&server, 2).await;

    let uri = server.uri();
    seed(&db_path, SOURCE_ID, &format!("{uri}/wd/99"));
    seed(&db_path, "other-board", &format!("{uri}/wd/98"));

    let config = create_test_config(&server, &db_path);
    let storage = share(SqliteStorage::new(&db_path).unwrap());
    let coordinator = Coordinator::from_config(&config, storage.clone()).unwrap();

    let first = coordinator.run_cycle().await.unwrap();
    let report = &first.sources[0];
    assert_eq!(report.enumerated, 3);
    assert_eq!(report.created, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.pruned, 1);
    assert!(report.warning.is_none());

    {
        let catalog = storage.lock().unwrap();
        assert_eq!(catalog.count_jobs(Some(SOURCE_ID)).unwrap(), 2);
        assert_eq!(catalog.count_jobs(Some("other-board")).unwrap(), 1);

        let identity = ListingIdentity::of(&format!("{uri}/wd/1?ref=list")).unwrap();
        let job = catalog.find_by_hash(&identity.hash).unwrap().unwrap();
        // Scraped title wins; the extractor supplies the company
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.company, "Mock Corp");
        assert_eq!(job.work_type, WorkType::Remote);
        assert!(job.required_skills.contains("Rust"));
        assert_eq!(job.accessibility_options, vec!["Elevator"]);
        assert_eq!(job.source_url, format!("{uri}/wd/1"));
    }

    // Everything is fresh now: no extraction calls, no new rows
    let second = coordinator.run_cycle().await.unwrap();
    let report = &second.sources[0];
    assert_eq!(report.created, 0);
    assert_eq!(report.unchanged, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.pruned, 0);
    assert_eq!(storage.lock().unwrap().count_jobs(None).unwrap(), 3);
}

#[tokio::test]
async fn test_failed_enumeration_never_prunes() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    Mock::given(method("GET"))
        .and(path("/api/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_extractor(&server, 0).await;

    let uri = server.uri();
    seed(&db_path, SOURCE_ID, &format!("{uri}/wd/1"));
    seed(&db_path, SOURCE_ID, &format!("{uri}/wd/2"));

    let config = create_test_config(&server, &db_path);
    let storage = share(SqliteStorage::new(&db_path).unwrap());
    let coordinator = Coordinator::from_config(&config, storage.clone()).unwrap();

    let cycle = coordinator.run_cycle().await.unwrap();
    let report = &cycle.sources[0];

    assert_eq!(report.enumerated, 0);
    assert!(report.warning.is_some());
    assert!(report.prune_skipped);
    assert_eq!(storage.lock().unwrap().count_jobs(Some(SOURCE_ID)).unwrap(), 2);
}

#[tokio::test]
async fn test_scheduler_records_run_history() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    mount_listing_page(&server, 0, &[5]).await;
    mount_posting(&server, 5, "Platform Engineer").await;
    mount_extractor(&server, 1).await;

    let config = create_test_config(&server, &db_path);
    let storage = share(SqliteStorage::new(&db_path).unwrap());
    let coordinator = Coordinator::from_config(&config, storage.clone()).unwrap();
    let scheduler = Scheduler::new(coordinator, Duration::from_secs(3600), true)
        .with_sink(Arc::new(SqliteReportSink::new(storage.clone(), "config-hash")));

    scheduler.run_once().await.unwrap();

    let runs = storage.lock().unwrap().recent_runs(5).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].config_hash, "config-hash");
    assert_eq!(runs[0].sources, 1);
    assert_eq!(runs[0].enumerated, 1);
    assert_eq!(runs[0].created, 1);
}

#[tokio::test]
async fn test_ingest_single_url_is_idempotent() {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("catalog.db");

    mount_posting(&server, 7, "Site Reliability Engineer").await;
    mount_extractor(&server, 1).await;

    let config = create_test_config(&server, &db_path);
    let storage = share(SqliteStorage::new(&db_path).unwrap());
    let coordinator = Coordinator::from_config(&config, storage.clone()).unwrap();
    let source = config.find_source(SOURCE_ID).unwrap();
    let url = format!("{}/wd/7?utm_source=mail", server.uri());

    let first = coordinator.ingest(&source, &url, None).await.unwrap();
    let second = coordinator.ingest(&source, &url, None).await.unwrap();

    assert_eq!(first.outcome.as_str(), "created");
    assert_eq!(second.outcome.as_str(), "fresh");
    assert_eq!(first.job.id, second.job.id);
    assert_eq!(storage.lock().unwrap().count_jobs(None).unwrap(), 1);
}
