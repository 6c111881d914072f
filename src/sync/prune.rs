use crate::model::JobSource;
use crate::storage::Storage;
use crate::sync::{lock_storage, SharedStorage};
use crate::url::canonical_url;
use crate::SyncError;
use tracing::{info, warn};

/// What a prune pass did for one source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneOutcome {
    Deleted(usize),
    /// The live set was empty, so nothing was considered
    Skipped,
}

impl PruneOutcome {
    pub fn deleted(&self) -> usize {
        match self {
            Self::Deleted(n) => *n,
            Self::Skipped => 0,
        }
    }
}

/// Removes records of `source` whose listing is no longer live
///
/// Live URLs are compared in canonical form. An empty live set is treated as
/// an enumeration failure rather than "every listing closed", and deletes
/// nothing.
pub fn prune(
    storage: &SharedStorage,
    source: &JobSource,
    live_urls: &[String],
) -> Result<PruneOutcome, SyncError> {
    let mut live: Vec<String> = live_urls
        .iter()
        .filter_map(|url| match canonical_url(url) {
            Ok(canonical) => Some(canonical),
            Err(e) => {
                warn!("Ignoring unparseable live URL {}: {}", url, e);
                None
            }
        })
        .collect();
    live.sort();
    live.dedup();

    if live.is_empty() {
        warn!(
            "No live listings for source {}; skipping prune",
            source.id
        );
        return Ok(PruneOutcome::Skipped);
    }

    let deleted = lock_storage(storage)?.delete_missing(&source.id, &live)?;
    if deleted > 0 {
        info!("Pruned {} closed listings from {}", deleted, source.id);
    }

    Ok(PruneOutcome::Deleted(deleted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobDraft, JobPlatform, WorkType};
    use crate::storage::SqliteStorage;
    use crate::sync::share;
    use crate::url::ListingIdentity;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    /// Log sink collecting formatted events for assertions
    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLog {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn source(id: &str) -> JobSource {
        JobSource {
            id: id.to_string(),
            company: "Acme".to_string(),
            platform: JobPlatform::Saramin,
            list_url: "https://www.saramin.co.kr/list".to_string(),
            active: true,
            listing_url_template: None,
        }
    }

    fn seed(storage: &SharedStorage, source_id: &str, url: &str) {
        let identity = ListingIdentity::of(url).unwrap();
        let draft = JobDraft {
            source_id: source_id.to_string(),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            source_url: identity.canonical,
            source_hash: identity.hash,
            required_skills: BTreeSet::new(),
            accessibility_options: Vec::new(),
            work_type: WorkType::Unknown,
            last_fetched_at: Utc::now(),
        };
        storage.lock().unwrap().upsert_job(&draft).unwrap();
    }

    fn count(storage: &SharedStorage, source_id: &str) -> u64 {
        storage.lock().unwrap().count_jobs(Some(source_id)).unwrap()
    }

    #[test]
    fn test_empty_live_set_deletes_nothing() {
        let storage = share(SqliteStorage::new_in_memory().unwrap());
        seed(&storage, "a", "https://www.saramin.co.kr/job/1");
        seed(&storage, "a", "https://www.saramin.co.kr/job/2");

        let outcome = prune(&storage, &source("a"), &[]).unwrap();

        assert_eq!(outcome, PruneOutcome::Skipped);
        assert_eq!(count(&storage, "a"), 2);
    }

    #[test]
    fn test_unparseable_live_set_counts_as_empty() {
        let storage = share(SqliteStorage::new_in_memory().unwrap());
        seed(&storage, "a", "https://www.saramin.co.kr/job/1");

        let outcome = prune(&storage, &source("a"), &["not a url".to_string()]).unwrap();

        assert_eq!(outcome, PruneOutcome::Skipped);
        assert_eq!(count(&storage, "a"), 1);
    }

    #[test]
    fn test_deletes_exactly_the_closed_listings_of_the_source() {
        let storage = share(SqliteStorage::new_in_memory().unwrap());
        seed(&storage, "a", "https://www.saramin.co.kr/job/1");
        seed(&storage, "a", "https://www.saramin.co.kr/job/2");
        seed(&storage, "a", "https://www.saramin.co.kr/job/3");
        seed(&storage, "b", "https://www.saramin.co.kr/job/9");

        // Live URLs arrive in raw form and still match their canonical records
        let live = vec![
            "https://www.saramin.co.kr/job/1?ref=list".to_string(),
            "https://WWW.saramin.co.kr/job/3#apply".to_string(),
        ];
        let outcome = prune(&storage, &source("a"), &live).unwrap();

        assert_eq!(outcome, PruneOutcome::Deleted(1));
        assert_eq!(outcome.deleted(), 1);
        assert_eq!(count(&storage, "a"), 2);
        assert_eq!(count(&storage, "b"), 1);

        let gone = ListingIdentity::of("https://www.saramin.co.kr/job/2").unwrap();
        assert!(storage.lock().unwrap().find_by_hash(&gone.hash).unwrap().is_none());
    }

    #[test]
    fn test_empty_live_set_logs_warning() {
        let storage = share(SqliteStorage::new_in_memory().unwrap());
        seed(&storage, "a", "https://www.saramin.co.kr/job/1");

        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let outcome = tracing::subscriber::with_default(subscriber, || {
            prune(&storage, &source("a"), &[]).unwrap()
        });

        assert_eq!(outcome, PruneOutcome::Skipped);
        let output = log.contents();
        assert!(output.contains("WARN"), "no warning logged: {output}");
        assert!(output.contains("skipping prune"), "unexpected log: {output}");
        assert_eq!(count(&storage, "a"), 1);
    }
}
