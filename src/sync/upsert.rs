//! Freshness-gated, hash-keyed upsert of a single listing

use crate::extractor::{ExtractedJob, ExtractionHints, JobExtractor};
use crate::model::{Job, JobDraft, JobSource};
use crate::scraper::{PageScraper, ScrapedPage};
use crate::state::UpsertOutcome;
use crate::storage::{Storage, WriteOutcome};
use crate::sync::{lock_storage, HashLocks, SharedStorage};
use crate::url::ListingIdentity;
use crate::SyncError;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Value the extractor uses for "could not tell"
const UNKNOWN: &str = "UNKNOWN";

/// Result of one upsert
#[derive(Debug, Clone)]
pub struct UpsertResult {
    pub outcome: UpsertOutcome,
    pub job: Job,
}

/// Merges scraped and extracted listing data into the catalog
pub struct UpsertEngine {
    storage: SharedStorage,
    scraper: Arc<dyn PageScraper>,
    extractor: Arc<dyn JobExtractor>,
    locks: HashLocks,
    freshness_window: Duration,
}

impl UpsertEngine {
    pub fn new(
        storage: SharedStorage,
        scraper: Arc<dyn PageScraper>,
        extractor: Arc<dyn JobExtractor>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            storage,
            scraper,
            extractor,
            locks: HashLocks::new(),
            freshness_window,
        }
    }

    /// Brings the record for `url` up to date
    ///
    /// A record fetched within the freshness window is returned as-is without
    /// any network call. Work on the same identity hash is serialized, and the
    /// storage write is a single atomic insert-or-update.
    ///
    /// # Arguments
    ///
    /// * `source` - Source the listing was enumerated from
    /// * `url` - Listing URL as enumerated
    /// * `fallback_company` - Company used when neither scrape nor extractor names one
    pub async fn upsert(
        &self,
        source: &JobSource,
        url: &str,
        fallback_company: &str,
    ) -> Result<UpsertResult, SyncError> {
        let identity = ListingIdentity::of(url)?;
        let _guard = self.locks.acquire(&identity.hash).await;

        let existing = lock_storage(&self.storage)?.find_by_hash(&identity.hash)?;
        if let Some(job) = existing {
            if job.is_fresh(Utc::now(), self.freshness_window) {
                debug!("Skipping fresh listing {}", identity.canonical);
                return Ok(UpsertResult {
                    outcome: UpsertOutcome::Fresh,
                    job,
                });
            }
        }

        let page = self.scraper.scrape(url).await?;
        let hints = ExtractionHints {
            title: page.title.clone(),
            company: page.company.clone(),
        };
        let extracted = self.extractor.extract(&page.text, &hints).await?;

        let draft = resolve_draft(
            &source.id,
            &identity,
            &page,
            &extracted,
            fallback_company,
            Utc::now(),
        );

        let (write, job) = lock_storage(&self.storage)?.upsert_job(&draft)?;
        let outcome = match write {
            WriteOutcome::Inserted => UpsertOutcome::Created,
            WriteOutcome::Updated => UpsertOutcome::Updated,
            WriteOutcome::Stale => UpsertOutcome::Fresh,
        };
        debug!("Listing {} {}", identity.canonical, outcome);

        Ok(UpsertResult { outcome, job })
    }

    /// Releases bookkeeping for hashes no task is working on
    pub fn release_idle_locks(&self) {
        self.locks.prune_idle();
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case(UNKNOWN))
}

/// Resolves the record fields from scraped and extracted values
///
/// Precedence for title and company: directly scraped, then extractor, then
/// the fallback. Skills, accessibility options and work type always come
/// from this extraction and replace prior values.
pub fn resolve_draft(
    source_id: &str,
    identity: &ListingIdentity,
    page: &ScrapedPage,
    extracted: &ExtractedJob,
    fallback_company: &str,
    fetched_at: DateTime<Utc>,
) -> JobDraft {
    let title = present(page.title.as_deref())
        .or_else(|| present(Some(&extracted.title)))
        .unwrap_or(UNKNOWN)
        .to_string();

    let company = present(page.company.as_deref())
        .or_else(|| present(Some(&extracted.company)))
        .unwrap_or_else(|| fallback_company.trim())
        .to_string();

    let required_skills: BTreeSet<String> = extracted
        .required_skills
        .iter()
        .map(|skill| skill.trim())
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect();

    let mut accessibility_options: Vec<String> = Vec::new();
    for option in extracted.accessibility_options.iter().map(|o| o.trim()) {
        if !option.is_empty() && !accessibility_options.iter().any(|o| o == option) {
            accessibility_options.push(option.to_string());
        }
    }

    JobDraft {
        source_id: source_id.to_string(),
        title,
        company,
        source_url: identity.canonical.clone(),
        source_hash: identity.hash.clone(),
        required_skills,
        accessibility_options,
        work_type: extracted.work_type,
        last_fetched_at: fetched_at,
    }
}
