//! Sync coordinator - one pass over every active source
//!
//! For each source the coordinator:
//! - Enumerates the live listing URLs
//! - Runs every URL through the upsert engine, sequentially or with bounded
//!   concurrency
//! - Prunes records whose listing is no longer live
//!
//! Sources are processed one after another; a failing URL never aborts its
//! batch.

use crate::config::Config;
use crate::extractor::OpenAiExtractor;
use crate::model::JobSource;
use crate::output::{CycleReport, SourceReport};
use crate::scraper::{HeadlessScraper, HttpScraper, PageScraper, RuleTable, ScrapeChain};
use crate::source::{HttpEnumerator, ListingEnumerator};
use crate::state::{CycleMachine, CyclePhase, UpsertOutcome};
use crate::sync::{prune, SharedStorage, UpsertEngine, UpsertResult};
use crate::SyncError;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Main sync coordinator structure
pub struct Coordinator {
    storage: SharedStorage,
    enumerator: Arc<dyn ListingEnumerator>,
    engine: Arc<UpsertEngine>,
    sources: Vec<JobSource>,
    max_concurrent: usize,
}

impl Coordinator {
    pub fn new(
        storage: SharedStorage,
        enumerator: Arc<dyn ListingEnumerator>,
        engine: Arc<UpsertEngine>,
        sources: Vec<JobSource>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            storage,
            enumerator,
            engine,
            sources,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Wires the production pipeline from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `storage` - The opened catalog
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run cycles over the active sources
    /// * `Err(SyncError)` - A client could not be built or the API key is missing
    pub fn from_config(config: &Config, storage: SharedStorage) -> Result<Self, SyncError> {
        let enumerator = HttpEnumerator::new(&config.enumerator, &config.scraper.user_agent)?;

        let rules = Arc::new(RuleTable::with_overrides(&config.scraper.host_rules)?);
        let primary: Arc<dyn PageScraper> = Arc::new(HttpScraper::new(&config.scraper, rules.clone())?);
        let fallback: Option<Arc<dyn PageScraper>> = if config.scraper.headless {
            Some(Arc::new(HeadlessScraper::new(&config.scraper, rules)))
        } else {
            None
        };
        let scraper = ScrapeChain::new(primary, fallback, config.scraper.min_content_length);

        let extractor = OpenAiExtractor::from_config(&config.extractor)?;

        let engine = UpsertEngine::new(
            storage.clone(),
            Arc::new(scraper),
            Arc::new(extractor),
            chrono::Duration::hours(i64::from(config.scheduler.freshness_hours)),
        );

        Ok(Self::new(
            storage,
            Arc::new(enumerator),
            Arc::new(engine),
            config.active_sources(),
            config.scheduler.max_concurrent_scrapes as usize,
        ))
    }

    pub fn sources(&self) -> &[JobSource] {
        &self.sources
    }

    /// Runs one full cycle over every active source
    pub async fn run_cycle(&self) -> Result<CycleReport, SyncError> {
        let mut report = CycleReport::new(Utc::now());
        let mut machine = CycleMachine::new();

        info!("Starting sync cycle over {} sources", self.sources.len());

        for source in &self.sources {
            let source_report = self.sync_source(&mut machine, source).await?;
            report.sources.push(source_report);
        }

        if machine.phase() != CyclePhase::Idle {
            machine.advance(CyclePhase::Idle)?;
        }
        self.engine.release_idle_locks();

        report.finish(Utc::now());
        Ok(report)
    }

    /// Ingests a single listing URL on behalf of `source`
    pub async fn ingest(
        &self,
        source: &JobSource,
        url: &str,
        company: Option<&str>,
    ) -> Result<UpsertResult, SyncError> {
        let fallback_company = company.unwrap_or(&source.company);
        self.engine.upsert(source, url, fallback_company).await
    }

    async fn sync_source(
        &self,
        machine: &mut CycleMachine,
        source: &JobSource,
    ) -> Result<SourceReport, SyncError> {
        let mut report = SourceReport::new(&source.id);

        machine.advance(CyclePhase::Enumerating)?;
        let enumeration = self.enumerator.enumerate(source).await;
        report.enumerated = enumeration.urls.len() as u64;
        report.warning = enumeration.warning.clone();
        info!(
            "Source {}: {} listings over {} pages ({:?})",
            source.id,
            enumeration.urls.len(),
            enumeration.pages_fetched,
            enumeration.stop
        );

        machine.advance(CyclePhase::ScrapingBatch)?;
        for (url, result) in self.process_batch(source, &enumeration.urls).await {
            match result {
                Ok(upsert) => match upsert.outcome {
                    UpsertOutcome::Created => report.created += 1,
                    UpsertOutcome::Updated => report.updated += 1,
                    UpsertOutcome::Fresh => report.unchanged += 1,
                },
                Err(e) => {
                    warn!("Skipping {}: {}", url, e);
                    report.skipped += 1;
                }
            }
        }

        machine.advance(CyclePhase::Pruning)?;
        match prune(&self.storage, source, &enumeration.urls) {
            Ok(outcome) => report.record_prune(outcome),
            Err(e) => {
                error!("Prune of {} failed: {}", source.id, e);
                report.prune_skipped = true;
            }
        }

        Ok(report)
    }

    async fn process_batch(
        &self,
        source: &JobSource,
        urls: &[String],
    ) -> Vec<(String, Result<UpsertResult, SyncError>)> {
        if self.max_concurrent == 1 {
            let mut results = Vec::with_capacity(urls.len());
            for url in urls {
                let result = self.engine.upsert(source, url, &source.company).await;
                results.push((url.clone(), result));
            }
            return results;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Failed to acquire scrape permit: {}", e);
                    break;
                }
            };
            let engine = self.engine.clone();
            let source = source.clone();
            let task_url = url.clone();
            let handle = tokio::spawn(async move {
                let result = engine.upsert(&source, &task_url, &source.company).await;
                drop(permit);
                result
            });
            handles.push((url.clone(), handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (url, handle) in handles {
            let result = handle.await.unwrap_or_else(|e| {
                error!("Listing task for {} failed: {}", url, e);
                Err(SyncError::TaskFailed(e.to_string()))
            });
            results.push((url, result));
        }
        results
    }
}
