//! Primary/fallback scraping with a content validation gate

use crate::scraper::{PageScraper, ScrapeError, ScrapedPage};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs the primary strategy, validates its output, and falls back once
///
/// The minimum length gate applies to both strategies: a short page from
/// the fallback is a failure too.
pub struct ScrapeChain {
    primary: Arc<dyn PageScraper>,
    fallback: Option<Arc<dyn PageScraper>>,
    min_content_length: usize,
}

impl ScrapeChain {
    pub fn new(
        primary: Arc<dyn PageScraper>,
        fallback: Option<Arc<dyn PageScraper>>,
        min_content_length: usize,
    ) -> Self {
        Self {
            primary,
            fallback,
            min_content_length,
        }
    }

    fn validate(&self, page: ScrapedPage) -> Result<ScrapedPage, ScrapeError> {
        let len = page.text_len();
        if len < self.min_content_length {
            return Err(ScrapeError::TooShort {
                len,
                min: self.min_content_length,
            });
        }
        Ok(page)
    }

    async fn attempt(&self, scraper: &dyn PageScraper, url: &str) -> Result<ScrapedPage, ScrapeError> {
        let page = scraper.scrape(url).await?;
        self.validate(page)
    }
}

#[async_trait]
impl PageScraper for ScrapeChain {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ScrapeError> {
        let primary_error = match self.attempt(self.primary.as_ref(), url).await {
            Ok(page) => return Ok(page),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            debug!("{} scrape of {} failed with no fallback: {}", self.primary.name(), url, primary_error);
            return Err(primary_error);
        };

        warn!(
            url = %url,
            error = %primary_error,
            "{} scrape rejected, falling back to {}",
            self.primary.name(),
            fallback.name()
        );

        self.attempt(fallback.as_ref(), url)
            .await
            .map_err(|fallback_error| ScrapeError::Exhausted {
                primary: primary_error.to_string(),
                fallback: fallback_error.to_string(),
            })
    }

    fn name(&self) -> &'static str {
        "chain"
    }
}
