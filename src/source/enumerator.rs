//! Paginated listing API client

use crate::config::EnumeratorConfig;
use crate::model::JobSource;
use crate::source::{
    extract_item_ids, EnumerateError, EnumerationResult, ListingEnumerator, StopReason,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Enumerates sources over HTTP with `offset`/`limit` pagination
pub struct HttpEnumerator {
    client: Client,
    page_size: u32,
    max_pages: u32,
}

impl HttpEnumerator {
    /// Builds an enumerator with its own bounded-timeout client
    pub fn new(config: &EnumeratorConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            page_size: config.page_size,
            max_pages: config.max_pages,
        })
    }

    /// Fetches one page and returns its listing identifiers
    async fn fetch_page(&self, source: &JobSource, offset: u64) -> Result<Vec<String>, EnumerateError> {
        let url = page_url(&source.list_url, offset, self.page_size)?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnumerateError::Status(status.as_u16()));
        }

        let page: Value = response.json().await?;
        extract_item_ids(source.platform, &page)
    }

    /// Walks pages until one of the stop conditions holds
    ///
    /// Conditions in priority order: empty page, short page (kept), page
    /// ceiling, request failure (partial result).
    async fn walk(&self, source: &JobSource) -> EnumerationResult {
        let mut urls = Vec::new();
        let mut pages_fetched = 0;

        loop {
            if pages_fetched >= self.max_pages {
                debug!(
                    "Source {} reached the page ceiling ({} pages)",
                    source.id, self.max_pages
                );
                return finished(urls, pages_fetched, StopReason::PageCap, None);
            }

            let offset = u64::from(pages_fetched) * u64::from(self.page_size);
            let ids = match self.fetch_page(source, offset).await {
                Ok(ids) => ids,
                Err(e) => {
                    let message = format!(
                        "Enumeration of {} stopped at offset {} after {} URLs: {}",
                        source.id,
                        offset,
                        urls.len(),
                        e
                    );
                    warn!("{}", message);
                    return finished(urls, pages_fetched, StopReason::Failed, Some(message));
                }
            };
            pages_fetched += 1;

            if ids.is_empty() {
                return finished(urls, pages_fetched, StopReason::Exhausted, None);
            }

            let short_page = ids.len() < self.page_size as usize;
            urls.extend(ids.iter().map(|id| source.listing_url(id)));

            if short_page {
                return finished(urls, pages_fetched, StopReason::LastPage, None);
            }
        }
    }
}

fn finished(
    urls: Vec<String>,
    pages_fetched: u32,
    stop: StopReason,
    warning: Option<String>,
) -> EnumerationResult {
    EnumerationResult {
        urls,
        pages_fetched,
        stop,
        warning,
    }
}

/// Appends `offset` and `limit` to the source's list endpoint
fn page_url(list_url: &str, offset: u64, limit: u32) -> Result<Url, EnumerateError> {
    let mut url =
        Url::parse(list_url).map_err(|_| EnumerateError::InvalidListUrl(list_url.to_string()))?;
    url.query_pairs_mut()
        .append_pair("offset", &offset.to_string())
        .append_pair("limit", &limit.to_string());
    Ok(url)
}

#[async_trait]
impl ListingEnumerator for HttpEnumerator {
    async fn enumerate(&self, source: &JobSource) -> EnumerationResult {
        let result = self.walk(source).await;
        debug!(
            "Enumerated {} URLs from {} in {} pages ({:?})",
            result.urls.len(),
            source.id,
            result.pages_fetched,
            result.stop
        );
        result
    }
}
