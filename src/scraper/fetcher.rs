//! Direct HTTP fetch strategy
//!
//! Fetches listing pages with a browser-like user agent and a bounded
//! timeout. Only hosts on the configured allow-list are fetched; redirects
//! are followed by hand so every hop is checked against that list.

use crate::config::ScraperConfig;
use crate::scraper::{PageScraper, RuleTable, ScrapeError, ScrapedPage};
use crate::url::{extract_host, host_allowed};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Maximum redirect hops followed for one listing
const MAX_REDIRECTS: usize = 5;

/// Plain HTTP scraping strategy
pub struct HttpScraper {
    client: Client,
    allowed_hosts: Vec<String>,
    rules: Arc<RuleTable>,
}

impl HttpScraper {
    /// Builds the scraper's HTTP client from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Scraper section of the configuration
    /// * `rules` - Host extraction rules shared with the headless strategy
    pub fn new(config: &ScraperConfig, rules: Arc<RuleTable>) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .redirect(Policy::none()) // Redirects are followed in fetch_html
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            allowed_hosts: config.allowed_hosts.clone(),
            rules,
        })
    }

    /// Returns the allow-listed host of `url`
    fn allowed_host(&self, url: &Url) -> Result<String, ScrapeError> {
        let host = extract_host(url).ok_or_else(|| ScrapeError::InvalidUrl(url.to_string()))?;
        if !host_allowed(&self.allowed_hosts, &host) {
            return Err(ScrapeError::HostNotAllowed(host));
        }
        Ok(host)
    }

    /// Fetches raw HTML, following redirects only to allowed hosts
    ///
    /// # Returns
    ///
    /// The host the HTML was finally served from, and the HTML
    async fn fetch_html(&self, url: &Url) -> Result<(String, String), ScrapeError> {
        let mut current = url.clone();
        let mut host = self.allowed_host(&current)?;

        for _ in 0..=MAX_REDIRECTS {
            let response = self.client.get(current.as_str()).send().await?;
            let status = response.status();

            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| ScrapeError::Redirect(format!("{status} without Location from {current}")))?;
                let next = current
                    .join(location)
                    .map_err(|e| ScrapeError::Redirect(format!("bad Location '{location}': {e}")))?;
                if next.scheme() != "http" && next.scheme() != "https" {
                    return Err(ScrapeError::Redirect(format!("unsupported scheme in {next}")));
                }

                host = self.allowed_host(&next)?;
                debug!("Following redirect {} -> {}", current, next);
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(ScrapeError::Status(status.as_u16()));
            }

            return Ok((host, response.text().await?));
        }

        Err(ScrapeError::Redirect(format!(
            "more than {} redirects from {}",
            MAX_REDIRECTS, url
        )))
    }
}

#[async_trait]
impl PageScraper for HttpScraper {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ScrapeError> {
        let parsed = Url::parse(url).map_err(|e| ScrapeError::InvalidUrl(format!("{url}: {e}")))?;

        let (host, html) = self.fetch_html(&parsed).await?;
        let page = self.rules.extract(&html, &host);
        debug!("Fetched {} ({} characters of text)", url, page.text_len());
        Ok(page)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
