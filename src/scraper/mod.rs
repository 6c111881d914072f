//! Listing page scraping
//!
//! Two strategies sit behind the `PageScraper` seam: a direct HTTP fetch
//! restricted to an allow-list of hosts, and a headless browser render.
//! `ScrapeChain` runs the first, validates its output and falls back to the
//! second at most once.

mod chain;
mod fetcher;
mod headless;
mod rules;

pub use chain::ScrapeChain;
pub use fetcher::HttpScraper;
pub use headless::HeadlessScraper;
pub use rules::{collapse_whitespace, HostRule, RuleTable};

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a scraping strategy
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Host not allowed for direct fetch: {0}")]
    HostNotAllowed(String),

    #[error("Invalid listing URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Redirect failed: {0}")]
    Redirect(String),

    #[error("Content too short ({len} < {min} characters)")]
    TooShort { len: usize, min: usize },

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Render timed out after {0}s")]
    Timeout(u64),

    #[error("All strategies failed: primary: {primary}; fallback: {fallback}")]
    Exhausted { primary: String, fallback: String },
}

/// Text and metadata pulled out of a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedPage {
    /// Whitespace-collapsed body text
    pub text: String,
    pub title: Option<String>,
    pub company: Option<String>,
}

impl ScrapedPage {
    /// Length of the body text in characters
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A strategy that turns a listing URL into page text
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape(&self, url: &str) -> Result<ScrapedPage, ScrapeError>;

    /// Short label used in logs
    fn name(&self) -> &'static str;
}
