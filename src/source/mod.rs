//! Source enumeration module
//!
//! Walks the paginated listing API of a job source and returns the live
//! listing URLs in page-then-item order.

mod enumerator;
mod platform;

pub use enumerator::HttpEnumerator;
pub use platform::extract_item_ids;

use crate::model::JobSource;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while fetching a listing page
#[derive(Debug, Error)]
pub enum EnumerateError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Listing API returned HTTP {0}")]
    Status(u16),

    #[error("Invalid list URL '{0}'")]
    InvalidListUrl(String),

    #[error("Malformed listing page: {0}")]
    MalformedPage(String),
}

/// Why enumeration of a source stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page returned no items
    Exhausted,
    /// A page returned fewer items than the page size
    LastPage,
    /// The page ceiling was reached
    PageCap,
    /// A page request failed; the result is partial
    Failed,
}

/// Live listing URLs of one source
#[derive(Debug, Clone)]
pub struct EnumerationResult {
    pub urls: Vec<String>,
    pub pages_fetched: u32,
    pub stop: StopReason,
    /// Set when enumeration was cut short by a failure
    pub warning: Option<String>,
}

impl EnumerationResult {
    pub fn is_partial(&self) -> bool {
        self.stop == StopReason::Failed
    }
}

/// Produces the live listing URLs of a source
///
/// Enumeration never fails as a whole: request failures end it early and are
/// reported through `EnumerationResult::warning`.
#[async_trait]
pub trait ListingEnumerator: Send + Sync {
    async fn enumerate(&self, source: &JobSource) -> EnumerationResult;
}
