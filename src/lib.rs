//! Listing-Sync: keeps a local job catalog in step with live job-board listings
//!
//! This crate enumerates the listings published by each configured job source,
//! scrapes every listing page (plain HTTP first, headless rendering as a
//! fallback), hands the text to a structured extractor, upserts the result keyed
//! by a content address of the canonical URL, and prunes records whose listing
//! has disappeared.

pub mod config;
pub mod extractor;
pub mod model;
pub mod output;
pub mod scraper;
pub mod source;
pub mod state;
pub mod storage;
pub mod sync;
pub mod url;

use thiserror::Error;

/// Main error type for Listing-Sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Enumeration error: {0}")]
    Enumerate(#[from] source::EnumerateError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] scraper::ScrapeError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extractor::ExtractError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid cycle transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CyclePhase,
        to: state::CyclePhase,
    },

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Listing task failed: {0}")]
    TaskFailed(String),
}

impl SyncError {
    /// Returns true if the message can be shown to an end user as-is
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Extract(e) if e.is_user_facing())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Listing-Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::model::{Job, JobPlatform, JobSource, WorkType};
pub use crate::state::{CyclePhase, UpsertOutcome};
pub use crate::url::{identity_key, normalize_url};
