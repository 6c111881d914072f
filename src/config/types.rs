use crate::model::{JobPlatform, JobSource};
use serde::Deserialize;

/// Main configuration structure for Listing-Sync
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub enumerator: EnumeratorConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    pub storage: StorageConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

impl Config {
    /// Sources eligible for scheduling, in configuration order
    pub fn active_sources(&self) -> Vec<JobSource> {
        self.sources
            .iter()
            .filter(|entry| entry.active)
            .map(SourceEntry::to_source)
            .collect()
    }

    pub fn find_source(&self, id: &str) -> Option<JobSource> {
        self.sources
            .iter()
            .find(|entry| entry.id == id)
            .map(SourceEntry::to_source)
    }
}

/// Scheduling loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SchedulerConfig {
    /// Delay between the end of one cycle and the start of the next (seconds)
    pub interval_secs: u64,

    /// Records fetched more recently than this are not rescraped (hours)
    pub freshness_hours: u32,

    /// Upper bound of concurrently processed listings per source
    pub max_concurrent_scrapes: u32,

    /// Run a cycle immediately at startup instead of waiting one interval
    pub run_on_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 6 * 60 * 60,
            freshness_hours: 24,
            max_concurrent_scrapes: 1,
            run_on_start: true,
        }
    }
}

/// Listing API pagination configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EnumeratorConfig {
    pub page_size: u32,

    /// Hard ceiling on pages requested per source per cycle
    pub max_pages: u32,

    pub timeout_secs: u64,
}

impl Default for EnumeratorConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_pages: 50,
            timeout_secs: 15,
        }
    }
}

/// Content scraping configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScraperConfig {
    /// Browser-like user agent for direct fetches
    pub user_agent: String,

    pub timeout_secs: u64,

    /// Extracted text shorter than this (in characters) is rejected
    pub min_content_length: usize,

    /// Hosts that may be fetched directly (exact or `*.` wildcard patterns)
    pub allowed_hosts: Vec<String>,

    /// Enables the headless rendering fallback
    pub headless: bool,

    /// Settle delay after navigation before reading the page (milliseconds)
    pub settle_delay_ms: u64,

    pub render_timeout_secs: u64,

    /// Browser binary; auto-detected when absent
    pub chrome_path: Option<String>,

    /// Extra or overriding host extraction rules
    #[serde(rename = "host-rule")]
    pub host_rules: Vec<HostRuleEntry>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 10,
            min_content_length: 200,
            allowed_hosts: vec![
                "*.wanted.co.kr".to_string(),
                "*.saramin.co.kr".to_string(),
                "*.jobkorea.co.kr".to_string(),
            ],
            headless: true,
            settle_delay_ms: 3000,
            render_timeout_secs: 30,
            chrome_path: None,
            host_rules: Vec::new(),
        }
    }
}

/// A host substring mapped to CSS selectors
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct HostRuleEntry {
    /// Matched as a substring of the listing host
    pub host: String,

    /// Selector of the listing body
    pub body: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub company: Option<String>,
}

/// Structured extractor configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractorConfig {
    pub base_url: String,
    pub model: String,

    /// Environment variable that holds the API key
    pub api_key_env: String,

    /// Prepared input is truncated to this many characters
    pub max_input_chars: usize,

    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_input_chars: 200_000,
            timeout_secs: 60,
        }
    }
}

/// Catalog storage configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

/// A job source as written in the configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceEntry {
    pub id: String,
    pub company: String,
    pub platform: JobPlatform,
    pub list_url: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub listing_url_template: Option<String>,
}

fn default_active() -> bool {
    true
}

impl SourceEntry {
    pub fn to_source(&self) -> JobSource {
        JobSource {
            id: self.id.clone(),
            company: self.company.clone(),
            platform: self.platform,
            list_url: self.list_url.clone(),
            active: self.active,
            listing_url_template: self.listing_url_template.clone(),
        }
    }
}
