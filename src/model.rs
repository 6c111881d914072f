//! Domain records shared by the pipeline stages
//!
//! `JobSource` is owned by the administrative side and only read here.
//! `Job` is the catalog record produced by the upsert engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Supported job boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPlatform {
    Wanted,
    Saramin,
    JobKorea,
}

impl JobPlatform {
    /// Template turning a listing identifier into a listing URL
    ///
    /// The identifier sits in the path because canonical URLs drop the query.
    pub fn default_listing_template(&self) -> &'static str {
        match self {
            Self::Wanted => "https://www.wanted.co.kr/wd/{id}",
            Self::Saramin => "https://www.saramin.co.kr/zf_user/jobs/relay/view/{id}",
            Self::JobKorea => "https://www.jobkorea.co.kr/Recruit/GI_Read/{id}",
        }
    }

    /// JSON pointer to the item array inside a listing API page
    pub fn items_pointer(&self) -> &'static str {
        match self {
            Self::Wanted => "/data",
            Self::Saramin => "/jobs/job",
            Self::JobKorea => "/data",
        }
    }

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Wanted => "wanted",
            Self::Saramin => "saramin",
            Self::JobKorea => "jobkorea",
        }
    }
}

/// A paginated listing endpoint on a job board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSource {
    pub id: String,
    /// Owning company name, used when nothing better is scraped or extracted
    pub company: String,
    pub platform: JobPlatform,
    pub list_url: String,
    pub active: bool,
    /// Overrides `JobPlatform::default_listing_template`
    pub listing_url_template: Option<String>,
}

impl JobSource {
    pub fn listing_template(&self) -> &str {
        self.listing_url_template
            .as_deref()
            .unwrap_or_else(|| self.platform.default_listing_template())
    }

    /// Builds the listing URL for an item identifier
    pub fn listing_url(&self, item_id: &str) -> String {
        self.listing_template().replace("{id}", item_id)
    }
}

/// Work arrangement of a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum WorkType {
    #[serde(rename = "ONSITE")]
    OnSite,
    #[serde(rename = "REMOTE")]
    Remote,
    #[serde(rename = "HYBRID")]
    Hybrid,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl WorkType {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::OnSite => "ONSITE",
            Self::Remote => "REMOTE",
            Self::Hybrid => "HYBRID",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Lenient parse; anything unrecognised is `Unknown`
    pub fn parse_lenient(s: &str) -> Self {
        let folded: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match folded.as_str() {
            "ONSITE" | "OFFICE" | "INOFFICE" => Self::OnSite,
            "REMOTE" | "WFH" => Self::Remote,
            "HYBRID" => Self::Hybrid,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id: i64,
    pub source_id: String,
    pub title: String,
    pub company: String,
    /// Canonical listing URL
    pub source_url: String,
    /// `hash(normalize(source_url))`, unique across the catalog
    pub source_hash: String,
    pub required_skills: BTreeSet<String>,
    pub accessibility_options: Vec<String>,
    pub work_type: WorkType,
    pub last_fetched_at: DateTime<Utc>,
    pub like_count: i64,
    pub view_count: i64,
}

impl Job {
    /// True if the record was fetched less than `window` before `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now - self.last_fetched_at < window
    }
}

/// The pipeline-owned fields of a record, as written by an upsert
///
/// Counters are absent on purpose: they belong to user-facing features and
/// are never overwritten by a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDraft {
    pub source_id: String,
    pub title: String,
    pub company: String,
    pub source_url: String,
    pub source_hash: String,
    pub required_skills: BTreeSet<String>,
    pub accessibility_options: Vec<String>,
    pub work_type: WorkType,
    pub last_fetched_at: DateTime<Utc>,
}
