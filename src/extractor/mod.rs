//! Structured extraction of job attributes from listing text
//!
//! The extraction itself is delegated to an external language model service;
//! this module prepares its input, calls it, and validates the response.

mod input;
mod openai;

pub use input::{prepare_input, with_hints};
pub use openai::OpenAiExtractor;

use crate::model::WorkType;
use async_trait::async_trait;
use thiserror::Error;

/// Message shown to users when the service rejects an input
pub const RATE_LIMITED_MESSAGE: &str =
    "Input is too large for processing. Please submit a shorter listing.";

/// Errors raised by the structured extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Extractor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{}", RATE_LIMITED_MESSAGE)]
    RateLimited,

    #[error("Extractor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed extractor response: {0}")]
    MalformedResponse(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("Nothing to extract from")]
    EmptyInput,
}

impl ExtractError {
    /// True for conditions an end user can act on
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Directly scraped metadata passed along as explicit hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionHints {
    pub title: Option<String>,
    pub company: Option<String>,
}

/// Attributes returned by the extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedJob {
    pub title: String,
    pub company: String,
    pub required_skills: Vec<String>,
    pub accessibility_options: Vec<String>,
    pub work_type: WorkType,
}

/// Turns raw listing text into structured attributes
#[async_trait]
pub trait JobExtractor: Send + Sync {
    async fn extract(&self, text: &str, hints: &ExtractionHints) -> Result<ExtractedJob, ExtractError>;
}
