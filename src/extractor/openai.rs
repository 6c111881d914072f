//! Responses API client for job extraction

use crate::config::ExtractorConfig;
use crate::extractor::{
    prepare_input, with_hints, ExtractError, ExtractedJob, ExtractionHints, JobExtractor,
};
use crate::model::WorkType;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are extracting structured job data.

Rules:
- Jobs may be NON-SOFTWARE (cosmetics, sales, HR, marketing, design, manufacturing).
- NEVER default to software roles.
- NEVER return empty arrays for requiredSkills or accessibilityOptions.
- If skills are not listed, INFER them from responsibilities.
- If accessibility is not listed, INFER reasonable accommodations from work type.
- Prefer inference over UNKNOWN.
- If TITLE or COMPANY is explicitly provided above, USE IT EXACTLY.
- Only infer when missing.
- Do not return UNKNOWN if a reasonable value exists.";

/// Strict JSON schema the service must answer with
fn job_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["title", "company", "requiredSkills", "accessibilityOptions", "workType"],
        "properties": {
            "title": { "type": "string" },
            "company": { "type": "string" },
            "requiredSkills": {
                "type": "array",
                "minItems": 3,
                "items": { "type": "string" }
            },
            "accessibilityOptions": {
                "type": "array",
                "items": { "type": "string" }
            },
            "workType": {
                "type": "string",
                "enum": ["ONSITE", "REMOTE", "HYBRID", "UNKNOWN"]
            }
        }
    })
}

/// Wire shape of the structured answer
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobPayload {
    title: String,
    company: String,
    required_skills: Vec<String>,
    #[serde(default)]
    accessibility_options: Vec<String>,
    work_type: String,
}

impl From<JobPayload> for ExtractedJob {
    fn from(payload: JobPayload) -> Self {
        Self {
            title: payload.title,
            company: payload.company,
            required_skills: payload.required_skills,
            accessibility_options: payload.accessibility_options,
            work_type: WorkType::parse_lenient(&payload.work_type),
        }
    }
}

/// Extractor backed by the OpenAI Responses API
pub struct OpenAiExtractor {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    max_input_chars: usize,
}

impl OpenAiExtractor {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        max_input_chars: usize,
        timeout: Duration,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            max_input_chars,
        })
    }

    /// Builds the extractor, reading the API key from the configured variable
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExtractError::MissingApiKey(config.api_key_env.clone()))?;

        Self::new(
            &config.base_url,
            &config.model,
            &api_key,
            config.max_input_chars,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request_body(&self, input: &str) -> Value {
        json!({
            "model": self.model,
            "input": [
                {
                    "role": "system",
                    "content": [{ "type": "input_text", "text": SYSTEM_PROMPT }]
                },
                {
                    "role": "user",
                    "content": [{ "type": "input_text", "text": input }]
                }
            ],
            "text": {
                "format": {
                    "type": "json_schema",
                    "name": "job_schema",
                    "schema": job_schema(),
                    "strict": true
                }
            }
        })
    }

    async fn post(&self, body: &Value) -> Result<Value, ExtractError> {
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ExtractError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Finds the structured answer in a Responses API payload
///
/// Accepts an `output_json` part (already parsed) or an `output_text` part
/// holding JSON text, in the first output item that carries content.
fn extract_json(response: &Value) -> Result<Value, ExtractError> {
    let output = response
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractError::MalformedResponse("no output field".to_string()))?;

    let contents = output
        .iter()
        .find_map(|item| item.get("content").and_then(Value::as_array))
        .ok_or_else(|| ExtractError::MalformedResponse("no message content".to_string()))?;

    let part_of = |kind: &str| {
        contents
            .iter()
            .find(|part| part.get("type").and_then(Value::as_str) == Some(kind))
    };

    if let Some(part) = part_of("output_json") {
        return part
            .get("json")
            .cloned()
            .ok_or_else(|| ExtractError::MalformedResponse("output_json missing json".to_string()));
    }

    if let Some(part) = part_of("output_text") {
        let text = part
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::MalformedResponse("output_text missing text".to_string()))?;
        return serde_json::from_str(text)
            .map_err(|e| ExtractError::MalformedResponse(format!("output_text is not JSON: {e}")));
    }

    Err(ExtractError::MalformedResponse(
        "no output_json or output_text part".to_string(),
    ))
}

#[async_trait]
impl JobExtractor for OpenAiExtractor {
    async fn extract(&self, text: &str, hints: &ExtractionHints) -> Result<ExtractedJob, ExtractError> {
        let prepared = prepare_input(text, self.max_input_chars);
        if prepared.is_empty() {
            return Err(ExtractError::EmptyInput);
        }

        let input = with_hints(&prepared, hints);
        let response = self.post(&self.request_body(&input)).await?;
        let answer = extract_json(&response)?;

        let payload: JobPayload = serde_json::from_value(answer)
            .map_err(|e| ExtractError::MalformedResponse(e.to_string()))?;
        debug!(
            "Extracted '{}' with {} skills",
            payload.title,
            payload.required_skills.len()
        );
        Ok(payload.into())
    }
}
