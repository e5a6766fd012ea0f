use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::{Result, TrackerError};

// --- Provider trait ---

/// A web-search backend that answers a natural-language query with free text.
pub trait SearchProvider {
    fn search(&self, query: &str) -> Result<String>;
    /// Stored as the `source` of every row staged from this provider.
    fn source_label(&self) -> &str;
}

// --- Perplexity provider ---

const SYSTEM_PROMPT: &str = "You are a job search assistant. Search the web for current job postings \
and return ONLY a JSON array. Each element must be an object with the keys \
\"title\", \"company\", \"url\" and \"requirements\" (a short summary of required and preferred skills). \
Only include postings with a direct link. Do not add any text outside the JSON array.";

const TEMPERATURE: f32 = 0.1;
const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug)]
pub struct PerplexityProvider {
    api_key: String,
    model: String,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl PerplexityProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                TrackerError::SearchUnavailable(
                    "PERPLEXITY_API_KEY is not set. Add it to your environment or a .env file"
                        .to_string(),
                )
            })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                TrackerError::SearchUnavailable(format!("failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            client,
        })
    }

    fn request_for(&self, query: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: query.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

impl SearchProvider for PerplexityProvider {
    fn search(&self, query: &str) -> Result<String> {
        debug!(model = %self.model, endpoint = %self.endpoint, "sending search request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&self.request_for(query))
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    TrackerError::SearchUnavailable("search request timed out".to_string())
                } else {
                    TrackerError::SearchUnavailable(format!("failed to reach search API: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TrackerError::SearchUnavailable(describe_failure(
                status.as_u16(),
                &body,
            )));
        }

        let body = response.text().map_err(|e| {
            TrackerError::SearchUnavailable(format!("failed to read search response: {e}"))
        })?;
        extract_content(&body)
    }

    fn source_label(&self) -> &str {
        "perplexity"
    }
}

fn describe_failure(status: u16, body: &str) -> String {
    match status {
        401 | 403 => "search API rejected the credentials; check PERPLEXITY_API_KEY".to_string(),
        429 => "search API rate limit reached; try again later".to_string(),
        _ => format!("search API request failed with status {status}: {}", body.trim()),
    }
}

/// Pull the assistant text out of a chat-completions response body.
fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        TrackerError::SearchUnavailable(format!("failed to parse search API response: {e}"))
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| TrackerError::SearchUnavailable("no content in search API response".to_string()))
}
