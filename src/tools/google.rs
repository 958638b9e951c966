//! Google-grounded search tool.
//!
//! Issues a Gemini `generateContent` request with the `google_search`
//! grounding tool enabled and returns the grounded answer text. This is a
//! search tool, not a chat call: it runs outside the agent's conversation
//! and its failures surface as tool errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{PulseError, Result};

use super::Tool;

const GROUNDING_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Model used for grounded search requests.
const DEFAULT_GROUNDING_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Deserialize)]
struct GroundingResponse {
    #[serde(default)]
    candidates: Vec<GroundingCandidate>,
}

#[derive(Debug, Deserialize)]
struct GroundingCandidate {
    content: Option<GroundingContent>,
}

#[derive(Debug, Deserialize)]
struct GroundingContent {
    #[serde(default)]
    parts: Vec<GroundingPart>,
}

#[derive(Debug, Deserialize)]
struct GroundingPart {
    #[serde(default)]
    text: Option<String>,
}

/// Collect the text parts of the first candidate.
fn extract_text(response: GroundingResponse) -> String {
    let Some(candidate) = response.candidates.into_iter().next() else {
        return String::new();
    };
    let Some(content) = candidate.content else {
        return String::new();
    };

    content
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Grounded web search backed by Gemini's `google_search` tool.
pub struct GoogleSearchTool {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
}

impl GoogleSearchTool {
    /// Create a new grounded search tool with the default model.
    pub fn new(api_key: &str) -> Self {
        Self::with_model(api_key, DEFAULT_GROUNDING_MODEL)
    }

    /// Create a grounded search tool with a specific model.
    pub fn with_model(api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key: api_key.to_string(),
            api_base: GROUNDING_API_URL.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn name(&self) -> &str {
        "google_search"
    }

    fn description(&self) -> &str {
        "Search for current information using Google's grounded search. \
         Use this for latest news, real-time data, recent developments, and \
         current facts that may not be in your training data."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (be specific and focused)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PulseError::Tool("Missing 'query' parameter".to_string()))?;

        let request = json!({
            "contents": [{
                "role": "user",
                "parts": [{
                    "text": format!(
                        "Search for and provide current information about: {}",
                        query
                    )
                }]
            }],
            "tools": [{ "google_search": {} }]
        });

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.model
        );
        debug!(model = %self.model, "Sending grounded search request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PulseError::Tool(format!("Grounded search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PulseError::Tool(format!(
                "Grounded search error: {} ({})",
                status,
                detail.trim()
            )));
        }

        let payload: GroundingResponse = response
            .json()
            .await
            .map_err(|e| PulseError::Tool(format!("Failed to parse search response: {}", e)))?;

        let text = extract_text(payload);
        if text.is_empty() {
            return Ok("No results found from grounded search.".to_string());
        }

        Ok(format!("Current information (via Google Search):\n{}", text))
    }
}
