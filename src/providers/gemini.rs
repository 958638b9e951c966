//! Gemini Provider Implementation
//!
//! This module implements the `LlmProvider` trait for Google's Gemini
//! `generateContent` REST API, handling turn conversion, function calling,
//! and usage metadata.
//!
//! # Example
//!
//! ```rust,ignore
//! use redpulse::providers::{gemini::GeminiProvider, ChatOptions, LlmProvider};
//! use redpulse::session::Turn;
//!
//! async fn example() {
//!     let provider = GeminiProvider::new("your-api-key");
//!
//!     let turns = vec![
//!         Turn::system("You are a research analyst."),
//!         Turn::user("Hello!"),
//!     ];
//!
//!     let response = provider
//!         .chat(turns, vec![], None, ChatOptions::default())
//!         .await
//!         .unwrap();
//!
//!     println!("Gemini: {}", response.content);
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::error::{ProviderError, PulseError, Result};
use crate::session::{Role, Turn};

use super::{parse_provider_error, ChatOptions, LlmProvider, LlmResponse, LlmToolCall, ToolDefinition, Usage};

/// The Gemini API endpoint URL.
const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default Gemini model to use.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Per-request timeout for Gemini calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Gemini API Wire Types
// ============================================================================

/// Gemini API request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    /// Conversation contents (user/model turns)
    contents: Vec<GeminiContent>,
    /// System prompt, separated from the conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiSystemInstruction>,
    /// Available function declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiToolDecl>>,
    /// Sampling configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

/// System instruction wrapper (parts only, no role).
#[derive(Debug, Serialize)]
struct GeminiSystemInstruction {
    parts: Vec<GeminiPart>,
}

/// A content entry: a role plus its parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    /// "user" or "model"
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// A single part of a content entry.
///
/// The API mixes text, function calls, and function responses in one parts
/// array; untagged deserialization picks the matching shape. The `Other`
/// variant absorbs part kinds this client does not consume (e.g. inline
/// data) instead of failing the whole response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
    Other(serde_json::Value),
}

/// A function call emitted by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    /// The Gemini API uses an 'args' object for function arguments
    #[serde(default)]
    args: serde_json::Value,
}

/// A function result fed back to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

/// Tool declaration wrapper.
#[derive(Debug, Serialize)]
struct GeminiToolDecl {
    /// The Gemini API expects 'functionDeclarations' (camelCase)
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<GeminiFunctionDecl>,
}

/// A single function declaration.
#[derive(Debug, Serialize)]
struct GeminiFunctionDecl {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// Sampling configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Gemini API response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

/// A response candidate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

/// Token accounting reported by the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

// ============================================================================
// Provider
// ============================================================================

/// LLM provider backed by the Gemini `generateContent` API.
pub struct GeminiProvider {
    api_key: String,
    api_base: String,
    model: String,
    client: Client,
}

impl GeminiProvider {
    /// Create a new Gemini provider with the default model.
    pub fn new(api_key: &str) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL)
    }

    /// Create a new Gemini provider with a specific model.
    pub fn with_model(api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: api_key.to_string(),
            api_base: GEMINI_API_URL.to_string(),
            model: model.to_string(),
            client,
        }
    }

    /// Override the API base URL (for tests or proxies).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Split the turn list into a system instruction and user/model contents.
    ///
    /// System turns are concatenated into the `systemInstruction` field;
    /// tool-result turns become `functionResponse` parts with user role, as
    /// the API requires.
    fn build_contents(turns: &[Turn]) -> (Option<GeminiSystemInstruction>, Vec<GeminiContent>) {
        let mut system_texts: Vec<String> = Vec::new();
        let mut contents: Vec<GeminiContent> = Vec::new();

        for turn in turns {
            match turn.role {
                Role::System => system_texts.push(turn.content.clone()),
                Role::User => contents.push(GeminiContent {
                    role: "user".to_string(),
                    parts: vec![GeminiPart::Text {
                        text: turn.content.clone(),
                    }],
                }),
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !turn.content.is_empty() {
                        parts.push(GeminiPart::Text {
                            text: turn.content.clone(),
                        });
                    }
                    for call in turn.tool_calls.iter().flatten() {
                        parts.push(GeminiPart::FunctionCall {
                            function_call: GeminiFunctionCall {
                                name: call.name.clone(),
                                args: call.arguments.clone(),
                            },
                        });
                    }
                    if parts.is_empty() {
                        parts.push(GeminiPart::Text {
                            text: String::new(),
                        });
                    }
                    contents.push(GeminiContent {
                        role: "model".to_string(),
                        parts,
                    });
                }
                Role::Tool => {
                    let name = turn.tool_name.clone().unwrap_or_default();
                    contents.push(GeminiContent {
                        role: "user".to_string(),
                        parts: vec![GeminiPart::FunctionResponse {
                            function_response: GeminiFunctionResponse {
                                name,
                                response: json!({ "result": turn.content }),
                            },
                        }],
                    });
                }
            }
        }

        let system_instruction = if system_texts.is_empty() {
            None
        } else {
            Some(GeminiSystemInstruction {
                parts: vec![GeminiPart::Text {
                    text: system_texts.join("\n\n"),
                }],
            })
        };

        (system_instruction, contents)
    }

    /// Convert a parsed API response into an `LlmResponse`.
    fn parse_response(response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| PulseError::Provider("No candidates in Gemini response".to_string()))?;

        let mut texts: Vec<String> = Vec::new();
        let mut tool_calls: Vec<LlmToolCall> = Vec::new();

        if let Some(content) = candidate.content {
            for part in content.parts {
                match part {
                    GeminiPart::Text { text } => texts.push(text),
                    GeminiPart::FunctionCall { function_call } => {
                        tool_calls.push(LlmToolCall::new(&function_call.name, function_call.args));
                    }
                    GeminiPart::FunctionResponse { .. } | GeminiPart::Other(_) => {}
                }
            }
        }

        let mut result = LlmResponse::with_tools(&texts.join("\n"), tool_calls);
        if let Some(usage) = response.usage_metadata {
            result = result.with_usage(Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            });
        }

        Ok(result)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn chat(
        &self,
        turns: Vec<Turn>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LlmResponse> {
        let model = model.unwrap_or(&self.model);
        let (system_instruction, contents) = Self::build_contents(&turns);

        let tool_decls = if tools.is_empty() {
            None
        } else {
            Some(vec![GeminiToolDecl {
                function_declarations: tools
                    .into_iter()
                    .map(|t| GeminiFunctionDecl {
                        name: t.name,
                        description: t.description,
                        parameters: t.parameters,
                    })
                    .collect(),
            }])
        };

        let request = GeminiRequest {
            contents,
            system_instruction,
            tools: tool_decls,
            generation_config: Some(GeminiGenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            }),
        };

        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        debug!(model = model, "Sending Gemini chat request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PulseError::from(ProviderError::Timeout(e.to_string()))
                } else {
                    PulseError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_provider_error(status.as_u16(), &body).into());
        }

        let payload: GeminiResponse = response.json().await?;
        let result = Self::parse_response(payload)?;
        debug!(
            tool_calls = result.tool_calls.len(),
            content_len = result.content.len(),
            "Gemini chat response parsed"
        );

        Ok(result)
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ToolCall;

    #[test]
    fn test_provider_properties() {
        let provider = GeminiProvider::new("test-key");
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), "gemini-2.5-flash");
    }

    #[test]
    fn test_provider_with_model() {
        let provider = GeminiProvider::with_model("test-key", "gemini-2.0-flash");
        assert_eq!(provider.default_model(), "gemini-2.0-flash");
    }

    #[test]
    fn test_with_api_base_trims_trailing_slash() {
        let provider = GeminiProvider::new("k").with_api_base("http://localhost:8080/");
        assert_eq!(provider.api_base, "http://localhost:8080");
    }

    #[test]
    fn test_build_contents_system_split() {
        let turns = vec![
            Turn::system("You are a research analyst."),
            Turn::system("Today's date is 2026-01-01T00:00:00Z"),
            Turn::user("Hello"),
        ];
        let (system, contents) = GeminiProvider::build_contents(&turns);

        let system = system.unwrap();
        match &system.parts[0] {
            GeminiPart::Text { text } => {
                assert!(text.contains("research analyst"));
                assert!(text.contains("Today's date"));
            }
            other => panic!("expected Text part, got {:?}", other),
        }

        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
    }

    #[test]
    fn test_build_contents_assistant_tool_calls() {
        let call = ToolCall::new("search_subreddits", json!({"query": "rust"}));
        let turns = vec![
            Turn::user("Find rust subreddits"),
            Turn::assistant_with_tools("", vec![call]),
            Turn::tool_result("search_subreddits", "1. r/rust"),
        ];
        let (_, contents) = GeminiProvider::build_contents(&turns);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1].role, "model");
        match &contents[1].parts[0] {
            GeminiPart::FunctionCall { function_call } => {
                assert_eq!(function_call.name, "search_subreddits");
                assert_eq!(function_call.args["query"], "rust");
            }
            other => panic!("expected FunctionCall part, got {:?}", other),
        }

        assert_eq!(contents[2].role, "user");
        match &contents[2].parts[0] {
            GeminiPart::FunctionResponse { function_response } => {
                assert_eq!(function_response.name, "search_subreddits");
                assert_eq!(function_response.response["result"], "1. r/rust");
            }
            other => panic!("expected FunctionResponse part, got {:?}", other),
        }
    }

    #[test]
    fn test_build_contents_no_system() {
        let turns = vec![Turn::user("Hello")];
        let (system, contents) = GeminiProvider::build_contents(&turns);
        assert!(system.is_none());
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn test_parse_response_text() {
        let payload: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{"text": "Hello from Gemini"}]
                    },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 12,
                    "candidatesTokenCount": 5,
                    "totalTokenCount": 17
                }
            }"#,
        )
        .unwrap();

        let response = GeminiProvider::parse_response(payload).unwrap();
        assert_eq!(response.content, "Hello from Gemini");
        assert!(!response.has_tool_calls());
        let usage = response.usage.unwrap();
        assert_eq!(usage.prompt_tokens, 12);
        assert_eq!(usage.completion_tokens, 5);
        assert_eq!(usage.total_tokens, 17);
    }

    #[test]
    fn test_parse_response_function_call() {
        let payload: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"text": "Let me search."},
                            {"functionCall": {"name": "google_search", "args": {"query": "rust 1.80"}}}
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        let response = GeminiProvider::parse_response(payload).unwrap();
        assert_eq!(response.content, "Let me search.");
        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "google_search");
        assert_eq!(response.tool_calls[0].arguments["query"], "rust 1.80");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_parse_response_no_candidates() {
        let payload: GeminiResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let err = GeminiProvider::parse_response(payload).unwrap_err();
        assert!(matches!(err, PulseError::Provider(_)));
    }

    #[test]
    fn test_parse_response_unknown_part_kind() {
        // Unknown part shapes must not fail the whole response.
        let payload: GeminiResponse = serde_json::from_str(
            r#"{
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [
                            {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
                            {"text": "caption"}
                        ]
                    }
                }]
            }"#,
        )
        .unwrap();

        let response = GeminiProvider::parse_response(payload).unwrap();
        assert_eq!(response.content, "caption");
    }

    #[test]
    fn test_request_serialization_camel_case() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart::Text {
                    text: "hi".to_string(),
                }],
            }],
            system_instruction: Some(GeminiSystemInstruction {
                parts: vec![GeminiPart::Text {
                    text: "be brief".to_string(),
                }],
            }),
            tools: Some(vec![GeminiToolDecl {
                function_declarations: vec![GeminiFunctionDecl {
                    name: "current_date".to_string(),
                    description: "Current date".to_string(),
                    parameters: json!({"type": "object", "properties": {}}),
                }],
            }]),
            generation_config: Some(GeminiGenerationConfig {
                temperature: Some(0.4),
                top_p: None,
                max_output_tokens: Some(1024),
            }),
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"functionDeclarations\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":1024"));
        assert!(!json.contains("topP"));
    }
}
