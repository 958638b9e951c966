//! Providers module - LLM backends
//!
//! This module defines the `LlmProvider` trait and common types for
//! interacting with LLM APIs. The production backend is Gemini; tests supply
//! scripted providers through the same trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use redpulse::providers::{ChatOptions, GeminiProvider, LlmProvider};
//! use redpulse::session::Turn;
//!
//! async fn example() {
//!     let provider = GeminiProvider::new("your-api-key");
//!     let turns = vec![Turn::user("Hello!")];
//!     let options = ChatOptions::new().with_max_tokens(1000);
//!
//!     let response = provider.chat(turns, vec![], None, options).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod gemini;
mod types;

use crate::error::ProviderError;

pub use gemini::GeminiProvider;
pub use types::{ChatOptions, LlmProvider, LlmResponse, LlmToolCall, ToolDefinition, Usage};

/// Parse an HTTP status code and response body into a structured [`ProviderError`].
///
/// This centralizes the mapping from HTTP status codes to error
/// classifications so every HTTP-speaking component produces consistent
/// typed errors.
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    match status {
        401 | 403 => ProviderError::Auth(body.to_string()),
        402 => ProviderError::Billing(body.to_string()),
        404 => ProviderError::ModelNotFound(body.to_string()),
        429 => ProviderError::RateLimit(body.to_string()),
        400 => ProviderError::InvalidRequest(body.to_string()),
        500..=599 => ProviderError::ServerError(body.to_string()),
        _ => ProviderError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
