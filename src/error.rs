//! Error types for RedPulse
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Provider Error Classification
// ============================================================================

/// Structured provider error classification.
///
/// Categorizes LLM provider HTTP errors by status code so that failures can
/// be reported precisely (auth vs rate limit vs server trouble) without
/// string matching on response bodies.
#[derive(Debug)]
pub enum ProviderError {
    /// 401/403 — Invalid API key or authentication failure
    Auth(String),
    /// 429 — Rate limit or quota exceeded
    RateLimit(String),
    /// 402 — Payment required or billing issue
    Billing(String),
    /// 500/502/503/504 — Server-side errors
    ServerError(String),
    /// 400 — Bad request, invalid JSON, malformed parameters
    InvalidRequest(String),
    /// 404 — Model not found or endpoint not available
    ModelNotFound(String),
    /// Connection or read timeout
    Timeout(String),
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            ProviderError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            ProviderError::Billing(msg) => write!(f, "Billing error: {}", msg),
            ProviderError::ServerError(msg) => write!(f, "Server error: {}", msg),
            ProviderError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ProviderError::ModelNotFound(msg) => write!(f, "Model not found: {}", msg),
            ProviderError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            ProviderError::Unknown(msg) => write!(f, "Unknown provider error: {}", msg),
        }
    }
}

impl ProviderError {
    /// Returns the HTTP status code associated with this error, if applicable.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Auth(_) => Some(401),
            ProviderError::RateLimit(_) => Some(429),
            ProviderError::Billing(_) => Some(402),
            ProviderError::ServerError(_) => Some(500),
            ProviderError::InvalidRequest(_) => Some(400),
            ProviderError::ModelNotFound(_) => Some(404),
            ProviderError::Timeout(_) => None,
            ProviderError::Unknown(_) => None,
        }
    }
}

impl From<ProviderError> for PulseError {
    fn from(err: ProviderError) -> Self {
        PulseError::ProviderTyped(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for RedPulse operations.
#[derive(Error, Debug)]
pub enum PulseError {
    /// Configuration-related errors (missing credentials, invalid config).
    /// Fatal at startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model requested a tool name that is not in the registry.
    /// Aborts the run; never silently ignored.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool execution errors (network failure, auth failure, rate limit from
    /// the external API). Surfaced as text back to the model; not retried.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Provider errors without classification (missing candidates, bad
    /// payloads). New code should prefer `ProviderTyped` for HTTP failures.
    #[error("Provider error: {0}")]
    Provider(String),

    /// Structured provider error classified by HTTP status.
    #[error("Provider error: {0}")]
    ProviderTyped(ProviderError),

    /// Run-log write failures. Reported, never fatal to answer delivery.
    #[error("Run log error: {0}")]
    Log(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// A specialized `Result` type for RedPulse operations.
pub type Result<T> = std::result::Result<T, PulseError>;
