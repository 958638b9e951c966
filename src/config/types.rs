//! Configuration types for RedPulse.

use serde::{Deserialize, Serialize};

use crate::error::{PulseError, Result};

/// Environment variables that must be set for the agent to run.
pub const REQUIRED_ENV_VARS: &[&str] =
    &["GEMINI_API_KEY", "REDDIT_CLIENT_ID", "REDDIT_CLIENT_SECRET"];

/// Top-level configuration.
///
/// Loaded from an optional JSON file with environment overrides; every field
/// has a usable default so a missing config file is not an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent model settings
    pub agent: AgentConfig,
    /// Search tool settings
    pub search: SearchConfig,
    /// Run-log settings
    pub runlog: RunLogConfig,
    /// Diagnostic logging settings
    pub logging: LoggingConfig,
}

/// Model and loop settings for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model identifier for conversation calls
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens per completion
    pub max_tokens: u32,
    /// Nucleus sampling parameter (provider default when unset)
    pub top_p: Option<f32>,
    /// Upper bound on tool-call cycles within one run
    pub max_tool_iterations: usize,
    /// Override for the built-in system prompt
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.4,
            max_tokens: 8192,
            top_p: None,
            max_tool_iterations: 10,
            system_prompt: None,
        }
    }
}

/// Limits and model selection for the search tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Default result count for subreddit discovery
    pub subreddit_search_limit: usize,
    /// Default result count for subreddit content search
    pub content_search_limit: usize,
    /// Model used for grounded Google search requests
    pub grounding_model: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            subreddit_search_limit: 8,
            content_search_limit: 8,
            grounding_model: "gemini-2.0-flash".to_string(),
        }
    }
}

/// Run-log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLogConfig {
    /// Whether completed runs are appended to the run log
    pub enabled: bool,
    /// Log file path (defaults to `~/.redpulse/logs/runs.jsonl`)
    pub file: Option<String>,
}

impl Default for RunLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: None,
        }
    }
}

/// Diagnostic logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default level filter (overridden by RUST_LOG)
    pub level: String,
    /// Optional log file (stderr when unset, JSON format only)
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable text
    #[default]
    Pretty,
    /// Structured JSON lines for log aggregators
    Json,
}

/// API credentials, read once from the environment at startup.
///
/// Kept apart from [`Config`] so secrets never end up in the config file.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Gemini API key (conversation calls and grounded search)
    pub gemini_api_key: String,
    /// Reddit app client id
    pub reddit_client_id: String,
    /// Reddit app client secret
    pub reddit_client_secret: String,
}

impl Credentials {
    /// Read credentials from the environment, failing fast when any required
    /// variable is missing or blank.
    pub fn from_env() -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_ENV_VARS
            .iter()
            .filter(|var| {
                std::env::var(var)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(PulseError::Config(format!(
                "{} environment variable(s) not set",
                missing.join(", ")
            )));
        }

        Ok(Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            reddit_client_id: std::env::var("REDDIT_CLIENT_ID").unwrap_or_default(),
            reddit_client_secret: std::env::var("REDDIT_CLIENT_SECRET").unwrap_or_default(),
        })
    }
}
