//! Configuration management for RedPulse
//!
//! Configuration is loaded from `~/.redpulse/config.json` (optional) with
//! environment variable overrides, and passed explicitly into the components
//! that need it. Credentials are read separately from the environment and
//! never written to the config file.

mod types;

pub use types::*;

use std::path::{Path, PathBuf};

use crate::error::Result;

impl Config {
    /// Returns the RedPulse configuration directory path (~/.redpulse)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".redpulse")
    }

    /// Returns the path to the config file (~/.redpulse/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables override config values using the pattern
    /// `REDPULSE_SECTION_KEY`.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("REDPULSE_AGENT_MODEL") {
            self.agent.model = val;
        }
        if let Ok(val) = std::env::var("REDPULSE_AGENT_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                self.agent.temperature = v;
            }
        }
        if let Ok(val) = std::env::var("REDPULSE_AGENT_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                self.agent.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("REDPULSE_AGENT_MAX_TOOL_ITERATIONS") {
            if let Ok(v) = val.parse() {
                self.agent.max_tool_iterations = v;
            }
        }

        if let Ok(val) = std::env::var("REDPULSE_SEARCH_SUBREDDIT_LIMIT") {
            if let Ok(v) = val.parse() {
                self.search.subreddit_search_limit = v;
            }
        }
        if let Ok(val) = std::env::var("REDPULSE_SEARCH_CONTENT_LIMIT") {
            if let Ok(v) = val.parse() {
                self.search.content_search_limit = v;
            }
        }

        if let Ok(val) = std::env::var("REDPULSE_RUNLOG_PATH") {
            self.runlog.file = Some(val);
        }
        if let Ok(val) = std::env::var("REDPULSE_RUNLOG_ENABLED") {
            if let Ok(v) = val.parse() {
                self.runlog.enabled = v;
            }
        }

        if let Ok(val) = std::env::var("REDPULSE_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the resolved run-log file path (~ expanded).
    pub fn runlog_path(&self) -> PathBuf {
        match &self.runlog.file {
            Some(file) => expand_home(file),
            None => Self::dir().join("logs").join("runs.jsonl"),
        }
    }
}

/// Expand ~ to home directory in a path string
fn expand_home(path: &str) -> PathBuf {
    if path.is_empty() {
        return PathBuf::from(path);
    }

    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            if path.len() > 1 && path.chars().nth(1) == Some('/') {
                return home.join(&path[2..]);
            }
            return home;
        }
    }

    PathBuf::from(path)
}
