//! Tools module - Tool definitions and execution for LLM function calling
//!
//! This module provides the infrastructure for defining and invoking tools
//! that the LLM can call during a run, plus the concrete search tools the
//! agent ships with.
//!
//! # Overview
//!
//! - `Tool` trait: The interface that all tools must implement
//! - `ToolRegistry`: Central registry mapping tool names to implementations
//!
//! # Built-in Tools
//!
//! - `SearchSubredditsTool`: Find subreddits matching a query
//! - `SearchSubredditContentTool`: Search posts and comments in a subreddit
//! - `GoogleSearchTool`: Google-grounded search via Gemini
//! - `CurrentDateTool`: Current UTC date and time
//! - `EchoTool`: Simple echo tool for testing
//!
//! # Example
//!
//! ```rust
//! use redpulse::tools::{EchoTool, Tool, ToolRegistry};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let mut registry = ToolRegistry::new();
//! registry.register(Box::new(EchoTool));
//!
//! let result = registry.invoke("echo", json!({"message": "Hello!"})).await;
//! assert_eq!(result.unwrap(), "Hello!");
//!
//! // Get tool definitions for the LLM
//! let definitions = registry.definitions();
//! assert_eq!(definitions.len(), 1);
//! # });
//! ```

pub mod datetime;
pub mod google;
pub mod reddit;
mod registry;
mod types;

pub use datetime::CurrentDateTool;
pub use google::GoogleSearchTool;
pub use reddit::{RedditClient, SearchSubredditContentTool, SearchSubredditsTool};
pub use registry::ToolRegistry;
pub use types::Tool;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A simple echo tool for testing purposes.
///
/// This tool echoes back any message provided to it. Useful for testing the
/// tool infrastructure without touching the network.
///
/// # Example
///
/// ```rust
/// use redpulse::tools::{EchoTool, Tool};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let tool = EchoTool;
/// let result = tool.execute(json!({"message": "Hello"})).await;
/// assert_eq!(result.unwrap(), "Hello");
/// # });
/// ```
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(no message)");
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.description(), "Echoes back the provided message");

        let result = tool.execute(json!({"message": "test"})).await.unwrap();
        assert_eq!(result, "test");
    }

    #[tokio::test]
    async fn test_echo_tool_no_message() {
        let tool = EchoTool;
        let result = tool.execute(json!({})).await.unwrap();
        assert_eq!(result, "(no message)");
    }

    #[test]
    fn test_echo_tool_parameters() {
        let tool = EchoTool;
        let params = tool.parameters();
        assert_eq!(params["type"], "object");
        assert!(params["properties"]["message"].is_object());
    }
}
