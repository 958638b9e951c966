//! Tool types for RedPulse
//!
//! This module defines the `Tool` trait that all tools must implement.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Trait that all tools must implement.
///
/// Tools are executable functions the LLM can call to gather information,
/// like searching Reddit or running a grounded web search. Each tool takes
/// a tool-specific JSON argument object and returns text for the model.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use redpulse::tools::Tool;
/// use redpulse::error::Result;
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///     fn description(&self) -> &str { "Does something useful" }
///     fn parameters(&self) -> Value {
///         serde_json::json!({
///             "type": "object",
///             "properties": {},
///             "required": []
///         })
///     }
///     async fn execute(&self, _args: Value) -> Result<String> {
///         Ok("Done!".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    ///
    /// This name identifies the tool when the LLM requests it. It must be
    /// unique within a registry.
    fn name(&self) -> &str;

    /// Get the tool description.
    ///
    /// Sent to the LLM to help it understand when and how to use the tool.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// # Arguments
    /// * `args` - The JSON argument object passed by the LLM
    ///
    /// # Returns
    /// Formatted text for the model, or an error. Errors from the underlying
    /// external call (network, auth, rate limit) surface as
    /// [`crate::error::PulseError::Tool`]; a single best-effort attempt is
    /// made, with no retries.
    async fn execute(&self, args: Value) -> Result<String>;
}
