//! Tool registry for RedPulse
//!
//! This module provides the `ToolRegistry` struct for managing and invoking
//! tools. Tools can be registered, looked up by name, and executed.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;
use tracing::{error, info};

use crate::error::{PulseError, Result};
use crate::providers::ToolDefinition;

use super::Tool;

/// A registry that holds and manages tools.
///
/// The registry maps tool names to implementations, projects registered
/// tools into provider-facing definitions, and invokes tools with logging
/// around each execution.
///
/// # Example
///
/// ```rust
/// use redpulse::tools::{EchoTool, ToolRegistry};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool));
///
/// assert!(registry.has("echo"));
///
/// let result = registry.invoke("echo", json!({"message": "hello"})).await;
/// assert_eq!(result.unwrap(), "hello");
/// # });
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    ///
    /// # Example
    /// ```
    /// use redpulse::tools::ToolRegistry;
    ///
    /// let registry = ToolRegistry::new();
    /// assert!(registry.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool in the registry.
    ///
    /// If a tool with the same name already exists, it is replaced.
    ///
    /// # Example
    /// ```
    /// use redpulse::tools::{EchoTool, ToolRegistry};
    ///
    /// let mut registry = ToolRegistry::new();
    /// registry.register(Box::new(EchoTool));
    /// assert!(registry.has("echo"));
    /// ```
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        info!(tool = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    ///
    /// # Returns
    /// A reference to the tool if found, or `None` if not found.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Invoke a tool by name.
    ///
    /// An unregistered name is a hard failure: the caller receives
    /// [`PulseError::UnknownTool`], never a silent no-op. A registered tool
    /// that fails surfaces whatever error the underlying call raised.
    ///
    /// # Example
    /// ```
    /// use redpulse::error::PulseError;
    /// use redpulse::tools::ToolRegistry;
    /// use serde_json::json;
    ///
    /// # tokio_test::block_on(async {
    /// let registry = ToolRegistry::new();
    /// let err = registry.invoke("nonexistent", json!({})).await.unwrap_err();
    /// assert!(matches!(err, PulseError::UnknownTool(_)));
    /// # });
    /// ```
    pub async fn invoke(&self, name: &str, args: Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| PulseError::UnknownTool(name.to_string()))?;

        let start = Instant::now();

        match tool.execute(args).await {
            Ok(output) => {
                info!(
                    tool = name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool executed successfully"
                );
                Ok(output)
            }
            Err(e) => {
                error!(
                    tool = name,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool execution failed"
                );
                Err(e)
            }
        }
    }

    /// Get all tool definitions for use with LLM providers.
    ///
    /// # Example
    /// ```
    /// use redpulse::tools::{EchoTool, ToolRegistry};
    ///
    /// let mut registry = ToolRegistry::new();
    /// registry.register(Box::new(EchoTool));
    ///
    /// let definitions = registry.definitions();
    /// assert_eq!(definitions.len(), 1);
    /// assert_eq!(definitions[0].name, "echo");
    /// ```
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Get the names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a tool exists in the registry.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
