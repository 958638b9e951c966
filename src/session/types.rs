//! Conversation types for RedPulse
//!
//! This module defines the core types for conversation state: turns, roles,
//! and tool calls. A conversation is an append-only sequence of turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An in-memory conversation: an ordered, append-only sequence of turns.
///
/// The conversation accumulates across queries within one interactive
/// session. During a run, `push` is the only mutator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered list of turns in this conversation
    pub turns: Vec<Turn>,
    /// When this conversation was started
    pub created_at: DateTime<Utc>,
    /// When this conversation was last appended to
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::Conversation;
    ///
    /// let conversation = Conversation::new();
    /// assert!(conversation.is_empty());
    /// ```
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn to this conversation.
    ///
    /// Also updates the `updated_at` timestamp.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::{Conversation, Turn};
    ///
    /// let mut conversation = Conversation::new();
    /// conversation.push(Turn::user("Hello!"));
    /// assert_eq!(conversation.len(), 1);
    /// ```
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        self.updated_at = Utc::now();
    }

    /// Get the number of turns in this conversation.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Check if this conversation is empty (no turns).
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Get the last turn in this conversation, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Get turns by role.
    pub fn turns_by_role(&self, role: Role) -> Vec<&Turn> {
        self.turns.iter().filter(|t| t.role == role).collect()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// A single turn in a conversation.
///
/// Turns can come from the user, the assistant, a system prompt, or a tool
/// result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// The role of the turn's author
    pub role: Role,
    /// The text content of the turn
    pub content: String,
    /// Tool calls requested by the assistant (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Name of the tool this turn is a result of (for tool-result turns)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Turn {
    /// Create a new user turn.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::{Role, Turn};
    ///
    /// let turn = Turn::user("What are people saying about rustls?");
    /// assert_eq!(turn.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tool_calls: None,
            tool_name: None,
        }
    }

    /// Create a new assistant turn.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::{Role, Turn};
    ///
    /// let turn = Turn::assistant("Here is what I found.");
    /// assert_eq!(turn.role, Role::Assistant);
    /// ```
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: None,
            tool_name: None,
        }
    }

    /// Create a new system turn.
    ///
    /// System turns carry prompts and instructions.
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            tool_calls: None,
            tool_name: None,
        }
    }

    /// Create a new tool-result turn.
    ///
    /// # Arguments
    /// * `tool_name` - The name of the tool that produced this result
    /// * `content` - The result content from the tool
    ///
    /// # Example
    /// ```
    /// use redpulse::session::{Role, Turn};
    ///
    /// let turn = Turn::tool_result("search_subreddits", "1. r/rust ...");
    /// assert_eq!(turn.role, Role::Tool);
    /// assert_eq!(turn.tool_name.as_deref(), Some("search_subreddits"));
    /// ```
    pub fn tool_result(tool_name: &str, content: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            tool_calls: None,
            tool_name: Some(tool_name.to_string()),
        }
    }

    /// Create an assistant turn with tool calls.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::{ToolCall, Turn};
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("google_search", json!({"query": "rust 1.80"}));
    /// let turn = Turn::assistant_with_tools("Let me look that up.", vec![call]);
    /// assert!(turn.has_tool_calls());
    /// ```
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: Some(tool_calls),
            tool_name: None,
        }
    }

    /// Check if this turn carries tool calls.
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|tc| !tc.is_empty())
            .unwrap_or(false)
    }

    /// Check if this is a tool-result turn.
    pub fn is_tool_result(&self) -> bool {
        self.role == Role::Tool && self.tool_name.is_some()
    }
}

/// The role of a turn's author in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompts and instructions
    System,
    /// Turns from the user
    User,
    /// Turns from the AI assistant
    Assistant,
    /// Results from tool executions
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool call requested by the assistant.
///
/// The name must resolve in the tool registry; the arguments are a JSON
/// object whose shape is tool-specific and not validated beyond presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to call
    pub name: String,
    /// JSON argument object for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use redpulse::session::ToolCall;
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("search_subreddits", json!({"query": "rust"}));
    /// assert_eq!(call.name, "search_subreddits");
    /// ```
    pub fn new(name: &str, arguments: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_conversation_new() {
        let conversation = Conversation::new();
        assert!(conversation.turns.is_empty());
        assert!(conversation.created_at <= conversation.updated_at);
    }

    #[test]
    fn test_conversation_push() {
        let mut conversation = Conversation::new();
        let initial_updated = conversation.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));

        conversation.push(Turn::user("Hello"));
        assert_eq!(conversation.len(), 1);
        assert!(conversation.updated_at >= initial_updated);
    }

    #[test]
    fn test_conversation_helpers() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());
        assert_eq!(conversation.len(), 0);
        assert!(conversation.last().is_none());

        conversation.push(Turn::user("Hello"));
        conversation.push(Turn::assistant("Hi!"));

        assert!(!conversation.is_empty());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap().role, Role::Assistant);
        assert_eq!(conversation.turns_by_role(Role::User).len(), 1);
    }

    #[test]
    fn test_turn_user() {
        let turn = Turn::user("Hello");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "Hello");
        assert!(turn.tool_calls.is_none());
        assert!(turn.tool_name.is_none());
    }

    #[test]
    fn test_turn_assistant() {
        let turn = Turn::assistant("Hi there");
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.content, "Hi there");
    }

    #[test]
    fn test_turn_system() {
        let turn = Turn::system("You are a research analyst");
        assert_eq!(turn.role, Role::System);
        assert_eq!(turn.content, "You are a research analyst");
    }

    #[test]
    fn test_turn_tool_result() {
        let turn = Turn::tool_result("google_search", "Results...");
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.content, "Results...");
        assert_eq!(turn.tool_name, Some("google_search".to_string()));
        assert!(turn.is_tool_result());
    }

    #[test]
    fn test_turn_with_tool_calls() {
        let call = ToolCall::new("search_subreddits", json!({"query": "test"}));
        let turn = Turn::assistant_with_tools("Searching...", vec![call]);

        assert!(turn.has_tool_calls());
        let calls = turn.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "search_subreddits");
    }

    #[test]
    fn test_turn_empty_tool_calls() {
        let turn = Turn::assistant_with_tools("Nothing to call", vec![]);
        assert!(!turn.has_tool_calls());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_role_serialize() {
        let user = Role::User;
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#""user""#);

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_tool_call_new() {
        let call = ToolCall::new("search_subreddits", json!({"query": "rust"}));
        assert_eq!(call.name, "search_subreddits");
        assert_eq!(call.arguments["query"], "rust");
    }

    #[test]
    fn test_conversation_serialization() {
        let mut conversation = Conversation::new();
        conversation.push(Turn::user("Hello"));
        conversation.push(Turn::assistant("Hi!"));

        let json = serde_json::to_string(&conversation).unwrap();
        let parsed: Conversation = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.turns.len(), 2);
        assert_eq!(parsed.turns[0].role, Role::User);
        assert_eq!(parsed.turns[1].role, Role::Assistant);
    }

    #[test]
    fn test_turn_serialization_skips_none() {
        let turn = Turn::user("Hello");
        let json = serde_json::to_string(&turn).unwrap();

        // tool_calls and tool_name should not be in JSON when None
        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_name"));
    }

    #[test]
    fn test_turn_roundtrip_with_tool_calls() {
        let call = ToolCall::new("current_date", json!({}));
        let turn = Turn::assistant_with_tools("", vec![call]);

        let json = serde_json::to_string(&turn).unwrap();
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, turn);
    }
}
