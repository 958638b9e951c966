//! Context builder for agent conversations
//!
//! This module provides the `ContextBuilder` for constructing the system
//! prompt and message list for LLM calls.

use chrono::Utc;

use crate::session::Turn;

/// Default system prompt for the research agent.
const DEFAULT_SYSTEM_PROMPT: &str = r#"# ROLE & OBJECTIVE
You are a Senior Research Analyst. Your goal is to provide unbiased, up-to-date intelligence by synthesizing official sources with public sentiment.

# WORKFLOW
1.  **Google Scan**: Use Google Search for a high-level overview and to find recent, authoritative sources.
2.  **Reddit Analysis**: Use Reddit search to find public opinions, questions, and sentiment.
3.  **Synthesize Report**: Structure your findings into the following sections:
    *   **Summary**: A concise overview of the most critical findings.
    *   **Key Facts**: 3-5 bullet points from authoritative sources.
    *   **Public Viewpoint**: 3-5 bullet points summarizing Reddit discussions.
    *   **Gaps**: Note any conflicting information or unanswered questions.

# CORE DIRECTIVE
Always use your tools; never use your internal knowledge. Ground all findings in retrieved data. If a search fails, try again differently before concluding."#;

/// Builder for constructing conversation context for LLM calls.
///
/// Produces the system turn (prompt plus a per-call date stamp) followed by
/// the conversation history and, optionally, a fresh user turn.
///
/// # Example
///
/// ```rust
/// use redpulse::agent::ContextBuilder;
///
/// let builder = ContextBuilder::new();
/// let turns = builder.build_messages(&[], "Hello!");
/// assert_eq!(turns.len(), 2); // system + user turn
/// ```
pub struct ContextBuilder {
    /// The system prompt to use
    system_prompt: String,
    /// Whether to append the current date to the system turn
    date_stamp: bool,
}

impl ContextBuilder {
    /// Create a new context builder with the default system prompt.
    pub fn new() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            date_stamp: true,
        }
    }

    /// Override the system prompt.
    ///
    /// # Example
    /// ```
    /// use redpulse::agent::ContextBuilder;
    ///
    /// let builder = ContextBuilder::new().with_system_prompt("Be terse.");
    /// let system = builder.build_system_turn();
    /// assert!(system.content.starts_with("Be terse."));
    /// ```
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Disable the date stamp (deterministic output for tests).
    pub fn without_date_stamp(mut self) -> Self {
        self.date_stamp = false;
        self
    }

    /// Build the system turn: the prompt, date-stamped so the model knows
    /// how stale its training data is relative to "now".
    pub fn build_system_turn(&self) -> Turn {
        if self.date_stamp {
            Turn::system(&format!(
                "{}\n\nToday's date is {}",
                self.system_prompt,
                Utc::now().to_rfc3339()
            ))
        } else {
            Turn::system(&self.system_prompt)
        }
    }

    /// Build the full message list for an LLM call: system turn, history,
    /// and (when non-empty) a fresh user turn.
    ///
    /// Follow-up calls within a tool loop pass an empty `user_input`; the
    /// latest user turn is already part of the history by then.
    pub fn build_messages(&self, history: &[Turn], user_input: &str) -> Vec<Turn> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(self.build_system_turn());
        messages.extend_from_slice(history);
        if !user_input.is_empty() {
            messages.push(Turn::user(user_input));
        }
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
