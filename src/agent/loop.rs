//! Agent loop implementation
//!
//! This module provides the core agent loop that takes a user query, calls
//! the LLM provider, executes requested tools, and records each completed
//! run in the run log.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{PulseError, Result};
use crate::providers::{ChatOptions, LlmProvider, Usage};
use crate::runlog::{RunLog, RunLogger, ToolCallRecord};
use crate::session::{Conversation, ToolCall, Turn};
use crate::tools::ToolRegistry;

use super::context::ContextBuilder;

/// The agent: one query in, one synthesized answer out.
///
/// The `Agent` is responsible for:
/// - Building conversation context (system prompt + history)
/// - Calling the LLM provider for responses
/// - Executing tool calls and feeding results back to the LLM
/// - Appending one run-log record per completed run
///
/// The run cycles AWAITING_MODEL -> EXECUTING_TOOL -> AWAITING_MODEL until
/// the model answers without tool calls, bounded by
/// `agent.max_tool_iterations`.
///
/// # Example
///
/// ```rust,ignore
/// use redpulse::agent::Agent;
/// use redpulse::config::Config;
/// use redpulse::providers::GeminiProvider;
/// use redpulse::tools::{CurrentDateTool, ToolRegistry};
///
/// let config = Config::default();
/// let provider = Box::new(GeminiProvider::new("api-key"));
/// let mut tools = ToolRegistry::new();
/// tools.register(Box::new(CurrentDateTool));
///
/// let mut agent = Agent::new(config, provider, tools);
/// let answer = agent.run("What day is it?").await?;
/// ```
pub struct Agent {
    /// Agent configuration
    config: Config,
    /// The LLM provider to use
    provider: Box<dyn LlmProvider>,
    /// Registered tools
    tools: ToolRegistry,
    /// Context builder for constructing LLM messages
    context_builder: ContextBuilder,
    /// Conversation memory, shared across runs within a session
    conversation: Conversation,
    /// Run-log sink; `None` disables run logging
    run_logger: Option<RunLogger>,
}

impl Agent {
    /// Create a new agent.
    ///
    /// A `system_prompt` in the config overrides the built-in prompt. Run
    /// logging is off until [`Agent::with_run_logger`] attaches a sink.
    pub fn new(config: Config, provider: Box<dyn LlmProvider>, tools: ToolRegistry) -> Self {
        let context_builder = match config.agent.system_prompt.as_deref() {
            Some(prompt) => ContextBuilder::new().with_system_prompt(prompt),
            None => ContextBuilder::new(),
        };

        Self {
            config,
            provider,
            tools,
            context_builder,
            conversation: Conversation::new(),
            run_logger: None,
        }
    }

    /// Attach a run logger.
    pub fn with_run_logger(mut self, logger: RunLogger) -> Self {
        self.run_logger = Some(logger);
        self
    }

    /// Replace the context builder (custom prompt handling in tests).
    pub fn with_context_builder(mut self, context_builder: ContextBuilder) -> Self {
        self.context_builder = context_builder;
        self
    }

    /// Get the conversation accumulated so far.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Get the number of registered tools.
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Check if a tool is registered.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.has(name)
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process one user query to completion.
    ///
    /// Runs the model/tool cycle until the model produces a final answer (or
    /// the iteration cap is reached), then appends exactly one run-log
    /// record covering the whole run, in success and error paths alike.
    ///
    /// # Errors
    /// - [`PulseError::UnknownTool`] when the model requests an unregistered
    ///   tool; the run aborts and the failure is surfaced to the caller.
    /// - Provider errors abort the run.
    ///
    /// Tool execution failures do NOT abort the run: the error text is fed
    /// back to the model as the tool result so it can recover or apologize.
    pub async fn run(&mut self, query: &str) -> Result<String> {
        let started_at = Utc::now();
        let timer = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        let run_start = self.conversation.len();
        let mut tool_records: Vec<ToolCallRecord> = Vec::new();
        let mut total_tokens: Option<u32> = None;

        info!(run_id = %run_id, "Processing query");
        let outcome = self
            .drive(query, &mut tool_records, &mut total_tokens)
            .await;

        let latency_ms = timer.elapsed().as_millis() as u64;
        match &outcome {
            Ok(answer) => info!(
                run_id = %run_id,
                latency_ms = latency_ms,
                tool_calls = tool_records.len(),
                answer_len = answer.len(),
                "Run completed"
            ),
            Err(e) => error!(run_id = %run_id, latency_ms = latency_ms, error = %e, "Run failed"),
        }

        if let Some(logger) = &self.run_logger {
            let (final_answer, run_error) = match &outcome {
                Ok(answer) => (answer.clone(), None),
                Err(e) => (format!("[error] {}", e), Some(e.to_string())),
            };
            let record = RunLog {
                timestamp: started_at,
                run_id,
                user_message: query.to_string(),
                turns: self.conversation.turns[run_start..].to_vec(),
                tool_calls: tool_records,
                total_tokens,
                latency_ms,
                final_answer,
                error: run_error,
            };
            if let Err(e) = logger.append(&record) {
                // A lost log line must not cost the user their answer.
                warn!(error = %e, "Failed to append run log");
            }
        }

        outcome
    }

    /// The model/tool cycle for one run.
    async fn drive(
        &mut self,
        query: &str,
        tool_records: &mut Vec<ToolCallRecord>,
        total_tokens: &mut Option<u32>,
    ) -> Result<String> {
        let options = self.chat_options();
        let model = Some(self.config.agent.model.as_str());
        let tool_definitions = self.tools.definitions();

        let messages = self
            .context_builder
            .build_messages(&self.conversation.turns, query);

        let mut response = self
            .provider
            .chat(messages, tool_definitions.clone(), model, options.clone())
            .await?;
        accumulate_tokens(total_tokens, response.usage);

        self.conversation.push(Turn::user(query));

        let max_iterations = self.config.agent.max_tool_iterations;
        let mut iteration = 0;

        while response.has_tool_calls() && iteration < max_iterations {
            iteration += 1;
            debug!("Tool iteration {} of {}", iteration, max_iterations);

            let calls: Vec<ToolCall> = response
                .tool_calls
                .iter()
                .map(|tc| ToolCall::new(&tc.name, tc.arguments.clone()))
                .collect();
            self.conversation
                .push(Turn::assistant_with_tools(&response.content, calls));

            for call in &response.tool_calls {
                info!(tool = %call.name, "Executing tool");

                let result = match self.tools.invoke(&call.name, call.arguments.clone()).await {
                    Ok(output) => output,
                    // An unregistered name aborts the run; execution failures
                    // are surfaced to the model as text instead.
                    Err(e @ PulseError::UnknownTool(_)) => return Err(e),
                    Err(e) => format!("Error: {}", e),
                };

                tool_records.push(ToolCallRecord {
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                    result: result.clone(),
                });
                self.conversation.push(Turn::tool_result(&call.name, &result));
            }

            let messages = self
                .context_builder
                .build_messages(&self.conversation.turns, "");
            response = self
                .provider
                .chat(messages, tool_definitions.clone(), model, options.clone())
                .await?;
            accumulate_tokens(total_tokens, response.usage);
        }

        if iteration >= max_iterations && response.has_tool_calls() {
            warn!(
                iterations = iteration,
                "Tool loop reached maximum iterations, returning partial response"
            );
        }

        self.conversation.push(Turn::assistant(&response.content));

        Ok(response.content)
    }

    fn chat_options(&self) -> ChatOptions {
        let mut options = ChatOptions::new()
            .with_max_tokens(self.config.agent.max_tokens)
            .with_temperature(self.config.agent.temperature);
        if let Some(top_p) = self.config.agent.top_p {
            options = options.with_top_p(top_p);
        }
        options
    }
}

/// Add a response's token usage to the running total for the run.
fn accumulate_tokens(total: &mut Option<u32>, usage: Option<Usage>) {
    if let Some(usage) = usage {
        *total = Some(total.unwrap_or(0) + usage.total_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{LlmResponse, LlmToolCall, ToolDefinition};
    use crate::session::Role;
    use crate::tools::EchoTool;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays a fixed script of responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<LlmResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<LlmResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat(
            &self,
            _turns: Vec<Turn>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LlmResponse> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| PulseError::Provider("Script exhausted".to_string()))
        }

        fn default_model(&self) -> &str {
            "scripted"
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Provider that requests the same tool on every call.
    struct LoopingProvider;

    #[async_trait]
    impl LlmProvider for LoopingProvider {
        async fn chat(
            &self,
            _turns: Vec<Turn>,
            _tools: Vec<ToolDefinition>,
            _model: Option<&str>,
            _options: ChatOptions,
        ) -> Result<LlmResponse> {
            Ok(LlmResponse::with_tools(
                "",
                vec![LlmToolCall::new("echo", json!({"message": "again"}))],
            ))
        }

        fn default_model(&self) -> &str {
            "looping"
        }

        fn name(&self) -> &str {
            "looping"
        }
    }

    fn echo_registry() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(EchoTool));
        tools
    }

    #[test]
    fn test_agent_creation() {
        let agent = Agent::new(
            Config::default(),
            Box::new(ScriptedProvider::new(vec![])),
            echo_registry(),
        );

        assert_eq!(agent.tool_count(), 1);
        assert!(agent.has_tool("echo"));
        assert!(!agent.has_tool("nonexistent"));
        assert!(agent.conversation().is_empty());
    }

    #[test]
    fn test_system_prompt_override_from_config() {
        let mut config = Config::default();
        config.agent.system_prompt = Some("Custom prompt".to_string());
        let agent = Agent::new(
            config,
            Box::new(ScriptedProvider::new(vec![])),
            ToolRegistry::new(),
        );
        let system = agent.context_builder.build_system_turn();
        assert!(system.content.starts_with("Custom prompt"));
    }

    #[tokio::test]
    async fn test_run_direct_answer() {
        let provider = ScriptedProvider::new(vec![LlmResponse::text("Direct answer")]);
        let mut agent = Agent::new(Config::default(), Box::new(provider), echo_registry());

        let answer = agent.run("Just answer").await.unwrap();
        assert_eq!(answer, "Direct answer");

        let turns = &agent.conversation().turns;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_run_with_tool_call() {
        let provider = ScriptedProvider::new(vec![
            LlmResponse::with_tools(
                "",
                vec![LlmToolCall::new("echo", json!({"message": "ping"}))],
            ),
            LlmResponse::text("The echo said ping"),
        ]);
        let mut agent = Agent::new(Config::default(), Box::new(provider), echo_registry());

        let answer = agent.run("Use the echo tool").await.unwrap();
        assert_eq!(answer, "The echo said ping");

        let roles: Vec<Role> = agent.conversation().turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert!(agent.conversation().turns[1].has_tool_calls());
        assert_eq!(agent.conversation().turns[2].content, "ping");
    }

    #[tokio::test]
    async fn test_run_unknown_tool_aborts() {
        let provider = ScriptedProvider::new(vec![LlmResponse::with_tools(
            "",
            vec![LlmToolCall::new("frobnicate", json!({}))],
        )]);
        let mut agent = Agent::new(Config::default(), Box::new(provider), echo_registry());

        let err = agent.run("Trigger unknown tool").await.unwrap_err();
        assert!(matches!(err, PulseError::UnknownTool(_)));
    }

    #[tokio::test]
    async fn test_run_iteration_cap() {
        let mut config = Config::default();
        config.agent.max_tool_iterations = 3;
        let mut agent = Agent::new(config, Box::new(LoopingProvider), echo_registry());

        let answer = agent.run("Loop forever").await.unwrap();
        assert_eq!(answer, "");

        // One tool turn per iteration, bounded by the cap.
        let tool_turns = agent.conversation().turns_by_role(Role::Tool).len();
        assert_eq!(tool_turns, 3);
    }

    #[tokio::test]
    async fn test_conversation_memory_across_runs() {
        let provider = ScriptedProvider::new(vec![
            LlmResponse::text("First answer"),
            LlmResponse::text("Second answer"),
        ]);
        let mut agent = Agent::new(Config::default(), Box::new(provider), echo_registry());

        agent.run("First question").await.unwrap();
        agent.run("Second question").await.unwrap();

        let turns = &agent.conversation().turns;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "First question");
        assert_eq!(turns[2].content, "Second question");
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        // Empty script: the first chat call fails.
        let provider = ScriptedProvider::new(vec![]);
        let mut agent = Agent::new(Config::default(), Box::new(provider), echo_registry());

        let err = agent.run("Anything").await.unwrap_err();
        assert!(matches!(err, PulseError::Provider(_)));
    }

    #[test]
    fn test_chat_options_from_config() {
        let mut config = Config::default();
        config.agent.max_tokens = 1234;
        config.agent.temperature = 0.9;
        config.agent.top_p = Some(0.7);

        let agent = Agent::new(
            config,
            Box::new(ScriptedProvider::new(vec![])),
            ToolRegistry::new(),
        );
        let options = agent.chat_options();
        assert_eq!(options.max_tokens, Some(1234));
        assert_eq!(options.temperature, Some(0.9));
        assert_eq!(options.top_p, Some(0.7));
    }

    #[test]
    fn test_accumulate_tokens() {
        let mut total = None;
        accumulate_tokens(&mut total, None);
        assert_eq!(total, None);

        accumulate_tokens(&mut total, Some(Usage::new(10, 5)));
        assert_eq!(total, Some(15));

        accumulate_tokens(&mut total, Some(Usage::new(20, 10)));
        assert_eq!(total, Some(45));
    }
}
