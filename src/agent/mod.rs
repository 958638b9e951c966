//! Agent module - Core agent loop and context building
//!
//! The agent is responsible for:
//!
//! - Building conversation context with the system prompt and history
//! - Calling the LLM provider for responses
//! - Executing tool calls and feeding results back to the LLM
//! - Appending one run-log record per completed run
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │     CLI     │────>│    Agent    │────>│ LlmProvider │
//! │  (queries)  │     │             │     │  (Gemini)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │                   │
//!                            │                   │
//!                            ▼                   ▼
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   RunLog    │     │    Tools    │
//!                     │   (JSONL)   │     │  Registry   │
//!                     └─────────────┘     └─────────────┘
//! ```

mod context;
mod r#loop;

pub use context::ContextBuilder;
pub use r#loop::Agent;
