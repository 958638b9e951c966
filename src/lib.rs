//! RedPulse - research agent blending news search with Reddit sentiment

pub mod agent;
pub mod config;
pub mod error;
pub mod providers;
pub mod runlog;
pub mod session;
pub mod tools;
pub mod utils;

pub use agent::{Agent, ContextBuilder};
pub use config::{Config, Credentials};
pub use error::{PulseError, Result};
pub use providers::{
    ChatOptions, GeminiProvider, LlmProvider, LlmResponse, LlmToolCall, ToolDefinition, Usage,
};
pub use runlog::{RunLog, RunLogger};
pub use session::{Conversation, Role, ToolCall, Turn};
