//! Session module - conversation state for agent runs
//!
//! A conversation is an append-only sequence of [`Turn`] values produced by
//! the user, the assistant, and tool executions. State lives in memory for
//! the duration of an interactive session; the persistent record of each run
//! is the run log (see [`crate::runlog`]).

mod types;

pub use types::{Conversation, Role, ToolCall, Turn};
