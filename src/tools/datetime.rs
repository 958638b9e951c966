//! Current date tool.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::Result;

use super::Tool;

/// Returns the current UTC date and time.
///
/// The agent's knowledge is frozen at training time, so the model calls this
/// to anchor "latest" and "recent" in its search queries.
pub struct CurrentDateTool;

#[async_trait]
impl Tool for CurrentDateTool {
    fn name(&self) -> &str {
        "current_date"
    }

    fn description(&self) -> &str {
        "Returns the current UTC date and time in ISO 8601 format."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: Value) -> Result<String> {
        Ok(Utc::now().to_rfc3339())
    }
}
