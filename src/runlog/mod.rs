//! Run log - persistent JSONL record of completed runs
//!
//! Every completed run (success or failure) appends exactly one JSON line to
//! the run-log file. Records are immutable once written; there is no
//! rotation or compaction. A failed append is reported by the caller and
//! never blocks answer delivery.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{PulseError, Result};
use crate::session::Turn;

/// Digest of one tool invocation within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Name of the invoked tool
    pub name: String,
    /// Arguments the model passed
    pub arguments: Value,
    /// Text the tool returned (or the error text fed back to the model)
    pub result: String,
}

/// Persisted record of one complete query-to-answer cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    /// When the run started (UTC)
    pub timestamp: DateTime<Utc>,
    /// Unique identifier for this run
    pub run_id: String,
    /// The user's query
    pub user_message: String,
    /// Full turn sequence of the run, in order
    pub turns: Vec<Turn>,
    /// Digest of every tool invocation during the run
    pub tool_calls: Vec<ToolCallRecord>,
    /// Total tokens across every LLM call in the run, when reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    /// Wall-clock duration of the run in milliseconds
    pub latency_ms: u64,
    /// The final answer delivered to the user (or an error placeholder)
    pub final_answer: String,
    /// Error that aborted the run, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Appends run records to a JSONL file, one object per line.
///
/// The file is opened in append mode, written, flushed, and closed on every
/// call; no handle is held between runs.
///
/// # Example
///
/// ```
/// use redpulse::runlog::{RunLog, RunLogger};
/// use chrono::Utc;
///
/// let dir = tempfile::tempdir().unwrap();
/// let logger = RunLogger::new(dir.path().join("runs.jsonl")).unwrap();
///
/// let record = RunLog {
///     timestamp: Utc::now(),
///     run_id: "run-1".to_string(),
///     user_message: "hello".to_string(),
///     turns: vec![],
///     tool_calls: vec![],
///     total_tokens: None,
///     latency_ms: 12,
///     final_answer: "hi".to_string(),
///     error: None,
/// };
/// logger.append(&record).unwrap();
/// assert_eq!(logger.read_all().unwrap().len(), 1);
/// ```
pub struct RunLogger {
    path: PathBuf,
}

impl RunLogger {
    /// Create a run logger, ensuring the parent directory exists.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PulseError::Log(format!("Failed to create log directory: {}", e)))?;
        }
        Ok(Self { path })
    }

    /// The file this logger appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one run record as a single JSON line.
    ///
    /// Opens the file in create+append mode, writes the line, flushes, and
    /// closes. The record is guaranteed flushed before this returns.
    pub fn append(&self, record: &RunLog) -> Result<()> {
        let line = serde_json::to_string(record)
            .map_err(|e| PulseError::Log(format!("Failed to serialize run record: {}", e)))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| PulseError::Log(format!("Failed to open run log: {}", e)))?;

        writeln!(file, "{}", line)
            .map_err(|e| PulseError::Log(format!("Failed to write run log: {}", e)))?;
        file.flush()
            .map_err(|e| PulseError::Log(format!("Failed to flush run log: {}", e)))?;

        Ok(())
    }

    /// Read every record in the log, oldest first.
    ///
    /// Unparseable lines are skipped with a warning rather than failing the
    /// whole read. A missing file reads as an empty log.
    pub fn read_all(&self) -> Result<Vec<RunLog>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PulseError::Log(format!("Failed to read run log: {}", e)))?;

        let mut records = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RunLog>(line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(line = number + 1, error = %e, "Skipping malformed run-log line");
                }
            }
        }

        Ok(records)
    }

    /// Read the most recent `limit` records, oldest of those first.
    pub fn read_last(&self, limit: usize) -> Result<Vec<RunLog>> {
        let mut records = self.read_all()?;
        if records.len() > limit {
            records.drain(..records.len() - limit);
        }
        Ok(records)
    }
}
