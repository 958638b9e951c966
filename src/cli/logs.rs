//! Run-log inspection command (`redpulse logs`).

use std::collections::BTreeMap;

use anyhow::{Context, Result};

use redpulse::config::Config;
use redpulse::runlog::{RunLog, RunLogger};

/// Width of the query/answer snippets in the listing.
const LIST_SNIPPET_CHARS: usize = 120;

/// Show recent runs or aggregate statistics from the run log.
pub(crate) fn cmd_logs(config: Config, limit: usize, stats: bool) -> Result<()> {
    let path = config.runlog_path();
    if !path.exists() {
        println!("No runs logged yet ({}).", path.display());
        return Ok(());
    }

    let logger = RunLogger::new(&path)
        .with_context(|| format!("Failed to open run log at {}", path.display()))?;

    if stats {
        let records = logger.read_all()?;
        print!("{}", format_stats(&records));
    } else {
        let records = logger.read_last(limit)?;
        print!("{}", format_recent(&records));
    }

    Ok(())
}

/// Collapse text to a single short line.
fn one_line_snippet(text: &str) -> String {
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= LIST_SNIPPET_CHARS {
        flattened
    } else {
        let cut: String = flattened.chars().take(LIST_SNIPPET_CHARS).collect();
        format!("{}...", cut)
    }
}

fn format_recent(records: &[RunLog]) -> String {
    if records.is_empty() {
        return "No runs recorded.\n".to_string();
    }

    let mut output = String::new();
    for record in records {
        output.push_str(&format!(
            "{}  {}ms  tools={}{}{}\n",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.latency_ms,
            record.tool_calls.len(),
            record
                .total_tokens
                .map(|t| format!("  tokens={}", t))
                .unwrap_or_default(),
            if record.error.is_some() { "  [ERROR]" } else { "" },
        ));
        output.push_str(&format!("  Q: {}\n", one_line_snippet(&record.user_message)));
        output.push_str(&format!("  A: {}\n\n", one_line_snippet(&record.final_answer)));
    }
    output
}

fn format_stats(records: &[RunLog]) -> String {
    if records.is_empty() {
        return "No runs recorded.\n".to_string();
    }

    let total_runs = records.len();
    let failed_runs = records.iter().filter(|r| r.error.is_some()).count();
    let total_tool_calls: usize = records.iter().map(|r| r.tool_calls.len()).sum();
    let total_tokens: u64 = records
        .iter()
        .filter_map(|r| r.total_tokens)
        .map(u64::from)
        .sum();
    let mean_latency_ms =
        records.iter().map(|r| r.latency_ms).sum::<u64>() / total_runs as u64;

    // BTreeMap keeps the per-tool listing stable across runs.
    let mut per_tool: BTreeMap<&str, usize> = BTreeMap::new();
    for record in records {
        for call in &record.tool_calls {
            *per_tool.entry(call.name.as_str()).or_insert(0) += 1;
        }
    }

    let mut output = String::new();
    output.push_str(&format!("Total runs:       {}\n", total_runs));
    output.push_str(&format!("Failed runs:      {}\n", failed_runs));
    output.push_str(&format!("Tool calls:       {}\n", total_tool_calls));
    output.push_str(&format!("Total tokens:     {}\n", total_tokens));
    output.push_str(&format!("Mean latency:     {}ms\n", mean_latency_ms));

    if !per_tool.is_empty() {
        output.push_str("Calls per tool:\n");
        for (name, count) in per_tool {
            output.push_str(&format!("  {:<28} {}\n", name, count));
        }
    }

    output
}
