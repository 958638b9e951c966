//! Shared CLI helpers used across command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};

use redpulse::agent::Agent;
use redpulse::config::{Config, Credentials};
use redpulse::providers::GeminiProvider;
use redpulse::runlog::RunLogger;
use redpulse::tools::{
    CurrentDateTool, GoogleSearchTool, RedditClient, SearchSubredditContentTool,
    SearchSubredditsTool, ToolRegistry,
};

/// Wire up a fully configured agent: credentials, provider, search tools,
/// and (when enabled) the run logger.
///
/// Fails fast when a required credential is missing from the environment.
pub(crate) fn build_agent(config: Config) -> Result<Agent> {
    let credentials = Credentials::from_env().with_context(|| {
        format!(
            "Missing API credentials; set them in the environment or a .env file \
             (config file: {})",
            Config::path().display()
        )
    })?;

    let provider = Box::new(GeminiProvider::with_model(
        &credentials.gemini_api_key,
        &config.agent.model,
    ));

    let reddit = Arc::new(RedditClient::new(
        &credentials.reddit_client_id,
        &credentials.reddit_client_secret,
    ));

    let mut tools = ToolRegistry::new();
    tools.register(Box::new(SearchSubredditsTool::new(
        Arc::clone(&reddit),
        config.search.subreddit_search_limit,
    )));
    tools.register(Box::new(SearchSubredditContentTool::new(
        reddit,
        config.search.content_search_limit,
    )));
    tools.register(Box::new(GoogleSearchTool::with_model(
        &credentials.gemini_api_key,
        &config.search.grounding_model,
    )));
    tools.register(Box::new(CurrentDateTool));

    let run_logger = if config.runlog.enabled {
        let path = config.runlog_path();
        Some(
            RunLogger::new(&path)
                .with_context(|| format!("Failed to prepare run log at {}", path.display()))?,
        )
    } else {
        None
    };

    let mut agent = Agent::new(config, provider, tools);
    if let Some(logger) = run_logger {
        agent = agent.with_run_logger(logger);
    }

    Ok(agent)
}
