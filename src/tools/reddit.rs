//! Reddit search tools.
//!
//! Provides:
//! - `search_subreddits`: find subreddits matching a query.
//! - `search_subreddit_content`: search posts and recent comments in a subreddit.
//!
//! Both tools share a [`RedditClient`] that handles app-only OAuth
//! (client-credentials grant) with a cached bearer token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{PulseError, Result};

use super::Tool;

const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const REDDIT_API_URL: &str = "https://oauth.reddit.com";
const REDDIT_USER_AGENT: &str = "redpulse/0.1 (public-sentiment research agent)";
const MAX_SEARCH_LIMIT: usize = 25;
const SNIPPET_CHARS: usize = 200;
/// Seconds shaved off the reported token lifetime so a token is never used
/// right at its expiry boundary.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Authenticated HTTP client for the Reddit data API.
///
/// Uses the app-only OAuth flow: a client-credentials token is fetched on
/// first use and cached until shortly before it expires.
pub struct RedditClient {
    client: Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditClient {
    /// Create a new Reddit client from app credentials.
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token: Mutex::new(None),
        }
    }

    /// Get a valid bearer token, fetching a fresh one when the cache is
    /// empty or about to expire.
    async fn bearer_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Utc::now() {
                return Ok(cached.access_token.clone());
            }
        }

        debug!("Fetching Reddit app-only OAuth token");
        let response = self
            .client
            .post(REDDIT_TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, REDDIT_USER_AGENT)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PulseError::Tool(format!("Reddit token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PulseError::Tool(format!(
                "Reddit auth error: {} ({})",
                status,
                detail.trim()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PulseError::Tool(format!("Failed to parse Reddit token: {}", e)))?;

        let lifetime = (token.expires_in - TOKEN_EXPIRY_MARGIN_SECS).max(0);
        *guard = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        });

        Ok(token.access_token)
    }

    /// GET a Reddit API path with query parameters, parsing the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", REDDIT_API_URL, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, REDDIT_USER_AGENT)
            .query(query)
            .send()
            .await
            .map_err(|e| PulseError::Tool(format!("Reddit request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PulseError::Tool(format!(
                "Reddit API error: {} ({})",
                status,
                detail.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| PulseError::Tool(format!("Failed to parse Reddit response: {}", e)))
    }
}

// ============================================================================
// Reddit Listing Wire Types
// ============================================================================

/// Reddit wraps every collection in a `Listing` envelope.
#[derive(Debug, Deserialize)]
struct Listing<T> {
    data: ListingData<T>,
}

#[derive(Debug, Deserialize)]
struct ListingData<T> {
    #[serde(default = "Vec::new")]
    children: Vec<ListingChild<T>>,
}

#[derive(Debug, Deserialize)]
struct ListingChild<T> {
    data: T,
}

impl<T> Listing<T> {
    fn into_items(self) -> Vec<T> {
        self.data.children.into_iter().map(|c| c.data).collect()
    }
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    public_description: String,
}

#[derive(Debug, Deserialize)]
struct PostData {
    #[serde(default)]
    title: String,
    /// Absent for deleted accounts
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    url: String,
    #[serde(default)]
    selftext: String,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    author: Option<String>,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    body: String,
    #[serde(default)]
    permalink: String,
}

// ============================================================================
// Formatting helpers
// ============================================================================

/// Truncate text to a snippet, char-safe.
fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut)
    }
}

fn author_label(author: &Option<String>) -> &str {
    author.as_deref().unwrap_or("[deleted]")
}

fn format_subreddits(query: &str, subs: &[SubredditData]) -> String {
    let mut output = format!("Subreddits matching '{}':\n\n", query);
    for (index, sub) in subs.iter().enumerate() {
        output.push_str(&format!("{}. r/{}", index + 1, sub.display_name));
        if !sub.title.is_empty() {
            output.push_str(&format!(" - {}", sub.title));
        }
        output.push('\n');
        if !sub.public_description.is_empty() {
            output.push_str(&format!("   {}\n", snippet(&sub.public_description)));
        }
        output.push('\n');
    }
    output.trim_end().to_string()
}

/// Keep only comments mentioning the query (case-insensitive) and rank them
/// by score, highest first.
fn filter_and_rank_comments(mut comments: Vec<CommentData>, query: &str) -> Vec<CommentData> {
    let needle = query.to_lowercase();
    comments.retain(|c| c.body.to_lowercase().contains(&needle));
    comments.sort_by(|a, b| b.score.cmp(&a.score));
    comments
}

fn format_content(
    subreddit: &str,
    query: &str,
    posts: &[PostData],
    comments: &[CommentData],
) -> String {
    if posts.is_empty() && comments.is_empty() {
        return format!(
            "No posts or comments found in r/{} for '{}'.",
            subreddit, query
        );
    }

    let mut output = String::new();

    if !posts.is_empty() {
        output.push_str(&format!("Posts in r/{} matching '{}':\n\n", subreddit, query));
        for (index, post) in posts.iter().enumerate() {
            output.push_str(&format!(
                "{}. {} (score {}, by {})\n",
                index + 1,
                post.title,
                post.score,
                author_label(&post.author)
            ));
            if !post.url.is_empty() {
                output.push_str(&format!("   {}\n", post.url));
            }
            if !post.selftext.is_empty() {
                output.push_str(&format!("   {}\n", snippet(&post.selftext)));
            }
            output.push('\n');
        }
    }

    if !comments.is_empty() {
        output.push_str(&format!("Top comments mentioning '{}':\n\n", query));
        for (index, comment) in comments.iter().enumerate() {
            output.push_str(&format!(
                "{}. (score {}, by {}) {}\n",
                index + 1,
                comment.score,
                author_label(&comment.author),
                snippet(&comment.body)
            ));
            if !comment.permalink.is_empty() {
                output.push_str(&format!("   https://reddit.com{}\n", comment.permalink));
            }
            output.push('\n');
        }
    }

    output.trim_end().to_string()
}

fn extract_limit(args: &Value, default_limit: usize) -> usize {
    args.get("limit")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default_limit)
        .clamp(1, MAX_SEARCH_LIMIT)
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PulseError::Tool(format!("Missing '{}' parameter", key)))
}

// ============================================================================
// Tools
// ============================================================================

/// Subreddit discovery tool.
pub struct SearchSubredditsTool {
    reddit: Arc<RedditClient>,
    default_limit: usize,
}

impl SearchSubredditsTool {
    /// Create a new subreddit search tool.
    pub fn new(reddit: Arc<RedditClient>, default_limit: usize) -> Self {
        Self {
            reddit,
            default_limit: default_limit.clamp(1, MAX_SEARCH_LIMIT),
        }
    }
}

#[async_trait]
impl Tool for SearchSubredditsTool {
    fn name(&self) -> &str {
        "search_subreddits"
    }

    fn description(&self) -> &str {
        "Search for relevant subreddits using a query string. Returns subreddit names, titles, and descriptions."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of subreddits to return (1-25)",
                    "minimum": 1,
                    "maximum": 25
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let query = required_str(&args, "query")?;
        let limit = extract_limit(&args, self.default_limit);

        let listing: Listing<SubredditData> = self
            .reddit
            .get_json(
                "/subreddits/search",
                &[("q", query.to_string()), ("limit", limit.to_string())],
            )
            .await?;

        let subs = listing.into_items();
        if subs.is_empty() {
            return Ok(format!("No subreddits found for '{}'.", query));
        }

        Ok(format_subreddits(query, &subs))
    }
}

/// Subreddit post and comment search tool.
pub struct SearchSubredditContentTool {
    reddit: Arc<RedditClient>,
    default_limit: usize,
}

impl SearchSubredditContentTool {
    /// Create a new subreddit content search tool.
    pub fn new(reddit: Arc<RedditClient>, default_limit: usize) -> Self {
        Self {
            reddit,
            default_limit: default_limit.clamp(1, MAX_SEARCH_LIMIT),
        }
    }
}

#[async_trait]
impl Tool for SearchSubredditContentTool {
    fn name(&self) -> &str {
        "search_subreddit_content"
    }

    fn description(&self) -> &str {
        "Search for relevant posts and comments in a subreddit using a query string. \
         Returns matching posts and comments with title, author, score, and snippet. \
         The 'sort' parameter can be 'relevance', 'new', or 'top'."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "subreddit": {
                    "type": "string",
                    "description": "Subreddit name, without the r/ prefix"
                },
                "query": {
                    "type": "string",
                    "description": "Search query"
                },
                "limit": {
                    "type": "integer",
                    "description": "Number of results per kind (1-25)",
                    "minimum": 1,
                    "maximum": 25
                },
                "sort": {
                    "type": "string",
                    "description": "Post sort order: relevance, new, or top",
                    "enum": ["relevance", "new", "top"]
                }
            },
            "required": ["subreddit", "query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let subreddit = required_str(&args, "subreddit")?
            .trim_start_matches("r/")
            .to_string();
        let query = required_str(&args, "query")?;
        let limit = extract_limit(&args, self.default_limit);
        let sort = args
            .get("sort")
            .and_then(|v| v.as_str())
            .unwrap_or("relevance")
            .to_string();

        let posts: Listing<PostData> = self
            .reddit
            .get_json(
                &format!("/r/{}/search", subreddit),
                &[
                    ("q", query.to_string()),
                    ("restrict_sr", "1".to_string()),
                    ("sort", sort),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        let comments: Listing<CommentData> = self
            .reddit
            .get_json(
                &format!("/r/{}/comments", subreddit),
                &[("limit", limit.to_string())],
            )
            .await?;

        let posts = posts.into_items();
        let comments = filter_and_rank_comments(comments.into_items(), query);

        Ok(format_content(&subreddit, query, &posts, &comments))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<RedditClient> {
        Arc::new(RedditClient::new("id", "secret"))
    }

    #[test]
    fn test_tool_properties() {
        let subs = SearchSubredditsTool::new(client(), 8);
        assert_eq!(subs.name(), "search_subreddits");
        assert!(subs.description().contains("subreddits"));
        assert!(subs.parameters().is_object());

        let content = SearchSubredditContentTool::new(client(), 8);
        assert_eq!(content.name(), "search_subreddit_content");
        assert!(content.description().contains("posts and comments"));
    }

    #[test]
    fn test_default_limit_clamped() {
        let tool = SearchSubredditsTool::new(client(), 500);
        assert_eq!(tool.default_limit, MAX_SEARCH_LIMIT);

        let tool = SearchSubredditsTool::new(client(), 0);
        assert_eq!(tool.default_limit, 1);
    }

    #[tokio::test]
    async fn test_missing_query_fails_before_network() {
        let tool = SearchSubredditsTool::new(client(), 8);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, PulseError::Tool(_)));
        assert!(err.to_string().contains("query"));
    }

    #[tokio::test]
    async fn test_missing_subreddit_fails_before_network() {
        let tool = SearchSubredditContentTool::new(client(), 8);
        let err = tool.execute(json!({"query": "rust"})).await.unwrap_err();
        assert!(err.to_string().contains("subreddit"));
    }

    #[test]
    fn test_extract_limit() {
        assert_eq!(extract_limit(&json!({}), 8), 8);
        assert_eq!(extract_limit(&json!({"limit": 3}), 8), 3);
        assert_eq!(extract_limit(&json!({"limit": 100}), 8), MAX_SEARCH_LIMIT);
        assert_eq!(extract_limit(&json!({"limit": 0}), 8), 1);
    }

    #[test]
    fn test_required_str() {
        assert_eq!(required_str(&json!({"query": " rust "}), "query").unwrap(), "rust");
        assert!(required_str(&json!({"query": ""}), "query").is_err());
        assert!(required_str(&json!({"query": null}), "query").is_err());
        assert!(required_str(&json!({}), "query").is_err());
    }

    #[test]
    fn test_snippet_truncation() {
        let short = "hello world";
        assert_eq!(snippet(short), "hello world");

        let long = "x".repeat(SNIPPET_CHARS + 50);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_snippet_multibyte_safe() {
        let long = "é".repeat(SNIPPET_CHARS + 10);
        let cut = snippet(&long);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_listing_deserialization() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    {"kind": "t5", "data": {
                        "display_name": "rust",
                        "title": "The Rust Programming Language",
                        "public_description": "A place for all things Rust"
                    }}
                ]
            }
        }"#;
        let listing: Listing<SubredditData> = serde_json::from_str(raw).unwrap();
        let subs = listing.into_items();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].display_name, "rust");
    }

    #[test]
    fn test_post_deserialization_deleted_author() {
        let raw = r#"{
            "data": {
                "children": [
                    {"data": {"title": "A post", "author": null, "score": 42, "url": "https://example.com", "selftext": ""}}
                ]
            }
        }"#;
        let listing: Listing<PostData> = serde_json::from_str(raw).unwrap();
        let posts = listing.into_items();
        assert_eq!(author_label(&posts[0].author), "[deleted]");
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn test_filter_and_rank_comments() {
        let comments = vec![
            CommentData {
                author: Some("a".into()),
                score: 5,
                body: "I love Rust".into(),
                permalink: "/r/prog/1".into(),
            },
            CommentData {
                author: Some("b".into()),
                score: 50,
                body: "rust is great for CLIs".into(),
                permalink: "/r/prog/2".into(),
            },
            CommentData {
                author: Some("c".into()),
                score: 100,
                body: "unrelated".into(),
                permalink: "/r/prog/3".into(),
            },
        ];

        let ranked = filter_and_rank_comments(comments, "Rust");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].score, 50);
        assert_eq!(ranked[1].score, 5);
    }

    #[test]
    fn test_format_subreddits() {
        let subs = vec![SubredditData {
            display_name: "rust".into(),
            title: "The Rust Programming Language".into(),
            public_description: "A place for all things Rust".into(),
        }];
        let output = format_subreddits("rust", &subs);
        assert!(output.contains("1. r/rust - The Rust Programming Language"));
        assert!(output.contains("A place for all things Rust"));
    }

    #[test]
    fn test_format_content_empty() {
        let output = format_content("rust", "tokio", &[], &[]);
        assert!(output.contains("No posts or comments found"));
    }

    #[test]
    fn test_format_content_posts_before_comments() {
        let posts = vec![PostData {
            title: "Tokio 2.0?".into(),
            author: Some("alice".into()),
            score: 12,
            url: "https://reddit.com/r/rust/1".into(),
            selftext: "Is it coming?".into(),
        }];
        let comments = vec![CommentData {
            author: Some("bob".into()),
            score: 7,
            body: "tokio is stable".into(),
            permalink: "/r/rust/c1".into(),
        }];

        let output = format_content("rust", "tokio", &posts, &comments);
        let posts_pos = output.find("Posts in r/rust").unwrap();
        let comments_pos = output.find("Top comments").unwrap();
        assert!(posts_pos < comments_pos);
        assert!(output.contains("(score 12, by alice)"));
        assert!(output.contains("https://reddit.com/r/rust/c1"));
    }
}
