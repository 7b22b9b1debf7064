//! Pipeline configuration with sensible defaults.
//!
//! [`PipelineConfig`] controls pool width, per-task deadlines, transport
//! timeouts, per-source result caps, and the public API endpoints adapters
//! talk to. The endpoint fields exist so tests and mirrors can redirect them.

use crate::error::DigestError;

/// Default public Hacker News search index.
pub const DEFAULT_HACKERNEWS_API: &str = "https://hn.algolia.com/api/v1";
/// Default third-party V2EX full-text index.
pub const DEFAULT_V2EX_SEARCH_API: &str = "https://www.sov2ex.com/api";
/// Default GitHub REST API base.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of source tasks in flight at once.
    pub workers: usize,
    /// Deadline for one source task, including parsing.
    pub task_timeout_seconds: u64,
    /// Per-source cap on returned records.
    pub max_results: usize,
    /// Transport connect timeout in seconds.
    pub connect_timeout_seconds: u64,
    /// Transport total request timeout in seconds.
    pub request_timeout_seconds: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Base URL of the Hacker News search index.
    pub hackernews_api: String,
    /// Base URL of the V2EX search index.
    pub v2ex_search_api: String,
    /// Base URL of the issue-tracker API.
    pub github_api: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            task_timeout_seconds: 30,
            max_results: 10,
            connect_timeout_seconds: 15,
            request_timeout_seconds: 30,
            user_agent: "feed-digest-bot".to_owned(),
            hackernews_api: DEFAULT_HACKERNEWS_API.to_owned(),
            v2ex_search_api: DEFAULT_V2EX_SEARCH_API.to_owned(),
            github_api: DEFAULT_GITHUB_API.to_owned(),
        }
    }
}

impl PipelineConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `workers` must be greater than 0
    /// - `task_timeout_seconds` must be greater than 0
    /// - `max_results` must be greater than 0
    /// - both transport timeouts must be greater than 0
    pub fn validate(&self) -> Result<(), DigestError> {
        if self.workers == 0 {
            return Err(DigestError::Config("workers must be greater than 0".into()));
        }
        if self.task_timeout_seconds == 0 {
            return Err(DigestError::Config(
                "task_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(DigestError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        if self.connect_timeout_seconds == 0 || self.request_timeout_seconds == 0 {
            return Err(DigestError::Config(
                "transport timeouts must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
