//! Configuration for the digest command line.
//!
//! One TOML file describes every pipeline: search keys and sites for the
//! pooled search, feeds for the feed digest, repositories for the issue
//! digest. Every section is optional and falls back to defaults.
//!
//! ```toml
//! [pipeline]
//! workers = 5
//! max_results = 20
//!
//! [search]
//! tavily_api_key = "tvly-..."
//!
//! [[sites]]
//! kind = "discourse"
//! url = "https://linux.do"
//! name = "Linux.do"
//!
//! [[feeds]]
//! url = "https://blog.rust-lang.org/feed.xml"
//!
//! [[repos]]
//! repo = "rust-lang/rust"
//!
//! [issues]
//! days = 3
//! ```

use std::path::{Path, PathBuf};

use digest_search::adapters::web_search::{EXA_ENDPOINT, TAVILY_ENDPOINT};
use digest_search::config::{DEFAULT_GITHUB_API, DEFAULT_HACKERNEWS_API, DEFAULT_V2EX_SEARCH_API};
use digest_search::{DEFAULT_DIGEST_DAYS, PipelineConfig, Query, SourceDescriptor, SourceKind};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable consulted for an issue-tracker token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Pool, timeout and endpoint settings shared by all pipelines.
    pub pipeline: PipelineSection,
    /// Web-search API keys.
    pub search: SearchSection,
    /// Forum and community sites for the pooled search.
    pub sites: Vec<SiteEntry>,
    /// Feeds for the feed digest.
    pub feeds: Vec<FeedEntry>,
    /// Repositories for the issue digest.
    pub repos: Vec<RepoEntry>,
    /// Issue digest settings.
    pub issues: IssuesSection,
    /// Keyword filter for the feed digest.
    pub feeds_filter: FeedsFilter,
}

/// Mirror of [`PipelineConfig`] as it appears in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    pub workers: usize,
    pub task_timeout_seconds: u64,
    pub max_results: usize,
    pub connect_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub user_agent: String,
    pub hackernews_api: String,
    pub v2ex_search_api: String,
    pub github_api: String,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            workers: defaults.workers,
            task_timeout_seconds: defaults.task_timeout_seconds,
            max_results: defaults.max_results,
            connect_timeout_seconds: defaults.connect_timeout_seconds,
            request_timeout_seconds: defaults.request_timeout_seconds,
            user_agent: defaults.user_agent,
            hackernews_api: DEFAULT_HACKERNEWS_API.to_owned(),
            v2ex_search_api: DEFAULT_V2EX_SEARCH_API.to_owned(),
            github_api: DEFAULT_GITHUB_API.to_owned(),
        }
    }
}

impl From<&PipelineSection> for PipelineConfig {
    fn from(section: &PipelineSection) -> Self {
        Self {
            workers: section.workers,
            task_timeout_seconds: section.task_timeout_seconds,
            max_results: section.max_results,
            connect_timeout_seconds: section.connect_timeout_seconds,
            request_timeout_seconds: section.request_timeout_seconds,
            user_agent: section.user_agent.clone(),
            hackernews_api: section.hackernews_api.clone(),
            v2ex_search_api: section.v2ex_search_api.clone(),
            github_api: section.github_api.clone(),
        }
    }
}

/// Web-search API keys; an engine runs only when its key is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub tavily_api_key: Option<String>,
    pub exa_api_key: Option<String>,
}

/// A searchable site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    /// `discourse`, `hackernews` or `v2ex`.
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A feed URL; the format is detected from the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A repository in `owner/name` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoEntry {
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Issue digest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuesSection {
    /// Look-back window for digest mode.
    pub days: u32,
    /// Keyword; switches the issue pipeline to search mode.
    pub search: Option<String>,
    /// API token; falls back to `GITHUB_TOKEN`.
    pub token: Option<String>,
}

impl Default for IssuesSection {
    fn default() -> Self {
        Self {
            days: DEFAULT_DIGEST_DAYS,
            search: None,
            token: None,
        }
    }
}

/// Keywords a feed digest is filtered by.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsFilter {
    pub keywords: Vec<String>,
}

impl DigestConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/feed-digest/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("feed-digest").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("feed-digest")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/feed-digest/config.toml")
        }
    }

    /// The library pipeline settings.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::from(&self.pipeline)
    }

    /// Descriptors for the pooled search: one per configured API key, then
    /// one per site, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] for a site whose kind is not a
    /// searchable site.
    pub fn search_sources(&self) -> Result<Vec<SourceDescriptor>> {
        let mut sources = Vec::new();
        let engines = [
            (TAVILY_ENDPOINT, "Tavily", &self.search.tavily_api_key),
            (EXA_ENDPOINT, "Exa", &self.search.exa_api_key),
        ];
        for (endpoint, name, key) in engines {
            if let Some(key) = non_blank(key.as_deref()) {
                sources.push(
                    SourceDescriptor::new(SourceKind::WebSearchEngine, endpoint)
                        .with_credential(key)
                        .with_display_name(name),
                );
            }
        }

        for site in &self.sites {
            let kind = match SourceKind::parse(&site.kind) {
                Some(
                    kind @ (SourceKind::DiscourseForum | SourceKind::HackerNews | SourceKind::V2ex),
                ) => kind,
                _ => {
                    return Err(AppError::Config(format!(
                        "site {} has unsupported kind {:?}",
                        site.url, site.kind
                    )));
                }
            };
            sources.push(with_name(SourceDescriptor::new(kind, &site.url), &site.name));
        }
        Ok(sources)
    }

    /// Descriptors for the feed digest, in file order.
    pub fn feed_sources(&self) -> Vec<SourceDescriptor> {
        self.feeds
            .iter()
            .map(|feed| with_name(SourceDescriptor::new(SourceKind::RssFeed, &feed.url), &feed.name))
            .collect()
    }

    /// Descriptors for the issue digest, each carrying `token` if any.
    pub fn issue_sources(&self, token: Option<&str>) -> Vec<SourceDescriptor> {
        self.repos
            .iter()
            .map(|repo| {
                let source =
                    with_name(SourceDescriptor::new(SourceKind::IssueTracker, &repo.repo), &repo.name);
                match token {
                    Some(token) => source.with_credential(token),
                    None => source,
                }
            })
            .collect()
    }

    /// Search mode when `[issues] search` is set, digest mode otherwise.
    pub fn issue_query(&self) -> Query {
        match non_blank(self.issues.search.as_deref()) {
            Some(text) => Query {
                text: Some(text.to_owned()),
                days: self.issues.days,
            },
            None => Query::digest(self.issues.days),
        }
    }

    /// The configured token, then `GITHUB_TOKEN`, otherwise anonymous.
    pub fn resolve_issue_token(&self) -> Option<String> {
        resolve_token(
            self.issues.token.as_deref(),
            std::env::var(GITHUB_TOKEN_ENV).ok().as_deref(),
        )
    }
}

/// First non-blank of an explicit token and an environment value.
pub fn resolve_token(explicit: Option<&str>, from_env: Option<&str>) -> Option<String> {
    non_blank(explicit).or_else(|| non_blank(from_env)).map(str::to_owned)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn with_name(source: SourceDescriptor, name: &Option<String>) -> SourceDescriptor {
    match non_blank(name.as_deref()) {
        Some(name) => source.with_display_name(name),
        None => source,
    }
}
