//! # digest-search
//!
//! Concurrent multi-source retrieval for feed digests.
//!
//! This crate fans one query out to heterogeneous sources (hosted web-search
//! APIs, RSS/Atom feeds, Discourse forums, Hacker News, V2EX and GitHub
//! issues), normalises every response into one [`Record`] shape, drops
//! repeated URLs, and ranks the merged list for downstream analysis.
//!
//! ## Design
//!
//! - One adapter per source family behind [`SourceAdapter`]; all network
//!   access goes through the [`Transport`] trait
//! - A bounded [`WorkerPool`] runs one task per source with a per-task
//!   timeout; a failing or slow source only fails its own entry
//! - Deduplication is by exact URL, first occurrence kept
//! - Ranking is chosen per pipeline: by score for search, by date then a
//!   secondary signal for feeds and issues
//! - Only configuration errors abort a run; everything else is reported
//!   per source
//!
//! ## Security
//!
//! - Credentials are never logged or serialised
//! - Search queries are logged only at trace level

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod content;
pub mod dates;
pub mod error;
pub mod http;
pub mod orchestrator;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod xml;

pub use adapter::{Query, SourceAdapter, DEFAULT_DIGEST_DAYS};
pub use config::PipelineConfig;
pub use error::{DigestError, Result};
pub use http::{FetchRequest, HttpTransport, Method, Transport};
pub use orchestrator::{AggregateReport, Ranking, SourceSummary, WorkerPool};
pub use types::{FetchResult, Record, SourceDescriptor, SourceKind, SourceOutput};

/// Pooled keyword search over web-search engines and forums, ranked by
/// score, using the production HTTP transport.
///
/// # Errors
///
/// Returns [`DigestError::Config`] for a blank query, no sources, or an
/// invalid config. Per-source failures are reported inside the result.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> digest_search::Result<()> {
/// use digest_search::{PipelineConfig, SourceDescriptor, SourceKind};
///
/// let sources = vec![
///     SourceDescriptor::new(SourceKind::HackerNews, "https://news.ycombinator.com"),
///     SourceDescriptor::new(SourceKind::DiscourseForum, "https://users.rust-lang.org"),
/// ];
/// let report = digest_search::search("async traits", &sources, &PipelineConfig::default()).await?;
/// for record in &report.merged {
///     println!("{:.1} {}", record.score, record.url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(
    query: &str,
    sources: &[SourceDescriptor],
    config: &PipelineConfig,
) -> Result<AggregateReport> {
    config.validate()?;
    let transport = HttpTransport::new(config)?;
    orchestrator::run_search(&transport, query, sources, config).await
}

/// Fetch feeds newest first, keeping only records matching any of
/// `keywords` when the list is non-empty.
///
/// # Errors
///
/// Same as [`search`], minus the query check.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> digest_search::Result<()> {
/// use digest_search::{PipelineConfig, SourceDescriptor, SourceKind};
///
/// let feeds = vec![SourceDescriptor::new(SourceKind::RssFeed, "https://blog.rust-lang.org/feed.xml")];
/// let report = digest_search::fetch_feeds(&feeds, &[], &PipelineConfig::default()).await?;
/// println!("{} posts", report.total_count);
/// # Ok(())
/// # }
/// ```
pub async fn fetch_feeds(
    feeds: &[SourceDescriptor],
    keywords: &[String],
    config: &PipelineConfig,
) -> Result<AggregateReport> {
    config.validate()?;
    let transport = HttpTransport::new(config)?;
    orchestrator::run_feeds(&transport, feeds, keywords, config).await
}

/// Issue search (query with text) or digest (query without) across
/// repositories, newest first, then by reactions.
///
/// # Errors
///
/// Same as [`fetch_feeds`].
pub async fn fetch_issues(
    repos: &[SourceDescriptor],
    query: &Query,
    config: &PipelineConfig,
) -> Result<AggregateReport> {
    config.validate()?;
    let transport = HttpTransport::new(config)?;
    orchestrator::run_issues(&transport, repos, query, config).await
}
