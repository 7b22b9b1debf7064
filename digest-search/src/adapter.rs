//! Trait definition for pluggable source adapters.
//!
//! Each source family (web search API, feeds, Discourse, Hacker News, V2EX,
//! issue tracker) implements [`SourceAdapter`] to provide a uniform
//! interface for fetching and normalising records.

use crate::config::PipelineConfig;
use crate::error::DigestError;
use crate::http::Transport;
use crate::types::{SourceDescriptor, SourceOutput};
use std::future::Future;

/// Default look-back window for issue digests, in days.
pub const DEFAULT_DIGEST_DAYS: u32 = 7;

/// What a pipeline run is asking for.
///
/// Search-style adapters require `text`. Feed adapters ignore it. The issue
/// tracker runs in search mode when `text` is present and in digest mode
/// (issues updated within `days`) otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: Option<String>,
    pub days: u32,
}

impl Query {
    /// A keyword query.
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            days: DEFAULT_DIGEST_DAYS,
        }
    }

    /// No keyword; feeds are fetched whole.
    pub fn feeds() -> Self {
        Self {
            text: None,
            days: DEFAULT_DIGEST_DAYS,
        }
    }

    /// Issue digest over the last `days` days.
    pub fn digest(days: u32) -> Self {
        Self { text: None, days }
    }

    /// The keyword text, or a config error for adapters that need one.
    pub fn require_text(&self) -> Result<&str, DigestError> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DigestError::Config("a search query is required".into()))
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::feeds()
    }
}

/// A pluggable source backend.
///
/// Implementors call the transport, parse the source-native response, and
/// map it into records. Each adapter handles its own:
///
/// - URL and request-body construction with query encoding
/// - response parsing (JSON or XML)
/// - field mapping, HTML stripping, and content truncation
/// - the per-source result cap (`config.max_results`)
///
/// Errors are returned, never panicked; [`crate::adapters::invoke`] turns
/// them into failed fetch results. All implementations must be
/// `Send + Sync` for concurrent source queries.
pub trait SourceAdapter: Send + Sync {
    /// Fetch and normalise records for one source.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError`] if the transport fails, the response cannot
    /// be parsed, or the descriptor/query is unusable for this adapter.
    fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> impl Future<Output = Result<SourceOutput, DigestError>> + Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
