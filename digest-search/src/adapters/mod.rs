//! Source adapter implementations and the adapter boundary.
//!
//! Each module provides a struct implementing [`crate::adapter::SourceAdapter`]
//! for one source family. [`invoke`] dispatches a descriptor to its adapter
//! and turns every error into a failed [`FetchResult`].

pub mod discourse;
pub mod feed;
pub mod hackernews;
pub mod issues;
pub mod v2ex;
pub mod web_search;

pub use discourse::DiscourseAdapter;
pub use feed::FeedAdapter;
pub use hackernews::HackerNewsAdapter;
pub use issues::IssueTrackerAdapter;
pub use v2ex::V2exAdapter;
pub use web_search::WebSearchAdapter;

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::error::DigestError;
use crate::http::Transport;
use crate::types::{FetchResult, SourceDescriptor, SourceKind, SourceOutput};
use std::time::Instant;

/// Checks the fields every adapter relies on before any request is made.
///
/// # Errors
///
/// Returns [`DigestError::Config`] for an empty endpoint, a web-search
/// source without a key, or an issue-tracker endpoint not shaped
/// `owner/repo`.
pub fn validate_descriptor(source: &SourceDescriptor) -> Result<(), DigestError> {
    if source.endpoint.trim().is_empty() {
        return Err(DigestError::Config(format!(
            "{} source has an empty endpoint",
            source.kind
        )));
    }
    match source.kind {
        SourceKind::WebSearchEngine
            if source.credential.as_deref().is_none_or(str::is_empty) =>
        {
            Err(DigestError::Config(format!(
                "web search source {} has no API key",
                source.endpoint
            )))
        }
        SourceKind::IssueTracker => issues::validate_repo(source.endpoint.trim()),
        _ => Ok(()),
    }
}

/// Run one source through its adapter.
///
/// Never fails: transport, parse and descriptor errors all come back as
/// a failed result carrying the message, with the elapsed time recorded
/// either way.
pub async fn invoke<T: Transport>(
    transport: &T,
    source: &SourceDescriptor,
    query: &Query,
    config: &PipelineConfig,
) -> FetchResult {
    let started = Instant::now();
    let outcome = match validate_descriptor(source) {
        Ok(()) => dispatch(transport, source, query, config).await,
        Err(err) => Err(err),
    };
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let result = match outcome {
        Ok(output) => {
            tracing::debug!(
                source = %source.label(),
                kind = %source.kind,
                count = output.records.len(),
                elapsed_ms = elapsed,
                "source returned records"
            );
            FetchResult::succeeded(source.clone(), output)
        }
        Err(err) => {
            tracing::warn!(
                source = %source.label(),
                kind = %source.kind,
                error = %err,
                "source fetch failed"
            );
            FetchResult::failed(source.clone(), err)
        }
    };
    result.with_duration_ms(elapsed)
}

/// Dispatch to the concrete adapter for `source.kind`.
async fn dispatch<T: Transport>(
    transport: &T,
    source: &SourceDescriptor,
    query: &Query,
    config: &PipelineConfig,
) -> Result<SourceOutput, DigestError> {
    match source.kind {
        SourceKind::WebSearchEngine => {
            WebSearchAdapter.fetch(transport, source, query, config).await
        }
        SourceKind::RssFeed | SourceKind::AtomFeed => {
            FeedAdapter.fetch(transport, source, query, config).await
        }
        SourceKind::DiscourseForum => {
            DiscourseAdapter.fetch(transport, source, query, config).await
        }
        SourceKind::HackerNews => {
            HackerNewsAdapter.fetch(transport, source, query, config).await
        }
        SourceKind::V2ex => V2exAdapter.fetch(transport, source, query, config).await,
        SourceKind::IssueTracker => {
            IssueTrackerAdapter.fetch(transport, source, query, config).await
        }
    }
}
