//! The three pipelines: pooled search, feed digest, issue digest.
//!
//! Each one validates its inputs, runs every valid source through the
//! [`WorkerPool`], and assembles a report with the ranking that suits its
//! source family.
//!
//! A descriptor that fails validation is reported as a failed source and
//! never scheduled. Only a run left with no schedulable source at all is a
//! hard [`DigestError::Config`]; every other failure stays inside the
//! report.

use crate::adapter::Query;
use crate::adapters::issues::IssueMode;
use crate::adapters::validate_descriptor;
use crate::config::PipelineConfig;
use crate::error::DigestError;
use crate::http::Transport;
use crate::types::{FetchResult, SourceDescriptor};

use super::pool::WorkerPool;
use super::ranking::Ranking;
use super::report::{assemble, AggregateReport};

/// `extra` key breaking date ties in issue reports.
pub const ISSUE_SECONDARY_KEY: &str = "reactions";

/// Run `sources` for `query` and rank the merged records with `ranking`.
///
/// # Errors
///
/// Returns [`DigestError::Config`] if `config` is invalid, `sources` is
/// empty, or no source passes validation.
pub async fn run_pipeline<T: Transport>(
    transport: &T,
    sources: &[SourceDescriptor],
    query: &Query,
    config: &PipelineConfig,
    ranking: Ranking,
) -> Result<AggregateReport, DigestError> {
    config.validate()?;
    let pool = WorkerPool::from_config(config)?;
    if sources.is_empty() {
        return Err(DigestError::Config("no sources configured".into()));
    }

    let mut rejected: Vec<(usize, FetchResult)> = Vec::new();
    let mut runnable: Vec<SourceDescriptor> = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        match validate_descriptor(source) {
            Ok(()) => runnable.push(source.clone()),
            Err(err) => {
                tracing::warn!(source = %source.label(), error = %err, "source skipped");
                rejected.push((index, FetchResult::failed(source.clone(), err)));
            }
        }
    }
    if runnable.is_empty() {
        let reasons: Vec<String> = rejected
            .iter()
            .filter_map(|(_, r)| r.error.clone())
            .collect();
        return Err(DigestError::Config(format!(
            "no usable sources: {}",
            reasons.join("; ")
        )));
    }

    tracing::info!(
        sources = runnable.len(),
        skipped = rejected.len(),
        workers = pool.width(),
        "running pipeline"
    );
    let ran = pool.run(transport, &runnable, query, config).await;

    // Put skipped sources back at their configured position.
    let mut results = Vec::with_capacity(sources.len());
    let mut ran = ran.into_iter();
    let mut rejected = rejected.into_iter().peekable();
    for index in 0..sources.len() {
        match rejected.next_if(|(i, _)| *i == index) {
            Some((_, failed)) => results.push(failed),
            None => results.extend(ran.next()),
        }
    }

    let report = assemble(query.text.as_deref(), &results, ranking);
    tracing::info!(
        total = report.total_count,
        failed = report.failed_sources(),
        "pipeline finished"
    );
    Ok(report)
}

/// Pooled keyword search over web-search engines and forums, by score.
///
/// # Errors
///
/// Returns [`DigestError::Config`] for a blank query or unusable sources.
pub async fn run_search<T: Transport>(
    transport: &T,
    query: &str,
    sources: &[SourceDescriptor],
    config: &PipelineConfig,
) -> Result<AggregateReport, DigestError> {
    let query = Query::search(query);
    query.require_text()?;
    run_pipeline(transport, sources, &query, config, Ranking::ByScore).await
}

/// Fetch feeds, newest first, optionally filtered by keywords.
///
/// # Errors
///
/// Returns [`DigestError::Config`] for unusable sources.
pub async fn run_feeds<T: Transport>(
    transport: &T,
    feeds: &[SourceDescriptor],
    keywords: &[String],
    config: &PipelineConfig,
) -> Result<AggregateReport, DigestError> {
    let report = run_pipeline(transport, feeds, &Query::feeds(), config, Ranking::by_date()).await?;
    Ok(report.with_keyword_filter(keywords))
}

/// Issue search or digest across repositories, newest first, then by
/// reactions.
///
/// # Errors
///
/// Returns [`DigestError::Config`] for unusable sources.
pub async fn run_issues<T: Transport>(
    transport: &T,
    repos: &[SourceDescriptor],
    query: &Query,
    config: &PipelineConfig,
) -> Result<AggregateReport, DigestError> {
    let ranking = Ranking::by_date_then(ISSUE_SECONDARY_KEY);
    let mut report = run_pipeline(transport, repos, query, config, ranking).await?;

    let mode = IssueMode::for_query(query);
    report.mode = Some(mode.as_str().to_owned());
    match mode {
        IssueMode::Search(text) => report.search_query = Some(text),
        IssueMode::Digest { days } => report.days = Some(days),
    }
    Ok(report)
}
