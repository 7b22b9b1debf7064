//! The three digest commands, expressed over any [`Transport`].

use std::io::Write;

use digest_search::orchestrator::{run_feeds, run_issues, run_search};
use digest_search::{AggregateReport, Transport};

use crate::config::DigestConfig;
use crate::error::{AppError, Result};

/// Pooled search across configured search APIs and sites.
///
/// # Errors
///
/// Returns [`AppError::Config`] or a configuration [`AppError::Search`]
/// when nothing can run.
pub async fn search<T: Transport>(
    transport: &T,
    config: &DigestConfig,
    query: &str,
) -> Result<AggregateReport> {
    let sources = config.search_sources()?;
    let report = run_search(transport, query, &sources, &config.pipeline_config()).await?;
    Ok(report)
}

/// Feed digest, filtered by `[feeds_filter] keywords`.
///
/// # Errors
///
/// Same as [`search`].
pub async fn feeds<T: Transport>(transport: &T, config: &DigestConfig) -> Result<AggregateReport> {
    let report = run_feeds(
        transport,
        &config.feed_sources(),
        &config.feeds_filter.keywords,
        &config.pipeline_config(),
    )
    .await?;
    Ok(report)
}

/// Issue search or digest across `[[repos]]`.
///
/// # Errors
///
/// Same as [`search`].
pub async fn issues<T: Transport>(
    transport: &T,
    config: &DigestConfig,
    token: Option<&str>,
) -> Result<AggregateReport> {
    let report = run_issues(
        transport,
        &config.issue_sources(token),
        &config.issue_query(),
        &config.pipeline_config(),
    )
    .await?;
    Ok(report)
}

/// Write `report` as pretty JSON followed by a newline.
///
/// # Errors
///
/// Returns [`AppError::Output`] if serialisation or the write fails.
pub fn write_report<W: Write>(report: &AggregateReport, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, report)
        .map_err(|e| AppError::Output(format!("failed to serialise report: {e}")))?;
    writeln!(out).map_err(|e| AppError::Output(e.to_string()))?;
    out.flush().map_err(|e| AppError::Output(e.to_string()))
}
