//! Hacker News via the public Algolia search-by-relevance index.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceOutput};
use serde::Deserialize;
use url::Url;

/// Canonical item page, used when a hit has no external URL.
pub const ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID", default)]
    object_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    story_title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    comment_text: Option<String>,
    #[serde(default)]
    story_text: Option<String>,
    #[serde(default)]
    points: Option<f64>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    num_comments: Option<f64>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Hacker News adapter.
pub struct HackerNewsAdapter;

impl SourceAdapter for HackerNewsAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        let text = query.require_text()?;
        let base = config.hackernews_api.trim_end_matches('/');
        let hits_per_page = config.max_results.to_string();
        let url = Url::parse_with_params(
            &format!("{base}/search"),
            &[("query", text), ("hitsPerPage", hits_per_page.as_str())],
        )
        .map_err(|e| DigestError::Config(format!("invalid Hacker News API URL: {e}")))?;

        tracing::trace!(query = text, "hacker news search");

        let body = transport.fetch(&FetchRequest::get(url.as_str())).await?;
        let records = parse_hits(&body, source, config.max_results)?;
        Ok(SourceOutput::from_records(records))
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}

pub(crate) fn parse_hits(
    body: &str,
    source: &SourceDescriptor,
    max_results: usize,
) -> Result<Vec<Record>, DigestError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let limit = source.kind.content_limit();

    let records = response
        .hits
        .into_iter()
        .filter_map(|hit| {
            let object_id = non_empty(hit.object_id);
            let url = non_empty(hit.url)
                .or_else(|| object_id.as_ref().map(|id| format!("{ITEM_URL}{id}")))?;
            let title = non_empty(hit.title)
                .or(non_empty(hit.story_title))
                .unwrap_or_default();
            let content = non_empty(hit.comment_text)
                .or(non_empty(hit.story_text))
                .unwrap_or_default();

            let mut record = Record::new(source, title, url, clean_snippet(&content, limit));
            record.score = hit.points.unwrap_or(0.0);
            record.author = non_empty(hit.author);
            record.published_at = hit.created_at.as_deref().and_then(normalize_date);
            record
                .extra
                .insert("num_comments".into(), hit.num_comments.unwrap_or(0.0));
            Some(record)
        })
        .take(max_results)
        .collect();
    Ok(records)
}
