//! Discourse forums via `search.json`.
//!
//! One GET returns parallel `topics` and `posts` arrays. Each post points
//! at its topic by id; the topic supplies title, slug, creation date and
//! engagement counts, the post supplies blurb, author and relevance score.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceOutput};
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    topics: Vec<Topic>,
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    reply_count: Option<f64>,
    #[serde(default)]
    like_count: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    topic_id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    blurb: Option<String>,
    #[serde(default)]
    score: Option<f64>,
}

/// Discourse forum adapter.
pub struct DiscourseAdapter;

impl SourceAdapter for DiscourseAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        let text = query.require_text()?;
        let base = source.endpoint.trim_end_matches('/');
        let url = search_url(base, text)?;

        tracing::trace!(query = text, site = base, "discourse search");

        let body = transport
            .fetch(&FetchRequest::get(url).header("Accept", "application/json"))
            .await?;
        let records = parse_search(&body, base, source, config.max_results)?;
        Ok(SourceOutput::from_records(records))
    }

    fn name(&self) -> &'static str {
        "discourse"
    }
}

fn search_url(base: &str, query: &str) -> Result<String, DigestError> {
    let url = Url::parse_with_params(&format!("{base}/search.json"), &[("q", query)])
        .map_err(|e| DigestError::Config(format!("invalid forum URL {base:?}: {e}")))?;
    Ok(url.into())
}

/// Join posts to their topics and build one record per post.
pub(crate) fn parse_search(
    body: &str,
    base: &str,
    source: &SourceDescriptor,
    max_results: usize,
) -> Result<Vec<Record>, DigestError> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let topics: HashMap<u64, &Topic> = response.topics.iter().map(|t| (t.id, t)).collect();
    let limit = source.kind.content_limit();

    let records = response
        .posts
        .iter()
        .take(max_results)
        .filter_map(|post| {
            let topic_id = post.topic_id?;
            let topic = topics.get(&topic_id).copied();

            let title = topic
                .and_then(|t| t.title.clone())
                .or_else(|| post.name.clone())
                .unwrap_or_default();
            let slug = topic
                .and_then(|t| t.slug.as_deref())
                .filter(|s| !s.is_empty())
                .unwrap_or("topic");
            let url = format!("{base}/t/{slug}/{topic_id}");

            let mut record = Record::new(
                source,
                title,
                url,
                clean_snippet(post.blurb.as_deref().unwrap_or_default(), limit),
            );
            record.score = post.score.unwrap_or(0.0);
            record.author = post.username.clone().filter(|u| !u.is_empty());
            record.published_at = topic
                .and_then(|t| t.created_at.as_deref())
                .and_then(normalize_date);
            record.extra.insert(
                "reply_count".into(),
                topic.and_then(|t| t.reply_count).unwrap_or(0.0),
            );
            record.extra.insert(
                "like_count".into(),
                topic.and_then(|t| t.like_count).unwrap_or(0.0),
            );
            Some(record)
        })
        .collect();
    Ok(records)
}
