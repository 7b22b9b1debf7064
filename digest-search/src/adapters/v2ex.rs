//! V2EX via the sov2ex full-text index. V2EX's own API has no search.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceOutput};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// Topic page prefix; the topic id is appended.
pub const TOPIC_URL: &str = "https://www.v2ex.com/t/";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_score", default)]
    score: Option<f64>,
    #[serde(rename = "_source", default)]
    source: Option<Topic>,
}

#[derive(Debug, Deserialize)]
struct Topic {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    member: Option<String>,
    #[serde(default)]
    created: Option<String>,
    #[serde(default)]
    replies: Option<f64>,
}

impl Topic {
    /// The index serves ids as numbers, occasionally as strings.
    fn id(&self) -> Option<String> {
        match &self.id {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

/// V2EX adapter.
pub struct V2exAdapter;

impl SourceAdapter for V2exAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        let text = query.require_text()?;
        let base = config.v2ex_search_api.trim_end_matches('/');
        let size = config.max_results.to_string();
        let url = Url::parse_with_params(
            &format!("{base}/search"),
            &[("q", text), ("size", size.as_str())],
        )
        .map_err(|e| DigestError::Config(format!("invalid V2EX index URL: {e}")))?;

        tracing::trace!(query = text, "v2ex search");

        let body = transport.fetch(&FetchRequest::get(url.as_str())).await?;
        let records = parse_hits(&body, source, config.max_results)?;
        Ok(SourceOutput::from_records(records))
    }

    fn name(&self) -> &'static str {
        "v2ex"
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
            let topic = hit.source?;
            let id = topic.id()?;
            let mut record = Record::new(
                source,
                topic.title.unwrap_or_default(),
                format!("{TOPIC_URL}{id}"),
                clean_snippet(topic.content.as_deref().unwrap_or_default(), limit),
            );
            record.score = hit.score.unwrap_or(0.0);
            record.author = topic.member.filter(|m| !m.is_empty());
            record.published_at = topic.created.as_deref().and_then(normalize_date);
            record
                .extra
                .insert("reply_count".into(), topic.replies.unwrap_or(0.0));
            Some(record)
        })
        .take(max_results)
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;
    use crate::types::SourceKind;

    const BODY: &str = r#"{"total": 3, "hits": [
        {"_score": 12.5, "_source": {"id": 1000001, "title": "Rust 入门", "content": "求推荐教程", "member": "alice", "created": "2024-01-02T08:00:00", "replies": 14}},
        {"_score": 9.0, "_source": {"id": "1000002", "title": "second", "content": "", "member": ""}},
        {"_score": 1.0, "_source": {"title": "no id"}}
    ]}"#;

    fn source() -> SourceDescriptor {
        SourceDescriptor::new(SourceKind::V2ex, "https://v2ex.com")
    }

    #[test]
    fn hits_read_from_nested_source() {
        let records = parse_hits(BODY, &source(), 20).expect("parse");
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.url, "https://www.v2ex.com/t/1000001");
        assert_eq!(first.title, "Rust 入门");
        assert!((first.score - 12.5).abs() < f64::EPSILON);
        assert_eq!(first.author.as_deref(), Some("alice"));
        assert_eq!(first.published_at.as_deref(), Some("2024-01-02T08:00:00Z"));
        assert!((first.extra_value("reply_count") - 14.0).abs() < f64::EPSILON);
        assert_eq!(first.source_label, "V2EX");
        assert_eq!(first.source_type, "v2ex");
    }

    #[test]
    fn string_id_and_empty_member() {
        let records = parse_hits(BODY, &source(), 20).expect("parse");
        assert_eq!(records[1].url, "https://www.v2ex.com/t/1000002");
        assert!(records[1].author.is_none());
        assert!(records[1].published_at.is_none());
    }

    #[test]
    fn cap_applies() {
        assert_eq!(parse_hits(BODY, &source(), 1).expect("parse").len(), 1);
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let err = parse_hits("<html>", &source(), 5).unwrap_err();
        assert!(matches!(err, DigestError::Parse(_)));
    }

    #[tokio::test]
    async fn query_is_encoded() {
        let transport = MockTransport::new().with_body("sov2ex.com/api/search", BODY);
        let output = V2exAdapter
            .fetch(
                &transport,
                &source(),
                &Query::search("rust async"),
                &PipelineConfig::default(),
            )
            .await
            .expect("fetch");
        assert_eq!(output.records.len(), 2);
        let url = &transport.requests()[0].url;
        assert!(url.contains("q=rust+async"));
        assert!(url.contains("size=10"));
    }
}
