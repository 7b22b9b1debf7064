//! Hosted web-search APIs: Tavily-style and Exa-style.
//!
//! Both take one POST carrying the query and return a ranked hit list with
//! a native relevance score. Tavily can also return a synthesized answer,
//! which is attached to the source's output rather than to any record.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceOutput};
use serde::Deserialize;
use serde_json::json;
use url::Url;

/// Default Tavily search endpoint.
pub const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
/// Default Exa search endpoint.
pub const EXA_ENDPOINT: &str = "https://api.exa.ai/search";

const EXA_HOST: &str = "exa.ai";

/// Request/response dialect of a web-search endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebSearchApi {
    /// API key in the JSON body; optional synthesized answer.
    Tavily,
    /// API key in an `x-api-key` header; neural search.
    Exa,
}

impl WebSearchApi {
    /// Pick the dialect from the endpoint host: `exa.ai` and its
    /// subdomains speak Exa, anything else speaks Tavily.
    pub fn detect(endpoint: &str) -> Self {
        let host = Url::parse(endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_default();
        if host == EXA_HOST || host.ends_with(".exa.ai") {
            Self::Exa
        } else {
            Self::Tavily
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tavily => "tavily",
            Self::Exa => "exa",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyHit>,
}

#[derive(Debug, Deserialize)]
struct TavilyHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    published_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExaResponse {
    #[serde(default)]
    results: Vec<ExaHit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExaHit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    published_date: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// Web-search API adapter.
pub struct WebSearchAdapter;

impl SourceAdapter for WebSearchAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        let text = query.require_text()?;
        let api_key = source
            .credential
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DigestError::Config("web search requires an API key".into()))?;
        let api = WebSearchApi::detect(&source.endpoint);

        tracing::trace!(query = text, api = api.name(), "web search");

        let request = build_request(api, &source.endpoint, api_key, text, config.max_results);
        let body = transport.fetch(&request).await?;
        parse_response(api, &body, source, config.max_results)
    }

    fn name(&self) -> &'static str {
        "web_search"
    }
}

fn build_request(
    api: WebSearchApi,
    endpoint: &str,
    api_key: &str,
    query: &str,
    max_results: usize,
) -> FetchRequest {
    match api {
        WebSearchApi::Tavily => FetchRequest::post_json(
            endpoint,
            json!({
                "api_key": api_key,
                "query": query,
                "search_depth": "advanced",
                "include_answer": true,
                "include_raw_content": false,
                "max_results": max_results,
            }),
        ),
        WebSearchApi::Exa => FetchRequest::post_json(
            endpoint,
            json!({
                "query": query,
                "type": "neural",
                "useAutoprompt": true,
                "numResults": max_results,
                "contents": { "text": { "maxCharacters": 500 } },
            }),
        )
        .header("x-api-key", api_key),
    }
}

/// Parse a web-search API response body into records.
///
/// Extracted as a separate function for testability with canned JSON.
pub(crate) fn parse_response(
    api: WebSearchApi,
    body: &str,
    source: &SourceDescriptor,
    max_results: usize,
) -> Result<SourceOutput, DigestError> {
    let limit = source.kind.content_limit();
    let label = source
        .display_name
        .clone()
        .unwrap_or_else(|| api.name().to_owned());

    let make = |title: Option<String>,
                url: Option<String>,
                content: Option<String>,
                score: Option<f64>,
                published: Option<String>| {
        let url = url.filter(|u| !u.is_empty())?;
        let mut record = Record::new(
            source,
            title.unwrap_or_default(),
            url,
            clean_snippet(content.as_deref().unwrap_or_default(), limit),
        );
        record.score = score.unwrap_or(0.0);
        record.source_label = label.clone();
        record.published_at = published.as_deref().and_then(normalize_date);
        Some(record)
    };

    match api {
        WebSearchApi::Tavily => {
            let parsed: TavilyResponse = serde_json::from_str(body)?;
            let records = parsed
                .results
                .into_iter()
                .filter_map(|hit| make(hit.title, hit.url, hit.content, hit.score, hit.published_date))
                .take(max_results)
                .collect();
            Ok(SourceOutput {
                records,
                answer: parsed.answer.filter(|a| !a.is_empty()),
            })
        }
        WebSearchApi::Exa => {
            let parsed: ExaResponse = serde_json::from_str(body)?;
            let records = parsed
                .results
                .into_iter()
                .filter_map(|hit| {
                    let author = hit.author.clone().filter(|a| !a.is_empty());
                    let mut record = make(hit.title, hit.url, hit.text, hit.score, hit.published_date)?;
                    record.author = author;
                    Some(record)
                })
                .take(max_results)
                .collect();
            Ok(SourceOutput::from_records(records))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Method;
    use crate::test_utils::MockTransport;
    use crate::types::SourceKind;

    fn tavily_source() -> SourceDescriptor {
        SourceDescriptor::new(SourceKind::WebSearchEngine, TAVILY_ENDPOINT).with_credential("tvly-key")
    }

    const TAVILY_BODY: &str = r#"{
        "answer": "Rust is a systems language.",
        "results": [
            {"title": "Rust", "url": "https://rust-lang.org", "content": "<b>Fast</b> and safe", "score": 0.92, "published_date": "2024-01-02T10:00:00Z"},
            {"title": "No URL", "content": "dropped"},
            {"title": "Book", "url": "https://doc.rust-lang.org/book", "content": "The book"}
        ]
    }"#;

    #[test]
    fn detect_dialect_from_host() {
        assert_eq!(WebSearchApi::detect(TAVILY_ENDPOINT), WebSearchApi::Tavily);
        assert_eq!(WebSearchApi::detect(EXA_ENDPOINT), WebSearchApi::Exa);
        assert_eq!(WebSearchApi::detect("http://127.0.0.1:9/search"), WebSearchApi::Tavily);
    }

    #[test]
    fn hosts_merely_containing_exa_speak_tavily() {
        assert_eq!(WebSearchApi::detect("https://api.hexagon.dev/search"), WebSearchApi::Tavily);
        assert_eq!(WebSearchApi::detect("https://texas.example/search"), WebSearchApi::Tavily);
        assert_eq!(WebSearchApi::detect("https://exa.ai.evil.test/search"), WebSearchApi::Tavily);
        assert_eq!(WebSearchApi::detect("https://EXA.AI/search"), WebSearchApi::Exa);
        assert_eq!(WebSearchApi::detect("not a url"), WebSearchApi::Tavily);
    }

    #[test]
    fn tavily_hits_map_to_records() {
        let output = parse_response(WebSearchApi::Tavily, TAVILY_BODY, &tavily_source(), 10)
            .expect("parse");
        assert_eq!(output.records.len(), 2);
        let first = &output.records[0];
        assert_eq!(first.content, "Fast and safe");
        assert!((first.score - 0.92).abs() < f64::EPSILON);
        assert_eq!(first.source_label, "tavily");
        assert_eq!(first.source_type, "web_search");
        assert_eq!(first.published_at.as_deref(), Some("2024-01-02T10:00:00Z"));
        assert!(output.records[1].score.abs() < f64::EPSILON);
        assert_eq!(output.answer.as_deref(), Some("Rust is a systems language."));
    }

    #[test]
    fn content_truncated_to_500_chars() {
        let long = "y".repeat(700);
        let body = format!(r#"{{"results":[{{"title":"t","url":"https://a.test","content":"{long}"}}]}}"#);
        let output = parse_response(WebSearchApi::Tavily, &body, &tavily_source(), 10).expect("parse");
        assert_eq!(output.records[0].content.chars().count(), 500);
    }

    #[test]
    fn max_results_caps_records() {
        let output = parse_response(WebSearchApi::Tavily, TAVILY_BODY, &tavily_source(), 1)
            .expect("parse");
        assert_eq!(output.records.len(), 1);
    }

    #[test]
    fn exa_hits_map_to_records() {
        let body = r#"{"results":[{"title":"Exa","url":"https://exa.test/1","text":"neural","score":0.5,"publishedDate":"2024-02-01T00:00:00.000Z","author":"Ann"}]}"#;
        let source = SourceDescriptor::new(SourceKind::WebSearchEngine, EXA_ENDPOINT)
            .with_credential("k")
            .with_display_name("Exa");
        let output = parse_response(WebSearchApi::Exa, body, &source, 10).expect("parse");
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].author.as_deref(), Some("Ann"));
        assert_eq!(output.records[0].source_label, "Exa");
        assert!(output.answer.is_none());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_response(WebSearchApi::Tavily, "<html>", &tavily_source(), 10).unwrap_err();
        assert!(matches!(err, DigestError::Parse(_)));
    }

    #[tokio::test]
    async fn tavily_request_carries_key_in_body() {
        let transport = MockTransport::new().with_body("api.tavily.com", TAVILY_BODY);
        let output = WebSearchAdapter
            .fetch(&transport, &tavily_source(), &Query::search("rust"), &PipelineConfig::default())
            .await
            .expect("fetch");
        assert_eq!(output.records.len(), 2);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        let body = requests[0].body.as_ref().expect("json body");
        assert_eq!(body["api_key"], "tvly-key");
        assert_eq!(body["query"], "rust");
        assert_eq!(body["include_answer"], true);
    }

    #[tokio::test]
    async fn exa_request_carries_key_in_header() {
        let source = SourceDescriptor::new(SourceKind::WebSearchEngine, EXA_ENDPOINT).with_credential("exa-key");
        let transport = MockTransport::new().with_body("api.exa.ai", r#"{"results":[]}"#);
        let output = WebSearchAdapter
            .fetch(&transport, &source, &Query::search("rust"), &PipelineConfig::default())
            .await
            .expect("fetch");
        assert!(output.records.is_empty());
        let requests = transport.requests();
        assert!(requests[0]
            .headers
            .iter()
            .any(|(k, v)| k == "x-api-key" && v == "exa-key"));
        let body = requests[0].body.as_ref().expect("json body");
        assert!(body.get("api_key").is_none());
    }

    #[tokio::test]
    async fn missing_key_is_config_error() {
        let source = SourceDescriptor::new(SourceKind::WebSearchEngine, TAVILY_ENDPOINT);
        let err = WebSearchAdapter
            .fetch(&MockTransport::new(), &source, &Query::search("rust"), &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_config());
    }
}
