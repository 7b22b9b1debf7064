//! GitHub issues for one repository.
//!
//! Two modes, picked by the query: **search** (keyword plus `repo:` and
//! `is:issue` qualifiers, newest first) when the query carries text, and
//! **digest** (open issues updated within the last `days` days) otherwise.
//! The list endpoint mixes pull requests in with issues; they are dropped.
//!
//! Issues carry no relevance score. Ranking uses `extra.reactions` (the sum
//! of `+1`, `heart`, `hooray`, `rocket`) as the secondary key instead.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceOutput};
use chrono::{Duration, SecondsFormat, Utc};
use serde::Deserialize;
use url::Url;

const ACCEPT: &str = "application/vnd.github.v3+json";
const SEARCH_PAGE_SIZE: &str = "50";
const LIST_PAGE_SIZE: &str = "100";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    number: Option<f64>,
    #[serde(default)]
    comments: Option<f64>,
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    reactions: Option<Reactions>,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct User {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Reactions {
    #[serde(rename = "+1", default)]
    plus_one: f64,
    #[serde(default)]
    heart: f64,
    #[serde(default)]
    hooray: f64,
    #[serde(default)]
    rocket: f64,
}

impl Reactions {
    fn total(&self) -> f64 {
        self.plus_one + self.heart + self.hooray + self.rocket
    }
}

/// Which endpoint a call hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueMode {
    Search(String),
    Digest { days: u32 },
}

impl IssueMode {
    /// Search when the query has text, digest otherwise.
    pub fn for_query(query: &Query) -> Self {
        match query.require_text() {
            Ok(text) => Self::Search(text.to_owned()),
            Err(_) => Self::Digest { days: query.days },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Digest { .. } => "digest",
        }
    }
}

/// Checks that `repo` looks like `owner/name`.
///
/// # Errors
///
/// Returns [`DigestError::Config`] otherwise.
pub fn validate_repo(repo: &str) -> Result<(), DigestError> {
    let mut parts = repo.split('/');
    let well_formed = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(owner), Some(name), None)
            if !owner.is_empty()
                && !name.is_empty()
                && !repo.chars().any(char::is_whitespace)
    );
    if well_formed {
        Ok(())
    } else {
        Err(DigestError::Config(format!(
            "issue tracker endpoint must be owner/repo, got {repo:?}"
        )))
    }
}

/// Cutoff for a digest over the last `days` days, RFC 3339 UTC.
///
/// # Errors
///
/// Returns [`DigestError::Config`] when the window reaches past the
/// representable date range.
pub fn digest_since(days: u32) -> Result<String, DigestError> {
    Duration::try_days(i64::from(days))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .map(|since| since.to_rfc3339_opts(SecondsFormat::Secs, true))
        .ok_or_else(|| DigestError::Config(format!("digest window of {days} days is out of range")))
}

/// Builds the request URL for `mode` against `repo`.
///
/// # Errors
///
/// Returns [`DigestError::Config`] if the API base is not a valid URL or
/// the digest window is out of range.
pub fn request_url(api_base: &str, repo: &str, mode: &IssueMode) -> Result<Url, DigestError> {
    let base = api_base.trim_end_matches('/');
    let parsed = match mode {
        IssueMode::Search(text) => Url::parse_with_params(
            &format!("{base}/search/issues"),
            &[
                ("q", format!("{text} repo:{repo} is:issue").as_str()),
                ("sort", "created"),
                ("order", "desc"),
                ("per_page", SEARCH_PAGE_SIZE),
            ],
        ),
        IssueMode::Digest { days } => {
            let since = digest_since(*days)?;
            Url::parse_with_params(
                &format!("{base}/repos/{repo}/issues"),
                &[
                    ("state", "open"),
                    ("sort", "created"),
                    ("direction", "desc"),
                    ("per_page", LIST_PAGE_SIZE),
                    ("since", since.as_str()),
                ],
            )
        }
    };
    parsed.map_err(|e| DigestError::Config(format!("invalid issue tracker API URL: {e}")))
}

/// GitHub issue tracker adapter.
pub struct IssueTrackerAdapter;

impl SourceAdapter for IssueTrackerAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        let repo = source.endpoint.trim();
        validate_repo(repo)?;
        let mode = IssueMode::for_query(query);
        let url = request_url(&config.github_api, repo, &mode)?;

        tracing::trace!(repo, mode = mode.as_str(), "issue tracker request");

        let mut request = FetchRequest::get(url.as_str()).header("Accept", ACCEPT);
        // Anonymous calls work, just under a lower rate ceiling.
        if let Some(token) = source.credential.as_deref().filter(|t| !t.is_empty()) {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let body = transport.fetch(&request).await?;
        let issues = match mode {
            IssueMode::Search(_) => serde_json::from_str::<SearchResponse>(&body)?.items,
            IssueMode::Digest { .. } => serde_json::from_str::<Vec<Issue>>(&body)?,
        };
        Ok(SourceOutput::from_records(to_records(
            issues,
            source,
            config.max_results,
        )))
    }

    fn name(&self) -> &'static str {
        "issue_tracker"
    }
}

fn to_records(issues: Vec<Issue>, source: &SourceDescriptor, max_results: usize) -> Vec<Record> {
    let limit = source.kind.content_limit();
    issues
        .into_iter()
        .filter(|issue| issue.pull_request.is_none())
        .filter_map(|issue| {
            let url = issue.html_url.filter(|u| !u.is_empty())?;
            let mut record = Record::new(
                source,
                issue.title.unwrap_or_default(),
                url,
                clean_snippet(issue.body.as_deref().unwrap_or_default(), limit),
            );
            record.author = issue
                .user
                .and_then(|u| u.login)
                .filter(|login| !login.is_empty());
            record.published_at = issue.created_at.as_deref().and_then(normalize_date);
            record.tags = issue
                .labels
                .into_iter()
                .filter_map(|l| l.name)
                .filter(|n| !n.is_empty())
                .collect();
            record.extra.insert(
                "reactions".into(),
                issue.reactions.unwrap_or_default().total(),
            );
            record
                .extra
                .insert("comments".into(), issue.comments.unwrap_or(0.0));
            if let Some(number) = issue.number {
                record.extra.insert("issue_number".into(), number);
            }
            Some(record)
        })
        .take(max_results)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;
    use crate::types::SourceKind;

    const LIST_BODY: &str = r#"[
        {"number": 12, "title": "Crash on start", "html_url": "https://github.com/acme/tool/issues/12",
         "body": "<p>Steps</p>", "created_at": "2024-01-02T10:00:00Z", "comments": 3,
         "user": {"login": "ann"}, "labels": [{"name": "bug"}, {"name": "p1"}],
         "reactions": {"+1": 4, "-1": 9, "heart": 1, "hooray": 0, "rocket": 2, "total_count": 16}},
        {"number": 13, "title": "Add flag", "html_url": "https://github.com/acme/tool/pull/13",
         "created_at": "2024-01-03T10:00:00Z", "pull_request": {"url": "https://api.github.com/x"}},
        {"number": 14, "title": "Docs typo", "html_url": "https://github.com/acme/tool/issues/14",
         "body": null, "created_at": "2024-01-01T10:00:00Z", "comments": 0, "user": null}
    ]"#;

    fn source() -> SourceDescriptor {
        SourceDescriptor::new(SourceKind::IssueTracker, "acme/tool")
    }

    #[tokio::test]
    async fn digest_excludes_pull_requests() {
        let transport = MockTransport::new().with_body("/repos/acme/tool/issues", LIST_BODY);
        let config = PipelineConfig {
            max_results: 50,
            ..Default::default()
        };
        let output = IssueTrackerAdapter
            .fetch(&transport, &source(), &Query::digest(7), &config)
            .await
            .expect("fetch");
        assert_eq!(output.records.len(), 2);
        assert!(output.records.iter().all(|r| !r.url.contains("/pull/")));

        let first = &output.records[0];
        assert!((first.extra_value("reactions") - 7.0).abs() < f64::EPSILON);
        assert!((first.extra_value("comments") - 3.0).abs() < f64::EPSILON);
        assert!((first.extra_value("issue_number") - 12.0).abs() < f64::EPSILON);
        assert_eq!(first.tags, vec!["bug", "p1"]);
        assert_eq!(first.author.as_deref(), Some("ann"));
        assert_eq!(first.content, "Steps");
        assert!(first.score.abs() < f64::EPSILON);
        assert_eq!(first.source_label, "acme/tool");

        let request = &transport.requests()[0];
        assert!(request.url.contains("state=open"));
        assert!(request.url.contains("since="));
        assert!(!request.headers.iter().any(|(k, _)| k == "Authorization"));
    }

    #[tokio::test]
    async fn search_mode_reads_items_and_sends_token() {
        let body = format!(r#"{{"total_count": 3, "items": {LIST_BODY}}}"#);
        let transport = MockTransport::new().with_body("/search/issues", body);
        let source = source().with_credential("ghp_secret");
        let output = IssueTrackerAdapter
            .fetch(&transport, &source, &Query::search("crash"), &PipelineConfig::default())
            .await
            .expect("fetch");
        assert_eq!(output.records.len(), 2);

        let request = &transport.requests()[0];
        assert!(request.url.contains("q=crash+repo%3Aacme%2Ftool+is%3Aissue"));
        assert!(request
            .headers
            .contains(&("Authorization".to_owned(), "Bearer ghp_secret".to_owned())));
        assert!(request
            .headers
            .contains(&("Accept".to_owned(), ACCEPT.to_owned())));
    }

    #[tokio::test]
    async fn malformed_repo_is_config_error() {
        let transport = MockTransport::new();
        let bad = SourceDescriptor::new(SourceKind::IssueTracker, "https://github.com/acme/tool");
        let err = IssueTrackerAdapter
            .fetch(&transport, &bad, &Query::digest(7), &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_config());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn repo_shape() {
        assert!(validate_repo("rust-lang/rust").is_ok());
        assert!(validate_repo("rust-lang").is_err());
        assert!(validate_repo("/rust").is_err());
        assert!(validate_repo("a/b/c").is_err());
        assert!(validate_repo("a /b").is_err());
    }

    #[test]
    fn mode_follows_query() {
        assert_eq!(IssueMode::for_query(&Query::digest(3)), IssueMode::Digest { days: 3 });
        assert_eq!(
            IssueMode::for_query(&Query::search("leak")),
            IssueMode::Search("leak".into())
        );
        assert_eq!(IssueMode::Digest { days: 1 }.as_str(), "digest");
    }

    #[test]
    fn digest_since_rejects_out_of_range_window() {
        assert!(digest_since(7).is_ok_and(|since| since.ends_with('Z')));
        let err = digest_since(200_000_000).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("out of range"));
    }

    #[tokio::test]
    async fn huge_digest_window_fails_without_request() {
        let transport = MockTransport::new().with_body("/repos/acme/tool/issues", LIST_BODY);
        let err = IssueTrackerAdapter
            .fetch(&transport, &source(), &Query::digest(u32::MAX), &PipelineConfig::default())
            .await
            .unwrap_err();
        assert!(err.is_config());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn missing_reactions_count_as_zero() {
        let issues: Vec<Issue> = serde_json::from_str(LIST_BODY).expect("json");
        let records = to_records(issues, &source(), 10);
        assert!(records[1].extra_value("reactions").abs() < f64::EPSILON);
        assert!(records[1].author.is_none());
        assert_eq!(records[1].content, "");
    }
}
