//! Core types: source descriptors, normalised records, and per-source outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kinds of source a pipeline can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A hosted web-search API (Tavily or Exa style).
    WebSearchEngine,
    /// An RSS 2.0 feed.
    RssFeed,
    /// An Atom feed.
    AtomFeed,
    /// A Discourse forum's `search.json` endpoint.
    DiscourseForum,
    /// Hacker News via the public Algolia index.
    HackerNews,
    /// V2EX via the third-party sov2ex full-text index.
    V2ex,
    /// GitHub issues for one repository.
    IssueTracker,
}

impl SourceKind {
    /// Returns the machine name recorded as `source_type` on records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSearchEngine => "web_search",
            Self::RssFeed => "rss",
            Self::AtomFeed => "atom",
            Self::DiscourseForum => "discourse",
            Self::HackerNews => "hackernews",
            Self::V2ex => "v2ex",
            Self::IssueTracker => "issue_tracker",
        }
    }

    /// Returns the label used when a descriptor has no display name and the
    /// source itself does not supply one.
    pub fn default_label(&self) -> Option<&'static str> {
        match self {
            Self::HackerNews => Some("Hacker News"),
            Self::V2ex => Some("V2EX"),
            _ => None,
        }
    }

    /// Maximum characters kept in a record's `content` for this kind.
    ///
    /// Search engines and forums return short blurbs; feeds and issues
    /// carry longer bodies.
    pub fn content_limit(&self) -> usize {
        match self {
            Self::WebSearchEngine | Self::DiscourseForum | Self::HackerNews | Self::V2ex => 500,
            Self::RssFeed | Self::AtomFeed | Self::IssueTracker => 800,
        }
    }

    /// Parses a kind from a config string such as `"discourse"` or `"rss"`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "web_search" | "websearch" | "search" | "tavily" | "exa" => Some(Self::WebSearchEngine),
            "rss" => Some(Self::RssFeed),
            "atom" => Some(Self::AtomFeed),
            "feed" => Some(Self::RssFeed),
            "discourse" => Some(Self::DiscourseForum),
            "hackernews" | "hn" => Some(Self::HackerNews),
            "v2ex" => Some(Self::V2ex),
            "github" | "issues" | "issue_tracker" => Some(Self::IssueTracker),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one adapter invocation. Immutable once built.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Which adapter handles this source.
    pub kind: SourceKind,
    /// Base URL, feed URL, API URL, or `owner/repo` identifier.
    pub endpoint: String,
    /// Opaque pre-obtained credential (API key or bearer token).
    #[serde(skip_serializing, default)]
    pub credential: Option<String>,
    /// Optional label override for records from this source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl SourceDescriptor {
    /// Creates a descriptor with no credential and no display name.
    pub fn new(kind: SourceKind, endpoint: impl Into<String>) -> Self {
        Self {
            kind,
            endpoint: endpoint.into(),
            credential: None,
            display_name: None,
        }
    }

    /// Attaches a credential.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Attaches a display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Label for records: display name, then the kind's default, then the
    /// endpoint itself.
    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.kind.default_label().map(str::to_owned))
            .unwrap_or_else(|| self.endpoint.clone())
    }
}

// Hand-written so credentials never reach logs.
impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// The common normalised unit emitted by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    /// Required; the deduplication key.
    pub url: String,
    /// HTML-stripped and truncated to the source kind's content limit.
    pub content: String,
    /// Adapter-defined relevance or popularity signal, 0 when absent.
    pub score: f64,
    pub source_label: String,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// RFC 3339 UTC when the source date parsed, otherwise the raw string.
    ///
    /// Ranking compares this field as a string, so a mix of parsed and raw
    /// values can sort out of chronological order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    /// Source-specific secondary signals (reactions, comments, ...).
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
    /// Categories or labels carried by the source, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Record {
    /// Creates a record with empty optional fields for `source`.
    pub fn new(
        source: &SourceDescriptor,
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
            score: 0.0,
            source_label: source.label(),
            source_type: source.kind.as_str().to_owned(),
            author: None,
            published_at: None,
            extra: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    /// Reads a secondary signal, defaulting to 0.
    pub fn extra_value(&self, key: &str) -> f64 {
        self.extra.get(key).copied().unwrap_or(0.0)
    }
}

/// What a successful adapter call produces before it is wrapped into a
/// [`FetchResult`].
#[derive(Debug, Clone, Default)]
pub struct SourceOutput {
    pub records: Vec<Record>,
    /// Engine-level synthesized answer (web-search sources only).
    pub answer: Option<String>,
}

impl SourceOutput {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            answer: None,
        }
    }
}

/// Outcome of one adapter invocation.
///
/// `success == false` always comes with empty `records` and `Some(error)`.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub success: bool,
    pub records: Vec<Record>,
    pub error: Option<String>,
    pub source: SourceDescriptor,
    pub answer: Option<String>,
    /// Wall-clock time spent on this task in milliseconds.
    pub duration_ms: u64,
}

impl FetchResult {
    /// Wraps a successful adapter output.
    pub fn succeeded(source: SourceDescriptor, output: SourceOutput) -> Self {
        Self {
            success: true,
            records: output.records,
            error: None,
            source,
            answer: output.answer,
            duration_ms: 0,
        }
    }

    /// Builds a failed result; records are always empty.
    pub fn failed(source: SourceDescriptor, error: impl fmt::Display) -> Self {
        Self {
            success: false,
            records: Vec::new(),
            error: Some(error.to_string()),
            source,
            answer: None,
            duration_ms: 0,
        }
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}
