//! Report assembly: per-source summaries plus the merged, ranked list.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::types::{FetchResult, Record, SourceKind};

use super::dedup::deduplicate;
use super::ranking::Ranking;

/// Outcome of one source as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    /// Feed URL, site base, API endpoint or `owner/repo`.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: SourceKind,
    pub success: bool,
    /// Records this source returned, before deduplication.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    pub duration_ms: u64,
}

impl From<&FetchResult> for SourceSummary {
    fn from(result: &FetchResult) -> Self {
        Self {
            source: result.source.endpoint.clone(),
            name: result.source.display_name.clone(),
            kind: result.source.kind,
            success: result.success,
            count: result.records.len(),
            error: result.error.clone(),
            answer: result.answer.clone(),
            duration_ms: result.duration_ms,
        }
    }
}

/// The final output of a pipeline run.
///
/// `total_count` always equals `merged.len()`. Optional fields describe
/// which pipeline produced the report and are omitted when unset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// RFC 3339 UTC time the report was assembled.
    pub fetched_at: String,
    /// Issue-tracker mode: `search` or `digest`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
    /// Look-back window of an issue digest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    /// Lowercased keywords a feed report was filtered by.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_applied: Option<Vec<String>>,
    pub ranking: Ranking,
    pub per_source: Vec<SourceSummary>,
    pub merged: Vec<Record>,
    pub total_count: usize,
}

impl AggregateReport {
    /// Number of sources that failed.
    pub fn failed_sources(&self) -> usize {
        self.per_source.iter().filter(|s| !s.success).count()
    }

    /// Drop merged records matching none of `keywords`.
    ///
    /// Matching is a case-insensitive substring test against the title and
    /// content. Blank keywords are ignored; when none remain the report is
    /// left untouched.
    #[must_use]
    pub fn with_keyword_filter(mut self, keywords: &[String]) -> Self {
        let keywords = normalize_keywords(keywords);
        if keywords.is_empty() {
            return self;
        }
        self.merged.retain(|record| matches_keywords(record, &keywords));
        self.total_count = self.merged.len();
        tracing::debug!(kept = self.total_count, ?keywords, "keyword filter applied");
        self.filter_applied = Some(keywords);
        self
    }
}

/// Merge, deduplicate and rank `results` into a report.
///
/// Records are concatenated in `results` order, so when two sources return
/// the same URL the earlier source's record is kept. Failed results carry
/// no records and only contribute their summary.
pub fn assemble(query: Option<&str>, results: &[FetchResult], ranking: Ranking) -> AggregateReport {
    let per_source: Vec<SourceSummary> = results.iter().map(SourceSummary::from).collect();

    let collected: Vec<Record> = results
        .iter()
        .filter(|r| r.success)
        .flat_map(|r| r.records.iter().cloned())
        .collect();
    let mut merged = deduplicate(collected);
    ranking.sort(&mut merged);

    AggregateReport {
        query: query.map(str::to_owned),
        fetched_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        mode: None,
        search_query: None,
        days: None,
        filter_applied: None,
        ranking,
        per_source,
        total_count: merged.len(),
        merged,
    }
}

fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn matches_keywords(record: &Record, keywords: &[String]) -> bool {
    let text = format!("{} {}", record.title, record.content).to_lowercase();
    keywords.iter().any(|k| text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceDescriptor, SourceOutput};

    fn source(kind: SourceKind, endpoint: &str) -> SourceDescriptor {
        SourceDescriptor::new(kind, endpoint)
    }

    fn record(source: &SourceDescriptor, url: &str, title: &str, score: f64) -> Record {
        let mut r = Record::new(source, title, url, "body text");
        r.score = score;
        r
    }

    fn ok(source: SourceDescriptor, records: Vec<Record>) -> FetchResult {
        FetchResult::succeeded(source, SourceOutput::from_records(records))
    }

    #[test]
    fn summaries_cover_every_source() {
        let web = source(SourceKind::WebSearchEngine, "https://api.tavily.com/search");
        let forum = source(SourceKind::DiscourseForum, "https://forum.test");
        let results = vec![
            ok(web.clone(), vec![record(&web, "https://a.test", "A", 0.9)]),
            FetchResult::failed(forum, "network error: refused"),
        ];
        let report = assemble(Some("q"), &results, Ranking::ByScore);
        assert_eq!(report.per_source.len(), 2);
        assert!(report.per_source[0].success);
        assert_eq!(report.per_source[0].count, 1);
        assert!(!report.per_source[1].success);
        assert_eq!(report.per_source[1].error.as_deref(), Some("network error: refused"));
        assert_eq!(report.failed_sources(), 1);
        assert_eq!(report.total_count, 1);
        assert_eq!(report.query.as_deref(), Some("q"));
    }

    #[test]
    fn duplicate_keeps_earlier_source() {
        let web = source(SourceKind::WebSearchEngine, "https://api.tavily.com/search");
        let forum = source(SourceKind::DiscourseForum, "https://forum.test");
        let results = vec![
            ok(web.clone(), vec![record(&web, "https://same.test", "web copy", 0.1)]),
            ok(forum.clone(), vec![record(&forum, "https://same.test", "forum copy", 50.0)]),
        ];
        let report = assemble(Some("q"), &results, Ranking::ByScore);
        assert_eq!(report.total_count, 1);
        assert_eq!(report.merged[0].title, "web copy");
        assert_eq!(report.per_source[1].count, 1);
    }

    #[test]
    fn merged_is_ranked() {
        let web = source(SourceKind::WebSearchEngine, "https://api.tavily.com/search");
        let results = vec![ok(
            web.clone(),
            vec![
                record(&web, "https://1.test", "low", 0.1),
                record(&web, "https://2.test", "high", 0.9),
            ],
        )];
        let report = assemble(None, &results, Ranking::ByScore);
        assert_eq!(report.merged[0].title, "high");
    }

    #[test]
    fn keyword_filter_is_case_insensitive_over_title_and_content() {
        let feed = source(SourceKind::RssFeed, "https://blog.test/feed");
        let mut in_content = record(&feed, "https://blog.test/2", "Weekly notes", 0.0);
        in_content.content = "Thoughts on TOKIO internals".into();
        let results = vec![ok(
            feed.clone(),
            vec![
                record(&feed, "https://blog.test/1", "Rust 2024 edition", 0.0),
                in_content,
                record(&feed, "https://blog.test/3", "Gardening", 0.0),
            ],
        )];
        let report = assemble(None, &results, Ranking::by_date())
            .with_keyword_filter(&[" RUST ".into(), "tokio".into(), String::new()]);
        assert_eq!(report.total_count, 2);
        assert_eq!(report.merged.len(), 2);
        assert_eq!(
            report.filter_applied,
            Some(vec!["rust".to_owned(), "tokio".to_owned()])
        );
        assert_eq!(report.per_source[0].count, 3);
    }

    #[test]
    fn blank_filter_leaves_report_untouched() {
        let feed = source(SourceKind::RssFeed, "https://blog.test/feed");
        let results = vec![ok(feed.clone(), vec![record(&feed, "https://blog.test/1", "x", 0.0)])];
        let report = assemble(None, &results, Ranking::by_date()).with_keyword_filter(&[" ".into()]);
        assert_eq!(report.total_count, 1);
        assert!(report.filter_applied.is_none());
    }

    #[test]
    fn serialises_without_unset_metadata() {
        let report = assemble(None, &[], Ranking::ByScore);
        let json = serde_json::to_value(&report).expect("json");
        assert!(json.get("mode").is_none());
        assert!(json.get("filter_applied").is_none());
        assert_eq!(json["total_count"], 0);
        assert_eq!(json["ranking"]["by"], "by_score");
        assert!(json["fetched_at"].as_str().is_some_and(|t| t.ends_with('Z')));
    }
}
