//! RSS 2.0 and Atom feeds.
//!
//! The format is detected from the root element (a root whose name
//! contains `feed` is Atom, anything else is read as RSS), so a descriptor's
//! `RssFeed`/`AtomFeed` kind is a hint, not a contract. All element lookups
//! go through [`NsAccessor`] bound to the namespace the document declares.

use crate::adapter::{Query, SourceAdapter};
use crate::config::PipelineConfig;
use crate::content::clean_snippet;
use crate::dates::normalize_date;
use crate::error::DigestError;
use crate::http::{FetchRequest, Transport};
use crate::types::{Record, SourceDescriptor, SourceKind, SourceOutput};
use crate::xml::{NsAccessor, XmlDocument, XmlElement};

/// Dublin Core namespace, used by RSS for `dc:creator`.
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// Syndication format detected from the root element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Atom,
}

impl FeedFormat {
    pub fn detect(document: &XmlDocument) -> Self {
        if document.root.name.to_ascii_lowercase().contains("feed") {
            Self::Atom
        } else {
            Self::Rss
        }
    }

    fn kind(self) -> SourceKind {
        match self {
            Self::Rss => SourceKind::RssFeed,
            Self::Atom => SourceKind::AtomFeed,
        }
    }
}

/// Feed adapter for both syndication formats.
pub struct FeedAdapter;

impl SourceAdapter for FeedAdapter {
    async fn fetch<T: Transport>(
        &self,
        transport: &T,
        source: &SourceDescriptor,
        _query: &Query,
        config: &PipelineConfig,
    ) -> Result<SourceOutput, DigestError> {
        tracing::trace!(url = %source.endpoint, "feed fetch");
        let body = transport.fetch(&FetchRequest::get(&source.endpoint)).await?;
        let records = parse_feed(&body, source, config.max_results)?;
        Ok(SourceOutput::from_records(records))
    }

    fn name(&self) -> &'static str {
        "feed"
    }
}

/// Parse a feed body into records, capped at `max_results`.
///
/// # Errors
///
/// Returns [`DigestError::Parse`] for malformed XML. An RSS root without
/// a `channel` element (RSS 1.0/RDF included) parses as an empty feed.
pub fn parse_feed(
    xml: &str,
    source: &SourceDescriptor,
    max_results: usize,
) -> Result<Vec<Record>, DigestError> {
    let document = XmlDocument::parse(xml)?;
    let format = FeedFormat::detect(&document);
    let ns = NsAccessor::for_document(&document);

    let mut records = match format {
        FeedFormat::Rss => parse_rss(&document.root, ns, source),
        FeedFormat::Atom => parse_atom(&document.root, ns, source),
    };
    records.truncate(max_results);

    tracing::debug!(url = %source.endpoint, format = ?format, count = records.len(), "feed parsed");
    Ok(records)
}

fn feed_label(source: &SourceDescriptor, feed_title: Option<String>) -> String {
    source
        .display_name
        .clone()
        .or(feed_title)
        .unwrap_or_else(|| source.endpoint.clone())
}

fn base_record(
    source: &SourceDescriptor,
    format: FeedFormat,
    label: &str,
    title: String,
    url: String,
    content: &str,
) -> Record {
    let kind = format.kind();
    let mut record = Record::new(source, title, url, clean_snippet(content, kind.content_limit()));
    record.source_label = label.to_owned();
    record.source_type = kind.as_str().to_owned();
    record
}

fn parse_rss(root: &XmlElement, ns: NsAccessor<'_>, source: &SourceDescriptor) -> Vec<Record> {
    let Some(channel) = ns.find(root, "channel") else {
        tracing::debug!(url = %source.endpoint, root = %root.name, "feed has no channel");
        return Vec::new();
    };
    let label = feed_label(source, ns.text(channel, "title"));
    let dc = NsAccessor::new(Some(DC_NAMESPACE));

    ns.children(channel, "item")
        .filter_map(|item| {
            let url = ns.text(item, "link")?;
            let mut record = base_record(
                source,
                FeedFormat::Rss,
                &label,
                ns.text(item, "title").unwrap_or_default(),
                url,
                &ns.text(item, "description").unwrap_or_default(),
            );
            record.published_at = ns.text(item, "pubDate").as_deref().and_then(normalize_date);
            record.author = dc.text(item, "creator");
            record.tags = ns
                .children(item, "category")
                .map(XmlElement::text)
                .filter(|t| !t.is_empty())
                .collect();
            Some(record)
        })
        .collect()
}

fn parse_atom(root: &XmlElement, ns: NsAccessor<'_>, source: &SourceDescriptor) -> Vec<Record> {
    let label = feed_label(source, ns.text(root, "title"));

    ns.children(root, "entry")
        .filter_map(|entry| {
            let url = atom_link(entry, ns)?;
            let content = ns
                .text(entry, "content")
                .or_else(|| ns.text(entry, "summary"))
                .unwrap_or_default();
            let date = ns
                .text(entry, "updated")
                .or_else(|| ns.text(entry, "published"));

            let mut record = base_record(
                source,
                FeedFormat::Atom,
                &label,
                ns.text(entry, "title").unwrap_or_default(),
                url,
                &content,
            );
            record.published_at = date.as_deref().and_then(normalize_date);
            record.author = ns.text(entry, "author/name");
            record.tags = ns
                .children(entry, "category")
                .filter_map(|c| c.attr("term"))
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect();
            Some(record)
        })
        .collect()
}

/// The entry's `rel="alternate"` link, or its first link with an `href`.
fn atom_link(entry: &XmlElement, ns: NsAccessor<'_>) -> Option<String> {
    let links: Vec<&XmlElement> = ns.children(entry, "link").collect();
    links
        .iter()
        .find(|l| l.attr("rel") == Some("alternate"))
        .or_else(|| links.first())
        .and_then(|l| l.attr("href"))
        .filter(|href| !href.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockTransport;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Example Blog</title>
    <item>
      <title>First post</title>
      <link>https://blog.example/1</link>
      <description>&lt;p&gt;Hello &lt;b&gt;world&lt;/b&gt;&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 10:00:00 +0000</pubDate>
      <category>rust</category>
      <category>async</category>
      <dc:creator>Ann</dc:creator>
    </item>
    <item>
      <title>No link</title>
    </item>
    <item>
      <title>Odd date</title>
      <link>https://blog.example/2</link>
      <pubDate>sometime in spring</pubDate>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Site</title>
  <entry>
    <title>Atom entry</title>
    <link rel="self" href="https://atom.example/self"/>
    <link rel="alternate" href="https://atom.example/1"/>
    <summary>short summary</summary>
    <content type="html">&lt;p&gt;Full content&lt;/p&gt;</content>
    <published>2024-01-01T09:00:00Z</published>
    <updated>2024-01-02T10:00:00Z</updated>
    <author><name>Bo</name></author>
    <category term="news"/>
  </entry>
  <entry>
    <title>Summary only</title>
    <link href="https://atom.example/2"/>
    <summary>just summary</summary>
    <published>2023-12-31T00:00:00Z</published>
  </entry>
</feed>"#;

    fn rss_source() -> SourceDescriptor {
        SourceDescriptor::new(SourceKind::RssFeed, "https://blog.example/feed")
    }

    #[test]
    fn rss_items_normalised() {
        let records = parse_feed(RSS, &rss_source(), 10).expect("parse");
        assert_eq!(records.len(), 2, "item without link dropped");
        let first = &records[0];
        assert_eq!(first.title, "First post");
        assert_eq!(first.url, "https://blog.example/1");
        assert_eq!(first.content, "Hello world");
        assert_eq!(first.published_at.as_deref(), Some("2024-01-01T10:00:00Z"));
        assert_eq!(first.tags, vec!["rust".to_string(), "async".to_string()]);
        assert_eq!(first.author.as_deref(), Some("Ann"));
        assert_eq!(first.source_label, "Example Blog");
        assert_eq!(first.source_type, "rss");
    }

    #[test]
    fn rss_unparsed_date_kept_raw() {
        let records = parse_feed(RSS, &rss_source(), 10).expect("parse");
        assert_eq!(records[1].published_at.as_deref(), Some("sometime in spring"));
    }

    #[test]
    fn atom_entries_normalised() {
        let source = SourceDescriptor::new(SourceKind::AtomFeed, "https://atom.example/feed");
        let records = parse_feed(ATOM, &source, 10).expect("parse");
        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.url, "https://atom.example/1", "alternate link preferred");
        assert_eq!(first.content, "Full content", "content preferred over summary");
        assert_eq!(first.published_at.as_deref(), Some("2024-01-02T10:00:00Z"), "updated preferred");
        assert_eq!(first.author.as_deref(), Some("Bo"));
        assert_eq!(first.tags, vec!["news".to_string()]);
        assert_eq!(first.source_label, "Atom Site");
        assert_eq!(first.source_type, "atom");

        let second = &records[1];
        assert_eq!(second.content, "just summary");
        assert_eq!(second.published_at.as_deref(), Some("2023-12-31T00:00:00Z"));
    }

    #[test]
    fn atom_with_prefixed_namespace() {
        let xml = r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom"><a:entry><a:title>P</a:title><a:link href="https://p.example/1"/><a:updated>2024-03-01T00:00:00Z</a:updated></a:entry></a:feed>"#;
        let source = SourceDescriptor::new(SourceKind::AtomFeed, "https://p.example/feed");
        let records = parse_feed(xml, &source, 10).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "P");
    }

    #[test]
    fn atom_without_namespace() {
        let xml = "<feed><entry><title>N</title><link href=\"https://n.example/1\"/><author><name>Cy</name></author></entry></feed>";
        let source = SourceDescriptor::new(SourceKind::AtomFeed, "https://n.example/feed");
        let records = parse_feed(xml, &source, 10).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author.as_deref(), Some("Cy"));
    }

    #[test]
    fn atom_elements_in_foreign_namespace_ignored() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:other"><entry><x:title>wrong</x:title><title>right</title><link href="https://f.example/1"/></entry></feed>"#;
        let source = SourceDescriptor::new(SourceKind::AtomFeed, "https://f.example/feed");
        let records = parse_feed(xml, &source, 10).expect("parse");
        assert_eq!(records[0].title, "right");
    }

    #[test]
    fn format_detected_from_root_not_descriptor() {
        let source = SourceDescriptor::new(SourceKind::AtomFeed, "https://blog.example/feed");
        let records = parse_feed(RSS, &source, 10).expect("parse");
        assert_eq!(records[0].source_type, "rss");
    }

    #[test]
    fn display_name_overrides_feed_title() {
        let source = rss_source().with_display_name("Mine");
        let records = parse_feed(RSS, &source, 10).expect("parse");
        assert_eq!(records[0].source_label, "Mine");
    }

    #[test]
    fn description_truncated_to_800_chars() {
        let long = "z".repeat(1200);
        let xml = format!(
            "<rss><channel><item><title>t</title><link>https://l.example/1</link><description>{long}</description></item></channel></rss>"
        );
        let records = parse_feed(&xml, &rss_source(), 10).expect("parse");
        assert_eq!(records[0].content.chars().count(), 800);
    }

    #[test]
    fn max_results_caps_items() {
        let records = parse_feed(RSS, &rss_source(), 1).expect("parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn rss_without_channel_is_empty_feed() {
        let records = parse_feed("<rss></rss>", &rss_source(), 10).expect("parse");
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn rdf_feed_succeeds_with_no_records() {
        let rdf = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/"><item><title>t</title><link>https://r.example/1</link></item></rdf:RDF>"#;
        let transport = MockTransport::new().with_body("r.example/rdf", rdf);
        let source = SourceDescriptor::new(SourceKind::RssFeed, "https://r.example/rdf");
        let result =
            crate::adapters::invoke(&transport, &source, &Query::feeds(), &PipelineConfig::default()).await;
        assert!(result.success);
        assert!(result.records.is_empty());
    }

    #[test]
    fn malformed_feed_is_parse_error() {
        let err = parse_feed("<rss><channel></rss>", &rss_source(), 10).unwrap_err();
        assert!(matches!(err, DigestError::Parse(_)));
    }

    #[test]
    fn html_entities_in_description_survive() {
        let xml = "<rss><channel><item><link>https://e.example/1</link><description>a&nbsp;b</description></item></channel></rss>";
        let records = parse_feed(xml, &rss_source(), 10).expect("parse");
        assert!(records[0].content.starts_with('a'));
        assert!(records[0].content.ends_with('b'));
    }

    #[test]
    fn escaped_markup_stripped_next_to_html_entities() {
        let xml = "<rss><channel><item><link>https://e.example/2</link><description>&lt;p&gt;Hi &lt;b&gt;there&lt;/b&gt;&lt;/p&gt; caf&eacute;</description></item></channel></rss>";
        let records = parse_feed(xml, &rss_source(), 10).expect("parse");
        assert_eq!(records[0].content, "Hi there caf\u{e9}");
    }

    #[test]
    fn escaped_markup_stripped_next_to_unknown_entities() {
        let xml = "<rss><channel><item><link>https://e.example/3</link><description>&lt;em&gt;x&lt;/em&gt; &bogus; AT&amp;T</description></item></channel></rss>";
        let records = parse_feed(xml, &rss_source(), 10).expect("parse");
        let content = &records[0].content;
        assert!(!content.contains('<'), "markup left in {content:?}");
        assert!(content.starts_with("x "));
        assert!(content.ends_with("AT&T"));
    }

    #[tokio::test]
    async fn fetches_endpoint_with_get() {
        let transport = MockTransport::new().with_body("blog.example/feed", RSS);
        let output = FeedAdapter
            .fetch(&transport, &rss_source(), &Query::feeds(), &PipelineConfig::default())
            .await
            .expect("fetch");
        assert_eq!(output.records.len(), 2);
        assert_eq!(transport.requests()[0].url, "https://blog.example/feed");
    }
}
