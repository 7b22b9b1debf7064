//! Publication-date normalisation.
//!
//! Source dates are tried against an ordered list of formats; the first
//! that parses wins and the value is rewritten as RFC 3339 UTC with a `Z`
//! suffix. A date no format accepts is kept verbatim.
//!
//! Ranking compares dates as strings. Normalised values order
//! chronologically among themselves, but a raw fallback string mixed in
//! with them sorts by its first characters, not by time.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// The formats tried, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateFormat {
    /// `Mon, 01 Jan 2024 10:00:00 +0000` or with a named zone (`GMT`, `EST`).
    Rfc2822,
    /// `2024-01-02T10:00:00+08:00` or `2024-01-02T10:00:00Z`, fractions allowed.
    Rfc3339,
    /// `2024-01-02T10:00:00+0800` (offset without a colon).
    IsoCompactOffset,
    /// `2024-01-02 10:00:00`, taken as UTC.
    PlainDateTime,
    /// `2024-01-02T10:00:00`, taken as UTC.
    IsoNaive,
}

const FORMATS: &[DateFormat] = &[
    DateFormat::Rfc2822,
    DateFormat::Rfc3339,
    DateFormat::IsoCompactOffset,
    DateFormat::PlainDateTime,
    DateFormat::IsoNaive,
];

impl DateFormat {
    fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            Self::Rfc2822 => DateTime::parse_from_rfc2822(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::IsoCompactOffset => DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Self::PlainDateTime => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc()),
            Self::IsoNaive => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc()),
        }
    }
}

/// Parse `raw` with the first matching format.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    FORMATS.iter().find_map(|format| format.parse(trimmed))
}

/// Normalise a source date for a record's `published_at`.
///
/// Returns `None` for empty input, the RFC 3339 UTC form when a format
/// matches, and the trimmed raw string otherwise.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match parse_date(trimmed) {
        Some(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => {
            tracing::trace!(raw = trimmed, "date kept unparsed");
            Some(trimmed.to_owned())
        }
    }
}
