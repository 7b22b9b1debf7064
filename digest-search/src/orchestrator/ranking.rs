//! Ranking comparators for merged records.
//!
//! Both comparators sort descending with a stable sort, so records that
//! compare equal keep their deduplicated order.
//!
//! `ByDate` compares `published_at` as a plain string. That is
//! chronological only while every value is in the normalised RFC 3339 UTC
//! form; a raw date that failed to parse is ordered by its text and can
//! land anywhere relative to parsed ones. Records without a date sort
//! last.

use std::cmp::Ordering;

use serde::Serialize;

use crate::types::Record;

/// The sort policy for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum Ranking {
    /// Descending `score`. Used for pooled search and forum results.
    ByScore,
    /// Descending `published_at`, then descending `extra[secondary]`.
    /// Used for feeds and issue trackers.
    ByDate {
        #[serde(skip_serializing_if = "Option::is_none")]
        secondary: Option<String>,
    },
}

impl Ranking {
    /// Date ordering with no secondary key.
    pub fn by_date() -> Self {
        Self::ByDate { secondary: None }
    }

    /// Date ordering, ties broken by an `extra` signal.
    pub fn by_date_then(secondary: impl Into<String>) -> Self {
        Self::ByDate {
            secondary: Some(secondary.into()),
        }
    }

    /// Ordering of `a` relative to `b`; `Less` means `a` ranks first.
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            Self::ByScore => b.score.total_cmp(&a.score),
            Self::ByDate { secondary } => {
                let by_date = b.published_at.cmp(&a.published_at);
                match secondary {
                    Some(key) => by_date
                        .then_with(|| b.extra_value(key).total_cmp(&a.extra_value(key))),
                    None => by_date,
                }
            }
        }
    }

    /// Sort `records` in place.
    pub fn sort(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}
