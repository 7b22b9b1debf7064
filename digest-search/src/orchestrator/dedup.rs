//! Record deduplication by exact URL.
//!
//! The key is the `url` string as the adapter produced it. Trailing
//! slashes, query-parameter order and scheme case are not normalised, so
//! `https://a.test/x` and `https://a.test/x/` are two records.

use std::collections::HashSet;

use crate::types::Record;

/// Keep the first record for each URL, in input order.
///
/// Later duplicates are dropped whole; no fields are merged. Records with
/// an empty URL are dropped too, since they have no key.
pub fn deduplicate(records: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let before = records.len();

    let unique: Vec<Record> = records
        .into_iter()
        .filter(|record| !record.url.is_empty() && seen.insert(record.url.clone()))
        .collect();

    tracing::debug!(before, after = unique.len(), "deduplicated records");
    unique
}
