// JobRadar - core/dedupe.rs
//
// Final de-duplication of match records. The same posting is often reachable
// through several sources (a chat plus a direct message link, or two
// overlapping source entries); only the first occurrence survives.

use crate::core::model::MatchRecord;
use std::collections::HashSet;

/// Identity key of a match record.
///
/// Records with a link are identified by the link alone; records without one
/// fall back to channel, timestamp and text.
pub fn record_identity_key(record: &MatchRecord) -> String {
    let link = record.link.trim();
    if !link.is_empty() {
        return format!("link:{}", link.to_lowercase());
    }
    format!(
        "text:{}|{}|{}",
        record.channel.trim().to_lowercase(),
        record.published_at.to_rfc3339(),
        record.text.trim().to_lowercase()
    )
}

/// Drop records whose identity key was already seen, preserving order.
///
/// Returns the kept records and the number removed.
pub fn dedupe_match_records(records: Vec<MatchRecord>) -> (Vec<MatchRecord>, usize) {
    let before = records.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    let kept: Vec<MatchRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record_identity_key(record)))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}
