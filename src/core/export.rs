// JobRadar - core/export.rs
//
// CSV and JSON export of match records.
// Core layer: writes to any Write trait object. Records are written newest
// first, the order the report view uses.

use crate::core::model::{MatchRecord, MatchResult};
use crate::util::constants;
use crate::util::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Human-readable summary of the matched keywords, one group per category.
///
/// Example: `title: директор | industry: финтех`. Empty categories are
/// omitted; an empty string means nothing matched.
pub fn format_matched_terms(result: &MatchResult) -> String {
    [
        ("title", &result.matched_title_terms),
        ("profile", &result.matched_profile_terms),
        ("industry", &result.matched_industry_terms),
    ]
    .iter()
    .filter(|(_, terms)| !terms.is_empty())
    .map(|(label, terms)| format!("{label}: {}", terms.join(", ")))
    .collect::<Vec<_>>()
    .join(" | ")
}

/// Records ordered newest first. Equal timestamps keep their scan order.
pub fn sort_newest_first(records: &[MatchRecord]) -> Vec<&MatchRecord> {
    let mut sorted: Vec<&MatchRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    sorted
}

fn check_limit(count: usize) -> Result<(), ExportError> {
    if count > constants::MAX_EXPORT_RECORDS {
        return Err(ExportError::TooManyRecords {
            count,
            max: constants::MAX_EXPORT_RECORDS,
        });
    }
    Ok(())
}

/// Export match records to CSV format.
///
/// Writes: date, message, link, channel, matched_terms
pub fn export_csv<W: Write>(
    records: &[MatchRecord],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_limit(records.len())?;
    let csv_error = |e: csv::Error| ExportError::Csv {
        path: export_path.to_path_buf(),
        source: e,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record(["date", "message", "link", "channel", "matched_terms"])
        .map_err(csv_error)?;

    let mut count = 0;
    for record in sort_newest_first(records) {
        let date = record
            .published_at
            .format(constants::DISPLAY_DATE_FORMAT)
            .to_string();
        csv_writer
            .write_record([
                date.as_str(),
                record.text.as_str(),
                record.link.as_str(),
                record.channel.as_str(),
                format_matched_terms(&record.match_result).as_str(),
            ])
            .map_err(csv_error)?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

#[derive(Serialize)]
struct JsonRow<'a> {
    date: String,
    channel: &'a str,
    link: &'a str,
    message: &'a str,
    score: u8,
    matched_terms: String,
    title_terms: &'a [String],
    profile_terms: &'a [String],
    industry_terms: &'a [String],
}

/// Export match records to JSON format (array of objects).
pub fn export_json<W: Write>(
    records: &[MatchRecord],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_limit(records.len())?;
    let rows: Vec<JsonRow<'_>> = sort_newest_first(records)
        .into_iter()
        .map(|record| JsonRow {
            date: record.published_at.to_rfc3339(),
            channel: &record.channel,
            link: &record.link,
            message: &record.text,
            score: record.match_result.score,
            matched_terms: format_matched_terms(&record.match_result),
            title_terms: &record.match_result.matched_title_terms,
            profile_terms: &record.match_result.matched_profile_terms,
            industry_terms: &record.match_result.matched_industry_terms,
        })
        .collect();

    serde_json::to_writer_pretty(writer, &rows).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(rows.len())
}
