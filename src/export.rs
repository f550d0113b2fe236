use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::{debug, info};

use crate::error::RecsError;
use crate::model::RecommendationRecord;
use crate::normalize::{
    clamp_match_score, percentage_text, record_is_truncated, select_embedding, token_counts,
};

/// Column order of the exported file
pub const CSV_HEADER: [&str; 13] = [
    "Title",
    "Description",
    "Description Truncated",
    "original_token_count",
    "truncated_token_count",
    "Embedding Available",
    "Match Score",
    "Precision",
    "Recall",
    "F1 Score",
    "Accuracy",
    "Cosine Similarity",
    "Requirements",
];

/// Wrap a text field in double quotes, doubling any quotes inside it.
/// Text columns are always quoted.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn csv_row(record: &RecommendationRecord) -> String {
    let metrics = &record.evaluation_metrics;
    let (original_tokens, truncated_tokens) = token_counts(record);

    let fields = [
        quote(&record.title),
        quote(record.description.as_deref().unwrap_or_default()),
        yes_no(record_is_truncated(record)).to_string(),
        original_tokens.to_string(),
        truncated_tokens.to_string(),
        yes_no(select_embedding(record).is_some()).to_string(),
        percentage_text(clamp_match_score(record.match_score)),
        percentage_text(metrics.precision),
        percentage_text(metrics.recall),
        percentage_text(metrics.f1_score),
        percentage_text(metrics.accuracy),
        percentage_text(metrics.cosine_similarity),
        quote(&record.requirements.join("; ")),
    ];

    fields.join(",")
}

/// Render records as CSV text, header first, one `\n`-terminated line per record.
pub fn to_csv(records: &[RecommendationRecord]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for record in records {
        out.push_str(&csv_row(record));
        out.push('\n');
    }

    out
}

/// `hackathon-recommendations-2025-01-15.csv`
pub fn export_filename(date: NaiveDate) -> String {
    format!("hackathon-recommendations-{}.csv", date.format("%Y-%m-%d"))
}

/// Write the export file into `dir`, creating it when missing.
///
/// Returns `Ok(None)` without touching the filesystem when there is nothing
/// to export.
pub async fn write_csv_file(
    records: &[RecommendationRecord],
    dir: &Path,
    date: NaiveDate,
) -> Result<Option<PathBuf>, RecsError> {
    if records.is_empty() {
        debug!("No recommendations to export");
        return Ok(None);
    }

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| RecsError::ExportError(format!("{}: {}", dir.display(), e)))?;

    let path = dir.join(export_filename(date));
    tokio::fs::write(&path, to_csv(records))
        .await
        .map_err(|e| RecsError::ExportError(format!("{}: {}", path.display(), e)))?;

    info!("Exported {} recommendations to {}", records.len(), path.display());
    Ok(Some(path))
}
