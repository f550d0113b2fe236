//! Derives stable display values from loosely-typed recommendation records.
//!
//! Everything here is pure: records are borrowed, never changed, and bad
//! input degrades to an empty or pass-through value instead of an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;

use crate::model::{RecommendationRecord, TextList};
use crate::tokens::estimate_token_count;

/// Number of keywords shown per card
pub const DISPLAY_KEYWORD_LIMIT: usize = 5;

/// Descriptions at least this many characters long are treated as cut off
pub const TRUNCATION_LENGTH: usize = 200;

/// Shown when a record has neither countdown tokens nor a deadline
pub const NO_DEADLINE_TEXT: &str = "No deadline";

/// Where a record's keyword list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordSource {
    /// `KeywordsFromCSV`
    Csv,
    /// The recommender's own `keywords`
    Original,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKeywords {
    /// Full keyword list, uncapped
    pub keywords: Vec<String>,
    pub source: KeywordSource,
}

impl ResolvedKeywords {
    /// The first [`DISPLAY_KEYWORD_LIMIT`] keywords
    pub fn display(&self) -> &[String] {
        let end = self.keywords.len().min(DISPLAY_KEYWORD_LIMIT);
        &self.keywords[..end]
    }
}

/// Display-ready view of one record
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub title: String,
    pub match_percentage: String,
    pub countdown: String,
    pub keywords: Vec<String>,
    pub keyword_source: KeywordSource,
    /// Length of the selected embedding, if any
    pub embedding_dimensions: Option<usize>,
    pub truncated: bool,
    pub original_token_count: usize,
    pub truncated_token_count: usize,
}

/// Clamp a fraction at 1.0 from above only. Negative scores pass through.
pub fn clamp_match_score(score: f64) -> f64 {
    score.min(1.0)
}

/// Fraction as a percentage with at most two decimals and no trailing zeros.
///
/// `0.4567` → `"45.67"`, `0.4` → `"40"`.
pub fn percentage_text(fraction: f64) -> String {
    let fixed = format!("{:.2}", fraction * 100.0);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// `0.4` → `"40%"`, `1.3` → `"100%"`.
pub fn format_match_score(score: f64) -> String {
    format!("{}%", percentage_text(clamp_match_score(score)))
}

/// First non-empty embedding alias, probed in priority order:
/// `embedding`, `description_embedding`, `embeddings`, `vector`, `text_embedding`.
pub fn select_embedding(record: &RecommendationRecord) -> Option<&[f64]> {
    [
        &record.embedding,
        &record.description_embedding,
        &record.embeddings,
        &record.vector,
        &record.text_embedding,
    ]
    .into_iter()
    .filter_map(|alias| alias.as_deref())
    .find(|values| !values.is_empty())
}

pub fn resolve_keywords(record: &RecommendationRecord) -> ResolvedKeywords {
    match &record.keywords_from_csv {
        Some(csv) if !csv.is_empty() => ResolvedKeywords {
            keywords: csv.clone(),
            source: KeywordSource::Csv,
        },
        _ if !record.keywords.is_empty() => ResolvedKeywords {
            keywords: record.keywords.clone(),
            source: KeywordSource::Original,
        },
        _ => ResolvedKeywords {
            keywords: Vec::new(),
            source: KeywordSource::None,
        },
    }
}

/// Countdown tokens precomputed by the recommender.
///
/// An array is returned as-is, a string is split on commas with each segment
/// trimmed. Anything else, including a blank string, yields nothing.
pub fn resolve_countdown(record: &RecommendationRecord) -> Vec<String> {
    match &record.countdown {
        Some(TextList::Many(tokens)) => tokens.clone(),
        Some(TextList::Joined(text)) if !text.trim().is_empty() => text
            .split(',')
            .map(|segment| segment.trim().to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Heuristic: ends with an ellipsis (`...` or `…`) or is at least
/// [`TRUNCATION_LENGTH`] characters long. False positives and negatives are
/// expected.
pub fn is_truncated(description: &str) -> bool {
    description.ends_with("...")
        || description.ends_with('\u{2026}')
        || description.chars().count() >= TRUNCATION_LENGTH
}

fn parse_deadline(deadline: &str) -> Option<DateTime<Utc>> {
    let trimmed = deadline.trim();

    if trimmed.contains('T') || trimmed.contains('-') {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(parsed.with_timezone(&Utc));
        }
        for format in [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
        ] {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(parsed.and_utc());
            }
        }
        return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc());
    }

    if trimmed.contains('/') {
        let parts: Vec<&str> = trimmed.split('/').map(str::trim).collect();
        if let [month, day, year] = parts.as_slice() {
            let iso = format!("{}-{:0>2}-{:0>2}", year, month, day);
            return NaiveDate::parse_from_str(&iso, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc());
        }
    }

    None
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit} left")
    } else {
        format!("{count} {unit}s left")
    }
}

/// Remaining time until `deadline`, in the largest whole unit that fits.
///
/// Unparseable deadlines come back unchanged.
pub fn compute_countdown_text(deadline: &str, now: DateTime<Utc>) -> String {
    let Some(instant) = parse_deadline(deadline) else {
        debug!("Leaving unparseable deadline as-is: {:?}", deadline);
        return deadline.to_string();
    };

    let diff = instant - now;
    if diff <= chrono::Duration::zero() {
        return "Deadline passed".to_string();
    }

    if diff.num_days() >= 1 {
        plural(diff.num_days(), "day")
    } else if diff.num_hours() >= 1 {
        plural(diff.num_hours(), "hour")
    } else {
        plural(diff.num_minutes(), "minute")
    }
}

/// Countdown as shown on a card: precomputed tokens when present, otherwise
/// computed from the deadline.
pub fn countdown_display(record: &RecommendationRecord, now: DateTime<Utc>) -> String {
    let tokens = resolve_countdown(record);
    if !tokens.is_empty() {
        return tokens.join(", ");
    }

    match record.deadline.as_deref() {
        Some(deadline) if !deadline.trim().is_empty() => compute_countdown_text(deadline, now),
        _ => NO_DEADLINE_TEXT.to_string(),
    }
}

pub fn record_is_truncated(record: &RecommendationRecord) -> bool {
    record.description.as_deref().is_some_and(is_truncated)
}

/// `(original, truncated)` token estimates.
///
/// The original count only differs when the description looks cut off and
/// the pre-truncation text came along with the record.
pub fn token_counts(record: &RecommendationRecord) -> (usize, usize) {
    let truncated = estimate_token_count(record.description.as_deref());
    let original = match &record.original_description {
        Some(original) if record_is_truncated(record) => estimate_token_count(Some(original)),
        _ => truncated,
    };
    (original, truncated)
}

pub fn normalize_record(record: &RecommendationRecord, now: DateTime<Utc>) -> NormalizedRecord {
    let keywords = resolve_keywords(record);
    let (original_token_count, truncated_token_count) = token_counts(record);

    NormalizedRecord {
        title: record.title.clone(),
        match_percentage: format_match_score(record.match_score),
        countdown: countdown_display(record, now),
        keywords: keywords.display().to_vec(),
        keyword_source: keywords.source,
        embedding_dimensions: select_embedding(record).map(<[f64]>::len),
        truncated: record_is_truncated(record),
        original_token_count,
        truncated_token_count,
    }
}
