//!
//! src/normalize.rs  Andrew Belles  Oct 18th, 2026
//!
//! Turns the decoded JSON payload of one artist's stats file into
//! validated track records, dropping (and counting) malformed rows
//!

use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::StatsError;
use crate::types::TrackRecord;

/// How required fields are checked.
///
/// `Truthy` rejects empty strings and a like count of zero, which is how
/// the published dashboard has always filtered. `Presence` only requires
/// the fields to exist with the right type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    #[default]
    Truthy,
    Presence,
}

impl ValidationPolicy {
    pub fn parse(s: &str) -> Option<ValidationPolicy> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truthy" => Some(ValidationPolicy::Truthy),
            "presence" => Some(ValidationPolicy::Presence),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub tracks: Vec<TrackRecord>,
    pub skipped: usize,
}

/// Validate every row of `payload`. `source` only labels log lines.
pub fn normalize_tracks(
    payload: &Value,
    policy: ValidationPolicy,
    source: &str
) -> Result<NormalizedBatch, StatsError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Null => {
            return Err(StatsError::Schema(format!("invalid JSON format in {source}")));
        }
        other => {
            return Err(StatsError::Schema(format!(
                "expected an array of tracks in {source}, got {}", json_kind(other)
            )));
        }
    };

    let mut batch = NormalizedBatch::default();
    for (index, row) in rows.iter().enumerate() {
        match row.as_object().and_then(|obj| normalize_row(obj, policy)) {
            Some(track) => batch.tracks.push(track),
            None => {
                warn!(source, index, "normalize.skip.missing_fields");
                batch.skipped += 1;
            }
        }
    }
    Ok(batch)
}

fn normalize_row(obj: &Map<String, Value>, policy: ValidationPolicy) -> Option<TrackRecord> {
    let title = required_str(obj, "Title", policy)?;
    let likes = obj.get("Like").and_then(Value::as_u64)?;
    if policy == ValidationPolicy::Truthy && likes == 0 {
        return None;
    }
    let scministats = required_str(obj, "scministats", policy)?;

    Some(TrackRecord {
        title,
        likes,
        scministats,
        url: optional_text(obj, "Title_URL"),
        date: optional_text(obj, "Date"),
        reposts: optional_text(obj, "scbuttonrepost"),
        comments: optional_text(obj, "Comment"),
    })
}

fn required_str(obj: &Map<String, Value>, key: &str, policy: ValidationPolicy) -> Option<String> {
    let s = obj.get(key)?.as_str()?;
    if policy == ValidationPolicy::Truthy && s.is_empty() {
        return None;
    }
    Some(s.to_string())
}

/// Optional fields arrive as strings or bare numbers depending on the scrape
fn optional_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_valid_rows_in_order_and_counts_skips() {
        let payload = json!([
            {"Title": "A", "Like": 10, "scministats": "1K", "Title_URL": "https://x.test/a"},
            {"Title": "", "Like": 10, "scministats": "1K"},
            {"Like": 3, "scministats": "2K"},
            {"Title": "B", "Like": 4, "scministats": "900", "Date": "2024-03-01",
             "scbuttonrepost": "12", "Comment": 3},
            {"Title": "C", "Like": 4}
        ]);
        let batch = normalize_tracks(&payload, ValidationPolicy::Truthy, "test").unwrap();
        assert_eq!(batch.skipped, 3);
        let titles: Vec<&str> = batch.tracks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(batch.tracks[0].url.as_deref(), Some("https://x.test/a"));
        assert_eq!(batch.tracks[1].url, None);
        assert_eq!(batch.tracks[1].reposts.as_deref(), Some("12"));
        assert_eq!(batch.tracks[1].comments.as_deref(), Some("3"));
    }

    #[test]
    fn zero_likes_are_rejected_by_default() {
        // current dashboard behaviour: a Like of 0 is treated as missing
        let payload = json!([{"Title": "Quiet", "Like": 0, "scministats": "500"}]);
        let batch = normalize_tracks(&payload, ValidationPolicy::Truthy, "test").unwrap();
        assert!(batch.tracks.is_empty());
        assert_eq!(batch.skipped, 1);
    }

    #[test]
    fn presence_policy_accepts_zero_likes() {
        let payload = json!([{"Title": "Quiet", "Like": 0, "scministats": "500"}]);
        let batch = normalize_tracks(&payload, ValidationPolicy::Presence, "test").unwrap();
        assert_eq!(batch.tracks.len(), 1);
        assert_eq!(batch.tracks[0].likes, 0);
    }

    #[test]
    fn non_array_payloads_fail_the_batch() {
        for payload in [json!(null), json!({"Title": "A"}), json!("tracks"), json!(7)] {
            let err = normalize_tracks(&payload, ValidationPolicy::Truthy, "x").unwrap_err();
            assert!(matches!(err, StatsError::Schema(_)), "{payload}");
        }
    }

    #[test]
    fn non_object_rows_are_skipped() {
        let payload = json!([null, 3, {"Title": "A", "Like": 1, "scministats": "5"}]);
        let batch = normalize_tracks(&payload, ValidationPolicy::Truthy, "x").unwrap();
        assert_eq!(batch.tracks.len(), 1);
        assert_eq!(batch.skipped, 2);
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(ValidationPolicy::parse("Presence"), Some(ValidationPolicy::Presence));
        assert_eq!(ValidationPolicy::parse("truthy"), Some(ValidationPolicy::Truthy));
        assert_eq!(ValidationPolicy::parse("strict"), None);
    }
}
