//! Pure transformation from raw source payloads to validated snapshots.
//!
//! Everything in this module is deterministic and side-effect free: the same
//! payload always yields the same content hash regardless of key order.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

use crate::shared::errors::{AppError, AppResult};

use super::snapshot::MovieSnapshot;

/// Field names probed, in order, for the upstream modification timestamp.
const SOURCE_UPDATED_AT_FIELDS: [&str; 4] =
    ["updated_at", "last_updated_at", "modified_at", "last_modified"];

/// Reject ids the source can never have issued.
pub fn validate_source_id(source_id: i32) -> AppResult<()> {
    if source_id <= 0 {
        return Err(AppError::Validation(format!(
            "invalid id: {} (must be a positive integer)",
            source_id
        )));
    }
    Ok(())
}

/// Build a validated snapshot from a raw source payload.
///
/// Genre/keyword names are extracted in payload order with empty entries
/// dropped; deduplication is the persistence layer's job.
pub fn build_snapshot(
    source_id: i32,
    raw_payload: Value,
    synced_at: DateTime<Utc>,
) -> AppResult<MovieSnapshot> {
    validate_source_id(source_id)?;

    let title = string_field(&raw_payload, "title").unwrap_or_default();
    let original_title =
        string_field(&raw_payload, "original_title").unwrap_or_else(|| title.clone());

    Ok(MovieSnapshot {
        source_id,
        title,
        original_title,
        release_year: release_year(&raw_payload),
        runtime_minutes: int_field(&raw_payload, "runtime"),
        original_language: string_field(&raw_payload, "original_language"),
        origin_country: origin_country(&raw_payload),
        poster_path: string_field(&raw_payload, "poster_path"),
        popularity: float_field(&raw_payload, "popularity"),
        vote_average: float_field(&raw_payload, "vote_average"),
        vote_count: int_field(&raw_payload, "vote_count"),
        synced_at,
        source_updated_at: probe_source_updated_at(&raw_payload),
        source_hash: content_hash(&raw_payload),
        genres: extract_names(raw_payload.get("genres")),
        keywords: extract_keyword_names(&raw_payload),
        raw_payload: Some(raw_payload),
    })
}

/// SHA-256 over the canonicalized payload: object keys recursively sorted,
/// array order preserved. Key order in the input never affects the digest.
pub fn content_hash(payload: &Value) -> String {
    let mut canonical = String::new();
    write_canonical(payload, &mut canonical);

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{:02x}", byte);
    }
    hex
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Probe the candidate timestamp fields in order; the first *present* field
/// decides the outcome. An unparsable value yields `None`, never an error.
pub fn probe_source_updated_at(payload: &Value) -> Option<DateTime<Utc>> {
    for field in SOURCE_UPDATED_AT_FIELDS {
        if let Some(raw) = payload.get(field) {
            return raw.as_str().and_then(parse_timestamp);
        }
    }
    None
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    // Date-only values are treated as midnight UTC
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Symmetric difference between the desired and current name sets:
/// `(additions, removals)`. Names present in both sets are untouched.
pub fn relation_diff(current: &[String], desired: &[String]) -> (Vec<String>, Vec<String>) {
    let added = desired
        .iter()
        .filter(|name| !current.contains(name))
        .cloned()
        .collect();
    let removed = current
        .iter()
        .filter(|name| !desired.contains(name))
        .cloned()
        .collect();
    (added, removed)
}

/// Order-preserving deduplication, dropping empty names.
pub fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .filter(|name| !name.is_empty() && seen.insert(name.as_str()))
        .cloned()
        .collect()
}

fn extract_names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.clone()),
                    Value::Object(_) => item
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    _ => None,
                })
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// The detail endpoint nests keywords under an object when fetched via
// append_to_response; a bare array is accepted as well.
fn extract_keyword_names(payload: &Value) -> Vec<String> {
    match payload.get("keywords") {
        Some(Value::Object(map)) => extract_names(map.get("keywords")),
        other => extract_names(other),
    }
}

fn string_field(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(payload: &Value, field: &str) -> Option<i32> {
    payload
        .get(field)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
}

fn float_field(payload: &Value, field: &str) -> Option<f32> {
    payload.get(field).and_then(Value::as_f64).map(|v| v as f32)
}

fn release_year(payload: &Value) -> Option<i32> {
    string_field(payload, "release_date")
        .and_then(|date| date.get(..4).and_then(|y| y.parse().ok()))
}

fn origin_country(payload: &Value) -> Option<String> {
    match payload.get("origin_country") {
        Some(Value::Array(items)) => items
            .first()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Some(Value::String(country)) if !country.is_empty() => Some(country.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_non_positive_ids() {
        assert!(validate_source_id(-1).is_err());
        assert!(validate_source_id(0).is_err());
        assert!(validate_source_id(603).is_ok());

        let err = build_snapshot(-1, json!({}), Utc::now()).unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn test_hash_is_key_order_independent() {
        let a = json!({"title": "The Matrix", "runtime": 136, "genres": [{"name": "Action"}]});
        let b = json!({"genres": [{"name": "Action"}], "runtime": 136, "title": "The Matrix"});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_hash_changes_on_scalar_difference() {
        let a = json!({"title": "The Matrix", "runtime": 136});
        let b = json!({"title": "The Matrix", "runtime": 137});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_hash_respects_array_order() {
        let a = json!({"genres": ["Action", "Sci-Fi"]});
        let b = json!({"genres": ["Sci-Fi", "Action"]});
        assert_ne!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_nested_objects_are_canonicalized() {
        let a = json!({"outer": {"b": 2, "a": 1}});
        let b = json!({"outer": {"a": 1, "b": 2}});
        assert_eq!(content_hash(&a), content_hash(&b));
    }

    #[test]
    fn test_probe_prefers_first_present_field() {
        let payload = json!({
            "updated_at": "2024-03-01T12:00:00Z",
            "modified_at": "2020-01-01T00:00:00Z"
        });
        let parsed = probe_source_updated_at(&payload).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_probe_unparsable_yields_none() {
        assert!(probe_source_updated_at(&json!({"updated_at": "not a date"})).is_none());
        assert!(probe_source_updated_at(&json!({"updated_at": 12345})).is_none());
        assert!(probe_source_updated_at(&json!({})).is_none());
    }

    #[test]
    fn test_probe_accepts_date_only() {
        let parsed = probe_source_updated_at(&json!({"modified_at": "2023-07-15"})).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2023-07-15T00:00:00+00:00");
    }

    #[test]
    fn test_build_extracts_fields_and_relations() {
        let payload = json!({
            "title": "The Matrix",
            "original_title": "The Matrix",
            "release_date": "1999-03-30",
            "runtime": 136,
            "original_language": "en",
            "origin_country": ["US"],
            "popularity": 85.5,
            "vote_average": 8.2,
            "vote_count": 24000,
            "genres": [{"name": "Action"}, {"name": "Science Fiction"}, {"name": ""}],
            "keywords": {"keywords": [{"name": "dystopia"}, {"name": "simulation"}]}
        });

        let snapshot = build_snapshot(603, payload, Utc::now()).unwrap();

        assert_eq!(snapshot.title, "The Matrix");
        assert_eq!(snapshot.release_year, Some(1999));
        assert_eq!(snapshot.runtime_minutes, Some(136));
        assert_eq!(snapshot.origin_country.as_deref(), Some("US"));
        assert_eq!(snapshot.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(snapshot.keywords, vec!["dystopia", "simulation"]);
        assert!(snapshot.raw_payload.is_some());
        assert_eq!(snapshot.source_hash.len(), 64);
    }

    #[test]
    fn test_build_does_not_deduplicate_names() {
        let payload = json!({
            "title": "x",
            "genres": [{"name": "Action"}, {"name": "Action"}]
        });
        let snapshot = build_snapshot(1, payload, Utc::now()).unwrap();
        assert_eq!(snapshot.genres, vec!["Action", "Action"]);
    }

    #[test]
    fn test_relation_diff() {
        let current = vec!["A".to_string(), "B".to_string()];
        let desired = vec!["B".to_string(), "C".to_string()];
        let (added, removed) = relation_diff(&current, &desired);
        assert_eq!(added, vec!["C"]);
        assert_eq!(removed, vec!["A"]);
    }

    #[test]
    fn test_relation_diff_no_changes() {
        let names = vec!["A".to_string(), "B".to_string()];
        let (added, removed) = relation_diff(&names, &names);
        assert!(added.is_empty());
        assert!(removed.is_empty());
    }

    #[test]
    fn test_dedup_names_preserves_order() {
        let names = vec![
            "Action".to_string(),
            "".to_string(),
            "Drama".to_string(),
            "Action".to_string(),
        ];
        assert_eq!(dedup_names(&names), vec!["Action", "Drama"]);
    }
}
