/// Test data factories with sensible defaults.
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use cinesync::modules::movie::domain::MovieSnapshot;

/// A realistic source payload, keywords nested the way the source nests them.
pub fn movie_payload(source_id: i32, title: &str) -> Value {
    json!({
        "id": source_id,
        "title": title,
        "original_title": title,
        "release_date": "1999-03-31",
        "runtime": 136,
        "original_language": "en",
        "origin_country": ["US"],
        "poster_path": format!("/poster-{}.jpg", source_id),
        "popularity": 98.5,
        "vote_average": 8.2,
        "vote_count": 25000,
        "genres": [
            {"id": 28, "name": "Action"},
            {"id": 878, "name": "Science Fiction"}
        ],
        "keywords": {
            "keywords": [
                {"id": 310, "name": "artificial intelligence"},
                {"id": 4565, "name": "dystopia"}
            ]
        }
    })
}

pub fn snapshot(source_id: i32, title: &str, synced_at: DateTime<Utc>) -> MovieSnapshot {
    MovieSnapshot {
        source_id,
        title: title.to_string(),
        original_title: title.to_string(),
        release_year: Some(1999),
        runtime_minutes: Some(136),
        original_language: Some("en".to_string()),
        origin_country: Some("US".to_string()),
        poster_path: None,
        popularity: None,
        vote_average: None,
        vote_count: None,
        synced_at,
        source_updated_at: None,
        source_hash: format!("hash-{}", source_id),
        genres: vec!["Action".to_string()],
        keywords: vec![],
        raw_payload: None,
    }
}

pub fn fresh_snapshot(source_id: i32, title: &str) -> MovieSnapshot {
    snapshot(source_id, title, Utc::now())
}

pub fn stale_snapshot(source_id: i32, title: &str, days_old: i64) -> MovieSnapshot {
    snapshot(source_id, title, Utc::now() - Duration::days(days_old))
}
