use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::modules::movie::domain::MovieSnapshot;
use crate::schema::{genres, keywords, movie_genres, movie_keywords, movies};

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = movies, primary_key(source_id))]
pub struct MovieRow {
    pub source_id: i32,
    pub title: String,
    pub original_title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub original_language: Option<String>,
    pub origin_country: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f32>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<i32>,
    pub synced_at: DateTime<Utc>,
    pub source_updated_at: Option<DateTime<Utc>>,
    pub source_hash: String,
    pub raw_payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MovieRow {
    pub fn into_snapshot(self, genres: Vec<String>, keywords: Vec<String>) -> MovieSnapshot {
        MovieSnapshot {
            source_id: self.source_id,
            title: self.title,
            original_title: self.original_title,
            release_year: self.release_year,
            runtime_minutes: self.runtime_minutes,
            original_language: self.original_language,
            origin_country: self.origin_country,
            poster_path: self.poster_path,
            popularity: self.popularity,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            synced_at: self.synced_at,
            source_updated_at: self.source_updated_at,
            source_hash: self.source_hash,
            genres,
            keywords,
            raw_payload: self.raw_payload,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = movies)]
pub struct NewMovieRow {
    pub source_id: i32,
    pub title: String,
    pub original_title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub original_language: Option<String>,
    pub origin_country: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f32>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<i32>,
    pub synced_at: DateTime<Utc>,
    pub source_updated_at: Option<DateTime<Utc>>,
    pub source_hash: String,
    pub raw_payload: Option<serde_json::Value>,
}

impl NewMovieRow {
    pub fn from_snapshot(snapshot: &MovieSnapshot) -> Self {
        Self {
            source_id: snapshot.source_id,
            title: snapshot.title.clone(),
            original_title: snapshot.original_title.clone(),
            release_year: snapshot.release_year,
            runtime_minutes: snapshot.runtime_minutes,
            original_language: snapshot.original_language.clone(),
            origin_country: snapshot.origin_country.clone(),
            poster_path: snapshot.poster_path.clone(),
            popularity: snapshot.popularity,
            vote_average: snapshot.vote_average,
            vote_count: snapshot.vote_count,
            synced_at: snapshot.synced_at,
            source_updated_at: snapshot.source_updated_at,
            source_hash: snapshot.source_hash.clone(),
            raw_payload: snapshot.raw_payload.clone(),
        }
    }
}

// Snapshots carry full replacement state, so absent optional fields must
// overwrite with NULL rather than being skipped.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = movies, treat_none_as_null = true)]
pub struct MovieChangeset {
    pub title: String,
    pub original_title: String,
    pub release_year: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub original_language: Option<String>,
    pub origin_country: Option<String>,
    pub poster_path: Option<String>,
    pub popularity: Option<f32>,
    pub vote_average: Option<f32>,
    pub vote_count: Option<i32>,
    pub synced_at: DateTime<Utc>,
    pub source_updated_at: Option<DateTime<Utc>>,
    pub source_hash: String,
    pub raw_payload: Option<serde_json::Value>,
    pub updated_at: DateTime<Utc>,
}

impl MovieChangeset {
    /// `synced_at` is passed separately so callers can enforce per-movie
    /// monotonicity against the existing row.
    pub fn from_snapshot(snapshot: &MovieSnapshot, synced_at: DateTime<Utc>) -> Self {
        MovieChangeset {
            title: snapshot.title.clone(),
            original_title: snapshot.original_title.clone(),
            release_year: snapshot.release_year,
            runtime_minutes: snapshot.runtime_minutes,
            original_language: snapshot.original_language.clone(),
            origin_country: snapshot.origin_country.clone(),
            poster_path: snapshot.poster_path.clone(),
            popularity: snapshot.popularity,
            vote_average: snapshot.vote_average,
            vote_count: snapshot.vote_count,
            synced_at,
            source_updated_at: snapshot.source_updated_at,
            source_hash: snapshot.source_hash.clone(),
            raw_payload: snapshot.raw_payload.clone(),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct GenreRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = genres)]
pub struct NewGenre {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Queryable)]
pub struct KeywordRow {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = keywords)]
pub struct NewKeyword {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = movie_genres)]
pub struct NewMovieGenre {
    pub movie_id: i32,
    pub genre_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = movie_keywords)]
pub struct NewMovieKeyword {
    pub movie_id: i32,
    pub keyword_id: Uuid,
}
