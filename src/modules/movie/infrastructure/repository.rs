use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use log::debug;
use tokio::task;
use uuid::Uuid;

use crate::modules::movie::domain::{
    dedup_names, relation_diff, MovieRepository, MovieSnapshot, SyncStrategy,
};
use crate::schema::{genres, keywords, movie_genres, movie_keywords, movies};
use crate::shared::database::Database;
use crate::shared::errors::{AppError, AppResult};

use super::models::{
    GenreRow, KeywordRow, MovieChangeset, MovieRow, NewGenre, NewKeyword, NewMovieGenre,
    NewMovieKeyword, NewMovieRow,
};

/// Diesel-backed diff/upsert engine.
///
/// All write paths run inside a transaction and the returned snapshot is
/// re-read from the store after commit, so database state is the source of
/// truth for callers.
pub struct MovieRepositoryImpl {
    db: Arc<Database>,
}

impl MovieRepositoryImpl {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Upsert one movie inside the caller's transaction.
    ///
    /// When `(source_hash, source_updated_at)` match the stored row, the
    /// upstream content is unchanged: only `synced_at` advances and every
    /// relation write is skipped.
    fn upsert_movie(
        conn: &mut PgConnection,
        snapshot: &MovieSnapshot,
        strategy: SyncStrategy,
    ) -> AppResult<()> {
        let existing: Option<MovieRow> = movies::table
            .find(snapshot.source_id)
            .first(conn)
            .optional()?;

        if let Some(row) = &existing {
            if snapshot.matches_stored(&row.source_hash, row.source_updated_at) {
                debug!(
                    "movie {} unchanged upstream, advancing synced_at only",
                    snapshot.source_id
                );
                diesel::update(movies::table.find(snapshot.source_id))
                    .set((
                        movies::synced_at.eq(snapshot.advanced_synced_at(row.synced_at)),
                        movies::updated_at.eq(chrono::Utc::now()),
                    ))
                    .execute(conn)?;
                return Ok(());
            }
        }

        let synced_at = existing
            .as_ref()
            .map(|row| snapshot.advanced_synced_at(row.synced_at))
            .unwrap_or(snapshot.synced_at);

        diesel::insert_into(movies::table)
            .values(NewMovieRow::from_snapshot(snapshot))
            .on_conflict(movies::source_id)
            .do_update()
            .set(MovieChangeset::from_snapshot(snapshot, synced_at))
            .execute(conn)?;

        Self::sync_genres(conn, snapshot.source_id, &dedup_names(&snapshot.genres), strategy)?;
        Self::sync_keywords(
            conn,
            snapshot.source_id,
            &dedup_names(&snapshot.keywords),
            strategy,
        )?;

        Ok(())
    }

    /// Look up or lazily create genre dictionary rows. Duplicate-safe: a
    /// concurrent insert of the same name is absorbed by the conflict target.
    fn ensure_genres(
        conn: &mut PgConnection,
        names: &[String],
    ) -> AppResult<HashMap<String, Uuid>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<NewGenre> = names
            .iter()
            .map(|name| NewGenre {
                id: Uuid::new_v4(),
                name: name.clone(),
            })
            .collect();
        diesel::insert_into(genres::table)
            .values(&rows)
            .on_conflict(genres::name)
            .do_nothing()
            .execute(conn)?;

        let found: Vec<GenreRow> = genres::table
            .filter(genres::name.eq_any(names))
            .load(conn)?;
        Ok(found.into_iter().map(|row| (row.name, row.id)).collect())
    }

    fn ensure_keywords(
        conn: &mut PgConnection,
        names: &[String],
    ) -> AppResult<HashMap<String, Uuid>> {
        if names.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<NewKeyword> = names
            .iter()
            .map(|name| NewKeyword {
                id: Uuid::new_v4(),
                name: name.clone(),
            })
            .collect();
        diesel::insert_into(keywords::table)
            .values(&rows)
            .on_conflict(keywords::name)
            .do_nothing()
            .execute(conn)?;

        let found: Vec<KeywordRow> = keywords::table
            .filter(keywords::name.eq_any(names))
            .load(conn)?;
        Ok(found.into_iter().map(|row| (row.name, row.id)).collect())
    }

    fn sync_genres(
        conn: &mut PgConnection,
        movie_id: i32,
        desired: &[String],
        strategy: SyncStrategy,
    ) -> AppResult<()> {
        let ids = Self::ensure_genres(conn, desired)?;

        match strategy {
            SyncStrategy::Single => {
                // Full replace: drop the association set, insert the desired one
                diesel::delete(movie_genres::table.filter(movie_genres::movie_id.eq(movie_id)))
                    .execute(conn)?;
                Self::insert_genre_links(conn, movie_id, desired, &ids)?;
            }
            SyncStrategy::Batch => {
                let current: Vec<String> = movie_genres::table
                    .inner_join(genres::table)
                    .filter(movie_genres::movie_id.eq(movie_id))
                    .select(genres::name)
                    .load(conn)?;
                let (added, removed) = relation_diff(&current, desired);

                if !removed.is_empty() {
                    let removed_ids: Vec<Uuid> = genres::table
                        .filter(genres::name.eq_any(&removed))
                        .select(genres::id)
                        .load(conn)?;
                    diesel::delete(
                        movie_genres::table
                            .filter(movie_genres::movie_id.eq(movie_id))
                            .filter(movie_genres::genre_id.eq_any(&removed_ids)),
                    )
                    .execute(conn)?;
                }
                Self::insert_genre_links(conn, movie_id, &added, &ids)?;
            }
        }
        Ok(())
    }

    fn insert_genre_links(
        conn: &mut PgConnection,
        movie_id: i32,
        names: &[String],
        ids: &HashMap<String, Uuid>,
    ) -> AppResult<()> {
        let links: Vec<NewMovieGenre> = names
            .iter()
            .filter_map(|name| {
                ids.get(name).map(|genre_id| NewMovieGenre {
                    movie_id,
                    genre_id: *genre_id,
                })
            })
            .collect();
        if !links.is_empty() {
            diesel::insert_into(movie_genres::table)
                .values(&links)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        Ok(())
    }

    fn sync_keywords(
        conn: &mut PgConnection,
        movie_id: i32,
        desired: &[String],
        strategy: SyncStrategy,
    ) -> AppResult<()> {
        let ids = Self::ensure_keywords(conn, desired)?;

        match strategy {
            SyncStrategy::Single => {
                diesel::delete(
                    movie_keywords::table.filter(movie_keywords::movie_id.eq(movie_id)),
                )
                .execute(conn)?;
                Self::insert_keyword_links(conn, movie_id, desired, &ids)?;
            }
            SyncStrategy::Batch => {
                let current: Vec<String> = movie_keywords::table
                    .inner_join(keywords::table)
                    .filter(movie_keywords::movie_id.eq(movie_id))
                    .select(keywords::name)
                    .load(conn)?;
                let (added, removed) = relation_diff(&current, desired);

                if !removed.is_empty() {
                    let removed_ids: Vec<Uuid> = keywords::table
                        .filter(keywords::name.eq_any(&removed))
                        .select(keywords::id)
                        .load(conn)?;
                    diesel::delete(
                        movie_keywords::table
                            .filter(movie_keywords::movie_id.eq(movie_id))
                            .filter(movie_keywords::keyword_id.eq_any(&removed_ids)),
                    )
                    .execute(conn)?;
                }
                Self::insert_keyword_links(conn, movie_id, &added, &ids)?;
            }
        }
        Ok(())
    }

    fn insert_keyword_links(
        conn: &mut PgConnection,
        movie_id: i32,
        names: &[String],
        ids: &HashMap<String, Uuid>,
    ) -> AppResult<()> {
        let links: Vec<NewMovieKeyword> = names
            .iter()
            .filter_map(|name| {
                ids.get(name).map(|keyword_id| NewMovieKeyword {
                    movie_id,
                    keyword_id: *keyword_id,
                })
            })
            .collect();
        if !links.is_empty() {
            diesel::insert_into(movie_keywords::table)
                .values(&links)
                .on_conflict_do_nothing()
                .execute(conn)?;
        }
        Ok(())
    }

    fn load_snapshot(conn: &mut PgConnection, source_id: i32) -> AppResult<Option<MovieSnapshot>> {
        let row: Option<MovieRow> = movies::table.find(source_id).first(conn).optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let genre_names: Vec<String> = movie_genres::table
            .inner_join(genres::table)
            .filter(movie_genres::movie_id.eq(source_id))
            .select(genres::name)
            .order(genres::name.asc())
            .load(conn)?;
        let keyword_names: Vec<String> = movie_keywords::table
            .inner_join(keywords::table)
            .filter(movie_keywords::movie_id.eq(source_id))
            .select(keywords::name)
            .order(keywords::name.asc())
            .load(conn)?;

        Ok(Some(row.into_snapshot(genre_names, keyword_names)))
    }
}

#[async_trait]
impl MovieRepository for MovieRepositoryImpl {
    async fn find_by_source_id(&self, source_id: i32) -> AppResult<Option<MovieSnapshot>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<Option<MovieSnapshot>> {
            let mut conn = db.get_connection()?;
            Self::load_snapshot(&mut conn, source_id)
        })
        .await?
    }

    async fn persist(
        &self,
        snapshot: &MovieSnapshot,
        strategy: SyncStrategy,
    ) -> AppResult<MovieSnapshot> {
        let db = Arc::clone(&self.db);
        let snapshot = snapshot.clone();

        task::spawn_blocking(move || -> AppResult<MovieSnapshot> {
            let mut conn = db.get_connection()?;
            conn.transaction::<_, AppError, _>(|conn| {
                Self::upsert_movie(conn, &snapshot, strategy)
            })?;

            // Canonical state is whatever the store holds after commit
            Self::load_snapshot(&mut conn, snapshot.source_id)?.ok_or_else(|| {
                AppError::Persistence(format!(
                    "movie {} missing after commit",
                    snapshot.source_id
                ))
            })
        })
        .await?
    }

    async fn persist_many(
        &self,
        snapshots: &[MovieSnapshot],
        strategy: SyncStrategy,
        chunk_size: usize,
    ) -> AppResult<Vec<MovieSnapshot>> {
        if snapshots.is_empty() {
            return Ok(Vec::new());
        }

        let db = Arc::clone(&self.db);
        let snapshots = snapshots.to_vec();
        let chunk_size = chunk_size.max(1);

        task::spawn_blocking(move || -> AppResult<Vec<MovieSnapshot>> {
            let mut conn = db.get_connection()?;

            for chunk in snapshots.chunks(chunk_size) {
                conn.transaction::<_, AppError, _>(|conn| {
                    for snapshot in chunk {
                        Self::upsert_movie(conn, snapshot, strategy)?;
                    }
                    Ok(())
                })?;
            }

            let mut persisted = Vec::with_capacity(snapshots.len());
            for snapshot in &snapshots {
                let loaded =
                    Self::load_snapshot(&mut conn, snapshot.source_id)?.ok_or_else(|| {
                        AppError::Persistence(format!(
                            "movie {} missing after commit",
                            snapshot.source_id
                        ))
                    })?;
                persisted.push(loaded);
            }
            Ok(persisted)
        })
        .await?
    }
}
