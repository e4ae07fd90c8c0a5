use sea_orm::{ConnectionTrait, EntityTrait, IntoActiveModel, SqlErr, sea_query::OnConflict};
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{MovieDetails, SearchResult},
};

pub async fn get<C: ConnectionTrait>(conn: &C, tmdb_id: i32) -> AppResult<Option<movie::Model>> {
    Ok(movie::Entity::find_by_id(tmdb_id).one(conn).await?)
}

#[derive(Clone, Debug)]
pub struct CachedMovie {
    pub movie: movie::Model,
    pub created: bool,
}

// Concurrent first-time callers race on the primary key: the loser's insert
// is a no-op and it reads the winner's row back.
pub async fn get_or_create<C: ConnectionTrait>(
    conn: &C,
    tmdb_id: i32,
    search: &SearchResult,
    details: &MovieDetails,
) -> AppResult<CachedMovie> {
    if let Some(movie) = get(conn, tmdb_id).await? {
        debug!(tmdb_id, "movie already cached");
        return Ok(CachedMovie { movie, created: false });
    }

    let row = movie::Model {
        id: tmdb_id,
        title: search.title.clone(),
        release_date: search.release_date.as_deref().and_then(non_empty),
        genre: details.genres.first().map(|g| g.name.clone()),
        runtime: details.runtime,
        poster_path: search.poster_path.as_deref().and_then(non_empty),
        vote_average: search.vote_average,
        cached_at: now_sec(),
    };

    let inserted = match movie::Entity::insert(row.clone().into_active_model())
        .on_conflict(OnConflict::column(movie::Column::Id).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await
    {
        Ok(rows) => rows > 0,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => false,
        Err(err) => return Err(err.into()),
    };

    if inserted {
        debug!(tmdb_id, title = %row.title, "cached new movie");
        return Ok(CachedMovie { movie: row, created: true });
    }

    debug!(tmdb_id, "movie inserted concurrently, reading it back");
    let movie = get(conn, tmdb_id).await?.ok_or_else(|| AppError::not_found("movie", tmdb_id))?;
    Ok(CachedMovie { movie, created: false })
}

pub fn format_runtime(minutes: u64) -> String {
    format!("{}h {}m", minutes / 60, minutes % 60)
}

pub fn poster_url(base_url: &str, poster_path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), poster_path.trim_start_matches('/'))
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

pub(crate) fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
