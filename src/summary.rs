use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    cache::format_runtime,
    entities::{entry, movie},
    error::AppResult,
    models::{CurrentUser, Summary, SummaryEntry},
};

// Movies with an unknown runtime add nothing to the total.
pub async fn summarize<C: ConnectionTrait>(conn: &C, user: &CurrentUser) -> AppResult<Summary> {
    let rows = entry::Entity::find()
        .filter(entry::Column::UserId.eq(user.id))
        .order_by_desc(entry::Column::WatchedOn)
        .order_by_desc(entry::Column::Id)
        .find_also_related(movie::Entity)
        .all(conn)
        .await?;

    let mut total_runtime_minutes: u64 = 0;
    let mut entries = Vec::with_capacity(rows.len());

    for (entry, movie) in rows {
        let runtime = movie.as_ref().and_then(|m| m.runtime);
        total_runtime_minutes += runtime.and_then(|r| u64::try_from(r).ok()).unwrap_or(0);

        entries.push(SummaryEntry {
            entry_id: entry.id,
            movie_id: entry.movie_id,
            title: movie.as_ref().map(|m| m.title.clone()).unwrap_or_default(),
            watched_on: entry.watched_on,
            rating: entry.rating,
            runtime_minutes: runtime,
            poster_path: movie.and_then(|m| m.poster_path),
        });
    }

    Ok(Summary {
        count: entries.len(),
        entries,
        total_runtime_minutes,
        total_runtime: format_runtime(total_runtime_minutes),
    })
}
