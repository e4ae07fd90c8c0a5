use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use tracing::{debug, warn};

use crate::{
    cache,
    entities::{entry, user},
    error::{AppError, AppResult},
    models::{CurrentUser, Rating},
};

// ISO or the `MM-DD-YYYY` form-style date
pub fn parse_watched_on(input: &str) -> AppResult<Date> {
    let input = input.trim();
    input
        .parse::<Date>()
        .or_else(|_| Date::strptime("%m-%d-%Y", input))
        .map_err(|_| {
            AppError::validation("watched_on", input, "expected a date like 2024-03-01")
        })
}

pub async fn record<C: ConnectionTrait>(
    conn: &C,
    user: &CurrentUser,
    movie_id: i32,
    watched_on: Date,
    rating: Option<i32>,
) -> AppResult<entry::Model> {
    let rating = rating.map(Rating::new).transpose()?;

    if user::Entity::find_by_id(user.id).one(conn).await?.is_none() {
        return Err(AppError::not_found("user", user.id));
    }
    if cache::get(conn, movie_id).await?.is_none() {
        return Err(AppError::not_found("movie", movie_id));
    }

    let entry = entry::ActiveModel {
        user_id: Set(user.id),
        movie_id: Set(movie_id),
        watched_on: Set(watched_on.to_string()),
        rating: Set(rating.map(Rating::get)),
        created_at: Set(cache::now_sec()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    debug!(user_id = user.id, movie_id, entry_id = entry.id, "recorded entry");
    Ok(entry)
}

pub async fn delete<C: ConnectionTrait>(
    conn: &C,
    user: &CurrentUser,
    entry_id: i32,
) -> AppResult<()> {
    let Some(entry) = entry::Entity::find_by_id(entry_id).one(conn).await? else {
        return Err(AppError::not_found("entry", entry_id));
    };

    if entry.user_id != user.id {
        warn!(
            user_id = user.id,
            entry_id,
            owner_id = entry.user_id,
            "refused to delete another user's entry"
        );
        return Err(AppError::not_found("entry", entry_id));
    }

    entry.delete(conn).await?;
    debug!(user_id = user.id, entry_id, "deleted entry");
    Ok(())
}

pub async fn list_for_movie<C: ConnectionTrait>(
    conn: &C,
    user: &CurrentUser,
    movie_id: i32,
) -> AppResult<Vec<entry::Model>> {
    Ok(entry::Entity::find()
        .filter(entry::Column::UserId.eq(user.id))
        .filter(entry::Column::MovieId.eq(movie_id))
        .order_by_desc(entry::Column::WatchedOn)
        .order_by_desc(entry::Column::Id)
        .all(conn)
        .await?)
}
