use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState, cache,
    entities::entry,
    entries,
    error::{AppError, AppResult},
    models::{CurrentUser, EntryRequest, MovieView, NewUser, Rating, Summary, UserView},
    processor, summary, users,
};

const USER_HEADER: &str = "x-user-id";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users", post(create_user))
        .route("/movies/search", get(search_movies))
        .route("/movies/{id}", get(get_movie))
        .route("/movies/{id}/entries", get(movie_entries))
        .route("/entries", post(create_entry))
        .route("/entries/{id}", delete(delete_entry))
        .route("/summary", get(get_summary))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

// Credential checks happen in front of this service; here the id only has to
// name a real user.
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i32>().ok())
            .ok_or_else(|| AppError::Unauthorized("missing or invalid x-user-id header".into()))?;

        match users::find(&state.db, id).await? {
            Some(user) => Ok(CurrentUser { id: user.id }),
            None => Err(AppError::Unauthorized(format!("unknown user {id}"))),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    new: Result<Json<NewUser>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let Json(new) = new?;
    let user = users::create(&state.db, new).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    query: String,
}

async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieView>>> {
    let movies =
        processor::search(&state.db, &*state.tmdb, &q.query, state.config.max_concurrent).await?;
    Ok(Json(
        movies.into_iter().map(|m| MovieView::new(m, &state.config.poster_base_url)).collect(),
    ))
}

async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieView>> {
    let movie = cache::get(&state.db, id).await?.ok_or_else(|| AppError::not_found("movie", id))?;
    Ok(Json(MovieView::new(movie, &state.config.poster_base_url)))
}

async fn movie_entries(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<entry::Model>>> {
    Ok(Json(entries::list_for_movie(&state.db, &user, id).await?))
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    req: Result<Json<EntryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<entry::Model>)> {
    let Json(req) = req?;
    let rating = req.rating.as_ref().map(Rating::from_json).transpose()?.map(Rating::get);
    let watched_on = entries::parse_watched_on(&req.watched_on)?;
    let entry =
        processor::log_watch(&state.db, &*state.tmdb, &user, req.movie_id, watched_on, rating)
            .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    entries::delete(&state.db, &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_summary(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> AppResult<Json<Summary>> {
    Ok(Json(summary::summarize(&state.db, &user).await?))
}
