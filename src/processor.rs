use futures::{StreamExt, stream};
use jiff::civil::Date;
use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::{debug, warn};

use crate::{
    cache,
    entities::{entry, movie},
    entries,
    error::{AppError, AppResult},
    models::{CurrentUser, Rating, SearchResult},
    tmdb::MetadataSource,
    users,
};

// Results keep the provider's order. A candidate whose details cannot be
// fetched is skipped; the search only fails if every candidate does.
pub async fn search<M: MetadataSource>(
    db: &DatabaseConnection,
    metadata: &M,
    query: &str,
    max_concurrent: usize,
) -> AppResult<Vec<movie::Model>> {
    let candidates = metadata.search_by_title(query).await?;
    debug!(query = %query, candidates = candidates.len(), "reconciling search results");

    let outcomes: Vec<AppResult<movie::Model>> = stream::iter(candidates)
        .map(|candidate| reconcile(db, metadata, candidate))
        .buffered(max_concurrent.max(1))
        .collect()
        .await;

    let mut movies = Vec::with_capacity(outcomes.len());
    let mut first_err = None;
    for outcome in outcomes {
        match outcome {
            Ok(movie) => movies.push(movie),
            Err(err) => {
                warn!(error = %err, "failed to cache search result");
                first_err.get_or_insert(err);
            },
        }
    }

    match first_err {
        Some(err) if movies.is_empty() => Err(err),
        _ => Ok(movies),
    }
}

async fn reconcile<M: MetadataSource>(
    db: &DatabaseConnection,
    metadata: &M,
    candidate: SearchResult,
) -> AppResult<movie::Model> {
    if let Some(movie) = cache::get(db, candidate.id).await? {
        return Ok(movie);
    }

    let details = metadata.fetch_details(candidate.id).await?;
    debug!(tmdb_id = candidate.id, tagline = ?details.tagline, "fetched details for new movie");

    let txn = db.begin().await?;
    let cached = cache::get_or_create(&txn, candidate.id, &candidate, &details).await?;
    txn.commit().await?;

    if !cached.created {
        debug!(tmdb_id = candidate.id, "movie was cached by a concurrent request");
    }
    Ok(cached.movie)
}

// The movie insert and the entry insert commit together or not at all.
pub async fn log_watch<M: MetadataSource>(
    db: &DatabaseConnection,
    metadata: &M,
    user: &CurrentUser,
    tmdb_id: i32,
    watched_on: Date,
    rating: Option<i32>,
) -> AppResult<entry::Model> {
    rating.map(Rating::new).transpose()?;
    if users::find(db, user.id).await?.is_none() {
        return Err(AppError::not_found("user", user.id));
    }

    let details = match cache::get(db, tmdb_id).await? {
        Some(_) => None,
        None => Some(metadata.fetch_details(tmdb_id).await?),
    };

    let txn = db.begin().await?;
    if let Some(details) = &details {
        cache::get_or_create(&txn, tmdb_id, &details.as_search_result(), details).await?;
    }
    let entry = entries::record(&txn, user, tmdb_id, watched_on, rating).await?;
    txn.commit().await?;

    Ok(entry)
}
