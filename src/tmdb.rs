use std::{future::Future, num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::StatusCode;
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, SearchResult},
};

pub const SEARCH_RESULT_LIMIT: usize = 5;

pub trait MetadataSource: Send + Sync {
    fn search_by_title(
        &self,
        query: &str,
    ) -> impl Future<Output = AppResult<Vec<SearchResult>>> + Send;

    fn fetch_details(&self, tmdb_id: i32) -> impl Future<Output = AppResult<MovieDetails>> + Send;
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    // base, 2*base, 4*base... for zero-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, base_delay: Duration::from_millis(250) }
    }
}

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    retry: RetryPolicy,
}

impl TmdbClient {
    pub fn new(
        client: reqwest::Client,
        api_key: String,
        base_url: String,
        rps: u32,
        retry: RetryPolicy,
    ) -> Self {
        if api_key.trim().is_empty() {
            warn!("no TMDB_API_KEY provided, metadata requests will be rejected upstream");
        }

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, api_key, base_url, limiter, retry }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut attempt = 0;

        loop {
            self.limiter.until_ready().await;

            match self.try_get(&url, params).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "TMDB request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                },
                Err(err) => return Err(err),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(FetchError::Decode)
    }
}

impl MetadataSource for TmdbClient {
    async fn search_by_title(&self, query: &str) -> AppResult<Vec<SearchResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("query", query, "search text is required"));
        }

        debug!(query = %query, "searching TMDB");
        let resp: SearchResponse = self
            .get_json("/search/movie", &[("query", query)])
            .await
            .map_err(|e| e.into_app_error(|| format!("search results for {query:?}")))?;

        if resp.results.is_empty() {
            return Err(AppError::NotFound(format!("search results for {query:?}")));
        }

        let mut results = resp.results;
        results.truncate(SEARCH_RESULT_LIMIT);
        Ok(results)
    }

    async fn fetch_details(&self, tmdb_id: i32) -> AppResult<MovieDetails> {
        debug!(tmdb_id, "fetching TMDB movie details");
        self.get_json(&format!("/movie/{tmdb_id}"), &[])
            .await
            .map_err(|e| e.into_app_error(|| format!("movie {tmdb_id}")))
    }
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("TMDB returned HTTP {0}")]
    Status(StatusCode),

    #[error("malformed TMDB response: {0}")]
    Decode(serde_json::Error),
}

impl FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(err) => err.is_connect() || err.is_timeout(),
            FetchError::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            },
            FetchError::Decode(_) => false,
        }
    }

    fn into_app_error(self, resource: impl FnOnce() -> String) -> AppError {
        match self {
            FetchError::Status(StatusCode::NOT_FOUND) => AppError::NotFound(resource()),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}
