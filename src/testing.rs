use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{
    error::{AppError, AppResult},
    models::{Genre, MovieDetails, SearchResult},
    tmdb::MetadataSource,
};

#[derive(Default)]
struct FakeState {
    search_calls: AtomicUsize,
    details_calls: AtomicUsize,
    failures_left: AtomicUsize,
    throttled_left: AtomicUsize,
    stalls_left: AtomicUsize,
    last_api_key: Mutex<Option<String>>,
}

pub struct FakeTmdb {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeTmdb {
    pub async fn spawn() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route("/search/movie", get(search))
            .route("/movie/{id}", get(movie))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    // 503
    pub fn fail_next_details(&self, n: usize) {
        self.state.failures_left.store(n, Ordering::SeqCst);
    }

    // 429
    pub fn throttle_next_details(&self, n: usize) {
        self.state.throttled_left.store(n, Ordering::SeqCst);
    }

    pub fn stall_next_details(&self, n: usize) {
        self.state.stalls_left.store(n, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> usize {
        self.state.search_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.state.details_calls.load(Ordering::SeqCst)
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.state.last_api_key.lock().unwrap().clone()
    }
}

async fn search(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.search_calls.fetch_add(1, Ordering::SeqCst);
    *state.last_api_key.lock().unwrap() = params.get("api_key").cloned();

    match params.get("query").map(String::as_str) {
        Some("matrix") => {
            let results: Vec<_> = (603..610)
                .map(|id| {
                    let title = if id == 603 {
                        "The Matrix".to_string()
                    } else {
                        format!("The Matrix {}", id - 602)
                    };
                    let release_date = if id == 607 { "" } else { "1999-03-30" };
                    json!({
                        "id": id,
                        "title": title,
                        "release_date": release_date,
                        "vote_average": 8.2,
                        "poster_path": format!("/poster{id}.jpg"),
                    })
                })
                .collect();
            Json(json!({ "results": results })).into_response()
        },
        Some("garbage") => (StatusCode::OK, "<html>not json</html>").into_response(),
        _ => Json(json!({ "results": [] })).into_response(),
    }
}

async fn movie(State(state): State<Arc<FakeState>>, Path(id): Path<i32>) -> Response {
    state.details_calls.fetch_add(1, Ordering::SeqCst);

    if take_one(&state.failures_left) {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }
    if take_one(&state.throttled_left) {
        return (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "1")]).into_response();
    }
    if take_one(&state.stalls_left) {
        tokio::time::sleep(Duration::from_secs(2)).await;
    }

    if id == 999_999 {
        return (StatusCode::NOT_FOUND, Json(json!({ "status_code": 34 }))).into_response();
    }

    let genres =
        if id == 604 { json!([]) } else { json!([{ "name": "Action" }, { "name": "Sci-Fi" }]) };
    let title = if id == 603 { "The Matrix".to_string() } else { format!("Movie {id}") };
    let runtime = if id == 603 { 136 } else { 120 };
    Json(json!({
        "id": id,
        "title": title,
        "release_date": "1999-03-30",
        "vote_average": 8.2,
        "poster_path": format!("/poster{id}.jpg"),
        "runtime": runtime,
        "genres": genres,
        "tagline": "Welcome to the Real World.",
    }))
    .into_response()
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
}

#[derive(Default)]
pub struct StubMetadata {
    pub search: Vec<SearchResult>,
    pub details: HashMap<i32, MovieDetails>,
    detail_calls: AtomicUsize,
}

impl StubMetadata {
    pub fn with_movies(movies: &[(i32, &str, Option<i32>)]) -> Self {
        let mut stub = Self::default();
        for &(id, title, runtime) in movies {
            stub.search.push(SearchResult {
                id,
                title: title.to_string(),
                release_date: Some("2001-01-01".to_string()),
                vote_average: 7.0,
                poster_path: Some(format!("/{id}.jpg")),
            });
            stub.details.insert(id, details(id, title, runtime));
        }
        stub
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

impl MetadataSource for StubMetadata {
    async fn search_by_title(&self, _query: &str) -> AppResult<Vec<SearchResult>> {
        if self.search.is_empty() {
            return Err(AppError::NotFound("search results".to_string()));
        }
        Ok(self.search.clone())
    }

    async fn fetch_details(&self, tmdb_id: i32) -> AppResult<MovieDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details.get(&tmdb_id).cloned().ok_or_else(|| AppError::not_found("movie", tmdb_id))
    }
}

pub fn details(id: i32, title: &str, runtime: Option<i32>) -> MovieDetails {
    MovieDetails {
        id,
        title: title.to_string(),
        release_date: Some("2001-01-01".to_string()),
        vote_average: 7.0,
        poster_path: Some(format!("/{id}.jpg")),
        runtime,
        genres: vec![Genre { name: "Drama".to_string() }],
        tagline: None,
    }
}
