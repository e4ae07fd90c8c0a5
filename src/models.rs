use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    cache,
    entities::{movie, user},
    error::{AppError, AppResult},
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Genre {
    pub name: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MovieDetails {
    pub id: i32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub tagline: Option<String>,
}

impl MovieDetails {
    pub fn as_search_result(&self) -> SearchResult {
        SearchResult {
            id: self.id,
            title: self.title.clone(),
            release_date: self.release_date.clone(),
            vote_average: self.vote_average,
            poster_path: self.poster_path.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 10;

    pub fn new(value: i32) -> AppResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or_else(|| {
                AppError::validation("rating", value.to_string(), "must be between 0 and 10")
            })
    }

    // Request bodies carry the rating as raw JSON so a string or a fraction
    // is reported with the value the caller sent.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        match value.as_i64().and_then(|v| i32::try_from(v).ok()) {
            Some(v) => Self::new(v),
            None => {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Err(AppError::validation("rating", shown, "must be a whole number from 0 to 10"))
            },
        }
    }

    pub fn get(self) -> i32 {
        i32::from(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurrentUser {
    pub id: i32,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for UserView {
    fn from(user: user::Model) -> Self {
        Self { id: user.id, name: user.name, username: user.username, email: user.email }
    }
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub movie_id: i32,
    pub watched_on: String,
    #[serde(default)]
    pub rating: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct MovieView {
    pub id: i32,
    pub title: String,
    pub release_date: Option<String>,
    pub genre: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub runtime: Option<String>,
    pub poster_url: Option<String>,
    pub vote_average: f64,
}

impl MovieView {
    pub fn new(movie: movie::Model, poster_base_url: &str) -> Self {
        Self {
            id: movie.id,
            runtime: movie.runtime.map(|m| cache::format_runtime(u64::try_from(m).unwrap_or(0))),
            poster_url: movie.poster_path.as_deref().map(|p| cache::poster_url(poster_base_url, p)),
            title: movie.title,
            release_date: movie.release_date,
            genre: movie.genre,
            runtime_minutes: movie.runtime,
            vote_average: movie.vote_average,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SummaryEntry {
    pub entry_id: i32,
    pub movie_id: i32,
    pub title: String,
    pub watched_on: String,
    pub rating: Option<i32>,
    pub runtime_minutes: Option<i32>,
    pub poster_path: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
    pub count: usize,
    pub total_runtime_minutes: u64,
    pub total_runtime: String,
}
