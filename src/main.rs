mod cache;
mod config;
mod db;
mod entities;
mod entries;
mod error;
mod models;
mod processor;
mod routes;
mod summary;
#[cfg(test)]
mod testing;
mod tmdb;
mod users;

use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use crate::{
    config::Config,
    tmdb::{RetryPolicy, TmdbClient},
};

pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub tmdb: Arc<TmdbClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("reelog/0.1")
        .timeout(Duration::from_secs(config.tmdb_timeout_secs))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_api_key.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
        RetryPolicy {
            max_retries: config.tmdb_max_retries,
            base_delay: Duration::from_millis(config.tmdb_retry_base_ms),
        },
    );

    let state = Arc::new(AppState { config: config.clone(), db, tmdb: Arc::new(tmdb) });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
