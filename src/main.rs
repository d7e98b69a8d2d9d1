mod cache;
mod cache_aside;
mod config;
mod db;
mod entities;
mod error;
mod hal;
mod models;
mod object_id;
mod pagination;
mod repository;
mod routes;
mod service;
mod store;

use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    cache::{KeyValueCache, SqlCache},
    cache_aside::{CachePolicy, CachedFilmReader},
    config::{CacheConfig, Config},
    hal::Hypermedia,
    repository::FilmRepository,
    service::FilmService,
    store::SqlDocumentStore,
};

#[derive(Clone)]
pub struct AppState {
    pub service: FilmService,
    pub hypermedia: Hypermedia,
}

pub fn app(state: Arc<AppState>) -> Router {
    routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,starwars_catalog=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let db = db::open_store(&config.database_url).await?;
    let repository = FilmRepository::new(Arc::new(SqlDocumentStore::new(db)));

    let cache = start_cache(&config.cache).await;
    let policy = CachePolicy::from(&config.cache);
    let reader = CachedFilmReader::new(repository.clone(), cache, policy);

    let state = Arc::new(AppState {
        service: FilmService::new(repository, reader),
        hypermedia: Hypermedia::new(config.hypermedia_uri.clone()),
    });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, cache = config.cache.enabled, "listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// The cache is optional: when disabled or unreachable at startup the service
/// runs on store reads alone.
async fn start_cache(config: &CacheConfig) -> Option<Arc<dyn KeyValueCache>> {
    if !config.enabled {
        tracing::info!("cache disabled");
        return None;
    }

    let db = match db::open_cache(&config.database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::warn!(error = %err, "cache unavailable, serving reads from the store");
            return None;
        },
    };

    let cache = SqlCache::new(db);
    spawn_purger(cache.clone(), config.purge_interval);
    Some(Arc::new(cache))
}

fn spawn_purger(cache: SqlCache, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(std::time::Duration::from_secs(1)));
        loop {
            ticker.tick().await;
            match cache.purge_expired().await {
                Ok(0) => {},
                Ok(purged) => tracing::debug!(purged, "expired cache entries removed"),
                Err(err) => tracing::warn!(error = %err, "cache purge failed"),
            }
        }
    });
}
