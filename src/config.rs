use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub hypermedia_uri: String,
    pub cache: CacheConfig,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub database_url: String,
    pub film_ttl: Duration,
    pub page_ttl: Duration,
    pub op_timeout: Duration,
    pub purge_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_url: "sqlite://catalog-cache.db?mode=rwc".to_string(),
            film_ttl: Duration::from_secs(50),
            page_ttl: Duration::from_secs(20),
            op_timeout: Duration::from_millis(2_000),
            purge_interval: Duration::from_secs(300),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 =
            std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().context("PORT")?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://catalog.db?mode=rwc".to_string());

        let hypermedia_uri = std::env::var("HYPERMEDIA_URI")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            enabled: std::env::var("CACHE_ENABLED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.enabled),
            database_url: std::env::var("CACHE_DATABASE_URL").unwrap_or(defaults.database_url),
            film_ttl: env_duration("CACHE_FILM_TTL_SECS", Duration::from_secs)
                .unwrap_or(defaults.film_ttl),
            page_ttl: env_duration("CACHE_PAGE_TTL_SECS", Duration::from_secs)
                .unwrap_or(defaults.page_ttl),
            op_timeout: env_duration("CACHE_TIMEOUT_MS", Duration::from_millis)
                .unwrap_or(defaults.op_timeout),
            purge_interval: env_duration("CACHE_PURGE_INTERVAL_SECS", Duration::from_secs)
                .unwrap_or(defaults.purge_interval),
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            hypermedia_uri,
            cache,
        })
    }
}

fn env_duration(key: &str, unit: fn(u64) -> Duration) -> Option<Duration> {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).map(unit)
}
