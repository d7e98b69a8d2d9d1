use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, trace, warn};

use crate::{
    cache::KeyValueCache,
    config::CacheConfig,
    error::CatalogResult,
    models::Film,
    object_id::ObjectId,
    pagination::{Page, PageRequest},
    repository::FilmRepository,
};

#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    pub film_ttl: Duration,
    pub page_ttl: Duration,
    pub op_timeout: Duration,
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            film_ttl: config.film_ttl,
            page_ttl: config.page_ttl,
            op_timeout: config.op_timeout,
        }
    }
}

/// Read path of the catalog: consult the cache, fall back to the repository,
/// then populate the cache in the background.
///
/// Every cache call is bounded by `op_timeout`; errors and timeouts count as a
/// miss and never fail the read. Writes do not invalidate entries, so a cached
/// film or page can be stale for up to its TTL.
#[derive(Clone)]
pub struct CachedFilmReader {
    repository: FilmRepository,
    cache: Option<Arc<dyn KeyValueCache>>,
    policy: CachePolicy,
}

impl CachedFilmReader {
    pub fn new(
        repository: FilmRepository,
        cache: Option<Arc<dyn KeyValueCache>>,
        policy: CachePolicy,
    ) -> Self {
        Self { repository, cache, policy }
    }

    pub fn cache(&self) -> Option<&Arc<dyn KeyValueCache>> {
        self.cache.as_ref()
    }

    pub async fn get_by_id(&self, id: &str) -> CatalogResult<Option<Film>> {
        let key = ObjectId::parse_str(id)?.to_hex();

        if let Some(film) = self.lookup::<Film>(&key).await {
            trace!(%key, "film served from cache");
            return Ok(Some(film));
        }

        let film = self.repository.find_by_id(&key).await?;
        trace!(%key, found = film.is_some(), "film served from store");
        if let Some(film) = &film {
            self.populate(key, film, self.policy.film_ttl);
        }
        Ok(film)
    }

    pub async fn get_page(&self, request: PageRequest) -> CatalogResult<Page> {
        let key = request.cache_key();

        if let Some(page) = self.lookup::<Page>(&key).await {
            trace!(%key, "page served from cache");
            return Ok(page);
        }

        let items = self.repository.find_page(request.index(), request.size()).await?;
        let total = self.repository.count().await?;
        let page = Page::assemble(request, total, items);
        trace!(%key, items = page.items.len(), total, "page served from store");

        self.populate(key, &page, self.policy.page_ttl);
        Ok(page)
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let cache = self.cache.as_ref()?;

        let raw = match tokio::time::timeout(self.policy.op_timeout, cache.get(key)).await {
            Ok(Ok(raw)) => raw?,
            Ok(Err(err)) => {
                warn!(%key, error = %err, "cache read failed, falling back to store");
                return None;
            },
            Err(_) => {
                let timeout_ms = self.policy.op_timeout.as_millis() as u64;
                warn!(%key, timeout_ms, "cache read timed out");
                return None;
            },
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%key, error = %err, "discarding undecodable cache entry");
                None
            },
        }
    }

    /// Writes `value` under `key` on a detached task; the caller never waits.
    fn populate<T: Serialize>(&self, key: String, value: &T, ttl: Duration) {
        let Some(cache) = self.cache.clone() else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%key, error = %err, "cannot encode cache entry");
                return;
            },
        };

        let timeout = self.policy.op_timeout;
        tokio::spawn(async move {
            match tokio::time::timeout(timeout, cache.set(&key, &raw, ttl)).await {
                Ok(Ok(())) => debug!(%key, ttl_secs = ttl.as_secs(), "cache populated"),
                Ok(Err(err)) => warn!(%key, error = %err, "cache write failed"),
                Err(_) => warn!(%key, "cache write timed out"),
            }
        });
    }
}
