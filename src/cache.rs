use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::{entities::cache_entry, error::CatalogResult};

/// String key-value store with per-entry expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> CatalogResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()>;

    async fn ping(&self) -> CatalogResult<()>;
}

/// Cache table on its own SQLite connection. Expired rows are invisible to
/// reads and removed by [`SqlCache::purge_expired`].
#[derive(Clone)]
pub struct SqlCache {
    db: DatabaseConnection,
}

impl SqlCache {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn purge_expired(&self) -> CatalogResult<u64> {
        let result = cache_entry::Entity::delete_many()
            .filter(cache_entry::Column::ExpiresAt.lte(now_ms()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[async_trait]
impl KeyValueCache for SqlCache {
    async fn get(&self, key: &str) -> CatalogResult<Option<String>> {
        let entry = cache_entry::Entity::find_by_id(key.to_string()).one(&self.db).await?;
        Ok(entry.filter(|e| is_fresh(e.expires_at)).map(|e| e.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CatalogResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let model = cache_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            expires_at: Set(now_ms().saturating_add(ttl_ms)),
        };

        cache_entry::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(cache_entry::Column::Key)
                    .update_columns([cache_entry::Column::Value, cache_entry::Column::ExpiresAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}

fn is_fresh(expires_at: i64) -> bool {
    now_ms() < expires_at
}

fn now_ms() -> i64 {
    jiff::Timestamp::now().as_millisecond()
}
