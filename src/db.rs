use migration::{CacheMigrator, Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use crate::error::CatalogResult;

const PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"];

/// Opens the document store database and brings its schema up to date.
pub async fn open_store(database_url: &str) -> CatalogResult<DatabaseConnection> {
    let db = connect(database_url).await?;
    Migrator::up(&db, None).await?;
    tracing::debug!(url = %redact(database_url), "document store ready");
    Ok(db)
}

/// Opens the cache database and brings its schema up to date.
pub async fn open_cache(database_url: &str) -> CatalogResult<DatabaseConnection> {
    let db = connect(database_url).await?;
    CacheMigrator::up(&db, None).await?;
    tracing::debug!(url = %redact(database_url), "cache database ready");
    Ok(db)
}

async fn connect(database_url: &str) -> CatalogResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    for pragma in PRAGMAS {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }
    Ok(db)
}

fn redact(url: &str) -> &str {
    url.split_once('?').map_or(url, |(path, _)| path)
}
