pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_documents;
mod m20250601_000002_create_cache_entries;

/// Schema of the document store.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250601_000001_create_documents::Migration)]
    }
}

/// Schema of the cache database. Keeps its own history table so it can share
/// a file with [`Migrator`].
pub struct CacheMigrator;

#[async_trait::async_trait]
impl MigratorTrait for CacheMigrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250601_000002_create_cache_entries::Migration)]
    }

    fn migration_table_name() -> DynIden {
        Alias::new("seaql_cache_migrations").into_iden()
    }
}
