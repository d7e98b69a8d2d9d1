use tracing::error;

use crate::{
    cache_aside::CachedFilmReader,
    error::{CatalogError, CatalogResult},
    models::{Film, FilmDetails},
    pagination::{Page, PageRequest},
    repository::FilmRepository,
};

/// Entry point used by the HTTP layer. Reads go through the cache-aside
/// reader, writes straight to the repository. Store and codec failures leave
/// here as `OperationFailed`.
#[derive(Clone)]
pub struct FilmService {
    repository: FilmRepository,
    reader: CachedFilmReader,
}

impl FilmService {
    pub fn new(repository: FilmRepository, reader: CachedFilmReader) -> Self {
        Self { repository, reader }
    }

    pub fn repository(&self) -> &FilmRepository {
        &self.repository
    }

    pub fn reader(&self) -> &CachedFilmReader {
        &self.reader
    }

    pub async fn list_page(&self, page: i64, size: i64) -> CatalogResult<Page> {
        let request = PageRequest::new(page, size)?;
        self.reader.get_page(request).await.map_err(|err| wrap("list_page", err))
    }

    pub async fn get_by_id(&self, id: &str) -> CatalogResult<Option<Film>> {
        self.reader.get_by_id(id).await.map_err(|err| wrap("get_by_id", err))
    }

    pub async fn create(&self, details: FilmDetails) -> CatalogResult<Film> {
        self.repository.create(details).await.map_err(|err| wrap("create", err))
    }

    pub async fn update(&self, id: &str, details: FilmDetails) -> CatalogResult<Option<Film>> {
        self.repository.update(id, details).await.map_err(|err| wrap("update", err))
    }

    pub async fn delete(&self, id: &str) -> CatalogResult<bool> {
        self.repository.delete(id).await.map_err(|err| wrap("delete", err))
    }

    pub async fn count(&self) -> CatalogResult<u64> {
        self.repository.count().await.map_err(|err| wrap("count", err))
    }
}

fn wrap(operation: &'static str, err: CatalogError) -> CatalogError {
    if err.is_client_error() {
        return err;
    }
    let err = err.into_operation_failed();
    error!(operation, error = %err, "catalog operation failed");
    err
}
