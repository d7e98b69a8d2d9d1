use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::{
    error::CatalogResult,
    models::{Film, FilmDetails},
    object_id::ObjectId,
    store::{Document, DocumentStore},
};

pub const FILMS_COLLECTION: &str = "movies";

/// SQLite binds offsets and limits as signed 64-bit integers.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Stored shape of a film: everything except the identifier, which the store keeps.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilmDocument {
    #[serde(flatten)]
    details: FilmDetails,
    created_at: Timestamp,
    edited_at: Timestamp,
}

impl FilmDocument {
    fn into_film(self, id: ObjectId) -> Film {
        Film { id, details: self.details, created_at: self.created_at, edited_at: self.edited_at }
    }

    fn from_store(doc: Document) -> CatalogResult<Self> {
        Ok(serde_json::from_value(doc)?)
    }

    fn to_store(&self) -> CatalogResult<Document> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Film persistence over a [`DocumentStore`]. Owns identifier parsing and the
/// timestamp rules for create and update.
#[derive(Clone)]
pub struct FilmRepository {
    store: Arc<dyn DocumentStore>,
}

impl FilmRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Zero-based page of films in insertion order; empty past the end,
    /// including offsets too large for the store to address.
    pub async fn find_page(&self, page_index: u64, page_size: u64) -> CatalogResult<Vec<Film>> {
        let Some(skip) = page_index.checked_mul(page_size).filter(|&skip| skip <= MAX_OFFSET)
        else {
            return Ok(Vec::new());
        };

        let rows = self.store.find(FILMS_COLLECTION, skip, page_size.min(MAX_OFFSET)).await?;

        rows.into_iter()
            .map(|(id, doc)| FilmDocument::from_store(doc).map(|doc| doc.into_film(id)))
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> CatalogResult<Option<Film>> {
        let id = ObjectId::parse_str(id)?;
        self.load(id).await
    }

    pub async fn create(&self, details: FilmDetails) -> CatalogResult<Film> {
        details.validate()?;

        let now = Timestamp::now();
        let doc = FilmDocument { details, created_at: now, edited_at: now };
        let id = self.store.insert_one(FILMS_COLLECTION, doc.to_store()?).await?;

        tracing::debug!(%id, title = %doc.details.title, "film created");
        Ok(doc.into_film(id))
    }

    /// Replaces every mutable attribute of the film. `id` and `createdAt` are
    /// kept; `editedAt` moves forward. Absent ids are left untouched.
    pub async fn update(&self, id: &str, details: FilmDetails) -> CatalogResult<Option<Film>> {
        let id = ObjectId::parse_str(id)?;
        details.validate()?;

        let Some(existing) = self.load(id).await? else {
            return Ok(None);
        };

        let doc = FilmDocument {
            details,
            created_at: existing.created_at,
            edited_at: Timestamp::now().max(existing.created_at),
        };

        if !self.store.replace_by_id(FILMS_COLLECTION, id, doc.to_store()?).await? {
            return Ok(None);
        }

        tracing::debug!(%id, "film updated");
        Ok(Some(doc.into_film(id)))
    }

    /// `true` when a film was removed, `false` when there was nothing to remove.
    pub async fn delete(&self, id: &str) -> CatalogResult<bool> {
        let id = ObjectId::parse_str(id)?;
        let deleted = self.store.delete_by_id(FILMS_COLLECTION, id).await?;
        tracing::debug!(%id, deleted, "film delete");
        Ok(deleted)
    }

    pub async fn count(&self) -> CatalogResult<u64> {
        self.store.count(FILMS_COLLECTION).await
    }

    async fn load(&self, id: ObjectId) -> CatalogResult<Option<Film>> {
        let Some(doc) = self.store.find_by_id(FILMS_COLLECTION, id).await? else {
            return Ok(None);
        };
        Ok(Some(FilmDocument::from_store(doc)?.into_film(id)))
    }
}
