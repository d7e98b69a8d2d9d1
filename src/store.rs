use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};
use serde_json::Value;

use crate::{
    entities::document,
    error::{CatalogError, CatalogResult},
    object_id::ObjectId,
};

/// A JSON object as held by the store. The identifier lives beside it, not inside it.
pub type Document = Value;

/// Minimal document-store surface the repository needs. Every operation is
/// scoped to a named collection and addressed by [`ObjectId`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document and returns the identifier the store assigned.
    async fn insert_one(&self, collection: &str, doc: Document) -> CatalogResult<ObjectId>;

    /// Documents in insertion order, skipping `skip` and returning at most `limit`.
    async fn find(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> CatalogResult<Vec<(ObjectId, Document)>>;

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> CatalogResult<Option<Document>>;

    /// Returns `false` when nothing matched `id`.
    async fn replace_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        doc: Document,
    ) -> CatalogResult<bool>;

    /// Returns `false` when nothing matched `id`.
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> CatalogResult<bool>;

    async fn count(&self, collection: &str) -> CatalogResult<u64>;

    async fn ping(&self) -> CatalogResult<()>;
}

#[derive(Clone)]
pub struct SqlDocumentStore {
    db: DatabaseConnection,
}

impl SqlDocumentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn insert_with_id(
        &self,
        collection: &str,
        id: ObjectId,
        doc: &Document,
    ) -> CatalogResult<()> {
        let model = document::ActiveModel {
            seq: Default::default(),
            id: Set(id.to_hex()),
            collection: Set(collection.to_string()),
            body: Set(serde_json::to_string(doc)?),
            inserted_at: Set(jiff::Timestamp::now().as_millisecond()),
        };

        match document::Entity::insert(model).exec(&self.db).await {
            Ok(_) => Ok(()),
            Err(err) => match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    Err(CatalogError::DuplicateIdentifier(id.to_hex()))
                },
                _ => Err(err.into()),
            },
        }
    }
}

#[async_trait]
impl DocumentStore for SqlDocumentStore {
    async fn insert_one(&self, collection: &str, doc: Document) -> CatalogResult<ObjectId> {
        let id = ObjectId::generate();
        self.insert_with_id(collection, id, &doc).await?;
        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        skip: u64,
        limit: u64,
    ) -> CatalogResult<Vec<(ObjectId, Document)>> {
        let rows = document::Entity::find()
            .filter(document::Column::Collection.eq(collection))
            .order_by_asc(document::Column::Seq)
            .offset(skip)
            .limit(limit)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| -> CatalogResult<(ObjectId, Document)> {
                Ok((ObjectId::parse_str(&row.id)?, serde_json::from_str(&row.body)?))
            })
            .collect()
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> CatalogResult<Option<Document>> {
        let row = document::Entity::find()
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::Id.eq(id.to_hex()))
            .one(&self.db)
            .await?;

        row.map(|row| serde_json::from_str(&row.body).map_err(CatalogError::from)).transpose()
    }

    async fn replace_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        doc: Document,
    ) -> CatalogResult<bool> {
        let result = document::Entity::update_many()
            .col_expr(document::Column::Body, Expr::value(serde_json::to_string(&doc)?))
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::Id.eq(id.to_hex()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> CatalogResult<bool> {
        let result = document::Entity::delete_many()
            .filter(document::Column::Collection.eq(collection))
            .filter(document::Column::Id.eq(id.to_hex()))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn count(&self, collection: &str) -> CatalogResult<u64> {
        let total = document::Entity::find()
            .filter(document::Column::Collection.eq(collection))
            .count(&self.db)
            .await?;
        Ok(total)
    }

    async fn ping(&self) -> CatalogResult<()> {
        self.db.ping().await?;
        Ok(())
    }
}
