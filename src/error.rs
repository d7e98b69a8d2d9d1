use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Failures raised by the catalog core (repository, cache-aside reader, service).
///
/// "Not found" is never an error here: lookups return `Option` and deletes
/// return `bool`. The `Database` and `Serialization` variants only travel
/// between the store and the service; the service folds them into
/// `OperationFailed` before anything reaches the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid identifier `{0}`: expected 24 hexadecimal characters")]
    InvalidIdentifier(String),

    #[error("invalid page size {0}: must be at least 1")]
    InvalidPageSize(i64),

    #[error("invalid page number {0}: pages start at 1")]
    InvalidPageNumber(i64),

    #[error("invalid film: {0}")]
    InvalidFilm(String),

    #[error("duplicate identifier `{0}`")]
    DuplicateIdentifier(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),

    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidIdentifier(_)
                | CatalogError::InvalidPageSize(_)
                | CatalogError::InvalidPageNumber(_)
                | CatalogError::InvalidFilm(_)
        )
    }

    /// Collapses store-specific failures into `OperationFailed`, keeping the
    /// underlying message. Client errors and already-wrapped failures pass
    /// through untouched.
    pub fn into_operation_failed(self) -> Self {
        match self {
            CatalogError::Database(err) => CatalogError::OperationFailed(err.to_string()),
            CatalogError::Serialization(err) => CatalogError::OperationFailed(err.to_string()),
            other => other,
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Error type returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("film `{0}` not found")]
    NotFound(String),

    #[error("invalid query string: {}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::InvalidQuery(_) => {
                (StatusCode::BAD_REQUEST, "INVALID_QUERY", self.to_string())
            },
            AppError::Catalog(err) => match err {
                CatalogError::InvalidIdentifier(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_IDENTIFIER", err.to_string())
                },
                CatalogError::InvalidPageSize(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_PAGE_SIZE", err.to_string())
                },
                CatalogError::InvalidPageNumber(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_PAGE_NUMBER", err.to_string())
                },
                CatalogError::InvalidFilm(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_FILM", err.to_string())
                },
                CatalogError::DuplicateIdentifier(_) => {
                    (StatusCode::CONFLICT, "DUPLICATE_IDENTIFIER", err.to_string())
                },
                _ => {
                    tracing::error!(error = %err, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "OPERATION_FAILED",
                        "the operation could not be completed".to_string(),
                    )
                },
            },
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
