use std::{sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{AppError, AppResult, CatalogResult},
    hal::{FILMS_PATH, FilmCollection, FilmResource},
    models::FilmDetails,
};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(FILMS_PATH, get(list_films).post(create_film))
        .route(
            &format!("{FILMS_PATH}/{{id}}"),
            get(get_film).put(update_film).delete(delete_film),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_size")]
    size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    10
}

pub async fn list_films(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> AppResult<Json<FilmCollection>> {
    let Query(q) = query?;
    let page = state.service.list_page(q.page, q.size).await?;
    Ok(Json(state.hypermedia.collection(page)))
}

pub async fn get_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<FilmResource>> {
    let found = state.service.get_by_id(&id).await?;
    let film = found.ok_or(AppError::NotFound(id))?;
    Ok(Json(state.hypermedia.film(film)))
}

pub async fn create_film(
    State(state): State<Arc<AppState>>,
    Json(details): Json<FilmDetails>,
) -> AppResult<(StatusCode, Json<FilmResource>)> {
    let film = state.service.create(details).await?;
    tracing::info!(id = %film.id, title = %film.details.title, "film registered");
    Ok((StatusCode::CREATED, Json(state.hypermedia.film(film))))
}

pub async fn update_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(details): Json<FilmDetails>,
) -> AppResult<Json<FilmResource>> {
    let updated = state.service.update(&id, details).await?;
    let film = updated.ok_or(AppError::NotFound(id))?;
    Ok(Json(state.hypermedia.film(film)))
}

pub async fn delete_film(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if state.service.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(id))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Probe {
    Up,
    Down,
    Disabled,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    database: Probe,
    cache: Probe,
    #[serde(skip_serializing_if = "Option::is_none")]
    films: Option<u64>,
}

/// 200 while the document store answers; a down cache only shows in the body.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthReport>) {
    let store = state.service.repository().store();
    let cache = state.service.reader().cache();

    let (database, cache) = futures::join!(probe(store.ping()), async {
        match cache {
            Some(cache) => probe(cache.ping()).await,
            None => Probe::Disabled,
        }
    });

    if database != Probe::Up {
        let report = HealthReport { database, cache, films: None };
        return (StatusCode::SERVICE_UNAVAILABLE, Json(report));
    }

    let films = state.service.count().await.ok();
    (StatusCode::OK, Json(HealthReport { database, cache, films }))
}

async fn probe(check: impl Future<Output = CatalogResult<()>>) -> Probe {
    match tokio::time::timeout(HEALTH_TIMEOUT, check).await {
        Ok(Ok(())) => Probe::Up,
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "health probe failed");
            Probe::Down
        },
        Err(_) => {
            tracing::warn!("health probe timed out");
            Probe::Down
        },
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Method, Request, header::CONTENT_TYPE},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        cache_aside::{CachePolicy, CachedFilmReader},
        db::test_support::TestDb,
        hal::Hypermedia,
        models::fixtures::a_new_hope,
        repository::FilmRepository,
        service::FilmService,
        store::SqlDocumentStore,
    };

    const BASE: &str = "http://catalog.test";

    fn app(db: &TestDb) -> Router {
        let repository = FilmRepository::new(Arc::new(SqlDocumentStore::new(db.conn())));
        let policy = CachePolicy {
            film_ttl: Duration::from_secs(50),
            page_ttl: Duration::from_secs(20),
            op_timeout: Duration::from_secs(2),
        };
        let reader = CachedFilmReader::new(repository.clone(), None, policy);
        let state = Arc::new(AppState {
            service: FilmService::new(repository, reader),
            hypermedia: Hypermedia::new(BASE),
        });
        crate::app(state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            },
            None => Body::empty(),
        };

        let response = app.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        if bytes.is_empty() {
            return (status, Value::Null);
        }
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn new_hope_json() -> Value {
        serde_json::to_value(a_new_hope()).unwrap()
    }

    #[tokio::test]
    async fn create_returns_201_with_self_link() {
        let db = TestDb::new().await;
        let app = app(&db);

        let (status, body) = send(&app, Method::POST, FILMS_PATH, Some(new_hope_json())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_str().unwrap();
        assert_eq!(body["_links"]["self"]["href"], format!("{BASE}/star-wars/movies/{id}"));
        assert_eq!(body["series"], "SAGA");
        assert_eq!(body["createdAt"], body["editedAt"]);
    }

    #[tokio::test]
    async fn list_envelope_for_a_single_film() {
        let db = TestDb::new().await;
        let app = app(&db);
        send(&app, Method::POST, FILMS_PATH, Some(new_hope_json())).await;

        let (status, body) =
            send(&app, Method::GET, "/star-wars/movies?page=1&size=10", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["info"], json!({ "count": 1, "pages": 1 }));
        assert!(body["_links"].get("next").is_none());
        assert!(body["_links"].get("prev").is_none());
        let first_page = format!("{BASE}/star-wars/movies?page=1&size=10");
        assert_eq!(body["_links"]["last"]["href"], first_page);
        assert_eq!(body["_embedded"]["ns:movies"][0]["title"], "A New Hope");
    }

    #[tokio::test]
    async fn list_defaults_to_first_page_of_ten() {
        let db = TestDb::new().await;
        let (status, body) = send(&app(&db), Method::GET, FILMS_PATH, None).await;
        assert_eq!(status, StatusCode::OK);
        let first_page = format!("{BASE}/star-wars/movies?page=1&size=10");
        assert_eq!(body["_links"]["self"]["href"], first_page);
        assert_eq!(body["info"], json!({ "count": 0, "pages": 1 }));
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_an_empty_200() {
        let db = TestDb::new().await;
        let app = app(&db);
        send(&app, Method::POST, FILMS_PATH, Some(new_hope_json())).await;

        let uri = format!("{FILMS_PATH}?page={}&size=10", i64::MAX);
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["_embedded"]["ns:movies"], json!([]));
        let prev = format!("{BASE}/star-wars/movies?page={}&size=10", i64::MAX - 1);
        assert_eq!(body["_links"]["prev"]["href"], prev);
        assert!(body["_links"].get("next").is_none());
        assert_eq!(body["info"], json!({ "count": 1, "pages": 1 }));
    }

    #[tokio::test]
    async fn zero_page_size_is_400() {
        let db = TestDb::new().await;
        let (status, body) =
            send(&app(&db), Method::GET, "/star-wars/movies?page=1&size=0", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_PAGE_SIZE");
    }

    #[tokio::test]
    async fn non_numeric_paging_is_a_json_400() {
        let db = TestDb::new().await;
        let app = app(&db);

        for uri in ["/star-wars/movies?page=abc", "/star-wars/movies?page=1&size=ten"] {
            let (status, body) = send(&app, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["code"], "INVALID_QUERY");
            assert!(body["error"].as_str().unwrap().starts_with("invalid query string"));
        }
    }

    #[tokio::test]
    async fn malformed_id_is_400_on_every_verb() {
        let db = TestDb::new().await;
        let app = app(&db);
        let uri = "/star-wars/movies/60bba776d0686920739c3cf";

        for (method, body) in [
            (Method::GET, None),
            (Method::PUT, Some(new_hope_json())),
            (Method::DELETE, None),
        ] {
            let (status, json) = send(&app, method.clone(), uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{method}");
            assert_eq!(json["code"], "INVALID_IDENTIFIER");
        }
    }

    #[tokio::test]
    async fn unknown_id_is_404_on_every_verb() {
        let db = TestDb::new().await;
        let app = app(&db);
        let uri = "/star-wars/movies/60bba776d0686920739c3cf1";

        for (method, body) in [
            (Method::GET, None),
            (Method::PUT, Some(new_hope_json())),
            (Method::DELETE, None),
        ] {
            let (status, json) = send(&app, method.clone(), uri, body).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{method}");
            assert_eq!(json["code"], "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn update_then_delete() {
        let db = TestDb::new().await;
        let app = app(&db);
        let (_, created) = send(&app, Method::POST, FILMS_PATH, Some(new_hope_json())).await;
        let uri = format!("{FILMS_PATH}/{}", created["id"].as_str().unwrap());

        let mut changed = new_hope_json();
        changed["imdbScore"] = json!(8.7);
        let (status, updated) = send(&app, Method::PUT, &uri, Some(changed)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["imdbScore"], 8.7);
        assert_eq!(updated["createdAt"], created["createdAt"]);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected() {
        let db = TestDb::new().await;
        let app = app(&db);

        let mut blank = new_hope_json();
        blank["title"] = json!("");
        let (status, body) = send(&app, Method::POST, FILMS_PATH, Some(blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_FILM");

        let mut unknown_series = new_hope_json();
        unknown_series["series"] = json!("HOLIDAY_SPECIAL");
        let request = Request::builder()
            .method(Method::POST)
            .uri(FILMS_PATH)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(unknown_series.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_store_up_and_cache_disabled() {
        let db = TestDb::new().await;
        let app = app(&db);
        send(&app, Method::POST, FILMS_PATH, Some(new_hope_json())).await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "database": "up", "cache": "disabled", "films": 1 }));
    }
}
