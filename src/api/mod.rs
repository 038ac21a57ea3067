//! JSON-over-HTTP surface. Every handler opens its own store connection on
//! the blocking pool, so requests share nothing but the database file.

mod albums;
mod categories;
mod images;
mod params;
mod user;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::{Database, ImageSummary};
use crate::error::GalleryError;
use crate::query::ImagePage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// The full application: API routes under `/api` plus gallery files.
pub fn router(state: AppState) -> Router {
    let files = ServeDir::new(&state.config.library.gallery_dir);

    let api = Router::new()
        .merge(images::router())
        .merge(categories::router())
        .merge(albums::router())
        .merge(user::router())
        .nest_service("/images/file", files);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<GalleryError> for ApiError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            GalleryError::InvalidInput(msg) => ApiError::BadRequest(msg),
            // never hand SQL or paths to the client
            other => {
                tracing::error!("Request failed: {}", other);
                ApiError::Internal("failed to access the gallery".to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Run store work on the blocking pool against a fresh connection.
pub(crate) async fn with_db<T, F>(state: &AppState, work: F) -> ApiResult<T>
where
    F: FnOnce(&Database) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db_path = state.config.db_path.clone();
    tokio::task::spawn_blocking(move || {
        let db = Database::open(&db_path)?;
        work(&db)
    })
    .await
    .map_err(|e| {
        tracing::error!("Blocking task failed: {}", e);
        ApiError::Internal("request was interrupted".to_string())
    })?
    .map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub limit: u64,
}

/// Page envelope shared by every listing endpoint.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub images: Vec<ImageSummary>,
    pub pagination: Pagination,
}

impl From<ImagePage> for PageResponse {
    fn from(page: ImagePage) -> Self {
        let total_pages = page.total_pages();
        let (current_page, limit) = match page.window {
            Some(window) => (window.page, window.limit as u64),
            None => (1, page.total),
        };
        Self {
            pagination: Pagination {
                current_page,
                total_pages,
                total_count: page.total,
                limit,
            },
            images: page.images,
        }
    }
}
