use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sqlx::SqlitePool;

use crate::player::{PlayerCoordinator, PlayerError};
use crate::repository::RepositoryError;
use crate::services::download::{DownloadHistory, DownloadRegistry};
use crate::services::worker::WorkerHandle;
use crate::services::ServiceError;

pub mod codec;
pub mod dto;
pub mod handlers;
pub mod routes;
pub mod ws;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub coordinator: Arc<PlayerCoordinator>,
    pub worker: WorkerHandle,
    pub registry: Arc<DownloadRegistry>,
    pub history: Arc<DownloadHistory>,
    pub ws_peers: Arc<ws::WsPeers>,
}

/// The four error kinds of §7, with their fixed HTTP mapping
/// (`BadInput`->400, `UnknownId`->404, `Conflict`->409, `InternalCorruption`->500).
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("{0}")]
    BadInput(String),

    #[error("no such id: {0}")]
    UnknownId(i64),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    InternalCorruption(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::BadInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::UnknownId(id) => (StatusCode::NOT_FOUND, format!("no such id: {id}")),
            WebError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            WebError::InternalCorruption(msg) => {
                log::error!("internal error serving request: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RepositoryError> for WebError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::IdNotFound(id) => WebError::UnknownId(id),
            RepositoryError::ValidationError(e) => WebError::BadInput(e.to_string()),
            RepositoryError::ConstraintViolation { description } => WebError::Conflict(description),
            other => WebError::InternalCorruption(other.to_string()),
        }
    }
}

impl From<ServiceError> for WebError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RepositoryError(e) => WebError::from(e),
            ServiceError::DomainStructValidationError(e) => WebError::BadInput(e.to_string()),
            other => WebError::InternalCorruption(other.to_string()),
        }
    }
}

impl From<PlayerError> for WebError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::UnknownId(id) => WebError::UnknownId(id),
            PlayerError::BadInput(msg) => WebError::BadInput(msg),
            PlayerError::Conflict(msg) => WebError::Conflict(msg),
            PlayerError::NotFound(msg) => WebError::InternalCorruption(msg),
            PlayerError::Service(e) => WebError::from(e),
        }
    }
}

pub type WebResult<T> = Result<T, WebError>;
