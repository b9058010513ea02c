use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::services::worker::WorkerRequest;
use crate::utils::config::get_config;
use crate::web::{AppState, WebError};

#[derive(Debug, Default, Deserialize)]
pub struct ScanBody {
    pub dir: Option<String>,
}

/// `POST /scanner/scan` (§6) — `dir` is resolved relative to the configured
/// music directory and must exist, grounded on `routes.py:start_scan`.
pub async fn start_scan(State(state): State<AppState>, Json(body): Json<ScanBody>) -> Result<StatusCode, WebError> {
    let config = get_config().map_err(|e| WebError::InternalCorruption(e.to_string()))?;
    let scandir = match &body.dir {
        Some(subdir) if !subdir.is_empty() => config.music_dir.join(subdir),
        _ => config.music_dir.clone(),
    };

    if !scandir.is_dir() {
        return Err(WebError::BadInput(format!("directory {} does not exist", scandir.display())));
    }

    state.worker.send(WorkerRequest::ScanDirectory(scandir))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /scanner/tidy` (§4.7/§6) — enqueues the delete-missing-tracks and
/// delete-empty-albums sweeps, in that order.
pub async fn start_tidy(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    state.worker.send(WorkerRequest::DeleteMissingTracks)?;
    state.worker.send(WorkerRequest::DeleteAlbumsWithoutTracks)?;
    Ok(StatusCode::NO_CONTENT)
}
