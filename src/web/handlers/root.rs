use axum::extract::State;
use axum::Json;

use crate::web::{AppState, WebError};

pub async fn get_snapshot(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    let snapshot = state.coordinator.snapshot(&state.worker).await?;
    Ok(Json(serde_json::to_value(snapshot).map_err(|e| WebError::InternalCorruption(e.to_string()))?))
}
