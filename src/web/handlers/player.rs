use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::player::{CurrentPlayer, PlayRequest};
use crate::web::{AppState, WebError};

pub async fn play(State(state): State<AppState>, Json(request): Json<PlayRequest>) -> Result<StatusCode, WebError> {
    state.coordinator.play(request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn pause(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    state.coordinator.pause().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct ResumeBody {
    pub player: Option<ResumePlayer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumePlayer {
    Radio,
    Local,
}

pub async fn resume(State(state): State<AppState>, body: Option<Json<ResumeBody>>) -> Result<StatusCode, WebError> {
    let preferred = body.and_then(|Json(b)| b.player).map(|p| match p {
        ResumePlayer::Radio => CurrentPlayer::Stream,
        ResumePlayer::Local => CurrentPlayer::File,
    });
    state.coordinator.resume(preferred).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stop(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    state.coordinator.stop().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn next(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    state.coordinator.next().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn previous(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    state.coordinator.prev().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct VolumeBody {
    pub volume: u8,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    pub volume: u8,
}

pub async fn get_volume(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    let snapshot = state.coordinator.snapshot(&state.worker).await?;
    Ok(Json(serde_json::json!({ "volume": snapshot.player_volume })))
}

pub async fn set_volume(State(state): State<AppState>, Json(body): Json<VolumeBody>) -> Result<StatusCode, WebError> {
    state.coordinator.set_volume(body.volume).await?;
    Ok(StatusCode::NO_CONTENT)
}
