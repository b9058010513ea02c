use std::collections::HashMap;

use axum::body::Body;
use axum::extract::{Path, Query, Request, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tower::util::ServiceExt;
use tower_http::services::ServeFile;

use crate::repository::SqliteTracksRepository;
use crate::web::codec::extract_id;
use crate::web::dto::json_track;
use crate::web::handlers::helpers::{info_level, track_context, track_tuples};
use crate::web::{AppState, WebError};

pub async fn list_tracks(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let tracks = SqliteTracksRepository::new().all(&state.pool).await?;
    let tuples = track_tuples(&state.pool, tracks).await?;
    let debug = level == crate::domain::InformationLevel::Debug;
    let body: Vec<_> = tuples.iter().map(|(t, genre, artwork_id)| json_track(t, genre.as_deref(), *artwork_id, debug)).collect();
    Ok(Json(serde_json::json!(body)))
}

pub async fn get_track(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid track id: {id}")))?;
    let track = SqliteTracksRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    let (genre, artwork_id) = track_context(&state.pool, &track).await?;
    let debug = level == crate::domain::InformationLevel::Debug;
    Ok(Json(json_track(&track, genre.as_deref(), artwork_id, debug)))
}

pub async fn get_mp3(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid track id: {id}")))?;
    let track = SqliteTracksRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    let request: Request<Body> = Request::new(Body::empty());
    match ServeFile::new(track.filepath()).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(err) => Err(WebError::InternalCorruption(format!("failed to serve {}: {err}", track.filepath().display()))),
    }
}

