use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::domain::playlist::Playlist;
use crate::repository::{SqlitePlaylistsRepository, SqliteTracksRepository};
use crate::utils::config::get_config;
use crate::web::codec::extract_id;
use crate::web::dto::json_playlist;
use crate::web::handlers::helpers::{info_level, track_tuples};
use crate::web::{AppState, WebError};

async fn playlist_tracks_context(
    pool: &sqlx::SqlitePool,
    playlist_id: i64,
) -> Result<Vec<crate::web::dto::TrackContext>, WebError> {
    let entries = SqlitePlaylistsRepository::new().entries(pool, playlist_id).await?;
    let mut tracks = Vec::with_capacity(entries.len());
    for entry in &entries {
        if let Some(track) = SqliteTracksRepository::new().by_id_fetch(pool, entry.track_id()).await? {
            tracks.push(track);
        }
    }
    track_tuples(pool, tracks).await
}

pub async fn list_playlists(State(state): State<AppState>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let playlists = SqlitePlaylistsRepository::new().all(&state.pool).await?;
    let mut body = Vec::with_capacity(playlists.len());
    for playlist in &playlists {
        let genre_ids = SqlitePlaylistsRepository::new().genre_ids(&state.pool, playlist.id()).await?;
        let tracks = playlist_tracks_context(&state.pool, playlist.id()).await?;
        body.push(json_playlist(playlist, &genre_ids, level, Some(&tracks), level));
    }
    Ok(Json(serde_json::json!(body)))
}

pub async fn get_playlist(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid playlist id: {id}")))?;
    let playlist = SqlitePlaylistsRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    let genre_ids = SqlitePlaylistsRepository::new().genre_ids(&state.pool, id).await?;
    let tracks = playlist_tracks_context(&state.pool, id).await?;
    Ok(Json(json_playlist(&playlist, &genre_ids, level, Some(&tracks), level)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistBody {
    pub title: Option<String>,
    #[serde(default)]
    pub tracks: Vec<serde_json::Value>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// Resolves the track ids a create/update body names, either directly
/// (`tracks`) or by filepath relative to the configured music directory
/// (`files`), grounded on `deserialize.py:build_playlist_from_api_data`.
async fn resolve_tracks(pool: &sqlx::SqlitePool, body: &PlaylistBody) -> Result<(Vec<i64>, Vec<String>), WebError> {
    if !body.tracks.is_empty() && !body.files.is_empty() {
        return Err(WebError::BadInput("only one of a list of tracks and a list of files is permitted".into()));
    }

    if !body.files.is_empty() {
        let music_dir = get_config().map_err(|e| WebError::InternalCorruption(e.to_string()))?.music_dir.clone();
        let mut track_ids = Vec::new();
        let mut missing = Vec::new();
        for filepath in &body.files {
            let full_path = music_dir.join(filepath);
            match SqliteTracksRepository::new().by_path_fetch(pool, &full_path).await? {
                Some(track) => track_ids.push(track.id()),
                None => missing.push(filepath.clone()),
            }
        }
        return Ok((track_ids, missing));
    }

    if body.tracks.is_empty() {
        return Err(WebError::BadInput("either a list of tracks or a list of files must be specified".into()));
    }

    let track_ids: Vec<i64> = body
        .tracks
        .iter()
        .map(|v| crate::web::codec::extract_id_from_json(v).ok_or_else(|| WebError::BadInput("invalid track reference".into())))
        .collect::<Result<_, _>>()?;
    Ok((track_ids, Vec::new()))
}

pub async fn add_playlist(State(state): State<AppState>, Json(body): Json<PlaylistBody>) -> Result<Json<serde_json::Value>, WebError> {
    let title = body.title.clone().filter(|t| !t.is_empty()).ok_or_else(|| WebError::BadInput("playlist title must be specified".into()))?;
    let (track_ids, missing) = resolve_tracks(&state.pool, &body).await?;
    if track_ids.is_empty() {
        return Err(WebError::BadInput("no tracks found. will not create an empty playlist.".into()));
    }

    let repo = SqlitePlaylistsRepository::new();
    let playlist = Playlist::new(0, title).map_err(|e| WebError::BadInput(e.to_string()))?;
    let playlist_id = repo.insert(&state.pool, &playlist).await?;
    for (index, track_id) in track_ids.iter().enumerate() {
        repo.append_entry(&state.pool, playlist_id, *track_id, index as u32).await?;
    }

    Ok(Json(serde_json::json!({ "playlistid": playlist_id, "nrtracks": track_ids.len(), "missing": missing })))
}

pub async fn update_playlist(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<PlaylistBody>) -> Result<Json<serde_json::Value>, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid playlist id: {id}")))?;
    let repo = SqlitePlaylistsRepository::new();
    repo.by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    if let Some(title) = &body.title {
        if !title.is_empty() {
            repo.update_title(&state.pool, id, title).await?;
        }
    }

    let (track_ids, missing) = resolve_tracks(&state.pool, &body).await?;
    if !track_ids.is_empty() {
        let existing = repo.entries(&state.pool, id).await?;
        let mut next_index = existing.len() as u32;
        for track_id in &track_ids {
            repo.append_entry(&state.pool, id, *track_id, next_index).await?;
            next_index += 1;
        }
    }

    Ok(Json(serde_json::json!({ "playlistid": id, "nrtracks": track_ids.len(), "missing": missing })))
}

pub async fn delete_playlist(State(state): State<AppState>, Path(id): Path<String>) -> Result<axum::http::StatusCode, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid playlist id: {id}")))?;
    SqlitePlaylistsRepository::new().delete(&state.pool, id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
