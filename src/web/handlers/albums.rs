use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::repository::{SqliteAlbumsRepository, SqliteTracksRepository};
use crate::web::codec::extract_id;
use crate::web::dto::json_album;
use crate::web::handlers::helpers::{album_artwork, info_level, track_tuples};
use crate::web::{AppState, WebError};

pub async fn list_albums(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    let albums = SqliteAlbumsRepository::new().all(&state.pool).await?;
    let mut body = Vec::with_capacity(albums.len());
    for album in albums {
        let genre_ids = SqliteAlbumsRepository::new().genre_ids(&state.pool, album.id()).await?;
        body.push(json_album(&album, &genre_ids, None, None, crate::domain::InformationLevel::Links));
    }
    Ok(Json(serde_json::json!(body)))
}

pub async fn get_album(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid album id: {id}")))?;
    let album = SqliteAlbumsRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    let genre_ids = SqliteAlbumsRepository::new().genre_ids(&state.pool, id).await?;
    let tracks = SqliteTracksRepository::new().all_by_album(&state.pool, id).await?;
    let tuples = track_tuples(&state.pool, tracks).await?;
    let artwork = album_artwork(&state.pool, &tuples).await?;
    Ok(Json(json_album(&album, &genre_ids, artwork, Some(&tuples), level)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlbumBody {
    pub releasedate: Option<u32>,
}

pub async fn update_album(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<UpdateAlbumBody>) -> Result<Json<serde_json::Value>, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid album id: {id}")))?;
    let repo = SqliteAlbumsRepository::new();
    repo.by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    repo.update_release_date(&state.pool, id, body.releasedate).await?;
    let album = repo.by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    let genre_ids = repo.genre_ids(&state.pool, id).await?;
    Ok(Json(json_album(&album, &genre_ids, None, None, crate::domain::InformationLevel::Links)))
}
