use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::repository::{SqliteAlbumsRepository, SqliteGenresRepository, SqlitePlaylistsRepository};
use crate::web::codec::extract_id;
use crate::web::dto::json_genre;
use crate::web::handlers::helpers::info_level;
use crate::web::{AppState, WebError};

pub async fn list_genres(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    let genres = SqliteGenresRepository::new().all(&state.pool).await?;
    let body: Vec<_> = genres.iter().map(|g| json_genre(g, None, crate::domain::InformationLevel::None, None, crate::domain::InformationLevel::None)).collect();
    Ok(Json(serde_json::json!(body)))
}

pub async fn get_genre(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let level = info_level(&query);
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid genre id: {id}")))?;
    let genre = SqliteGenresRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    let albums_repo = SqliteAlbumsRepository::new();
    let albums = albums_repo.by_genre(&state.pool, id).await?;
    let mut albums_with_genres = Vec::with_capacity(albums.len());
    for album in albums {
        let genre_ids = albums_repo.genre_ids(&state.pool, album.id()).await?;
        albums_with_genres.push((album, genre_ids));
    }

    let playlists = SqlitePlaylistsRepository::new().by_genre(&state.pool, id).await?;

    Ok(Json(json_genre(&genre, Some(&albums_with_genres), level, Some(&playlists), level)))
}
