use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::repository::SqliteAlbumsRepository;
use crate::web::dto::json_album;
use crate::web::{AppState, WebError};

/// `GET /artists/<name>` (§6) — every album by an artist, or every album
/// tagged as a various-artists compilation when `name` is "various artists"
/// (case-insensitive), matching `routes.py:albums_for_artist`.
pub async fn get_artist_albums(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<serde_json::Value>, WebError> {
    let repo = SqliteAlbumsRepository::new();

    let albums = if name.eq_ignore_ascii_case("various artists") {
        repo.compilations(&state.pool).await?
    } else {
        let exact = query.get("exact").map(|v| v == "true").unwrap_or(false);
        repo.by_artist(&state.pool, &name, exact).await?
    };

    let mut body = Vec::with_capacity(albums.len());
    for album in albums {
        let genre_ids = repo.genre_ids(&state.pool, album.id()).await?;
        body.push(json_album(&album, &genre_ids, None, None, crate::domain::InformationLevel::Links));
    }
    Ok(Json(serde_json::json!(body)))
}
