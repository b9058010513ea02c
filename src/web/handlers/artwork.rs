use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::repository::SqliteArtworkRepository;
use crate::web::codec::{artwork_link, extract_id};
use crate::web::{AppState, WebError};

fn mime_for_path(path: &std::path::Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn mime_for_blob(blob: &[u8]) -> Result<&'static str, WebError> {
    if blob.starts_with(&[0xff, 0xd8, 0xff]) {
        Ok("image/jpeg")
    } else if blob.starts_with(b"\x89PNG\r\n\x1a\n") {
        Ok("image/png")
    } else {
        Err(WebError::InternalCorruption("unknown artwork mime type".into()))
    }
}

/// `GET /artwork/<id>` (§6) — raw image bytes from whichever of `path`/`blob`
/// the artwork row carries, grounded on `routes.py:get_artwork`.
pub async fn get_artwork(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid artwork id: {id}")))?;
    let artwork = SqliteArtworkRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    if let Some(path) = artwork.path() {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| WebError::InternalCorruption(format!("failed to read {}: {e}", path.display())))?;
        let mime = mime_for_path(path);
        return Ok((
            [(header::CONTENT_TYPE, mime), (header::CACHE_CONTROL, "max-age=300")],
            data,
        )
            .into_response());
    }

    if let Some(blob) = artwork.blob() {
        let mime = mime_for_blob(blob)?;
        return Ok((
            [(header::CONTENT_TYPE, mime), (header::CACHE_CONTROL, "max-age=300")],
            blob.to_vec(),
        )
            .into_response());
    }

    Err(WebError::InternalCorruption(format!("artwork {id} has neither path nor blob")))
}

/// `GET /artworkinfo/<id>` (§6) — dimensions plus a link back to
/// `GET /artwork/<id>`, grounded on `routes.py:get_artwork_info`.
pub async fn get_artwork_info(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid artwork id: {id}")))?;
    let artwork = SqliteArtworkRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    let has_artwork = artwork.path().is_some() || artwork.blob().is_some();
    Ok(Json(serde_json::json!({
        "width": artwork.width(),
        "height": artwork.height(),
        "image": has_artwork.then(|| artwork_link(id)),
    })))
}
