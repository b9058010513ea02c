use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::player::{CurrentPlayer, QueuePutRequest};
use crate::repository::SqliteTracksRepository;
use crate::web::dto::json_track_or_file;
use crate::web::handlers::helpers::track_context;
use crate::web::{AppState, WebError};

async fn require_file_player_current(state: &AppState) -> Result<(), WebError> {
    if state.coordinator.current().await != CurrentPlayer::File {
        return Err(WebError::Conflict("queue operations not permitted when playing streaming content".into()));
    }
    Ok(())
}

pub async fn get_queue(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    require_file_player_current(&state).await?;

    let items = state.coordinator.queue_get().await;
    let mut body = Vec::with_capacity(items.len());
    for item in &items {
        let track = if item.is_ephemeral() { None } else { SqliteTracksRepository::new().by_id_fetch(&state.pool, item.track_id).await? };
        let (genre, artwork_id) = match &track {
            Some(t) => track_context(&state.pool, t).await?,
            None => (None, None),
        };
        body.push(json_track_or_file(item, track.as_ref(), genre.as_deref(), artwork_id, false));
    }
    Ok(Json(serde_json::json!(body)))
}

#[derive(Debug, Deserialize)]
pub struct QueueDeleteBody {
    pub index: usize,
    pub track: i64,
}

pub async fn delete_queue_item(State(state): State<AppState>, Json(body): Json<QueueDeleteBody>) -> Result<StatusCode, WebError> {
    require_file_player_current(&state).await?;
    state.coordinator.queue_delete(body.index, body.track).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn queue_options(State(state): State<AppState>) -> Result<StatusCode, WebError> {
    require_file_player_current(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Wire shape of `PUT /queue/` — a flat object carrying exactly one of
/// `{album+disk, track, url, queue}`, grounded on `routes.py:queue_put`.
#[derive(Debug, Default, Deserialize)]
pub struct QueuePutBody {
    pub album: Option<i64>,
    pub disk: Option<i64>,
    pub track: Option<i64>,
    pub url: Option<String>,
    pub queue: Option<Vec<i64>>,
}

pub async fn put_queue(State(state): State<AppState>, Json(body): Json<QueuePutBody>) -> Result<StatusCode, WebError> {
    require_file_player_current(&state).await?;

    let request = if let Some(album_id) = body.album {
        QueuePutRequest::Album { album_id, disk_nr: body.disk }
    } else if let Some(track_id) = body.track {
        QueuePutRequest::Track { track_id }
    } else if let Some(url) = body.url {
        QueuePutRequest::Url { url }
    } else if let Some(ids) = body.queue {
        QueuePutRequest::Queue { ids }
    } else {
        return Err(WebError::BadInput("no album+disk id, track id, url or new queue order specified".into()));
    };

    state.coordinator.queue_put(request).await?;
    Ok(StatusCode::NO_CONTENT)
}
