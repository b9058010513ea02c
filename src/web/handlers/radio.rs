use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::domain::radio::RadioStation;
use crate::repository::SqliteRadioRepository;
use crate::web::codec::extract_id;
use crate::web::dto::json_radio_station;
use crate::web::{AppState, WebError};

pub async fn list_radio_stations(State(state): State<AppState>) -> Result<Json<serde_json::Value>, WebError> {
    let stations = SqliteRadioRepository::new().all(&state.pool).await?;
    let body: Vec<_> = stations.iter().map(|s| json_radio_station(s, false)).collect();
    Ok(Json(serde_json::json!(body)))
}

pub async fn radio_stations_options() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct RadioStationBody {
    pub name: String,
    pub url: String,
    pub artwork: Option<String>,
    pub now_playing_url: Option<String>,
    pub now_playing_jq: Option<String>,
    pub now_playing_artwork_url: Option<String>,
    pub now_playing_artwork_jq: Option<String>,
}

pub async fn add_radio_station(State(state): State<AppState>, Json(body): Json<RadioStationBody>) -> Result<Json<serde_json::Value>, WebError> {
    let station = RadioStation::new(
        0,
        body.name,
        body.url,
        body.artwork,
        body.now_playing_url,
        body.now_playing_jq,
        body.now_playing_artwork_url,
        body.now_playing_artwork_jq,
        None,
    )
    .map_err(|e| WebError::BadInput(e.to_string()))?;

    let id = SqliteRadioRepository::new().insert(&state.pool, &station).await?;
    Ok(Json(serde_json::json!({ "id": id })))
}

/// `PUT /radio/` — reorder: the request body is a list of station ids (or
/// `/radio/<id>` links), and every existing station must appear exactly once.
pub async fn reorder_radio_stations(State(state): State<AppState>, Json(order): Json<Vec<serde_json::Value>>) -> Result<StatusCode, WebError> {
    let repo = SqliteRadioRepository::new();
    let stations = repo.all(&state.pool).await?;

    let ordered_ids: Vec<i64> = order
        .iter()
        .map(|v| crate::web::codec::extract_id_from_json(v).ok_or_else(|| WebError::BadInput("unrecognised station id in list".into())))
        .collect::<Result<_, _>>()?;

    let mut distinct = ordered_ids.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if ordered_ids.len() != stations.len() || distinct.len() != stations.len() {
        return Err(WebError::BadInput("submitted list does not specify the order for all stations, or contains duplicates".into()));
    }

    repo.update_sort_order(&state.pool, &ordered_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_radio_station(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid radio station id: {id}")))?;
    SqliteRadioRepository::new().delete(&state.pool, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_radio_station(State(state): State<AppState>, Path(id): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid radio station id: {id}")))?;
    let station = SqliteRadioRepository::new().by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    let level = crate::domain::InformationLevel::from_str_or_default(
        query.get("urls").map(String::as_str).unwrap_or(""),
        crate::domain::InformationLevel::Links,
    );
    let include_urls = matches!(level, crate::domain::InformationLevel::All | crate::domain::InformationLevel::Debug);
    Ok(Json(json_radio_station(&station, include_urls)))
}

pub async fn update_radio_station(State(state): State<AppState>, Path(id): Path<String>, Json(body): Json<RadioStationBody>) -> Result<Json<serde_json::Value>, WebError> {
    let id = extract_id(&id).ok_or_else(|| WebError::BadInput(format!("invalid radio station id: {id}")))?;
    let repo = SqliteRadioRepository::new();
    let existing = repo.by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;

    let station = RadioStation::new(
        id,
        body.name,
        body.url,
        body.artwork,
        body.now_playing_url,
        body.now_playing_jq,
        body.now_playing_artwork_url,
        body.now_playing_artwork_jq,
        existing.sort_order(),
    )
    .map_err(|e| WebError::BadInput(e.to_string()))?;

    repo.update(&state.pool, &station).await?;
    let updated = repo.by_id_fetch(&state.pool, id).await?.ok_or(WebError::UnknownId(id))?;
    Ok(Json(json_radio_station(&updated, false)))
}
