use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::repository::{SqliteAlbumsRepository, SqliteTracksRepository};
use crate::web::codec::artist_link;
use crate::web::dto::json_track;
use crate::web::handlers::helpers::track_tuples;
use crate::web::{AppState, WebError};

fn parse_bool(value: Option<&String>, default: bool) -> bool {
    match value.map(String::as_str) {
        Some("false") | Some("0") | Some("no") => false,
        Some("true") | Some("1") | Some("yes") => true,
        _ => default,
    }
}

fn search_words(query: &str) -> Vec<String> {
    query.split_whitespace().map(|w| w.to_string()).collect()
}

/// `GET /search/<q>` (§6) — independently toggled albums/artists/tracks
/// searches, grounded on `routes.py:search`.
pub async fn search(State(state): State<AppState>, Path(q): Path<String>, Query(query): Query<HashMap<String, String>>) -> Result<Json<serde_json::Value>, WebError> {
    let words = search_words(&q);
    let do_albums = parse_bool(query.get("albums"), true);
    let do_artists = parse_bool(query.get("artists"), true);
    let do_tracks = parse_bool(query.get("tracks"), true);

    let mut rtn = serde_json::Map::new();

    if do_albums {
        let albums_repo = SqliteAlbumsRepository::new();
        let albums = albums_repo.search(&state.pool, &words).await?;
        let mut body = Vec::with_capacity(albums.len());
        for album in &albums {
            let genre_ids = albums_repo.genre_ids(&state.pool, album.id()).await?;
            body.push(crate::web::dto::json_album(album, &genre_ids, None, None, crate::domain::InformationLevel::None));
        }
        rtn.insert("albums".to_string(), serde_json::json!(body));
    }

    if do_artists {
        let albums = SqliteAlbumsRepository::new().search(&state.pool, &words).await?;
        let artists: HashSet<String> = albums.into_iter().filter_map(|a| a.artist().map(str::to_string)).collect();
        let body: Vec<_> = artists
            .into_iter()
            .map(|name| serde_json::json!({ "name": &name, "link": artist_link(&name) }))
            .collect();
        rtn.insert("artists".to_string(), serde_json::json!(body));
    }

    if do_tracks {
        let tracks = SqliteTracksRepository::new().search_scored(&state.pool, &words).await?;
        let tuples = track_tuples(&state.pool, tracks).await?;
        let body: Vec<_> = tuples.iter().map(|(t, genre, artwork_id)| json_track(t, genre.as_deref(), *artwork_id, false)).collect();
        rtn.insert("tracks".to_string(), serde_json::json!(body));
    }

    Ok(Json(serde_json::Value::Object(rtn)))
}
