use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::domain::track::Track;
use crate::domain::InformationLevel;
use crate::repository::{SqliteArtworkRepository, SqliteGenresRepository};
use crate::web::dto::TrackContext;

use crate::web::WebError;

pub fn info_level(query: &HashMap<String, String>) -> InformationLevel {
    query.get("info").map(|v| InformationLevel::from_str_or_default(v, InformationLevel::default())).unwrap_or_default()
}

/// Resolves a track's genre name; `artwork_id` is already on `Track` so the
/// caller only needs the name lookup here.
pub async fn track_context(pool: &SqlitePool, track: &Track) -> Result<(Option<String>, Option<i64>), WebError> {
    let genre_name = match track.genre_id() {
        Some(id) => SqliteGenresRepository::new().by_id_fetch(pool, id).await?.map(|g| g.name().to_string()),
        None => None,
    };
    Ok((genre_name, track.artwork_id()))
}

pub async fn track_tuple(pool: &SqlitePool, track: Track) -> Result<TrackContext, WebError> {
    let (genre_name, artwork_id) = track_context(pool, &track).await?;
    Ok((track, genre_name, artwork_id))
}

pub async fn track_tuples(pool: &SqlitePool, tracks: Vec<Track>) -> Result<Vec<TrackContext>, WebError> {
    let mut out = Vec::with_capacity(tracks.len());
    for track in tracks {
        out.push(track_tuple(pool, track).await?);
    }
    Ok(out)
}

/// The `(artwork_id, width, height)` triple `json_album` embeds: the first
/// member track (in volume/track order) that carries artwork.
pub async fn album_artwork(pool: &SqlitePool, tracks: &[TrackContext]) -> Result<Option<(i64, Option<u32>, Option<u32>)>, WebError> {
    for (_, _, artwork_id) in tracks {
        if let Some(artwork_id) = artwork_id {
            if let Some(artwork) = SqliteArtworkRepository::new().by_id_fetch(pool, *artwork_id).await? {
                return Ok(Some((*artwork_id, artwork.width(), artwork.height())));
            }
        }
    }
    Ok(None)
}
