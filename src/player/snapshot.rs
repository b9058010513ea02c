use std::sync::Arc;

use serde::Serialize;

use crate::repository::RepositoryError;
use crate::services::worker::WorkerHandle;

use super::{CurrentPlayer, PlaybackStatus, PlayerCoordinator};

const API_VERSION: &str = "1";

#[derive(Debug, Serialize)]
pub struct TrackSnapshot {
    pub id: i64,
    pub title: String,
    pub artwork: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StreamTrackSnapshot {
    pub artist: String,
    pub title: String,
}

/// Mirrors `backend/nowplaying.py:get_current_status`: player-kind-specific
/// fields are flattened alongside the shared ones.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    pub api_version: &'static str,
    pub worker_status: String,
    pub player_status: PlaybackStatus,
    pub player_volume: u8,
    pub number_albums: i64,
    pub number_artworks: i64,
    pub number_tracks: i64,
    pub current_track_index: Option<i64>,
    pub maximum_track_index: Option<i64>,
    pub current_tracklist_uri: Option<String>,
    pub current_track: Option<serde_json::Value>,
    pub current_artwork: Option<String>,
    pub current_stream: Option<String>,
}

impl PlayerCoordinator {
    /// Builds the consolidated status document sent on `/ws` connect and
    /// after every state-change callback invocation (§4.11/§4.12).
    pub async fn snapshot(self: &Arc<Self>, worker: &WorkerHandle) -> Result<Snapshot, RepositoryError> {
        let number_albums = self.albums_repo().count(self.pool()).await?;
        let number_tracks = self.tracks_repo().count(self.pool()).await?;
        let number_artworks = crate::repository::SqliteArtworkRepository::new().count(self.pool()).await?;
        let worker_status = worker.status().await;

        match self.current().await {
            CurrentPlayer::File => {
                let fp = self.file_player_mutex().lock().await;
                let current_item = fp.visible_queue().first().cloned();

                let current_track = match &current_item {
                    Some(item) if item.track_id >= 0 => {
                        self.tracks_repo()
                            .by_id_fetch(self.pool(), item.track_id)
                            .await?
                            .map(|t| serde_json::json!({"id": t.id(), "title": t.title()}))
                    }
                    Some(item) => Some(serde_json::json!({"id": item.track_id, "title": item.filepath.display().to_string()})),
                    None => None,
                };

                Ok(Snapshot {
                    api_version: API_VERSION,
                    worker_status,
                    player_status: fp.status(),
                    player_volume: fp.volume(),
                    number_albums,
                    number_artworks,
                    number_tracks,
                    current_track_index: fp.current_index().map(|i| i as i64 + 1),
                    maximum_track_index: Some(fp.queue_len() as i64),
                    current_tracklist_uri: Some(fp.tracklist_identifier().to_string()),
                    current_artwork: None,
                    current_track,
                    current_stream: None,
                })
            }
            CurrentPlayer::Stream => {
                let sp = self.stream_player_mutex().lock().await;
                let current_track = if sp.status() == PlaybackStatus::Playing {
                    let now_playing = sp.now_playing();
                    match (now_playing.artist, now_playing.track) {
                        (Some(artist), Some(track)) => Some(serde_json::to_value(StreamTrackSnapshot { artist, title: track }).unwrap()),
                        _ => None,
                    }
                } else {
                    None
                };

                Ok(Snapshot {
                    api_version: API_VERSION,
                    worker_status,
                    player_status: sp.status(),
                    player_volume: sp.volume(),
                    number_albums,
                    number_artworks,
                    number_tracks,
                    current_track_index: sp.current_track_index().map(|i| i + 1),
                    maximum_track_index: sp.number_of_tracks(),
                    current_tracklist_uri: None,
                    current_artwork: sp.currently_playing_artwork(),
                    current_track,
                    current_stream: sp.name().map(str::to_string),
                })
            }
        }
    }
}
