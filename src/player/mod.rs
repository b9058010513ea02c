pub mod file_player;
pub mod stream_player;
pub mod poller;
pub mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::domain::queue::QueuedItem;
use crate::repository::{SqliteAlbumsRepository, SqlitePlaylistsRepository, SqliteRadioRepository, SqliteTracksRepository};
use crate::services::download::{Download, DownloadRegistry};
use crate::services::worker::{WorkerHandle, WorkerRequest};
use crate::services::ServiceError;

use file_player::FilePlayer;
use stream_player::StreamPlayer;

/// `PlayerInterface.current_status` (§4.2/§4.3), shared by both players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    Stopped,
    Playing,
    Paused,
}

/// Errors surfaced by the coordinator and both players, sitting between
/// `ServiceError` and `WebError` in the layering (§7).
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Unknown id: {0}")]
    UnknownId(i64),

    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Which of the two players currently owns the audio device (§4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentPlayer {
    File,
    Stream,
}

/// `play(request)`'s tagged union: exactly one of `{album_id, playlist_id,
/// queue_index, track_id, youtube_url, radio_id}` (§4.1).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub album_id: Option<i64>,
    pub playlist_id: Option<i64>,
    pub queue_index: Option<i64>,
    pub track_id: Option<i64>,
    pub youtube_url: Option<String>,
    pub radio_id: Option<i64>,
    pub start_track_id: Option<i64>,
    pub disk_nr: Option<i64>,
}

impl PlayRequest {
    fn validate(&self) -> Result<(), PlayerError> {
        let file_based_count =
            [self.album_id.is_some(), self.playlist_id.is_some(), self.queue_index.is_some()].iter().filter(|b| **b).count();
        if file_based_count > 1 {
            return Err(PlayerError::BadInput("at most one of albumId/playlistId/queueIndex may be set".into()));
        }

        let branches = [file_based_count > 0, self.track_id.is_some(), self.youtube_url.is_some(), self.radio_id.is_some()];
        let branch_count = branches.iter().filter(|b| **b).count();

        if branch_count == 0 {
            return Err(PlayerError::BadInput(
                "exactly one of albumId/playlistId/queueIndex/trackId/youtubeUrl/radioId must be set".into(),
            ));
        }
        if branch_count > 1 {
            return Err(PlayerError::BadInput("radioId and youtubeUrl are each mutually exclusive with every other field".into()));
        }
        Ok(())
    }
}

/// `queuePut`'s four cases (§4.1).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueuePutRequest {
    Album { album_id: i64, disk_nr: Option<i64> },
    Track { track_id: i64 },
    Url { url: String },
    Queue { ids: Vec<i64> },
}

/// The player façade (C8): owns exactly one "current" player and brokers
/// every playback operation the HTTP/WS surface exposes, grounded on
/// `backend/playerctrl.py`.
pub struct PlayerCoordinator {
    pool: SqlitePool,
    tracks: SqliteTracksRepository,
    albums: SqliteAlbumsRepository,
    playlists: SqlitePlaylistsRepository,
    radio: SqliteRadioRepository,
    file_player: Mutex<FilePlayer>,
    stream_player: Mutex<StreamPlayer>,
    current: Mutex<CurrentPlayer>,
    registry: Arc<DownloadRegistry>,
    worker: WorkerHandle,
    download_dir: PathBuf,
}

impl PlayerCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: SqlitePool,
        file_player: FilePlayer,
        stream_player: StreamPlayer,
        registry: Arc<DownloadRegistry>,
        worker: WorkerHandle,
        download_dir: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            pool,
            tracks: SqliteTracksRepository::new(),
            albums: SqliteAlbumsRepository::new(),
            playlists: SqlitePlaylistsRepository::new(),
            radio: SqliteRadioRepository::new(),
            file_player: Mutex::new(file_player),
            stream_player: Mutex::new(stream_player),
            current: Mutex::new(CurrentPlayer::File),
            registry,
            worker,
            download_dir,
        })
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn tracks_repo(&self) -> &SqliteTracksRepository {
        &self.tracks
    }

    pub(crate) fn albums_repo(&self) -> &SqliteAlbumsRepository {
        &self.albums
    }

    pub(crate) fn file_player_mutex(&self) -> &Mutex<FilePlayer> {
        &self.file_player
    }

    pub(crate) fn stream_player_mutex(&self) -> &Mutex<StreamPlayer> {
        &self.stream_player
    }

    pub async fn current(&self) -> CurrentPlayer {
        *self.current.lock().await
    }

    /// §4.1 `select(desired)`: pause-the-other-if-playing-and-different,
    /// return whether it was playing. The 1-second wait this implies is the
    /// *caller's* responsibility — see every call site below.
    async fn select(&self, desired: CurrentPlayer) -> Result<bool, PlayerError> {
        let mut current = self.current.lock().await;
        if *current == desired {
            return Ok(false);
        }

        let was_playing = match *current {
            CurrentPlayer::File => {
                let mut fp = self.file_player.lock().await;
                let playing = fp.status() == PlaybackStatus::Playing;
                if playing {
                    fp.pause()?;
                }
                playing
            }
            CurrentPlayer::Stream => {
                let mut sp = self.stream_player.lock().await;
                let playing = sp.status() == PlaybackStatus::Playing;
                if playing {
                    sp.pause().await?;
                }
                playing
            }
        };

        *current = desired;
        Ok(was_playing)
    }

    pub async fn play(self: &Arc<Self>, request: PlayRequest) -> Result<(), PlayerError> {
        request.validate()?;

        if let Some(radio_id) = request.radio_id {
            return self.play_radio(radio_id).await;
        }
        if let Some(url) = request.youtube_url.clone() {
            return self.play_youtube(url).await;
        }

        let was_playing = self.select(CurrentPlayer::File).await?;
        if was_playing {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        if let Some(album_id) = request.album_id {
            return self.play_album(album_id, request.disk_nr, request.start_track_id).await;
        }
        if let Some(playlist_id) = request.playlist_id {
            return self.play_playlist(playlist_id, request.start_track_id).await;
        }
        if let Some(queue_index) = request.queue_index {
            if queue_index < 0 {
                return Err(PlayerError::BadInput("queueIndex must be non-negative".into()));
            }
            let mut fp = self.file_player.lock().await;
            return fp.play_from_apparent_index(queue_index as usize, request.start_track_id);
        }
        if let Some(track_id) = request.track_id {
            return self.play_single_track(track_id).await;
        }

        unreachable!("PlayRequest::validate() guarantees exactly one branch is taken")
    }

    async fn play_album(self: &Arc<Self>, album_id: i64, disk_nr: Option<i64>, start_track_id: Option<i64>) -> Result<(), PlayerError> {
        let mut tracks = self.tracks.all_by_album(&self.pool, album_id).await.map_err(ServiceError::from)?;
        if tracks.is_empty() {
            return Err(PlayerError::UnknownId(album_id));
        }
        tracks.sort_by_key(|t| (t.volume_number().unwrap_or(0), t.track_number().unwrap_or(0)));
        if let Some(disk_nr) = disk_nr {
            tracks.retain(|t| t.volume_number().map(|v| v as i64) == Some(disk_nr));
        }

        let items: Vec<QueuedItem> = tracks.iter().map(|t| QueuedItem { track_id: t.id(), filepath: t.filepath().clone() }).collect();
        let start_index = start_track_id.and_then(|id| items.iter().position(|i| i.track_id == id)).unwrap_or(0);

        let mut fp = self.file_player.lock().await;
        fp.set_queue(items, format!("/albums/{album_id}"), false);
        fp.play_from_real_index(start_index, start_track_id)
    }

    async fn play_playlist(self: &Arc<Self>, playlist_id: i64, start_track_id: Option<i64>) -> Result<(), PlayerError> {
        let entries = self.playlists.entries(&self.pool, playlist_id).await.map_err(ServiceError::from)?;
        if entries.is_empty() {
            return Err(PlayerError::UnknownId(playlist_id));
        }

        let mut items = Vec::with_capacity(entries.len());
        for entry in &entries {
            match self.tracks.by_id_fetch(&self.pool, entry.track_id()).await.map_err(ServiceError::from)? {
                Some(track) => items.push(QueuedItem { track_id: track.id(), filepath: track.filepath().clone() }),
                None => log::warn!("playlist {playlist_id} references missing track {}", entry.track_id()),
            }
        }

        let start_index = start_track_id.and_then(|id| items.iter().position(|i| i.track_id == id)).unwrap_or(0);
        let mut fp = self.file_player.lock().await;
        fp.set_queue(items, format!("/playlists/{playlist_id}"), false);
        fp.play_from_real_index(start_index, start_track_id)
    }

    async fn play_single_track(self: &Arc<Self>, track_id: i64) -> Result<(), PlayerError> {
        let track =
            self.tracks.by_id_fetch(&self.pool, track_id).await.map_err(ServiceError::from)?.ok_or(PlayerError::UnknownId(track_id))?;
        let item = QueuedItem { track_id: track.id(), filepath: track.filepath().clone() };
        let mut fp = self.file_player.lock().await;
        fp.set_queue(vec![item], format!("/tracks/{track_id}"), true);
        Ok(())
    }

    async fn play_radio(self: &Arc<Self>, radio_id: i64) -> Result<(), PlayerError> {
        let stations = self.radio.all(&self.pool).await.map_err(ServiceError::from)?;
        let index = stations.iter().position(|s| s.id() == radio_id).ok_or(PlayerError::UnknownId(radio_id))?;
        let station = stations[index].clone();

        let was_playing = self.select(CurrentPlayer::Stream).await?;
        if was_playing {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let mut sp = self.stream_player.lock().await;
        sp.play(
            station.name().to_string(),
            station.url().to_string(),
            station.artwork_url().map(str::to_string),
            index as i64,
            stations.len() as i64,
            station.now_playing_url().map(str::to_string),
            station.now_playing_jq().map(str::to_string),
            station.now_playing_artwork_url().map(str::to_string),
            station.now_playing_artwork_jq().map(str::to_string),
        )
        .await
    }

    /// Enqueues a download job whose completion callback clears the file
    /// queue and starts playing the downloaded items (§4.1,
    /// `playerctrl.py:play_downloaded_files`).
    async fn play_youtube(self: &Arc<Self>, url: String) -> Result<(), PlayerError> {
        let was_playing = self.select(CurrentPlayer::File).await?;
        let this = self.clone();

        let callback: Box<dyn FnOnce(Vec<Download>) + Send> = Box::new(move |downloads| {
            tokio::spawn(async move {
                if was_playing {
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                if downloads.is_empty() {
                    log::warn!("youtube fetch returned no files");
                    return;
                }
                let items: Vec<QueuedItem> =
                    downloads.iter().map(|d| QueuedItem { track_id: d.fake_track_id, filepath: d.filepath.clone() }).collect();
                let mut fp = this.file_player.lock().await;
                fp.set_queue(items, "/downloads".to_string(), true);
            });
        });

        self.worker
            .send(WorkerRequest::FetchFromYouTube { url, download_dir: self.download_dir.clone(), callback })
            .map_err(PlayerError::from)
    }

    pub async fn pause(self: &Arc<Self>) -> Result<(), PlayerError> {
        match *self.current.lock().await {
            CurrentPlayer::File => self.file_player.lock().await.pause(),
            CurrentPlayer::Stream => self.stream_player.lock().await.pause().await,
        }
    }

    pub async fn resume(self: &Arc<Self>, preferred: Option<CurrentPlayer>) -> Result<(), PlayerError> {
        if let Some(preferred) = preferred {
            self.select(preferred).await?;
        }
        match *self.current.lock().await {
            CurrentPlayer::File => self.file_player.lock().await.resume(),
            CurrentPlayer::Stream => self.stream_player.lock().await.resume().await,
        }
    }

    pub async fn stop(self: &Arc<Self>) -> Result<(), PlayerError> {
        match *self.current.lock().await {
            CurrentPlayer::File => {
                self.file_player.lock().await.stop();
                Ok(())
            }
            CurrentPlayer::Stream => {
                self.stream_player.lock().await.stop().await;
                Ok(())
            }
        }
    }

    pub async fn set_volume(self: &Arc<Self>, volume: u8) -> Result<(), PlayerError> {
        match *self.current.lock().await {
            CurrentPlayer::File => self.file_player.lock().await.set_volume(volume),
            CurrentPlayer::Stream => self.stream_player.lock().await.set_volume(volume).await,
        }
    }

    pub async fn next(self: &Arc<Self>) -> Result<(), PlayerError> {
        match *self.current.lock().await {
            CurrentPlayer::File => {
                self.file_player.lock().await.next();
                Ok(())
            }
            CurrentPlayer::Stream => self.streaming_adjacent(1).await,
        }
    }

    pub async fn prev(self: &Arc<Self>) -> Result<(), PlayerError> {
        match *self.current.lock().await {
            CurrentPlayer::File => {
                self.file_player.lock().await.prev();
                Ok(())
            }
            CurrentPlayer::Stream => self.streaming_adjacent(-1).await,
        }
    }

    /// `playerctrl.py:update_player_streaming_prevnext` — look up the
    /// currently-playing URL among all stations and step by `delta`; a no-op
    /// if the URL isn't found among stations or the step overruns.
    async fn streaming_adjacent(self: &Arc<Self>, delta: i64) -> Result<(), PlayerError> {
        let current_url = self.stream_player.lock().await.url().map(str::to_string);
        let Some(current_url) = current_url else {
            return Ok(());
        };

        let stations = self.radio.all(&self.pool).await.map_err(ServiceError::from)?;
        let Some(current_index) = stations.iter().position(|s| s.url() == current_url) else {
            return Ok(());
        };
        let new_index = current_index as i64 + delta;
        if new_index < 0 || new_index as usize >= stations.len() {
            return Ok(());
        }
        self.play_radio(stations[new_index as usize].id()).await
    }

    pub async fn queue_get(self: &Arc<Self>) -> Vec<QueuedItem> {
        self.file_player.lock().await.visible_queue().to_vec()
    }

    pub async fn queue_delete(self: &Arc<Self>, index: usize, track_id: i64) -> Result<(), PlayerError> {
        self.file_player.lock().await.remove_from_queue(index, track_id)
    }

    pub async fn queue_put(self: &Arc<Self>, request: QueuePutRequest) -> Result<(), PlayerError> {
        if self.current().await != CurrentPlayer::File {
            return Err(PlayerError::Conflict("queue operations require the file player to be current".into()));
        }

        match request {
            QueuePutRequest::Album { album_id, disk_nr } => {
                let mut tracks = self.tracks.all_by_album(&self.pool, album_id).await.map_err(ServiceError::from)?;
                if tracks.is_empty() {
                    return Err(PlayerError::UnknownId(album_id));
                }
                tracks.sort_by_key(|t| (t.volume_number().unwrap_or(0), t.track_number().unwrap_or(0)));
                if let Some(disk_nr) = disk_nr {
                    tracks.retain(|t| t.volume_number().map(|v| v as i64) == Some(disk_nr));
                }
                let mut fp = self.file_player.lock().await;
                for track in tracks {
                    fp.add_to_queue(QueuedItem { track_id: track.id(), filepath: track.filepath().clone() });
                }
                Ok(())
            }
            QueuePutRequest::Track { track_id } => {
                let track = self
                    .tracks
                    .by_id_fetch(&self.pool, track_id)
                    .await
                    .map_err(ServiceError::from)?
                    .ok_or(PlayerError::UnknownId(track_id))?;
                self.file_player.lock().await.add_to_queue(QueuedItem { track_id: track.id(), filepath: track.filepath().clone() });
                Ok(())
            }
            QueuePutRequest::Url { url } => {
                let this = self.clone();
                let callback: Box<dyn FnOnce(Vec<Download>) + Send> = Box::new(move |downloads| {
                    tokio::spawn(async move {
                        let mut fp = this.file_player.lock().await;
                        for download in downloads {
                            fp.add_to_queue(QueuedItem { track_id: download.fake_track_id, filepath: download.filepath });
                        }
                    });
                });
                self.worker
                    .send(WorkerRequest::FetchFromYouTube { url, download_dir: self.download_dir.clone(), callback })
                    .map_err(PlayerError::from)
            }
            QueuePutRequest::Queue { ids } => {
                let mut items = Vec::with_capacity(ids.len());
                for id in ids {
                    if id >= 0 {
                        let track = self.tracks.by_id_fetch(&self.pool, id).await.map_err(ServiceError::from)?.ok_or(PlayerError::UnknownId(id))?;
                        items.push(QueuedItem { track_id: track.id(), filepath: track.filepath().clone() });
                    } else {
                        let download = self.registry.get(id).ok_or(PlayerError::UnknownId(id))?;
                        items.push(QueuedItem { track_id: download.fake_track_id, filepath: download.filepath });
                    }
                }
                let mut fp = self.file_player.lock().await;
                let identifier = fp.tracklist_identifier().to_string();
                fp.set_queue(items, identifier, false);
                Ok(())
            }
        }
    }
}
