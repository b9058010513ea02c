use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::{mpsc, Mutex};

use crate::repository::{SqliteAlbumsRepository, SqliteArtworkRepository, SqliteGenresRepository, SqliteTracksRepository};

use super::download::{fetch_audio, AudioFetcher, Download, DownloadHistory, DownloadRegistry};
use super::ingest::scan_directory;
use super::scanner::MediaScanner;
use super::{tidy, ServiceError};

/// Typed requests the worker drains one at a time (§4.9), extended per
/// spec.md with a result callback on `FetchFromYouTube` so the dispatching
/// HTTP handler can hand the downloads straight back to its caller.
pub enum WorkerRequest {
    ScanDirectory(PathBuf),
    DeleteMissingTracks,
    DeleteAlbumsWithoutTracks,
    DeleteArtworkWithoutTracks,
    DeleteEmptyGenres,
    FetchFromYouTube { url: String, download_dir: PathBuf, callback: Box<dyn FnOnce(Vec<Download>) + Send> },
}

impl std::fmt::Debug for WorkerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScanDirectory(path) => write!(f, "ScanDirectory({})", path.display()),
            Self::DeleteMissingTracks => write!(f, "DeleteMissingTracks"),
            Self::DeleteAlbumsWithoutTracks => write!(f, "DeleteAlbumsWithoutTracks"),
            Self::DeleteArtworkWithoutTracks => write!(f, "DeleteArtworkWithoutTracks"),
            Self::DeleteEmptyGenres => write!(f, "DeleteEmptyGenres"),
            Self::FetchFromYouTube { url, .. } => write!(f, "FetchFromYouTube({url})"),
        }
    }
}

fn describe(request: &WorkerRequest) -> String {
    match request {
        WorkerRequest::ScanDirectory(path) => format!("Scanning {}", path.display()),
        WorkerRequest::DeleteMissingTracks => "Deleting missing tracks".to_string(),
        WorkerRequest::DeleteAlbumsWithoutTracks => "Deleting empty albums".to_string(),
        WorkerRequest::DeleteArtworkWithoutTracks => "Deleting orphan artwork".to_string(),
        WorkerRequest::DeleteEmptyGenres => "Deleting empty genres".to_string(),
        WorkerRequest::FetchFromYouTube { url, .. } => format!("Fetching {url}"),
    }
}

/// A cloneable front for the worker's request queue plus its published
/// status string (§4.9: "on each dequeue... publish... on completion...
/// publish again").
#[derive(Clone)]
pub struct WorkerHandle {
    sender: mpsc::UnboundedSender<WorkerRequest>,
    status: Arc<Mutex<String>>,
}

impl WorkerHandle {
    pub fn send(&self, request: WorkerRequest) -> Result<(), ServiceError> {
        self.sender.send(request).map_err(|_| ServiceError::WorkerUnavailable)
    }

    pub async fn status(&self) -> String {
        self.status.lock().await.clone()
    }
}

/// Spawns the single-consumer worker loop, grounded on
/// `backend/workthread.py:WorkerThread`/`workqueue.py:WorkRequests`.
/// `on_status_change` is the state-change callback shared with the player
/// coordinator (§4.11) — it is invoked once per dequeue and once per
/// completion, and is expected to build and fan out a fresh snapshot.
pub fn spawn<F, C>(pool: SqlitePool, fetcher: Arc<F>, registry: Arc<DownloadRegistry>, history: Arc<DownloadHistory>, on_status_change: C) -> WorkerHandle
where
    F: AudioFetcher + Send + Sync + 'static,
    C: Fn() + Send + Sync + 'static,
{
    let (sender, mut receiver) = mpsc::unbounded_channel::<WorkerRequest>();
    let status = Arc::new(Mutex::new("Idle".to_string()));
    let status_in_task = status.clone();

    tokio::spawn(async move {
        let tracks = SqliteTracksRepository::new();
        let albums = SqliteAlbumsRepository::new();
        let genres = SqliteGenresRepository::new();
        let artwork = SqliteArtworkRepository::new();

        while let Some(request) = receiver.recv().await {
            *status_in_task.lock().await = describe(&request);
            on_status_change();

            match request {
                WorkerRequest::ScanDirectory(path) => {
                    let scanner = MediaScanner::new(&path);
                    if let Err(err) = scan_directory(&pool, &scanner).await {
                        log::error!("scan of {} failed: {err}", path.display());
                    }
                }
                WorkerRequest::DeleteMissingTracks => {
                    if let Err(err) = tidy::delete_missing_tracks(&pool, &tracks).await {
                        log::error!("delete_missing_tracks failed: {err}");
                    }
                }
                WorkerRequest::DeleteAlbumsWithoutTracks => {
                    if let Err(err) = tidy::delete_albums_without_tracks(&pool, &albums).await {
                        log::error!("delete_albums_without_tracks failed: {err}");
                    }
                }
                WorkerRequest::DeleteArtworkWithoutTracks => {
                    if let Err(err) = tidy::delete_artwork_without_tracks(&pool, &artwork).await {
                        log::error!("delete_artwork_without_tracks failed: {err}");
                    }
                }
                WorkerRequest::DeleteEmptyGenres => {
                    if let Err(err) = tidy::delete_empty_genres(&pool, &genres).await {
                        log::error!("delete_empty_genres failed: {err}");
                    }
                }
                WorkerRequest::FetchFromYouTube { url, download_dir, callback } => {
                    let downloads = match fetch_audio(fetcher.as_ref(), &registry, &history, &url, &download_dir).await {
                        Ok(downloads) => downloads,
                        Err(err) => {
                            log::warn!("fetch_audio failed for {url}: {err}");
                            Vec::new()
                        }
                    };
                    callback(downloads);
                }
            }

            *status_in_task.lock().await = "Idle".to_string();
            on_status_change();
        }
    });

    WorkerHandle { sender, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_helpers::{init_logger, prepare_db, TestSetupError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn dispatches_delete_missing_tracks() -> Result<(), TestSetupError> {
        init_logger()?;
        let pool = prepare_db().await?;
        let fetcher = Arc::new(crate::services::download::YtDlpFetcher);
        let registry = Arc::new(DownloadRegistry::new());
        let history = Arc::new(DownloadHistory::default());
        let notifications = Arc::new(AtomicUsize::new(0));
        let notifications_clone = notifications.clone();

        let handle = spawn(pool.clone(), fetcher, registry, history, move || {
            notifications_clone.fetch_add(1, Ordering::SeqCst);
        });

        handle.send(WorkerRequest::DeleteMissingTracks).unwrap();

        for _ in 0..50 {
            if notifications.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(notifications.load(Ordering::SeqCst) >= 2);
        assert_eq!(handle.status().await, "Idle");
        Ok(())
    }
}
