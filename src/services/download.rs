use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use tokio::process::Command;

use super::ServiceError;

/// One file produced by a successful `fetchAudio` call (§4.8), keyed by a
/// negative `FakeTrackId` so the player/catalog can address it the same way
/// as a real indexed track.
#[derive(Debug, Clone)]
pub struct Download {
    pub filepath: PathBuf,
    pub fake_track_id: i64,
    pub artist: Option<String>,
    pub title: Option<String>,
    pub artwork_url: Option<String>,
    pub url: String,
}

/// Sidecar JSON produced by `yt-dlp --write-info-json`; only the fields this
/// server surfaces are deserialized.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
}

/// Shells out to an external downloader. A capability trait (§2) so tests
/// can inject a fake without touching the network or a subprocess.
pub trait AudioFetcher {
    fn fetch(&self, url: &str, download_dir: &Path) -> impl Future<Output = Result<Vec<Download>, ServiceError>> + Send;
}

use std::future::Future;

/// Default `AudioFetcher`, grounded on `backend/ytdlp.py:fetch_audio`. Adds
/// `--write-info-json` beyond the original so artist/title/artwork can be
/// read back from the sidecar, per spec.md §4.8.
#[derive(Debug, Default)]
pub struct YtDlpFetcher;

impl AudioFetcher for YtDlpFetcher {
    async fn fetch(&self, url: &str, download_dir: &Path) -> Result<Vec<Download>, ServiceError> {
        let output = Command::new("yt-dlp")
            .current_dir(download_dir)
            .arg("-x")
            .arg("--audio-format")
            .arg("mp3")
            .arg("-f")
            .arg("ba")
            .arg("--no-download-archive")
            .arg("--write-info-json")
            .arg("-o")
            .arg("%(id)s.%(ext)s")
            .arg("--print")
            .arg("after_move:filepath")
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            log::warn!("yt-dlp exited with {} for {url}", output.status);
            return Ok(Vec::new());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let filepath = match stdout.lines().next_back() {
            Some(line) if !line.trim().is_empty() => download_dir.join(line.trim()),
            _ => return Ok(Vec::new()),
        };

        let info = read_sidecar_info(&filepath);

        Ok(vec![Download {
            fake_track_id: 0,
            artist: info.as_ref().and_then(|i| i.artist.clone().or_else(|| i.uploader.clone())),
            title: info.as_ref().and_then(|i| i.title.clone()),
            artwork_url: info.as_ref().and_then(|i| i.thumbnail.clone()),
            url: url.to_string(),
            filepath,
        }])
    }
}

fn read_sidecar_info(media_path: &Path) -> Option<YtDlpInfo> {
    let sidecar = media_path.with_extension("info.json");
    let contents = std::fs::read_to_string(sidecar).ok()?;
    serde_json::from_str(&contents).ok()
}

/// Allocates stable, monotonically decreasing negative ids for downloaded
/// files not present in the catalog, grounded on
/// `backend/downloadinfo.py:DownloadInfoDatabase`.
#[derive(Debug)]
pub struct DownloadRegistry {
    inner: Mutex<DownloadRegistryInner>,
}

#[derive(Debug)]
struct DownloadRegistryInner {
    filepath_to_id: HashMap<PathBuf, i64>,
    info_by_id: HashMap<i64, Download>,
    next_id: i64,
}

impl Default for DownloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(DownloadRegistryInner {
                filepath_to_id: HashMap::new(),
                info_by_id: HashMap::new(),
                next_id: -1,
            }),
        }
    }

    /// Returns the existing fake id for `filepath` or allocates the next
    /// (strictly decreasing) one.
    pub fn id_for_filepath(&self, filepath: &Path) -> i64 {
        let mut inner = self.inner.lock().expect("download registry poisoned");
        if let Some(id) = inner.filepath_to_id.get(filepath) {
            return *id;
        }
        let id = inner.next_id;
        inner.next_id -= 1;
        inner.filepath_to_id.insert(filepath.to_path_buf(), id);
        id
    }

    pub fn register(&self, mut download: Download) -> Download {
        let id = self.id_for_filepath(&download.filepath);
        download.fake_track_id = id;
        let mut inner = self.inner.lock().expect("download registry poisoned");
        inner.info_by_id.insert(id, download.clone());
        download
    }

    pub fn get(&self, fake_track_id: i64) -> Option<Download> {
        self.inner.lock().expect("download registry poisoned").info_by_id.get(&fake_track_id).cloned()
    }
}

/// Most-recent-first, URL-deduplicated download history, bounded to
/// `max_length` entries (default 10), grounded on
/// `backend/downloadhistory.py:DownloadHistory`.
#[derive(Debug)]
pub struct DownloadHistory {
    inner: Mutex<DownloadHistoryInner>,
}

#[derive(Debug)]
struct DownloadHistoryInner {
    urls: Vec<String>,
    files: HashMap<String, Vec<Download>>,
    max_length: usize,
}

impl Default for DownloadHistory {
    fn default() -> Self {
        Self::with_capacity(10)
    }
}

impl DownloadHistory {
    pub fn with_capacity(max_length: usize) -> Self {
        Self { inner: Mutex::new(DownloadHistoryInner { urls: Vec::new(), files: HashMap::new(), max_length }) }
    }

    pub fn record(&self, url: &str, files: Vec<Download>) {
        let mut inner = self.inner.lock().expect("download history poisoned");
        if let Some(pos) = inner.urls.iter().position(|u| u == url) {
            inner.urls.remove(pos);
        }
        inner.urls.insert(0, url.to_string());
        let max_length = inner.max_length;
        inner.urls.truncate(max_length);
        inner.files.insert(url.to_string(), files);
    }

    pub fn get(&self, url: &str) -> Option<Vec<Download>> {
        self.inner.lock().expect("download history poisoned").files.get(url).cloned()
    }

    /// All `(url, files)` pairs in most-recent-first order, feeding
    /// `GET /downloadhistory`.
    pub fn entries(&self) -> Vec<(String, Vec<Download>)> {
        let inner = self.inner.lock().expect("download history poisoned");
        inner.urls.iter().filter_map(|url| inner.files.get(url).map(|files| (url.clone(), files.clone()))).collect()
    }
}

/// Fetches `url` into `download_dir`, returning previously cached results if
/// the URL is already in `history` and every referenced file still exists
/// (§4.9's `FetchFromYouTube` callback contract).
pub async fn fetch_audio<F: AudioFetcher>(
    fetcher: &F,
    registry: &DownloadRegistry,
    history: &DownloadHistory,
    url: &str,
    download_dir: &Path,
) -> Result<Vec<Download>, ServiceError> {
    if let Some(cached) = history.get(url) {
        if cached.iter().all(|d| d.filepath.is_file()) {
            return Ok(cached);
        }
    }

    let downloads = fetcher.fetch(url, download_dir).await?;
    let registered: Vec<Download> = downloads.into_iter().map(|d| registry.register(d)).collect();
    history.record(url, registered.clone());
    Ok(registered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_allocates_stable_decreasing_ids() {
        let registry = DownloadRegistry::new();
        let a = registry.id_for_filepath(Path::new("/downloads/a.mp3"));
        let b = registry.id_for_filepath(Path::new("/downloads/b.mp3"));
        let a_again = registry.id_for_filepath(Path::new("/downloads/a.mp3"));

        assert_eq!(a, -1);
        assert_eq!(b, -2);
        assert_eq!(a_again, a);
    }

    #[test]
    fn history_dedups_by_url_and_moves_to_front() {
        let history = DownloadHistory::with_capacity(10);
        history.record("url-a", vec![]);
        history.record("url-b", vec![]);
        history.record("url-a", vec![]);

        let entries = history.entries();
        assert_eq!(entries[0].0, "url-a");
        assert_eq!(entries[1].0, "url-b");
    }

    #[test]
    fn history_truncates_to_max_length() {
        let history = DownloadHistory::with_capacity(2);
        history.record("url-a", vec![]);
        history.record("url-b", vec![]);
        history.record("url-c", vec![]);

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "url-c");
    }
}
