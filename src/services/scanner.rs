use std::path::{Path, PathBuf};

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::prelude::ItemKey;
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use walkdir::WalkDir;

use crate::domain::refs::{AlbumRef, ArtworkRef, TrackRef};
use crate::utils::normalizations::normalize_path;

use super::ScanError;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["flac", "mp3", "wav"];

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sibling `cover.jpg`/`cover.png` next to the track, preferred over an
/// embedded picture when both are present (`scan/common.py:find_coverart_file`).
fn find_coverart_file(path: &Path) -> Option<PathBuf> {
    let dir = path.parent()?;
    for leaf in ["cover.jpg", "cover.png"] {
        let candidate = dir.join(leaf);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

fn tag_string(tag: &Tag, key: ItemKey) -> Option<String> {
    tag.get_string(&key).map(|s| s.to_string()).filter(|s| !s.is_empty())
}

fn m_of_n(tag: &Tag, m_key: ItemKey, n_key: ItemKey) -> (Option<u32>, Option<u32>) {
    let m = tag.get_string(&m_key).and_then(|s| s.split('/').next()).and_then(|s| s.parse().ok());
    let n = tag
        .get_string(&n_key)
        .and_then(|s| s.split('/').next()).and_then(|s| s.parse().ok())
        .or_else(|| tag.get_string(&m_key).and_then(|s| s.split('/').nth(1)).and_then(|s| s.parse().ok()));
    (m, n)
}

/// Reads a single audio file's tags into the fixed `(TrackRef, AlbumRef,
/// Option<ArtworkRef>)` shape used by the ingestion reconciler (§4.1/§4.6).
/// Swappable for tests, matching the capability-trait pattern (§2).
pub trait TagReader {
    fn read(&self, path: &Path) -> Result<(TrackRef, AlbumRef, Option<ArtworkRef>), ScanError>;
}

#[derive(Debug, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read(&self, path: &Path) -> Result<(TrackRef, AlbumRef, Option<ArtworkRef>), ScanError> {
        let file = std::fs::File::open(path)?;
        let mut reader = std::io::BufReader::new(file);
        let tagged = Probe::new(&mut reader)
            .guess_file_type()
            .map_err(|e| ScanError::IOError(std::io::Error::other(e.to_string())))?
            .read()
            .map_err(|e| ScanError::IOError(std::io::Error::other(e.to_string())))?;

        let duration_ms = tagged.properties().duration().as_millis() as u32;
        let tag = tagged.primary_tag().or_else(|| tagged.first_tag());

        let title = tag
            .and_then(|t| t.title().map(|s| s.to_string()))
            .unwrap_or_else(|| fallback_title(path));
        let composer = tag.and_then(|t| tag_string(t, ItemKey::Composer));
        let track_artist = tag.and_then(|t| t.artist().map(|s| s.to_string()));
        let album_artist = tag.and_then(|t| tag_string(t, ItemKey::AlbumArtist));
        let genre = tag.and_then(|t| t.genre().map(|s| s.to_string()));
        let (volume_number, volume_count) = tag.map(|t| m_of_n(t, ItemKey::DiscNumber, ItemKey::DiscTotal)).unwrap_or((None, None));
        let (track_number, track_count) = tag.map(|t| m_of_n(t, ItemKey::TrackNumber, ItemKey::TrackTotal)).unwrap_or((None, None));
        let release_date = tag
            .and_then(|t| tag_string(t, ItemKey::RecordingDate).or_else(|| tag_string(t, ItemKey::Year)))
            .and_then(|s| parse_release_date(&s));
        let musicbrainz_track_id = tag.and_then(|t| tag_string(t, ItemKey::MusicBrainzRecordingId));
        let musicbrainz_artist_id = tag.and_then(|t| tag_string(t, ItemKey::MusicBrainzArtistId));
        let musicbrainz_album_id = tag.and_then(|t| tag_string(t, ItemKey::MusicBrainzReleaseId));
        let musicbrainz_album_artist_id = tag.and_then(|t| tag_string(t, ItemKey::MusicBrainzReleaseArtistId));
        let album_title = tag.and_then(|t| t.album().map(|s| s.to_string()));

        let artwork_path = find_coverart_file(path);
        let artwork_ref = if let Some(artwork_path) = artwork_path {
            Some(ArtworkRef::Path { path: artwork_path, width: None, height: None })
        } else {
            tag.and_then(|t| {
                let pictures = t.pictures();
                pictures
                    .iter()
                    .find(|p| p.pic_type() == PictureType::CoverFront)
                    .or_else(|| pictures.first())
                    .map(|pic| ArtworkRef::Blob { blob: pic.data().to_vec(), width: None, height: None })
            })
        };

        let track_ref = TrackRef {
            id: None,
            filepath: normalize_path(path),
            title,
            duration: duration_ms,
            composer,
            artist: track_artist.clone(),
            genre,
            volume_number,
            track_count,
            track_number,
            release_date,
            musicbrainz_track_id,
            musicbrainz_artist_id,
        };

        let album_ref = AlbumRef {
            title: album_title.unwrap_or_else(|| "unknown album".to_string()),
            artist: album_artist.or(track_artist),
            is_compilation: false,
            volume_count,
            release_year: release_date.and_then(|d| d.format("%Y").to_string().parse::<u32>().ok()),
            musicbrainz_album_id,
            musicbrainz_album_artist_id,
        };

        Ok((track_ref, album_ref, artwork_ref))
    }
}

fn fallback_title(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "unknown track".to_string())
}

/// Parses a tag's release-date string into a calendar date (T5, §8).
/// Accepts a plain year, `%Y-%m-%d`, `%Y-%m`, and full RFC 3339 / `%z`-offset
/// datetimes (`Z` or `+HHMM`/`+HH:MM` forms) — taking just the date part of
/// a datetime. Anything else, including free text, is rejected.
fn parse_release_date(raw: &str) -> Option<chrono::NaiveDate> {
    use chrono::{DateTime, NaiveDate};

    let raw = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }

    if let Some((y, m)) = raw.split_once('-') {
        if y.len() == 4 && m.len() == 2 && y.chars().all(|c| c.is_ascii_digit()) && m.chars().all(|c| c.is_ascii_digit()) {
            if let (Ok(year), Ok(month)) = (y.parse::<i32>(), m.parse::<u32>()) {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
                    return Some(date);
                }
            }
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc().date());
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.naive_utc().date());
    }

    if let Ok(year) = raw.parse::<i32>() {
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    None
}

/// Walks the configured music directory, yielding one `(TrackRef, AlbumRef,
/// Option<ArtworkRef>)` per supported audio file (§4.6). Directories and
/// symlinks are skipped; unsupported extensions are skipped with a debug
/// log. Per-file tag-reading failures are soft — collected into
/// `ScanResult::errors` rather than aborting the whole scan.
pub struct MediaScanner<R: TagReader = LoftyTagReader> {
    music_lib_path: PathBuf,
    tag_reader: R,
}

impl MediaScanner<LoftyTagReader> {
    pub fn new<P: AsRef<Path>>(music_path: P) -> Self {
        Self { music_lib_path: music_path.as_ref().to_owned(), tag_reader: LoftyTagReader }
    }
}

impl<R: TagReader> MediaScanner<R> {
    pub fn with_tag_reader<P: AsRef<Path>>(music_path: P, tag_reader: R) -> Self {
        Self { music_lib_path: music_path.as_ref().to_owned(), tag_reader }
    }

    pub fn scan_music_lib(&self) -> Result<ScanResult, ScanError> {
        std::fs::read_dir(&self.music_lib_path).map_err(|e| ScanError::RootDirAccessError {
            path: self.music_lib_path.display().to_string(),
            source: e,
        })?;

        let walker = WalkDir::new(&self.music_lib_path).min_depth(1);
        let mut scan_result = ScanResult::new();

        for entry_result in walker {
            match entry_result {
                Err(err) => scan_result.errors.push(ScanError::WalkdirError(err)),
                Ok(dir_entry) => {
                    let path = dir_entry.path();

                    if path.is_dir() || path.is_symlink() {
                        continue;
                    }
                    if !is_audio_file(path) {
                        log::debug!("Skipping file with unsupported extension: {}", path.display());
                        continue;
                    }

                    match self.tag_reader.read(path) {
                        Ok(entry) => scan_result.entries.push(entry),
                        Err(err) => {
                            log::warn!("Skipping file {}: {}", path.display(), err);
                            scan_result.errors.push(err);
                        }
                    }
                }
            }
        }

        Ok(scan_result)
    }
}

#[derive(Debug)]
pub struct ScanResult {
    pub entries: Vec<(TrackRef, AlbumRef, Option<ArtworkRef>)>,
    pub errors: Vec<ScanError>,
}

impl ScanResult {
    fn new() -> Self {
        Self { entries: Vec::new(), errors: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_helpers::*;

    #[tokio::test]
    async fn scan_empty_folder_yields_nothing() -> Result<(), TestSetupError> {
        init_logger()?;
        let dir = tempfile::tempdir()?;
        let scanner = MediaScanner::new(dir.path());

        let result = scanner.scan_music_lib().unwrap();
        assert!(result.entries.is_empty());
        Ok(())
    }

    /// T5 (§8): the release-date formats a scan must accept, and the one it
    /// must reject.
    #[test]
    fn parse_release_date_accepts_required_formats_and_rejects_free_text() {
        use chrono::NaiveDate;

        assert_eq!(parse_release_date("2021-09"), NaiveDate::from_ymd_opt(2021, 9, 1));
        assert_eq!(parse_release_date("2001-12-31T23:29:59Z"), NaiveDate::from_ymd_opt(2001, 12, 31));
        assert_eq!(parse_release_date("2015-07-15T16:54:33+0100"), NaiveDate::from_ymd_opt(2015, 7, 15));
        assert_eq!(parse_release_date("2016-08-29T21:32:06-0700"), NaiveDate::from_ymd_opt(2016, 8, 30));
        assert_eq!(parse_release_date("Some point in the 21st Century"), None);
    }

    #[tokio::test]
    async fn scan_nonexistent_root_is_an_error() -> Result<(), TestSetupError> {
        init_logger()?;
        let scanner = MediaScanner::new(PathBuf::from("/path/does/not/exist"));
        assert!(scanner.scan_music_lib().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn scan_skips_non_audio_files() -> Result<(), TestSetupError> {
        init_logger()?;
        let dir = tempfile::tempdir()?;
        let _temp_files = create_temp_files(dir.path(), 2, "txt")?;

        let scanner = MediaScanner::new(dir.path());
        let result = scanner.scan_music_lib().unwrap();
        assert!(result.entries.is_empty());
        Ok(())
    }

    struct FakeTagReader;
    impl TagReader for FakeTagReader {
        fn read(&self, path: &Path) -> Result<(TrackRef, AlbumRef, Option<ArtworkRef>), ScanError> {
            let track = TrackRef {
                id: None,
                filepath: path.to_path_buf(),
                title: "Fixture Track".to_string(),
                duration: 180_000,
                composer: None,
                artist: Some("Fixture Artist".to_string()),
                genre: None,
                volume_number: None,
                track_count: None,
                track_number: None,
                release_date: None,
                musicbrainz_track_id: None,
                musicbrainz_artist_id: None,
            };
            let album = AlbumRef {
                title: "Fixture Album".to_string(),
                artist: Some("Fixture Artist".to_string()),
                is_compilation: false,
                volume_count: None,
                release_year: None,
                musicbrainz_album_id: None,
                musicbrainz_album_artist_id: None,
            };
            Ok((track, album, None))
        }
    }

    #[tokio::test]
    async fn scan_finds_supported_extensions_via_injected_reader() -> Result<(), TestSetupError> {
        init_logger()?;
        let dir = tempfile::tempdir()?;
        let _mp3 = create_temp_files(dir.path(), 1, "mp3")?;
        let _flac = create_temp_files(dir.path(), 1, "flac")?;
        let _txt = create_temp_files(dir.path(), 1, "txt")?;

        let scanner = MediaScanner::with_tag_reader(dir.path(), FakeTagReader);
        let result = scanner.scan_music_lib().unwrap();

        assert_eq!(result.entries.len(), 2);
        Ok(())
    }
}
