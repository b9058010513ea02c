use std::path::PathBuf;
use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

use crate::utils::normalizations::{normalize_path, normalize_title};

use super::ValidationError;

/// A single indexed audio file.
///
/// `Genre`, `Album` and `Artwork` are foreign keys into their respective
/// tables; any of them may be absent for a freshly-scanned, not-yet-
/// cross-referenced track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    id: i64,
    filepath: PathBuf,
    title: String,
    duration: u32,
    composer: Option<String>,
    artist: Option<String>,
    genre_id: Option<i64>,
    volume_number: Option<u32>,
    track_count: Option<u32>,
    track_number: Option<u32>,
    release_date: Option<NaiveDate>,
    musicbrainz_track_id: Option<String>,
    musicbrainz_artist_id: Option<String>,
    album_id: Option<i64>,
    artwork_id: Option<i64>,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.filepath == other.filepath
    }
}

impl Eq for Track {}

#[allow(clippy::too_many_arguments)]
impl Track {
    pub fn new<S: Into<String>>(
        id: i64,
        filepath: PathBuf,
        title: S,
        duration: u32,
        composer: Option<String>,
        artist: Option<String>,
        genre_id: Option<i64>,
        volume_number: Option<u32>,
        track_count: Option<u32>,
        track_number: Option<u32>,
        release_date: Option<NaiveDate>,
        musicbrainz_track_id: Option<String>,
        musicbrainz_artist_id: Option<String>,
        album_id: Option<i64>,
        artwork_id: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let norm_path = normalize_path(&filepath);
        if norm_path.as_os_str().is_empty() {
            return Err(ValidationError::FilepathIsEmptyString);
        }

        let title = normalize_title(&title.into());
        if title.is_empty() {
            return Err(ValidationError::TitleIsEmptyString);
        }

        Ok(Self {
            id,
            filepath: norm_path,
            title,
            duration,
            composer,
            artist,
            genre_id,
            volume_number,
            track_count,
            track_number,
            release_date,
            musicbrainz_track_id,
            musicbrainz_artist_id,
            album_id,
            artwork_id,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn filepath(&self) -> &PathBuf {
        &self.filepath
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn composer(&self) -> Option<&str> {
        self.composer.as_deref()
    }

    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    pub fn genre_id(&self) -> Option<i64> {
        self.genre_id
    }

    pub fn volume_number(&self) -> Option<u32> {
        self.volume_number
    }

    pub fn track_count(&self) -> Option<u32> {
        self.track_count
    }

    pub fn track_number(&self) -> Option<u32> {
        self.track_number
    }

    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date
    }

    pub fn musicbrainz_track_id(&self) -> Option<&str> {
        self.musicbrainz_track_id.as_deref()
    }

    pub fn musicbrainz_artist_id(&self) -> Option<&str> {
        self.musicbrainz_artist_id.as_deref()
    }

    pub fn album_id(&self) -> Option<i64> {
        self.album_id
    }

    pub fn artwork_id(&self) -> Option<i64> {
        self.artwork_id
    }

    pub fn set_album_id(&mut self, album_id: Option<i64>) {
        self.album_id = album_id;
    }

    pub fn set_genre_id(&mut self, genre_id: Option<i64>) {
        self.genre_id = genre_id;
    }

    pub fn set_artwork_id(&mut self, artwork_id: Option<i64>) {
        self.artwork_id = artwork_id;
    }

    pub fn extension(&self) -> String {
        self.filepath
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }

    /// The wide match tuple used by `ensure_track_exists` to decide whether an
    /// incoming scan result is the same logical track as an already-stored
    /// row. Includes `Album` unlike the upstream reconciler this crate was
    /// grounded on, per the fuller identity rule.
    pub fn identity_key(&self) -> TrackIdentity<'_> {
        TrackIdentity {
            album_id: self.album_id,
            title: &self.title,
            duration: self.duration,
            artist: self.artist.as_deref(),
            volume_number: self.volume_number,
            track_number: self.track_number,
            release_date: self.release_date,
            musicbrainz_track_id: self.musicbrainz_track_id.as_deref(),
            musicbrainz_artist_id: self.musicbrainz_artist_id.as_deref(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct TrackIdentity<'a> {
    pub album_id: Option<i64>,
    pub title: &'a str,
    pub duration: u32,
    pub artist: Option<&'a str>,
    pub volume_number: Option<u32>,
    pub track_number: Option<u32>,
    pub release_date: Option<NaiveDate>,
    pub musicbrainz_track_id: Option<&'a str>,
    pub musicbrainz_artist_id: Option<&'a str>,
}
