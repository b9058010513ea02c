use serde::{Serialize, Deserialize};

use crate::utils::normalizations::normalize_title;

use super::ValidationError;

/// A collection of tracks released together. `IsCompilation` albums never
/// carry a single `Artist` — see invariant 3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    id: i64,
    artist: Option<String>,
    title: String,
    volume_count: Option<u32>,
    musicbrainz_album_id: Option<String>,
    musicbrainz_album_artist_id: Option<String>,
    release_year: Option<u32>,
    is_compilation: bool,
}

impl PartialEq for Album {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.artist == other.artist
    }
}

impl Eq for Album {}

impl Album {
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>>(
        id: i64,
        artist: Option<String>,
        title: S,
        volume_count: Option<u32>,
        musicbrainz_album_id: Option<String>,
        musicbrainz_album_artist_id: Option<String>,
        release_year: Option<u32>,
        is_compilation: bool,
    ) -> Result<Self, ValidationError> {
        let title = normalize_title(&title.into());
        if title.is_empty() {
            return Err(ValidationError::TitleIsEmptyString);
        }
        if is_compilation && artist.is_some() {
            return Err(ValidationError::CompilationHasArtist);
        }

        Ok(Self {
            id,
            artist,
            title,
            volume_count,
            musicbrainz_album_id,
            musicbrainz_album_artist_id,
            release_year,
            is_compilation,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn artist(&self) -> Option<&str> {
        self.artist.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn volume_count(&self) -> Option<u32> {
        self.volume_count
    }

    pub fn musicbrainz_album_id(&self) -> Option<&str> {
        self.musicbrainz_album_id.as_deref()
    }

    pub fn musicbrainz_album_artist_id(&self) -> Option<&str> {
        self.musicbrainz_album_artist_id.as_deref()
    }

    pub fn release_year(&self) -> Option<u32> {
        self.release_year
    }

    pub fn is_compilation(&self) -> bool {
        self.is_compilation
    }

    /// Only ever move the stored release year upward, never down, matching
    /// the reconciler's monotonic-update rule.
    pub fn bump_release_year(&mut self, candidate: Option<u32>) -> bool {
        match (self.release_year, candidate) {
            (None, Some(c)) => {
                self.release_year = Some(c);
                true
            }
            (Some(existing), Some(c)) if c > existing => {
                self.release_year = Some(c);
                true
            }
            _ => false,
        }
    }

    pub fn bump_volume_count(&mut self, candidate: Option<u32>) -> bool {
        match (self.volume_count, candidate) {
            (None, Some(c)) => {
                self.volume_count = Some(c);
                true
            }
            (Some(existing), Some(c)) if c > existing => {
                self.volume_count = Some(c);
                true
            }
            _ => false,
        }
    }
}
