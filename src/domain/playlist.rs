use serde::{Serialize, Deserialize};

use super::ValidationError;
use crate::utils::normalizations::normalize_title;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    id: i64,
    title: String,
}

impl Playlist {
    pub fn new<S: Into<String>>(id: i64, title: S) -> Result<Self, ValidationError> {
        let title = normalize_title(&title.into());
        if title.is_empty() {
            return Err(ValidationError::TitleIsEmptyString);
        }
        Ok(Self { id, title })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// A single ordered slot in a playlist. `PlaylistIndex` is the sort key
/// within the owning playlist, not a global id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistEntry {
    id: i64,
    playlist_id: i64,
    track_id: i64,
    playlist_index: u32,
}

impl PlaylistEntry {
    pub fn new(id: i64, playlist_id: i64, track_id: i64, playlist_index: u32) -> Self {
        Self { id, playlist_id, track_id, playlist_index }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn playlist_id(&self) -> i64 {
        self.playlist_id
    }

    pub fn track_id(&self) -> i64 {
        self.track_id
    }

    pub fn playlist_index(&self) -> u32 {
        self.playlist_index
    }
}
