use serde::{Serialize, Deserialize};

use super::ValidationError;
use crate::utils::normalizations::normalize_title;

/// A streaming radio station. The `now_playing_*` fields drive the
/// metadata poller (see `player::poller`); they are optional because not
/// every station publishes now-playing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioStation {
    id: i64,
    name: String,
    url: String,
    artwork_url: Option<String>,
    now_playing_url: Option<String>,
    now_playing_jq: Option<String>,
    now_playing_artwork_url: Option<String>,
    now_playing_artwork_jq: Option<String>,
    sort_order: Option<i64>,
}

impl RadioStation {
    #[allow(clippy::too_many_arguments)]
    pub fn new<S: Into<String>, U: Into<String>>(
        id: i64,
        name: S,
        url: U,
        artwork_url: Option<String>,
        now_playing_url: Option<String>,
        now_playing_jq: Option<String>,
        now_playing_artwork_url: Option<String>,
        now_playing_artwork_jq: Option<String>,
        sort_order: Option<i64>,
    ) -> Result<Self, ValidationError> {
        let name = normalize_title(&name.into());
        if name.is_empty() {
            return Err(ValidationError::NameIsEmptyString);
        }
        let url = url.into();
        if url.is_empty() {
            return Err(ValidationError::FilepathIsEmptyString);
        }

        Ok(Self {
            id,
            name,
            url,
            artwork_url,
            now_playing_url,
            now_playing_jq,
            now_playing_artwork_url,
            now_playing_artwork_jq,
            sort_order,
        })
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork_url.as_deref()
    }

    pub fn now_playing_url(&self) -> Option<&str> {
        self.now_playing_url.as_deref()
    }

    pub fn now_playing_jq(&self) -> Option<&str> {
        self.now_playing_jq.as_deref()
    }

    pub fn now_playing_artwork_url(&self) -> Option<&str> {
        self.now_playing_artwork_url.as_deref()
    }

    pub fn now_playing_artwork_jq(&self) -> Option<&str> {
        self.now_playing_artwork_jq.as_deref()
    }

    pub fn sort_order(&self) -> Option<i64> {
        self.sort_order
    }

    pub fn set_artwork_url(&mut self, url: Option<String>) {
        self.artwork_url = url;
    }
}
