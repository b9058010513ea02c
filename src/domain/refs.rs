use std::path::PathBuf;

use chrono::NaiveDate;

/// A candidate Album, as produced by the scanner or an HTTP edit, not yet
/// resolved against the catalog. `ensure_album_exists` turns this into a
/// concrete `Album` row, inserting or reconciling as needed (§4.5).
#[derive(Debug, Clone)]
pub struct AlbumRef {
    pub title: String,
    pub artist: Option<String>,
    pub is_compilation: bool,
    pub volume_count: Option<u32>,
    pub release_year: Option<u32>,
    pub musicbrainz_album_id: Option<String>,
    pub musicbrainz_album_artist_id: Option<String>,
}

/// A candidate Artwork: exactly one of `path`/`blob` is set (§3 invariant).
#[derive(Debug, Clone)]
pub enum ArtworkRef {
    Path { path: PathBuf, width: Option<u32>, height: Option<u32> },
    Blob { blob: Vec<u8>, width: Option<u32>, height: Option<u32> },
}

/// A candidate Track. `id` carries the id of an already-known row when the
/// scanner matched by filepath; `genre` is a plain name, resolved to a
/// `Genre` row by `ensure_track_exists` itself.
#[derive(Debug, Clone)]
pub struct TrackRef {
    pub id: Option<i64>,
    pub filepath: PathBuf,
    pub title: String,
    pub duration: u32,
    pub composer: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub volume_number: Option<u32>,
    pub track_count: Option<u32>,
    pub track_number: Option<u32>,
    pub release_date: Option<NaiveDate>,
    pub musicbrainz_track_id: Option<String>,
    pub musicbrainz_artist_id: Option<String>,
}
