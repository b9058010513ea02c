//! JSON response shapes. Grounded field-for-field on
//! `examples/original_source/pijuv2/backend/serialize.py`'s `json_*`
//! helpers, adapted to Rust's `serde_json::Value` and to the
//! `InformationLevel` tiers already modeled in `domain::InformationLevel`.
//!
//! `artwork`/`artworkinfo` links are keyed by artwork id, matching
//! `routes.py`'s `/artwork/<artworkid>` (the `serialize.py` this was
//! ported from keyed them by track id, a stale mismatch with its own
//! route definition — not carried forward here).

use serde_json::{json, Value};

use crate::domain::album::Album;
use crate::domain::genre::Genre;
use crate::domain::playlist::Playlist;
use crate::domain::queue::QueuedItem;
use crate::domain::radio::RadioStation;
use crate::domain::track::Track;
use crate::domain::InformationLevel;
use crate::services::download::Download;

use super::codec::{album_link, artwork_link, artworkinfo_link, genre_link, mp3_link, playlist_link, radio_link, track_link};

/// One member track's resolved genre name and artwork id, the context
/// `json_track`/`json_album` need beyond what `Track` stores directly.
pub type TrackContext = (Track, Option<String>, Option<i64>);

/// `artwork` sub-object on `json_album`: linked via whichever member track
/// first carries artwork, since albums don't store artwork directly.
fn artwork_object(artwork: Option<(i64, Option<u32>, Option<u32>)>) -> Value {
    match artwork {
        Some((artwork_id, width, height)) => json!({ "link": artwork_link(artwork_id), "width": width, "height": height }),
        None => json!({ "link": Value::Null, "width": Value::Null, "height": Value::Null }),
    }
}

/// `json_track(track, include_debuginfo)`.
pub fn json_track(track: &Track, genre_name: Option<&str>, artwork_id: Option<i64>, debug: bool) -> Value {
    let mut rtn = json!({
        "link": track_link(track.id()),
        "artist": track.artist(),
        "title": track.title(),
        "genre": genre_name,
        "disknumber": track.volume_number(),
        "tracknumber": track.track_number(),
        "trackcount": track.track_count(),
        "fileformat": track.extension(),
        "album": track.album_id().map(album_link),
        "artwork": artwork_id.map(artwork_link),
        "artworkinfo": artwork_id.map(artworkinfo_link),
        "mp3": mp3_link(track.id()),
    });
    if debug {
        rtn["filepath"] = json!(track.filepath());
    }
    rtn
}

/// `json_track_or_file` — the file player's queue can hold ephemeral
/// downloads (negative ids) alongside catalog tracks (§3 `QueuedItem`).
pub fn json_track_or_file(item: &QueuedItem, track: Option<&Track>, genre_name: Option<&str>, artwork_id: Option<i64>, debug: bool) -> Value {
    if !item.is_ephemeral() {
        return track.map(|t| json_track(t, genre_name, artwork_id, debug)).unwrap_or_else(|| json!({}));
    }

    let extension = item.filepath.extension().map(|ext| format!(".{}", ext.to_string_lossy())).unwrap_or_default();
    let mut rtn = json!({
        "link": track_link(item.track_id),
        "artist": Value::Null,
        "title": Value::Null,
        "genre": Value::Null,
        "disknumber": Value::Null,
        "tracknumber": Value::Null,
        "trackcount": Value::Null,
        "fileformat": extension,
        "album": Value::Null,
        "artwork": Value::Null,
        "artworkinfo": Value::Null,
    });
    if debug {
        rtn["filepath"] = json!(item.filepath);
    }
    rtn
}

/// `json_album(album, include_tracks)`. `tracks` must already be sorted by
/// (VolumeNumber, TrackNumber) and carry each track's resolved genre name
/// plus artwork id, since albums don't own that data directly.
pub fn json_album(
    album: &Album,
    genre_ids: &[i64],
    artwork: Option<(i64, Option<u32>, Option<u32>)>,
    tracks: Option<&[TrackContext]>,
    include_tracks: InformationLevel,
) -> Value {
    let mut rtn = json!({
        "link": album_link(album.id()),
        "artist": album.artist(),
        "title": album.title(),
        "releasedate": album.release_year(),
        "iscompilation": album.is_compilation(),
        "numberdisks": album.volume_count(),
        "artwork": artwork_object(artwork),
        "genres": genre_ids.iter().copied().map(genre_link).collect::<Vec<_>>(),
    });

    if let Some(tracks) = tracks {
        match include_tracks {
            InformationLevel::None => {}
            InformationLevel::Links => {
                rtn["tracks"] = json!(tracks.iter().map(|(t, _, _)| track_link(t.id())).collect::<Vec<_>>());
            }
            InformationLevel::All | InformationLevel::Debug => {
                let debug = include_tracks == InformationLevel::Debug;
                rtn["tracks"] = json!(tracks.iter().map(|(t, genre, artwork_id)| json_track(t, genre.as_deref(), *artwork_id, debug)).collect::<Vec<_>>());
            }
        }
    }
    rtn
}

/// `json_genre(genre, include_albums, include_playlists)`. Callers pass
/// already-resolved related albums/playlists since `Genre` itself carries
/// only an id and a name.
pub fn json_genre(
    genre: &Genre,
    albums: Option<&[(Album, Vec<i64>)]>,
    include_albums: InformationLevel,
    playlists: Option<&[Playlist]>,
    include_playlists: InformationLevel,
) -> Value {
    let mut rtn = json!({
        "link": genre_link(genre.id()),
        "name": genre.name(),
    });

    if let Some(albums) = albums {
        match include_albums {
            InformationLevel::None => {}
            InformationLevel::Links => {
                rtn["albums"] = json!(albums.iter().map(|(a, _)| album_link(a.id())).collect::<Vec<_>>());
            }
            InformationLevel::All | InformationLevel::Debug => {
                rtn["albums"] = json!(albums.iter().map(|(a, gids)| json_album(a, gids, None, None, include_albums)).collect::<Vec<_>>());
            }
        }
    }

    if let Some(playlists) = playlists {
        match include_playlists {
            InformationLevel::None => {}
            InformationLevel::Links => {
                rtn["playlists"] = json!(playlists.iter().map(|p| playlist_link(p.id())).collect::<Vec<_>>());
            }
            InformationLevel::All | InformationLevel::Debug => {
                rtn["playlists"] = json!(playlists
                    .iter()
                    .map(|p| json_playlist(p, &[], InformationLevel::None, None, InformationLevel::None))
                    .collect::<Vec<_>>());
            }
        }
    }
    rtn
}

/// `json_playlist(playlist, include_genres, include_tracks)`.
pub fn json_playlist(
    playlist: &Playlist,
    genre_ids: &[i64],
    include_genres: InformationLevel,
    tracks: Option<&[TrackContext]>,
    include_tracks: InformationLevel,
) -> Value {
    let mut rtn = json!({
        "link": playlist_link(playlist.id()),
        "title": playlist.title(),
    });

    if include_genres != InformationLevel::None {
        rtn["genres"] = json!(genre_ids.iter().copied().map(genre_link).collect::<Vec<_>>());
    }

    if let Some(tracks) = tracks {
        match include_tracks {
            InformationLevel::None => {}
            InformationLevel::Links => {
                rtn["tracks"] = json!(tracks.iter().map(|(t, _, _)| track_link(t.id())).collect::<Vec<_>>());
            }
            InformationLevel::All | InformationLevel::Debug => {
                let debug = include_tracks == InformationLevel::Debug;
                rtn["tracks"] = json!(tracks.iter().map(|(t, genre, artwork_id)| json_track(t, genre.as_deref(), *artwork_id, debug)).collect::<Vec<_>>());
            }
        }
    }
    rtn
}

/// `json_radio_station(station, include_urls)`.
pub fn json_radio_station(station: &RadioStation, include_urls: bool) -> Value {
    let mut rtn = json!({
        "link": radio_link(station.id()),
        "name": station.name(),
        "artwork": station.artwork_url(),
    });
    if include_urls {
        rtn["url"] = json!(station.url());
        rtn["now_playing_url"] = json!(station.now_playing_url());
        rtn["now_playing_jq"] = json!(station.now_playing_jq());
        rtn["now_playing_artwork_url"] = json!(station.now_playing_artwork_url());
        rtn["now_playing_artwork_jq"] = json!(station.now_playing_artwork_jq());
    }
    rtn
}

/// Entry shape for `GET /downloadhistory`.
pub fn json_download(download: &Download) -> Value {
    json!({
        "filepath": download.filepath,
        "trackid": download.fake_track_id,
        "artist": download.artist,
        "title": download.title,
        "artwork": download.artwork_url,
    })
}
