use std::collections::BTreeSet;

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::domain::refs::{AlbumRef, ArtworkRef, TrackRef};
use crate::repository::{SqliteAlbumsRepository, SqliteArtworkRepository, SqliteGenresRepository, SqliteTracksRepository};

use super::scanner::{MediaScanner, TagReader};
use super::ServiceError;

/// Reconciles one scanned `(TrackRef, AlbumRef, Option<ArtworkRef>)` triple
/// against the catalog (§4.6, grounded on `scan/directory.py:set_cross_refs`
/// and extended per the fuller five-step rule):
///
/// 1. `ensureAlbumExists` resolves/creates the album.
/// 2. `ensureArtworkExists` resolves/creates artwork, or clears it.
/// 3. `ensureTrackExists` resolves/creates/updates the track itself.
/// 4. On an update, the album's genre set is recomputed from its tracks'
///    distinct genres, and if the track moved albums the now-empty old
///    album is deleted.
/// 5. On an insert, the track's genre is appended to the album's genre set.
#[allow(clippy::too_many_arguments)]
pub async fn ingest_entry<'e, E>(
    executor: E,
    tracks: &SqliteTracksRepository,
    albums: &SqliteAlbumsRepository,
    genres: &SqliteGenresRepository,
    artwork: &SqliteArtworkRepository,
    track_ref: &TrackRef,
    album_ref: &AlbumRef,
    artwork_ref: Option<&ArtworkRef>,
) -> Result<(), ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let previous_album_id = match track_ref.id {
        Some(id) => tracks.by_id_fetch(executor, id).await?.and_then(|t| t.album_id()),
        None => None,
    };

    let album = albums.ensure_exists(executor, album_ref).await?;

    let artwork_id = match artwork_ref {
        Some(artwork_ref) => Some(artwork.ensure_exists(executor, artwork_ref).await?.id()),
        None => None,
    };

    let genre_id = match &track_ref.genre {
        Some(name) => Some(genres.ensure_exists(executor, name).await?.id()),
        None => None,
    };

    let is_update = track_ref.id.is_some();
    tracks.ensure_exists(executor, track_ref, Some(album.id()), genre_id, artwork_id).await?;

    if is_update {
        recompute_album_genres(executor, albums, tracks, album.id()).await?;

        if let Some(previous_album_id) = previous_album_id {
            if previous_album_id != album.id() {
                let remaining = tracks.all_by_album(executor, previous_album_id).await?;
                if remaining.is_empty() {
                    albums.delete(executor, previous_album_id).await?;
                }
            }
        }
    } else if let Some(genre_id) = genre_id {
        albums.add_genre(executor, album.id(), genre_id).await?;
    }

    Ok(())
}

async fn recompute_album_genres<'e, E>(
    executor: E,
    albums: &SqliteAlbumsRepository,
    tracks: &SqliteTracksRepository,
    album_id: i64,
) -> Result<(), ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let album_tracks = tracks.all_by_album(executor, album_id).await?;
    let distinct_genres: BTreeSet<i64> = album_tracks.iter().filter_map(|t| t.genre_id()).collect();
    let existing_genres = albums.genre_ids(executor, album_id).await?;

    for genre_id in &existing_genres {
        if !distinct_genres.contains(genre_id) {
            albums.remove_genre(executor, album_id, *genre_id).await?;
        }
    }
    for genre_id in distinct_genres {
        albums.add_genre(executor, album_id, genre_id).await?;
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub tracks_inserted: usize,
    pub tracks_updated: usize,
    pub errors: Vec<ServiceError>,
}

/// Walks `scanner`'s configured music directory and reconciles every entry
/// found against the catalog. A track already known by filepath is treated
/// as an update, matching the source's re-scan behaviour.
pub async fn scan_directory<R: TagReader>(pool: &SqlitePool, scanner: &MediaScanner<R>) -> Result<IngestReport, ServiceError> {
    let scan_result = scanner.scan_music_lib()?;

    let tracks = SqliteTracksRepository::new();
    let albums = SqliteAlbumsRepository::new();
    let genres = SqliteGenresRepository::new();
    let artwork = SqliteArtworkRepository::new();

    let mut report = IngestReport::default();

    for (mut track_ref, album_ref, artwork_ref) in scan_result.entries {
        if track_ref.id.is_none() {
            if let Some(existing) = tracks.by_path_fetch(pool, &track_ref.filepath).await? {
                track_ref.id = Some(existing.id());
            }
        }
        let is_update = track_ref.id.is_some();

        match ingest_entry(pool, &tracks, &albums, &genres, &artwork, &track_ref, &album_ref, artwork_ref.as_ref()).await {
            Ok(()) => {
                if is_update {
                    report.tracks_updated += 1;
                } else {
                    report.tracks_inserted += 1;
                }
            }
            Err(err) => {
                log::warn!("Failed to ingest {}: {}", track_ref.filepath.display(), err);
                report.errors.push(err);
            }
        }
    }

    for err in scan_result.errors {
        report.errors.push(ServiceError::ScanError(err));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_helpers::{init_logger, prepare_db, TestSetupError};

    fn sample_track_ref(filepath: &str, genre: Option<&str>) -> TrackRef {
        TrackRef {
            id: None,
            filepath: filepath.into(),
            title: "A Song".to_string(),
            duration: 180_000,
            composer: None,
            artist: Some("An Artist".to_string()),
            genre: genre.map(String::from),
            volume_number: None,
            track_count: None,
            track_number: None,
            release_date: None,
            musicbrainz_track_id: None,
            musicbrainz_artist_id: None,
        }
    }

    fn sample_album_ref() -> AlbumRef {
        AlbumRef {
            title: "An Album".to_string(),
            artist: Some("An Artist".to_string()),
            is_compilation: false,
            volume_count: None,
            release_year: None,
            musicbrainz_album_id: None,
            musicbrainz_album_artist_id: None,
        }
    }

    #[tokio::test]
    async fn fresh_track_creates_album_and_appends_genre() -> Result<(), TestSetupError> {
        init_logger()?;
        let pool = prepare_db().await?;
        let tracks = SqliteTracksRepository::new();
        let albums = SqliteAlbumsRepository::new();
        let genres = SqliteGenresRepository::new();
        let artwork = SqliteArtworkRepository::new();

        let track_ref = sample_track_ref("/music/a.mp3", Some("Ambient"));
        let album_ref = sample_album_ref();

        ingest_entry(&pool, &tracks, &albums, &genres, &artwork, &track_ref, &album_ref, None).await?;

        let album = albums.by_identity_fetch(&pool, "An Album", Some("An Artist")).await?;
        assert_eq!(album.len(), 1);
        let genre_ids = albums.genre_ids(&pool, album[0].id()).await?;
        assert_eq!(genre_ids.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn rescan_same_filepath_updates_instead_of_duplicating() -> Result<(), TestSetupError> {
        init_logger()?;
        let pool = prepare_db().await?;
        let tracks = SqliteTracksRepository::new();
        let albums = SqliteAlbumsRepository::new();
        let genres = SqliteGenresRepository::new();
        let artwork = SqliteArtworkRepository::new();

        let track_ref = sample_track_ref("/music/a.mp3", Some("Ambient"));
        let album_ref = sample_album_ref();
        ingest_entry(&pool, &tracks, &albums, &genres, &artwork, &track_ref, &album_ref, None).await?;

        let existing = tracks.by_path_fetch(&pool, &std::path::PathBuf::from("/music/a.mp3")).await?.unwrap();
        let mut second_pass = sample_track_ref("/music/a.mp3", Some("Ambient"));
        second_pass.id = Some(existing.id());

        ingest_entry(&pool, &tracks, &albums, &genres, &artwork, &second_pass, &album_ref, None).await?;

        assert_eq!(tracks.count(&pool).await?, 1);
        Ok(())
    }
}
