use sqlx::{Executor, Sqlite};

use crate::repository::{SqliteAlbumsRepository, SqliteArtworkRepository, SqliteGenresRepository, SqliteTracksRepository};

use super::ServiceError;

const PAGE_SIZE: i64 = 500;

#[derive(Debug, Default)]
pub struct TidyReport {
    pub deleted_track_ids: Vec<i64>,
    pub deleted_album_ids: Vec<i64>,
    pub deleted_artwork_ids: Vec<i64>,
    pub deleted_genre_ids: Vec<i64>,
}

/// Delete tracks whose `Filepath` no longer exists on disk. Pages through
/// the catalog by id, tolerating gaps left by earlier deletions (§4.7),
/// grounded on `database/tidy.py:delete_missing_tracks`.
pub async fn delete_missing_tracks<'e, E>(executor: E, tracks: &SqliteTracksRepository) -> Result<Vec<i64>, ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let mut deleted = Vec::new();
    let mut after_id = 0i64;

    loop {
        let (page, has_more) = tracks.all_paged(executor, after_id, PAGE_SIZE).await?;
        if page.is_empty() {
            break;
        }
        after_id = page.last().map(|t| t.id()).unwrap_or(after_id);

        for track in &page {
            if !track.filepath().is_file() {
                tracks.delete(executor, track.id()).await?;
                deleted.push(track.id());
            }
        }

        if !has_more {
            break;
        }
    }

    Ok(deleted)
}

/// Delete albums with zero tracks (§4.7).
pub async fn delete_albums_without_tracks<'e, E>(executor: E, albums: &SqliteAlbumsRepository) -> Result<Vec<i64>, ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let orphans = albums.without_tracks(executor).await?;
    let mut deleted = Vec::with_capacity(orphans.len());
    for album in orphans {
        albums.delete(executor, album.id()).await?;
        deleted.push(album.id());
    }
    Ok(deleted)
}

/// Delete artwork rows with zero tracks (§4.7) — defense-in-depth against
/// cascade misses, since a track's `Artwork` reference is cleared rather
/// than cascade-deleted.
pub async fn delete_artwork_without_tracks<'e, E>(executor: E, artwork: &SqliteArtworkRepository) -> Result<Vec<i64>, ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let orphans = artwork.without_tracks(executor).await?;
    let mut deleted = Vec::with_capacity(orphans.len());
    for art in orphans {
        artwork.delete(executor, art.id()).await?;
        deleted.push(art.id());
    }
    Ok(deleted)
}

/// Delete genres referenced by no album and no playlist (§4.7).
pub async fn delete_empty_genres<'e, E>(executor: E, genres: &SqliteGenresRepository) -> Result<Vec<i64>, ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let orphans = genres.without_albums_or_playlists(executor).await?;
    let mut deleted = Vec::with_capacity(orphans.len());
    for genre in orphans {
        genres.delete(executor, genre.id()).await?;
        deleted.push(genre.id());
    }
    Ok(deleted)
}

/// `/scanner/tidy` runs delete-missing-tracks followed by
/// delete-empty-albums; exposed here as a convenience bundling the two
/// sweeps a plain HTTP tidy request triggers (§6).
pub async fn tidy<'e, E>(
    executor: E,
    tracks: &SqliteTracksRepository,
    albums: &SqliteAlbumsRepository,
) -> Result<TidyReport, ServiceError>
where
    E: Executor<'e, Database = Sqlite> + Copy,
{
    let mut report = TidyReport::default();
    report.deleted_track_ids = delete_missing_tracks(executor, tracks).await?;
    report.deleted_album_ids = delete_albums_without_tracks(executor, albums).await?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::track::Track;
    use crate::services::test_helpers::{init_logger, prepare_db, TestSetupError};

    #[tokio::test]
    async fn deletes_track_whose_file_is_gone() -> Result<(), TestSetupError> {
        init_logger()?;
        let pool = prepare_db().await?;
        let tracks = SqliteTracksRepository::new();

        let dir = tempfile::tempdir()?;
        let existing_path = dir.path().join("present.mp3");
        std::fs::write(&existing_path, b"fake").unwrap();

        let present = Track::new(0, existing_path.clone(), "Present", 180, None, None, None, None, None, None, None, None, None, None, None)?;
        let missing = Track::new(0, dir.path().join("gone.mp3"), "Gone", 180, None, None, None, None, None, None, None, None, None, None, None)?;

        tracks.insert(&pool, &present).await?;
        let missing_id = tracks.insert(&pool, &missing).await?;

        let deleted = delete_missing_tracks(&pool, &tracks).await?;
        assert_eq!(deleted, vec![missing_id]);
        assert_eq!(tracks.count(&pool).await?, 1);
        Ok(())
    }
}
