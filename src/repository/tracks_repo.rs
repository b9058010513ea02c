use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::track::Track;
use crate::utils::normalizations::normalize_path;

use super::{IntoId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum TrackConversionError {
    #[error("Failed to build domain Track from row: {0}")]
    Validation(#[from] crate::domain::ValidationError),

    #[error("Stored ReleaseDate '{0}' is not a valid date")]
    BadReleaseDate(String),
}

#[derive(Debug, FromRow)]
struct DbTrack {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Filepath")]
    filepath: String,
    #[sqlx(rename = "Title")]
    title: String,
    #[sqlx(rename = "Duration")]
    duration: i64,
    #[sqlx(rename = "Composer")]
    composer: Option<String>,
    #[sqlx(rename = "Artist")]
    artist: Option<String>,
    #[sqlx(rename = "Genre")]
    genre: Option<i64>,
    #[sqlx(rename = "VolumeNumber")]
    volume_number: Option<i64>,
    #[sqlx(rename = "TrackCount")]
    track_count: Option<i64>,
    #[sqlx(rename = "TrackNumber")]
    track_number: Option<i64>,
    #[sqlx(rename = "ReleaseDate")]
    release_date: Option<String>,
    #[sqlx(rename = "MusicBrainzTrackId")]
    musicbrainz_track_id: Option<String>,
    #[sqlx(rename = "MusicBrainzArtistId")]
    musicbrainz_artist_id: Option<String>,
    #[sqlx(rename = "Album")]
    album: Option<i64>,
    #[sqlx(rename = "Artwork")]
    artwork: Option<i64>,
}

impl TryFrom<DbTrack> for Track {
    type Error = TrackConversionError;

    fn try_from(row: DbTrack) -> Result<Self, Self::Error> {
        let release_date = row
            .release_date
            .map(|s| NaiveDate::from_str(&s).map_err(|_| TrackConversionError::BadReleaseDate(s)))
            .transpose()?;

        let track = Track::new(
            row.id,
            PathBuf::from(row.filepath),
            row.title,
            row.duration as u32,
            row.composer,
            row.artist,
            row.genre,
            row.volume_number.map(|v| v as u32),
            row.track_count.map(|v| v as u32),
            row.track_number.map(|v| v as u32),
            release_date,
            row.musicbrainz_track_id,
            row.musicbrainz_artist_id,
            row.album,
            row.artwork,
        )?;
        Ok(track)
    }
}

#[derive(Debug, Default)]
pub struct SqliteTracksRepository;

impl SqliteTracksRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbTrack>("SELECT * FROM Tracks WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        row.map(Track::try_from).transpose().map_err(RepositoryError::from)
    }

    pub async fn by_path_fetch<'e, E>(&self, executor: E, path: &std::path::Path) -> Result<Option<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let norm = normalize_path(path);
        let path_str = norm
            .to_str()
            .ok_or_else(|| RepositoryError::InvalidPathEncoding(norm.clone()))?;

        let row = sqlx::query_as::<_, DbTrack>("SELECT * FROM Tracks WHERE Filepath = ?")
            .bind(path_str)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        row.map(Track::try_from).transpose().map_err(RepositoryError::from)
    }

    pub async fn all_by_album<'e, E>(&self, executor: E, album_id: impl IntoId) -> Result<Vec<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let album_id = album_id.into_id()?;
        let rows = sqlx::query_as::<_, DbTrack>("SELECT * FROM Tracks WHERE Album = ? ORDER BY VolumeNumber, TrackNumber")
            .bind(album_id)
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Track::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn all<'e, E>(&self, executor: E) -> Result<Vec<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbTrack>("SELECT * FROM Tracks")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Track::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn search<'e, E>(&self, executor: E, query: &str, limit: i64) -> Result<Vec<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let like = format!("%{}%", query);
        let rows = sqlx::query_as::<_, DbTrack>(
            "SELECT t.* FROM Tracks t LEFT JOIN Albums a ON t.Album = a.Id \
             WHERE t.Title LIKE ? OR t.Artist LIKE ? OR a.Title LIKE ? LIMIT ?",
        )
        .bind(&like)
        .bind(&like)
        .bind(&like)
        .bind(limit)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Track::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn insert<'e, E>(&self, executor: E, track: &Track) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let filepath = track
            .filepath()
            .to_str()
            .ok_or_else(|| RepositoryError::InvalidPathEncoding(track.filepath().clone()))?;

        let row: (i64,) = sqlx::query_as(
            "INSERT INTO Tracks
                (Filepath, Title, Duration, Composer, Artist, Genre, VolumeNumber, TrackCount,
                 TrackNumber, ReleaseDate, MusicBrainzTrackId, MusicBrainzArtistId, Album, Artwork)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING Id",
        )
        .bind(filepath)
        .bind(track.title())
        .bind(track.duration() as i64)
        .bind(track.composer())
        .bind(track.artist())
        .bind(track.genre_id())
        .bind(track.volume_number().map(|v| v as i64))
        .bind(track.track_count().map(|v| v as i64))
        .bind(track.track_number().map(|v| v as i64))
        .bind(track.release_date().map(|d| d.to_string()))
        .bind(track.musicbrainz_track_id())
        .bind(track.musicbrainz_artist_id())
        .bind(track.album_id())
        .bind(track.artwork_id())
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        Ok(row.0)
    }

    pub async fn update_cross_refs<'e, E>(
        &self,
        executor: E,
        track_id: impl IntoId,
        album_id: Option<i64>,
        genre_id: Option<i64>,
        artwork_id: Option<i64>,
    ) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let track_id = track_id.into_id()?;
        sqlx::query("UPDATE Tracks SET Album = ?, Genre = ?, Artwork = ? WHERE Id = ?")
            .bind(album_id)
            .bind(genre_id)
            .bind(artwork_id)
            .bind(track_id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    /// Deletes a track and, if it held the last reference to its artwork,
    /// the artwork row with it (data-model invariant 4: "Deleting the last
    /// Track referencing an Artwork deletes the Artwork").
    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        let id = id.into_id()?;

        let artwork_id: Option<i64> = sqlx::query_as::<_, (Option<i64>,)>("SELECT Artwork FROM Tracks WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?
            .and_then(|row| row.0);

        let result = sqlx::query("DELETE FROM Tracks WHERE Id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }

        if let Some(artwork_id) = artwork_id {
            let (remaining,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Tracks WHERE Artwork = ?")
                .bind(artwork_id)
                .fetch_one(executor)
                .await
                .map_err(RepositoryError::from_sqlx_error)?;

            if remaining == 0 {
                sqlx::query("DELETE FROM Artwork WHERE Id = ?")
                    .bind(artwork_id)
                    .execute(executor)
                    .await
                    .map_err(RepositoryError::from_sqlx_error)?;
            }
        }

        Ok(())
    }

    pub async fn id_exists<'e, E>(&self, executor: E, id: impl IntoId) -> Result<bool, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Tracks WHERE Id = ?")
            .bind(id)
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0 > 0)
    }

    pub async fn path_exists<'e, E>(&self, executor: E, path: &std::path::Path) -> Result<bool, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let norm = normalize_path(path);
        let path_str = norm
            .to_str()
            .ok_or_else(|| RepositoryError::InvalidPathEncoding(norm.clone()))?;
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Tracks WHERE Filepath = ?")
            .bind(path_str)
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0 > 0)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Tracks")
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    /// Matches the full `TrackIdentity` tuple used by `ensure_track_exists`
    /// when a candidate arrives without a known `Id` (§4.5). NULL-safe
    /// equality on every optional column.
    pub async fn by_identity_fetch<'e, E>(&self, executor: E, key: &crate::domain::track::TrackIdentity<'_>) -> Result<Vec<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbTrack>(
            "SELECT * FROM Tracks WHERE
                (Album = ? OR (Album IS NULL AND ? IS NULL)) AND
                Title = ? AND Duration = ? AND
                (Artist = ? OR (Artist IS NULL AND ? IS NULL)) AND
                (VolumeNumber = ? OR (VolumeNumber IS NULL AND ? IS NULL)) AND
                (TrackNumber = ? OR (TrackNumber IS NULL AND ? IS NULL)) AND
                (ReleaseDate = ? OR (ReleaseDate IS NULL AND ? IS NULL)) AND
                (MusicBrainzTrackId = ? OR (MusicBrainzTrackId IS NULL AND ? IS NULL)) AND
                (MusicBrainzArtistId = ? OR (MusicBrainzArtistId IS NULL AND ? IS NULL))",
        )
        .bind(key.album_id).bind(key.album_id)
        .bind(key.title)
        .bind(key.duration as i64)
        .bind(key.artist).bind(key.artist)
        .bind(key.volume_number.map(|v| v as i64)).bind(key.volume_number.map(|v| v as i64))
        .bind(key.track_number.map(|v| v as i64)).bind(key.track_number.map(|v| v as i64))
        .bind(key.release_date.map(|d| d.to_string())).bind(key.release_date.map(|d| d.to_string()))
        .bind(key.musicbrainz_track_id).bind(key.musicbrainz_track_id)
        .bind(key.musicbrainz_artist_id).bind(key.musicbrainz_artist_id)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Track::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    /// Overwrites every mutable field of an already-known row, used when the
    /// scanner re-visits a track it matched by filepath (`track_ref.id` is
    /// `Some`).
    pub async fn update_full<'e, E>(&self, executor: E, track: &Track) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "UPDATE Tracks SET
                Title = ?, Duration = ?, Composer = ?, Artist = ?, Genre = ?,
                VolumeNumber = ?, TrackCount = ?, TrackNumber = ?, ReleaseDate = ?,
                MusicBrainzTrackId = ?, MusicBrainzArtistId = ?, Album = ?, Artwork = ?
             WHERE Id = ?",
        )
        .bind(track.title())
        .bind(track.duration() as i64)
        .bind(track.composer())
        .bind(track.artist())
        .bind(track.genre_id())
        .bind(track.volume_number().map(|v| v as i64))
        .bind(track.track_count().map(|v| v as i64))
        .bind(track.track_number().map(|v| v as i64))
        .bind(track.release_date().map(|d| d.to_string()))
        .bind(track.musicbrainz_track_id())
        .bind(track.musicbrainz_artist_id())
        .bind(track.album_id())
        .bind(track.artwork_id())
        .bind(track.id())
        .execute(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    /// Insert-or-reconcile a scanned `TrackRef` (§4.5/§4.6). `genre_id` and
    /// `artwork_id` are pre-resolved by the caller (`ensure_genre_exists`,
    /// `ensure_artwork_exists`) since tracks don't own those reconciliations
    /// themselves. When `track_ref.id` is set the scanner already matched
    /// this row by filepath and every mutable field is overwritten; otherwise
    /// the full identity tuple is matched to decide insert vs. update.
    pub async fn ensure_exists<'e, E>(
        &self,
        executor: E,
        track_ref: &crate::domain::refs::TrackRef,
        album_id: Option<i64>,
        genre_id: Option<i64>,
        artwork_id: Option<i64>,
    ) -> Result<Track, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        let candidate = Track::new(
            track_ref.id.unwrap_or(0),
            track_ref.filepath.clone(),
            track_ref.title.clone(),
            track_ref.duration,
            track_ref.composer.clone(),
            track_ref.artist.clone(),
            genre_id,
            track_ref.volume_number,
            track_ref.track_count,
            track_ref.track_number,
            track_ref.release_date,
            track_ref.musicbrainz_track_id.clone(),
            track_ref.musicbrainz_artist_id.clone(),
            album_id,
            artwork_id,
        )?;

        if let Some(id) = track_ref.id {
            self.update_full(executor, &candidate).await?;
            return self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id));
        }

        let mut matches = self.by_identity_fetch(executor, &candidate.identity_key()).await?;
        match matches.len() {
            0 => {
                let id = self.insert(executor, &candidate).await?;
                self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id))
            }
            1 => {
                let existing = matches.remove(0);
                self.update_cross_refs(executor, existing.id(), album_id, genre_id, artwork_id).await?;
                self.by_id_fetch(executor, existing.id()).await?.ok_or(RepositoryError::IdNotFound(existing.id()))
            }
            _ => Err(RepositoryError::DuplicateIdentity(format!("Track {:?}", candidate.identity_key()))),
        }
    }

    /// Page through the catalog by id, tolerating gaps left by deletions.
    /// Returns up to `limit` tracks with `Id > after_id`, plus whether more
    /// remain — matching the source's pagination (it tracks the last seen id
    /// rather than an offset, so a delete mid-scan can't skip a row).
    pub async fn all_paged<'e, E>(&self, executor: E, after_id: i64, limit: i64) -> Result<(Vec<Track>, bool), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        let rows = sqlx::query_as::<_, DbTrack>("SELECT * FROM Tracks WHERE Id > ? ORDER BY Id LIMIT ?")
            .bind(after_id)
            .bind(limit + 1)
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        let has_more = rows.len() as i64 > limit;
        let mut tracks = rows.into_iter().map(Track::try_from).collect::<Result<Vec<_>, _>>()?;
        tracks.truncate(limit as usize);
        Ok((tracks, has_more))
    }

    /// Relevance-scored search across Title/Artist/Album (§4.5). For each
    /// word, the *best* matching location wins (exact title=4, substring
    /// title=3, substring album=2, substring artist=1, else 0); per-word
    /// scores are summed across all words, results sorted descending,
    /// truncated to 100.
    pub async fn search_scored<'e, E>(&self, executor: E, words: &[String]) -> Result<Vec<Track>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if words.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = String::from(
            "SELECT t.* FROM Tracks t LEFT JOIN Albums a ON t.Album = a.Id WHERE ",
        );
        let clauses: Vec<&str> =
            words.iter().map(|_| "(LOWER(t.Title) LIKE ? OR LOWER(t.Artist) LIKE ? OR LOWER(a.Title) LIKE ?)").collect();
        query.push_str(&clauses.join(" OR "));

        let mut q = sqlx::query_as::<_, DbTrack>(&query);
        for word in words {
            let like = format!("%{}%", word.to_lowercase());
            q = q.bind(like.clone()).bind(like.clone()).bind(like);
        }
        let rows = q.fetch_all(executor).await.map_err(RepositoryError::from_sqlx_error)?;

        let albums_titles: Vec<(i64, Option<String>)> = sqlx::query_as("SELECT Id, Title FROM Albums")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        let words_lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut scored: Vec<(i64, Track)> = rows
            .into_iter()
            .map(Track::try_from)
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|track| {
                let title_lower = track.title().to_lowercase();
                let artist_lower = track.artist().map(|a| a.to_lowercase());
                let album_title_lower = track
                    .album_id()
                    .and_then(|id| albums_titles.iter().find(|(aid, _)| *aid == id))
                    .and_then(|(_, title)| title.as_deref())
                    .map(|t| t.to_lowercase());

                let score: i64 = words_lower
                    .iter()
                    .map(|word| {
                        if title_lower == *word {
                            4
                        } else if title_lower.contains(word.as_str()) {
                            3
                        } else if album_title_lower.as_deref().is_some_and(|t| t.contains(word.as_str())) {
                            2
                        } else if artist_lower.as_deref().is_some_and(|a| a.contains(word.as_str())) {
                            1
                        } else {
                            0
                        }
                    })
                    .sum();
                (score, track)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(100);
        Ok(scored.into_iter().map(|(_, t)| t).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_helpers::prepare_db;

    fn sample_track(filepath: &str) -> Track {
        Track::new(
            0,
            PathBuf::from(filepath),
            "A Song",
            180,
            None,
            Some("An Artist".to_string()),
            None,
            Some(1),
            Some(10),
            Some(3),
            None,
            None,
            None,
            None,
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_then_fetch_by_id() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteTracksRepository::new();
        let track = sample_track("/music/a.mp3");

        let id = repo.insert(&pool, &track).await.unwrap();
        let fetched = repo.by_id_fetch(&pool, id).await.unwrap().unwrap();

        assert_eq!(fetched.title(), "A Song");
        assert_eq!(fetched.filepath(), &PathBuf::from("/music/a.mp3"));
    }

    #[tokio::test]
    async fn fetch_by_path_is_case_sensitive() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteTracksRepository::new();
        let track = sample_track("/music/Track.mp3");
        repo.insert(&pool, &track).await.unwrap();

        assert!(repo.by_path_fetch(&pool, &PathBuf::from("/music/Track.mp3")).await.unwrap().is_some());
        assert!(repo.by_path_fetch(&pool, &PathBuf::from("/music/track.mp3")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_filepath_is_rejected() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteTracksRepository::new();
        let track = sample_track("/music/a.mp3");
        repo.insert(&pool, &track).await.unwrap();

        let err = repo.insert(&pool, &track).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConstraintViolation { .. }));
    }

    #[tokio::test]
    async fn delete_missing_id_is_an_error() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteTracksRepository::new();
        let err = repo.delete(&pool, 999i64).await.unwrap_err();
        assert!(matches!(err, RepositoryError::IdNotFound(999)));
    }

    /// T3 (§8): deleting the last track referencing an artwork deletes the
    /// artwork with it, but leaves artwork still referenced by another track
    /// alone.
    #[tokio::test]
    async fn delete_removes_artwork_only_once_unreferenced() {
        let pool = prepare_db().await.unwrap();
        let tracks = SqliteTracksRepository::new();
        let artwork = crate::repository::SqliteArtworkRepository::new();

        let artwork_id = artwork.insert_blob(&pool, b"fake-jpeg-bytes", "deadbeef", None, None).await.unwrap();

        let mut sole = sample_track("/music/sole.mp3");
        sole.set_artwork_id(Some(artwork_id));
        let sole_id = tracks.insert(&pool, &sole).await.unwrap();

        let mut shared_a = sample_track("/music/shared_a.mp3");
        shared_a.set_artwork_id(Some(artwork_id));
        let shared_a_id = tracks.insert(&pool, &shared_a).await.unwrap();

        let mut shared_b = sample_track("/music/shared_b.mp3");
        shared_b.set_artwork_id(Some(artwork_id));
        let shared_b_id = tracks.insert(&pool, &shared_b).await.unwrap();

        tracks.delete(&pool, shared_a_id).await.unwrap();
        assert!(artwork.by_id_fetch(&pool, artwork_id).await.unwrap().is_some(), "artwork still referenced by shared_b must survive");

        tracks.delete(&pool, shared_b_id).await.unwrap();
        assert!(artwork.by_id_fetch(&pool, artwork_id).await.unwrap().is_some(), "artwork still referenced by sole must survive");

        tracks.delete(&pool, sole_id).await.unwrap();
        assert!(artwork.by_id_fetch(&pool, artwork_id).await.unwrap().is_none(), "last referencing track deleted, artwork must be gone");
    }

    #[tokio::test]
    async fn search_matches_title_artist_and_album() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteTracksRepository::new();
        repo.insert(&pool, &sample_track("/music/a.mp3")).await.unwrap();

        let results = repo.search(&pool, "Song", 100).await.unwrap();
        assert_eq!(results.len(), 1);
    }
}
