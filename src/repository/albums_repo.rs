use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::album::Album;

use super::{IntoId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum AlbumConversionError {
    #[error("Failed to build domain Album from row: {0}")]
    Validation(#[from] crate::domain::ValidationError),
}

#[derive(Debug, FromRow)]
struct DbAlbum {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Artist")]
    artist: Option<String>,
    #[sqlx(rename = "Title")]
    title: String,
    #[sqlx(rename = "VolumeCount")]
    volume_count: Option<i64>,
    #[sqlx(rename = "MusicBrainzAlbumId")]
    musicbrainz_album_id: Option<String>,
    #[sqlx(rename = "MusicBrainzAlbumArtistId")]
    musicbrainz_album_artist_id: Option<String>,
    #[sqlx(rename = "ReleaseYear")]
    release_year: Option<i64>,
    #[sqlx(rename = "IsCompilation")]
    is_compilation: bool,
}

impl TryFrom<DbAlbum> for Album {
    type Error = AlbumConversionError;

    fn try_from(row: DbAlbum) -> Result<Self, Self::Error> {
        let album = Album::new(
            row.id,
            row.artist,
            row.title,
            row.volume_count.map(|v| v as u32),
            row.musicbrainz_album_id,
            row.musicbrainz_album_artist_id,
            row.release_year.map(|v| v as u32),
            row.is_compilation,
        )?;
        Ok(album)
    }
}

#[derive(Debug, Default)]
pub struct SqliteAlbumsRepository;

impl SqliteAlbumsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbAlbum>("SELECT * FROM Albums WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        row.map(Album::try_from).transpose().map_err(RepositoryError::from)
    }

    /// Matches by the (Title, Artist) identity tuple, per `ensure_album_exists`.
    pub async fn by_identity_fetch<'e, E>(
        &self,
        executor: E,
        title: &str,
        artist: Option<&str>,
    ) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbAlbum>(
            "SELECT * FROM Albums WHERE Title = ? AND (Artist = ? OR (Artist IS NULL AND ? IS NULL))",
        )
        .bind(title)
        .bind(artist)
        .bind(artist)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn all<'e, E>(&self, executor: E) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbAlbum>("SELECT * FROM Albums")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn without_tracks<'e, E>(&self, executor: E) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbAlbum>(
            "SELECT a.* FROM Albums a LEFT JOIN Tracks t ON t.Album = a.Id WHERE t.Id IS NULL",
        )
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn insert<'e, E>(&self, executor: E, album: &Album) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO Albums
                (Artist, Title, VolumeCount, MusicBrainzAlbumId, MusicBrainzAlbumArtistId, ReleaseYear, IsCompilation)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING Id",
        )
        .bind(album.artist())
        .bind(album.title())
        .bind(album.volume_count().map(|v| v as i64))
        .bind(album.musicbrainz_album_id())
        .bind(album.musicbrainz_album_artist_id())
        .bind(album.release_year().map(|v| v as i64))
        .bind(album.is_compilation())
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;

        Ok(row.0)
    }

    pub async fn update_release_year_and_volume_count<'e, E>(
        &self,
        executor: E,
        id: impl IntoId,
        release_year: Option<u32>,
        volume_count: Option<u32>,
    ) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        sqlx::query("UPDATE Albums SET ReleaseYear = ?, VolumeCount = ? WHERE Id = ?")
            .bind(release_year.map(|v| v as i64))
            .bind(volume_count.map(|v| v as i64))
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    pub async fn add_genre<'e, E>(&self, executor: E, album_id: impl IntoId, genre_id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let album_id = album_id.into_id()?;
        let genre_id = genre_id.into_id()?;
        sqlx::query("INSERT OR IGNORE INTO album_genres (album_id, genre_id) VALUES (?, ?)")
            .bind(album_id)
            .bind(genre_id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    pub async fn remove_genre<'e, E>(&self, executor: E, album_id: impl IntoId, genre_id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let album_id = album_id.into_id()?;
        let genre_id = genre_id.into_id()?;
        sqlx::query("DELETE FROM album_genres WHERE album_id = ? AND genre_id = ?")
            .bind(album_id)
            .bind(genre_id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    pub async fn genre_ids<'e, E>(&self, executor: E, album_id: impl IntoId) -> Result<Vec<i64>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let album_id = album_id.into_id()?;
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT genre_id FROM album_genres WHERE album_id = ?")
            .bind(album_id)
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn by_genre<'e, E>(&self, executor: E, genre_id: impl IntoId) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let genre_id = genre_id.into_id()?;
        let rows = sqlx::query_as::<_, DbAlbum>(
            "SELECT a.* FROM Albums a JOIN album_genres ag ON ag.album_id = a.Id WHERE ag.genre_id = ?",
        )
        .bind(genre_id)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        let id = id.into_id()?;
        sqlx::query("DELETE FROM album_genres WHERE album_id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        let result = sqlx::query("DELETE FROM Albums WHERE Id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }
        Ok(())
    }

    /// Insert-or-reconcile on the `(Title, Artist)` identity (§4.5). On a
    /// match, `ReleaseYear`/`VolumeCount` are bumped monotonically upward,
    /// never overwritten downward (§9 Open Question: both fields get the
    /// same rule, the source's asymmetry is not carried forward).
    pub async fn ensure_exists<'e, E>(&self, executor: E, album_ref: &crate::domain::refs::AlbumRef) -> Result<Album, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        let artist = if album_ref.is_compilation { None } else { album_ref.artist.as_deref() };
        let mut matches = self.by_identity_fetch(executor, &album_ref.title, artist).await?;

        match matches.len() {
            0 => {
                let album = Album::new(
                    0,
                    artist.map(str::to_owned),
                    album_ref.title.clone(),
                    album_ref.volume_count,
                    album_ref.musicbrainz_album_id.clone(),
                    album_ref.musicbrainz_album_artist_id.clone(),
                    album_ref.release_year,
                    album_ref.is_compilation,
                )?;
                let id = self.insert(executor, &album).await?;
                self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id))
            }
            1 => {
                let mut existing = matches.remove(0);
                let year_changed = existing.bump_release_year(album_ref.release_year);
                let volume_changed = existing.bump_volume_count(album_ref.volume_count);
                if year_changed || volume_changed {
                    self.update_release_year_and_volume_count(
                        executor,
                        existing.id(),
                        existing.release_year(),
                        existing.volume_count(),
                    )
                    .await?;
                }
                Ok(existing)
            }
            _ => Err(RepositoryError::DuplicateIdentity(format!(
                "Album ({:?}, {:?})",
                album_ref.title, artist
            ))),
        }
    }

    /// Substring search across `Title`/`Artist`, one ILIKE-style pass per
    /// word, matching §4.5's per-word filtering (no relevance scoring —
    /// that's specific to `searchTracks`).
    pub async fn search<'e, E>(&self, executor: E, words: &[String]) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        if words.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = String::from("SELECT * FROM Albums WHERE ");
        let clauses: Vec<&str> = words.iter().map(|_| "(Title LIKE ? OR Artist LIKE ?)").collect();
        query.push_str(&clauses.join(" AND "));
        query.push_str(" LIMIT 100");

        let mut q = sqlx::query_as::<_, DbAlbum>(&query);
        for word in words {
            let like = format!("%{word}%");
            q = q.bind(like.clone()).bind(like);
        }
        let rows = q.fetch_all(executor).await.map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    /// All albums by a given artist name, feeding `GET /artists/<name>`.
    /// `exact` switches between equality and substring matching; the
    /// special-case artist "various artists" returns compilations instead
    /// (handled by the caller, per spec.md §6).
    pub async fn by_artist<'e, E>(&self, executor: E, artist: &str, exact: bool) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = if exact {
            sqlx::query_as::<_, DbAlbum>("SELECT * FROM Albums WHERE Artist = ? COLLATE NOCASE")
                .bind(artist)
                .fetch_all(executor)
                .await
        } else {
            let like = format!("%{artist}%");
            sqlx::query_as::<_, DbAlbum>("SELECT * FROM Albums WHERE Artist LIKE ? COLLATE NOCASE")
                .bind(like)
                .fetch_all(executor)
                .await
        }
        .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn compilations<'e, E>(&self, executor: E) -> Result<Vec<Album>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbAlbum>("SELECT * FROM Albums WHERE IsCompilation = 1")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Album::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn update_release_date<'e, E>(&self, executor: E, id: impl IntoId, release_year: Option<u32>) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        sqlx::query("UPDATE Albums SET ReleaseYear = ? WHERE Id = ?")
            .bind(release_year.map(|v| v as i64))
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Albums")
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_helpers::prepare_db;

    fn sample_album(title: &str, artist: Option<&str>) -> Album {
        Album::new(0, artist.map(String::from), title, Some(1), None, None, Some(1999), false).unwrap()
    }

    #[tokio::test]
    async fn insert_then_fetch_by_identity() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteAlbumsRepository::new();
        let album = sample_album("Moon Safari", Some("Air"));
        repo.insert(&pool, &album).await.unwrap();

        let found = repo.by_identity_fetch(&pool, "Moon Safari", Some("Air")).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn compilation_album_rejects_artist() {
        let err = Album::new(0, Some("Various".into()), "Now", None, None, None, None, true).unwrap_err();
        assert!(matches!(err, crate::domain::ValidationError::CompilationHasArtist));
    }

    #[tokio::test]
    async fn without_tracks_finds_empty_album() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteAlbumsRepository::new();
        repo.insert(&pool, &sample_album("Empty", None)).await.unwrap();

        let empties = repo.without_tracks(&pool).await.unwrap();
        assert_eq!(empties.len(), 1);
    }
}
