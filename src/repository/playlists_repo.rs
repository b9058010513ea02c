use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::playlist::{Playlist, PlaylistEntry};

use super::{IntoId, RepositoryError};

#[derive(Debug, FromRow)]
struct DbPlaylist {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Title")]
    title: String,
}

#[derive(Debug, FromRow)]
struct DbPlaylistEntry {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "PlaylistId")]
    playlist_id: i64,
    #[sqlx(rename = "TrackId")]
    track_id: i64,
    #[sqlx(rename = "PlaylistIndex")]
    playlist_index: i64,
}

impl From<DbPlaylist> for Playlist {
    fn from(row: DbPlaylist) -> Self {
        // Title was already normalized on insert; row data is trusted here.
        Playlist::new(row.id, row.title).expect("stored playlist title is never empty")
    }
}

impl From<DbPlaylistEntry> for PlaylistEntry {
    fn from(row: DbPlaylistEntry) -> Self {
        PlaylistEntry::new(row.id, row.playlist_id, row.track_id, row.playlist_index as u32)
    }
}

#[derive(Debug, Default)]
pub struct SqlitePlaylistsRepository;

impl SqlitePlaylistsRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<Playlist>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbPlaylist>("SELECT * FROM Playlists WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.map(Playlist::from))
    }

    pub async fn all<'e, E>(&self, executor: E) -> Result<Vec<Playlist>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbPlaylist>("SELECT * FROM Playlists")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    pub async fn entries<'e, E>(&self, executor: E, playlist_id: impl IntoId) -> Result<Vec<PlaylistEntry>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let playlist_id = playlist_id.into_id()?;
        let rows = sqlx::query_as::<_, DbPlaylistEntry>(
            "SELECT * FROM playlist_to_track WHERE PlaylistId = ? ORDER BY PlaylistIndex",
        )
        .bind(playlist_id)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(rows.into_iter().map(PlaylistEntry::from).collect())
    }

    pub async fn insert<'e, E>(&self, executor: E, playlist: &Playlist) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("INSERT INTO Playlists (Title) VALUES (?) RETURNING Id")
            .bind(playlist.title())
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    pub async fn append_entry<'e, E>(
        &self,
        executor: E,
        playlist_id: impl IntoId,
        track_id: impl IntoId,
        index: u32,
    ) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let playlist_id = playlist_id.into_id()?;
        let track_id = track_id.into_id()?;
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO playlist_to_track (PlaylistId, TrackId, PlaylistIndex) VALUES (?, ?, ?) RETURNING Id",
        )
        .bind(playlist_id)
        .bind(track_id)
        .bind(index as i64)
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    pub async fn update_title<'e, E>(&self, executor: E, id: impl IntoId, title: &str) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let result = sqlx::query("UPDATE Playlists SET Title = ? WHERE Id = ?")
            .bind(title)
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }
        Ok(())
    }

    pub async fn genre_ids<'e, E>(&self, executor: E, playlist_id: impl IntoId) -> Result<Vec<i64>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let playlist_id = playlist_id.into_id()?;
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT genre_id FROM playlist_genres WHERE playlist_id = ?")
            .bind(playlist_id)
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    pub async fn by_genre<'e, E>(&self, executor: E, genre_id: impl IntoId) -> Result<Vec<Playlist>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let genre_id = genre_id.into_id()?;
        let rows = sqlx::query_as::<_, DbPlaylist>(
            "SELECT p.* FROM Playlists p JOIN playlist_genres pg ON pg.playlist_id = p.Id WHERE pg.genre_id = ?",
        )
        .bind(genre_id)
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let result = sqlx::query("DELETE FROM Playlists WHERE Id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_helpers::prepare_db;

    #[tokio::test]
    async fn insert_then_append_entries_in_order() {
        let pool = prepare_db().await.unwrap();
        let repo = SqlitePlaylistsRepository::new();
        let playlist = Playlist::new(0, "Road Trip").unwrap();
        let playlist_id = repo.insert(&pool, &playlist).await.unwrap();

        // Entries reference track ids that need not exist for this check —
        // FK enforcement is exercised at the ingestion-service level.
        sqlx::query("PRAGMA foreign_keys = OFF").execute(&pool).await.unwrap();
        repo.append_entry(&pool, playlist_id, 1i64, 0).await.unwrap();
        repo.append_entry(&pool, playlist_id, 2i64, 1).await.unwrap();

        let entries = repo.entries(&pool, playlist_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].track_id(), 1);
        assert_eq!(entries[1].track_id(), 2);
    }

    #[tokio::test]
    async fn update_title_renames_playlist() {
        let pool = prepare_db().await.unwrap();
        let repo = SqlitePlaylistsRepository::new();
        let playlist = Playlist::new(0, "Old Name").unwrap();
        let playlist_id = repo.insert(&pool, &playlist).await.unwrap();

        repo.update_title(&pool, playlist_id, "New Name").await.unwrap();

        let fetched = repo.by_id_fetch(&pool, playlist_id).await.unwrap().unwrap();
        assert_eq!(fetched.title(), "New Name");
    }

    #[tokio::test]
    async fn update_title_on_missing_id_errors() {
        let pool = prepare_db().await.unwrap();
        let repo = SqlitePlaylistsRepository::new();
        let result = repo.update_title(&pool, 999i64, "Nope").await;
        assert!(matches!(result, Err(RepositoryError::IdNotFound(999))));
    }
}
