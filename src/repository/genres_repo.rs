use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::genre::Genre;

use super::{IntoId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum GenreConversionError {
    #[error("Failed to build domain Genre from row: {0}")]
    Validation(#[from] crate::domain::ValidationError),
}

#[derive(Debug, FromRow)]
struct DbGenre {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Name")]
    name: String,
}

impl TryFrom<DbGenre> for Genre {
    type Error = GenreConversionError;

    fn try_from(row: DbGenre) -> Result<Self, Self::Error> {
        Ok(Genre::new(row.id, row.name)?)
    }
}

#[derive(Debug, Default)]
pub struct SqliteGenresRepository;

impl SqliteGenresRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<Genre>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbGenre>("SELECT * FROM Genres WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(Genre::try_from).transpose().map_err(RepositoryError::from)
    }

    pub async fn by_name_fetch<'e, E>(&self, executor: E, name: &str) -> Result<Option<Genre>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, DbGenre>("SELECT * FROM Genres WHERE Name = ?")
            .bind(name)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(Genre::try_from).transpose().map_err(RepositoryError::from)
    }

    pub async fn all<'e, E>(&self, executor: E) -> Result<Vec<Genre>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbGenre>("SELECT * FROM Genres")
            .fetch_all(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Genre::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn without_albums_or_playlists<'e, E>(&self, executor: E) -> Result<Vec<Genre>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbGenre>(
            "SELECT g.* FROM Genres g
             LEFT JOIN album_genres ag ON ag.genre_id = g.Id
             LEFT JOIN playlist_genres pg ON pg.genre_id = g.Id
             WHERE ag.genre_id IS NULL AND pg.genre_id IS NULL",
        )
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Genre::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn insert<'e, E>(&self, executor: E, genre: &Genre) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("INSERT INTO Genres (Name) VALUES (?) RETURNING Id")
            .bind(genre.name())
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    /// Insert-or-fetch on the unique `Name` column (§4.5). Matches the
    /// original's `ensure_genre_exists`.
    pub async fn ensure_exists<'e, E>(&self, executor: E, name: &str) -> Result<Genre, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        if let Some(existing) = self.by_name_fetch(executor, name).await? {
            return Ok(existing);
        }
        let genre = Genre::new(0, name)?;
        let id = self.insert(executor, &genre).await?;
        self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id))
    }

    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let result = sqlx::query("DELETE FROM Genres WHERE Id = ?")
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
    async fn insert_then_fetch_by_name() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteGenresRepository::new();
        let genre = Genre::new(0, "Ambient").unwrap();
        repo.insert(&pool, &genre).await.unwrap();

        let found = repo.by_name_fetch(&pool, "Ambient").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn without_albums_or_playlists_finds_orphan() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteGenresRepository::new();
        repo.insert(&pool, &Genre::new(0, "Orphan").unwrap()).await.unwrap();

        let orphans = repo.without_albums_or_playlists(&pool).await.unwrap();
        assert_eq!(orphans.len(), 1);
    }
}
