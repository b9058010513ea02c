use std::path::PathBuf;

use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::artwork::Artwork;

use super::{IntoId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum ArtworkConversionError {
    #[error("Artwork row has neither Path nor Blob set")]
    NoSource,
}

#[derive(Debug, FromRow)]
struct DbArtwork {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Path")]
    path: Option<String>,
    #[sqlx(rename = "Blob")]
    blob: Option<Vec<u8>>,
    #[sqlx(rename = "BlobHash")]
    blob_hash: Option<String>,
    #[sqlx(rename = "Width")]
    width: Option<i64>,
    #[sqlx(rename = "Height")]
    height: Option<i64>,
}

impl TryFrom<DbArtwork> for Artwork {
    type Error = ArtworkConversionError;

    fn try_from(row: DbArtwork) -> Result<Self, Self::Error> {
        let width = row.width.map(|v| v as u32);
        let height = row.height.map(|v| v as u32);
        if let Some(path) = row.path {
            Ok(Artwork::from_path(row.id, PathBuf::from(path), width, height))
        } else if let (Some(blob), Some(hash)) = (row.blob, row.blob_hash) {
            Ok(Artwork::from_blob(row.id, blob, hash, width, height))
        } else {
            Err(ArtworkConversionError::NoSource)
        }
    }
}

#[derive(Debug, Default)]
pub struct SqliteArtworkRepository;

impl SqliteArtworkRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<Artwork>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbArtwork>("SELECT * FROM Artwork WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(Artwork::try_from).transpose().map_err(|e| RepositoryError::UnknownError(e.to_string()))
    }

    pub async fn by_blob_hash_fetch<'e, E>(&self, executor: E, hash: &str) -> Result<Option<Artwork>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row = sqlx::query_as::<_, DbArtwork>("SELECT * FROM Artwork WHERE BlobHash = ?")
            .bind(hash)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(Artwork::try_from).transpose().map_err(|e| RepositoryError::UnknownError(e.to_string()))
    }

    pub async fn by_path_fetch<'e, E>(&self, executor: E, path: &std::path::Path) -> Result<Option<Artwork>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let path_str = path.to_str().ok_or_else(|| RepositoryError::InvalidPathEncoding(path.to_path_buf()))?;
        let row = sqlx::query_as::<_, DbArtwork>("SELECT * FROM Artwork WHERE Path = ?")
            .bind(path_str)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(Artwork::try_from).transpose().map_err(|e| RepositoryError::UnknownError(e.to_string()))
    }

    pub async fn update_dimensions<'e, E>(&self, executor: E, id: impl IntoId, width: Option<u32>, height: Option<u32>) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        sqlx::query("UPDATE Artwork SET Width = ?, Height = ? WHERE Id = ?")
            .bind(width.map(|v| v as i64))
            .bind(height.map(|v| v as i64))
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    pub async fn insert_blob<'e, E>(
        &self,
        executor: E,
        blob: &[u8],
        blob_hash: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO Artwork (Blob, BlobHash, Width, Height) VALUES (?, ?, ?, ?) RETURNING Id",
        )
        .bind(blob)
        .bind(blob_hash)
        .bind(width.map(|v| v as i64))
        .bind(height.map(|v| v as i64))
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    pub async fn insert_path<'e, E>(
        &self,
        executor: E,
        path: &std::path::Path,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let path_str = path.to_str().ok_or_else(|| RepositoryError::InvalidPathEncoding(path.to_path_buf()))?;
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO Artwork (Path, Width, Height) VALUES (?, ?, ?) RETURNING Id",
        )
        .bind(path_str)
        .bind(width.map(|v| v as i64))
        .bind(height.map(|v| v as i64))
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    /// Artwork rows referenced by zero tracks — candidates for the tidy
    /// service's garbage collection pass.
    pub async fn without_tracks<'e, E>(&self, executor: E) -> Result<Vec<Artwork>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbArtwork>(
            "SELECT a.* FROM Artwork a LEFT JOIN Tracks t ON t.Artwork = a.Id WHERE t.Id IS NULL",
        )
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(Artwork::try_from).collect::<Result<_, _>>().map_err(|e| RepositoryError::UnknownError(e.to_string()))
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM Artwork")
            .fetch_one(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let result = sqlx::query("DELETE FROM Artwork WHERE Id = ?")
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }
        Ok(())
    }

    /// Insert-or-reconcile an `ArtworkRef` (§4.5). Path-backed refs match by
    /// `Path`. Blob-backed refs probe by SHA-1 first — the hash is an index,
    /// not a trust root, so a hit is confirmed with a full byte comparison
    /// against the stored blob before being treated as a match (§9).
    pub async fn ensure_exists<'e, E>(
        &self,
        executor: E,
        artwork_ref: &crate::domain::refs::ArtworkRef,
    ) -> Result<Artwork, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        use crate::domain::refs::ArtworkRef;

        match artwork_ref {
            ArtworkRef::Path { path, width, height } => {
                if let Some(existing) = self.by_path_fetch(executor, path).await? {
                    if existing.width() != *width || existing.height() != *height {
                        self.update_dimensions(executor, existing.id(), *width, *height).await?;
                        return self
                            .by_id_fetch(executor, existing.id())
                            .await?
                            .ok_or(RepositoryError::IdNotFound(existing.id()));
                    }
                    return Ok(existing);
                }
                let id = self.insert_path(executor, path, *width, *height).await?;
                self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id))
            }
            ArtworkRef::Blob { blob, width, height } => {
                use sha1::{Digest, Sha1};
                let digest = Sha1::digest(blob);
                let hash: String = digest.iter().map(|b| format!("{b:02x}")).collect();

                if let Some(existing) = self.by_blob_hash_fetch(executor, &hash).await? {
                    if existing.blob() == Some(blob.as_slice()) {
                        if existing.width() != *width || existing.height() != *height {
                            self.update_dimensions(executor, existing.id(), *width, *height).await?;
                            return self
                                .by_id_fetch(executor, existing.id())
                                .await?
                                .ok_or(RepositoryError::IdNotFound(existing.id()));
                        }
                        return Ok(existing);
                    }
                }
                let id = self.insert_blob(executor, blob, &hash, *width, *height).await?;
                self.by_id_fetch(executor, id).await?.ok_or(RepositoryError::IdNotFound(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_helpers::prepare_db;

    #[tokio::test]
    async fn insert_blob_then_fetch_by_hash() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteArtworkRepository::new();
        let id = repo.insert_blob(&pool, b"fake-jpeg-bytes", "deadbeef", Some(500), Some(500)).await.unwrap();

        let found = repo.by_blob_hash_fetch(&pool, "deadbeef").await.unwrap().unwrap();
        assert_eq!(found.id(), id);
        assert_eq!(found.blob(), Some(b"fake-jpeg-bytes".as_ref()));
    }

    #[tokio::test]
    async fn without_tracks_finds_orphaned_artwork() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteArtworkRepository::new();
        repo.insert_blob(&pool, b"x", "hash1", None, None).await.unwrap();

        let orphans = repo.without_tracks(&pool).await.unwrap();
        assert_eq!(orphans.len(), 1);
    }
}
