use sqlx::{Executor, FromRow, Sqlite};

use crate::domain::radio::RadioStation;

use super::{IntoId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum RadioConversionError {
    #[error("Failed to build domain RadioStation from row: {0}")]
    Validation(#[from] crate::domain::ValidationError),
}

#[derive(Debug, FromRow)]
struct DbRadioStation {
    #[sqlx(rename = "Id")]
    id: i64,
    #[sqlx(rename = "Name")]
    name: String,
    #[sqlx(rename = "Url")]
    url: String,
    #[sqlx(rename = "ArtworkUrl")]
    artwork_url: Option<String>,
    #[sqlx(rename = "NowPlayingUrl")]
    now_playing_url: Option<String>,
    #[sqlx(rename = "NowPlayingJq")]
    now_playing_jq: Option<String>,
    #[sqlx(rename = "NowPlayingArtworkUrl")]
    now_playing_artwork_url: Option<String>,
    #[sqlx(rename = "NowPlayingArtworkJq")]
    now_playing_artwork_jq: Option<String>,
    #[sqlx(rename = "SortOrder")]
    sort_order: Option<i64>,
}

impl TryFrom<DbRadioStation> for RadioStation {
    type Error = RadioConversionError;

    fn try_from(row: DbRadioStation) -> Result<Self, Self::Error> {
        let station = RadioStation::new(
            row.id,
            row.name,
            row.url,
            row.artwork_url,
            row.now_playing_url,
            row.now_playing_jq,
            row.now_playing_artwork_url,
            row.now_playing_artwork_jq,
            row.sort_order,
        )?;
        Ok(station)
    }
}

#[derive(Debug, Default)]
pub struct SqliteRadioRepository;

impl SqliteRadioRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn by_id_fetch<'e, E>(&self, executor: E, id: impl IntoId) -> Result<Option<RadioStation>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let row = sqlx::query_as::<_, DbRadioStation>("SELECT * FROM RadioStations WHERE Id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        row.map(RadioStation::try_from).transpose().map_err(RepositoryError::from)
    }

    /// All stations, ordered the same way `all_by_sort_order` does in the
    /// original — by `SortOrder` (nulls last), falling back to `Id`.
    pub async fn all<'e, E>(&self, executor: E) -> Result<Vec<RadioStation>, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, DbRadioStation>(
            "SELECT * FROM RadioStations ORDER BY SortOrder IS NULL, SortOrder, Id",
        )
        .fetch_all(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        rows.into_iter().map(RadioStation::try_from).collect::<Result<_, _>>().map_err(RepositoryError::from)
    }

    pub async fn insert<'e, E>(&self, executor: E, station: &RadioStation) -> Result<i64, RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO RadioStations
                (Name, Url, ArtworkUrl, NowPlayingUrl, NowPlayingJq, NowPlayingArtworkUrl, NowPlayingArtworkJq, SortOrder)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING Id",
        )
        .bind(station.name())
        .bind(station.url())
        .bind(station.artwork_url())
        .bind(station.now_playing_url())
        .bind(station.now_playing_jq())
        .bind(station.now_playing_artwork_url())
        .bind(station.now_playing_artwork_jq())
        .bind(station.sort_order())
        .fetch_one(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        Ok(row.0)
    }

    pub async fn update_artwork_url<'e, E>(&self, executor: E, id: impl IntoId, artwork_url: Option<&str>) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        sqlx::query("UPDATE RadioStations SET ArtworkUrl = ? WHERE Id = ?")
            .bind(artwork_url)
            .bind(id)
            .execute(executor)
            .await
            .map_err(RepositoryError::from_sqlx_error)?;
        Ok(())
    }

    /// Full-record update backing `PUT /radio/<id>` — every field but
    /// `SortOrder`, which is changed only through `update_sort_order`.
    pub async fn update<'e, E>(&self, executor: E, station: &RadioStation) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = station.id().into_id()?;
        let result = sqlx::query(
            "UPDATE RadioStations SET
                Name = ?, Url = ?, ArtworkUrl = ?, NowPlayingUrl = ?, NowPlayingJq = ?,
                NowPlayingArtworkUrl = ?, NowPlayingArtworkJq = ?
             WHERE Id = ?",
        )
        .bind(station.name())
        .bind(station.url())
        .bind(station.artwork_url())
        .bind(station.now_playing_url())
        .bind(station.now_playing_jq())
        .bind(station.now_playing_artwork_url())
        .bind(station.now_playing_artwork_jq())
        .bind(id)
        .execute(executor)
        .await
        .map_err(RepositoryError::from_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::IdNotFound(id));
        }
        Ok(())
    }

    /// Reassigns `SortOrder` for every id in `ordered_ids`, in list order,
    /// backing the station-reorder operation on `POST/PUT /radio/`.
    pub async fn update_sort_order<'e, E>(&self, executor: E, ordered_ids: &[i64]) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite> + Copy,
    {
        for (position, id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query("UPDATE RadioStations SET SortOrder = ? WHERE Id = ?")
                .bind(position as i64)
                .bind(id)
                .execute(executor)
                .await
                .map_err(RepositoryError::from_sqlx_error)?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::IdNotFound(*id));
            }
        }
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: impl IntoId) -> Result<(), RepositoryError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = id.into_id()?;
        let result = sqlx::query("DELETE FROM RadioStations WHERE Id = ?")
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
    async fn insert_then_list_in_sort_order() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteRadioRepository::new();
        let a = RadioStation::new(0, "BBC 6", "http://stream/a", None, None, None, None, None, Some(2)).unwrap();
        let b = RadioStation::new(0, "NTS", "http://stream/b", None, None, None, None, None, Some(1)).unwrap();
        repo.insert(&pool, &a).await.unwrap();
        repo.insert(&pool, &b).await.unwrap();

        let all = repo.all(&pool).await.unwrap();
        assert_eq!(all[0].name(), "NTS");
        assert_eq!(all[1].name(), "BBC 6");
    }

    #[tokio::test]
    async fn update_replaces_every_field_but_sort_order() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteRadioRepository::new();
        let station = RadioStation::new(0, "BBC 6", "http://stream/a", None, None, None, None, None, Some(5)).unwrap();
        let id = repo.insert(&pool, &station).await.unwrap();

        let renamed = RadioStation::new(id, "BBC 6 Music", "http://stream/b", None, None, None, None, None, Some(5)).unwrap();
        repo.update(&pool, &renamed).await.unwrap();

        let fetched = repo.by_id_fetch(&pool, id).await.unwrap().unwrap();
        assert_eq!(fetched.name(), "BBC 6 Music");
        assert_eq!(fetched.url(), "http://stream/b");
        assert_eq!(fetched.sort_order(), Some(5));
    }

    #[tokio::test]
    async fn update_sort_order_reassigns_in_list_order() {
        let pool = prepare_db().await.unwrap();
        let repo = SqliteRadioRepository::new();
        let a = RadioStation::new(0, "BBC 6", "http://stream/a", None, None, None, None, None, None).unwrap();
        let b = RadioStation::new(0, "NTS", "http://stream/b", None, None, None, None, None, None).unwrap();
        let id_a = repo.insert(&pool, &a).await.unwrap();
        let id_b = repo.insert(&pool, &b).await.unwrap();

        repo.update_sort_order(&pool, &[id_b, id_a]).await.unwrap();

        let all = repo.all(&pool).await.unwrap();
        assert_eq!(all[0].name(), "NTS");
        assert_eq!(all[1].name(), "BBC 6");
    }
}
