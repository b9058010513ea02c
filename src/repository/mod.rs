pub mod tracks_repo;
pub mod albums_repo;
pub mod genres_repo;
pub mod artwork_repo;
pub mod playlists_repo;
pub mod radio_repo;

pub use tracks_repo::SqliteTracksRepository;
pub use albums_repo::SqliteAlbumsRepository;
pub use genres_repo::SqliteGenresRepository;
pub use artwork_repo::SqliteArtworkRepository;
pub use playlists_repo::SqlitePlaylistsRepository;
pub use radio_repo::SqliteRadioRepository;

use tracks_repo::TrackConversionError;
use albums_repo::AlbumConversionError;
use genres_repo::GenreConversionError;
use artwork_repo::ArtworkConversionError;

use crate::domain::ValidationError;

use std::path::PathBuf;

/* Database related errors */
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Path contains non-UTF8 characters: {0:?}")]
    InvalidPathEncoding(PathBuf),

    #[error("Item with id <{0}> was not found.")]
    IdNotFound(i64),

    #[error("Unknown error occurred; here is something to help debugging: {0}")]
    UnknownError(String),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("Data mapping error for Track: {0}")]
    TrackDataMapping(#[from] TrackConversionError),

    #[error("Data mapping error for Album: {0}")]
    AlbumDataMapping(#[from] AlbumConversionError),

    #[error("Data mapping error for Genre: {0}")]
    GenreDataMapping(#[from] GenreConversionError),

    #[error("Data mapping error for Artwork: {0}")]
    ArtworkDataMapping(#[from] ArtworkConversionError),

    #[error("Entity validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("No rows were returned by a query that expected at least one row.")]
    RowNotFound,

    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("More than one row matched an identity that is supposed to be unique: {0}")]
    DuplicateIdentity(String),

    #[error("Something went wrong: {0}")]
    GenericDatabaseError(#[from] sqlx::Error),

    #[error("A constraint was violated: {description}")]
    ConstraintViolation { description: String },

    #[error("Failed to decode database row: {0}")]
    RowDecodingError(String),

    #[error("Failed to get column data")]
    ColumnGetError,
}

impl RepositoryError {
    pub fn from_sqlx_error(sqlx_error: sqlx::Error) -> Self {
        match &sqlx_error {
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                Self::ConnectionError(sqlx_error.to_string())
            }
            sqlx::Error::Decode(decode_err) => Self::RowDecodingError(decode_err.to_string()),
            sqlx::Error::Database(db_error) => {
                if let Some(error_code) = db_error.code() {
                    let code_str = error_code.as_ref();
                    // SQLite constraint error codes:
                    // 19 general, 2067 unique, 1555 primary key, 787 foreign key
                    if ["19", "2067", "1555", "787"].contains(&code_str) {
                        return Self::ConstraintViolation {
                            description: db_error.message().to_string(),
                        };
                    }
                }
                Self::GenericDatabaseError(sqlx_error)
            }
            _ => Self::GenericDatabaseError(sqlx_error),
        }
    }
}

/// Helper trait for id parameters of repository functions, letting
/// handlers pass either an `i64` or its string/URL-path representation.
pub trait IntoId {
    fn into_id(&self) -> Result<i64, RepositoryError>;
}

impl IntoId for i64 {
    fn into_id(&self) -> Result<i64, RepositoryError> {
        Ok(*self)
    }
}

impl IntoId for &i64 {
    fn into_id(&self) -> Result<i64, RepositoryError> {
        Ok(**self)
    }
}

impl IntoId for &str {
    fn into_id(&self) -> Result<i64, RepositoryError> {
        self.parse::<i64>()
            .map_err(|_| RepositoryError::UnknownError(format!("'{self}' is not a valid id")))
    }
}

impl IntoId for String {
    fn into_id(&self) -> Result<i64, RepositoryError> {
        self.as_str().into_id()
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use sqlx::{Error as SqlxError, SqlitePool};

    use super::RepositoryError;
    use crate::domain::ValidationError;

    #[derive(Debug, thiserror::Error)]
    pub enum TestSetupError {
        #[error("Database operation failed: {0}")]
        DbError(#[from] sqlx::Error),

        #[error("Repository operation failed: {0}")]
        RepositoryError(#[from] RepositoryError),

        #[error("Entity fields validation failed: {0}")]
        FieldsValidationError(#[from] ValidationError),
    }

    pub async fn prepare_db() -> Result<SqlitePool, SqlxError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }
}
