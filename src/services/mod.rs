pub mod scanner;
pub mod ingest;
pub mod tidy;
pub mod download;
pub mod worker;

use lofty::error::LoftyError;

use crate::domain::ValidationError;
use crate::repository::RepositoryError;

/// Unified services-layer error, sitting between `RepositoryError` and
/// `WebError` in the layering described in §7 — every fallible operation
/// in `scanner`/`ingest`/`tidy`/`download`/`worker` returns this.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Error while loading a config: {0}")]
    ConfigLoadingError(String),

    #[error(transparent)]
    RepositoryError(#[from] RepositoryError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    IOError(#[from] std::io::Error),

    #[error("Lofty lib has failed to read the file: {0}")]
    FailedToReadAudioFile(#[from] LoftyError),

    #[error("Failed to extract any metadata from a file: {0}")]
    FailedToExtractMetadata(String),

    #[error("Failed to extract extension from a file {0}")]
    FailedToExtractExtension(String),

    #[error(transparent)]
    ScanError(#[from] ScanError),

    #[error("Validation error has occured: {0}")]
    DomainStructValidationError(#[from] ValidationError),

    #[error("Download fetch failed: {0}")]
    FetchFailed(String),

    #[error("Subprocess '{0}' exited with a non-zero status")]
    SubprocessFailed(String),

    #[error("Worker has shut down and cannot accept more requests")]
    WorkerUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Walkdir error")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Permission denied at {path}: {source}")]
    RootDirAccessError{path: String, source: std::io::Error},

    #[error(transparent)]
    IOError(#[from] std::io::Error)
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::{path::Path, sync::OnceLock};

    use log::SetLoggerError;
    use sqlx::{Error as SqlxError, SqlitePool};
    use tempfile::{NamedTempFile, Builder};

    use crate::domain::ValidationError;
    use crate::repository::RepositoryError;

    use super::ServiceError;

    #[derive(Debug, thiserror::Error)]
    pub enum TestSetupError {
        #[error("Failed to init env logger for tests: {0}")]
        LoggerError(String),

        #[error("I/O error: {0}")]
        IOError(#[from] std::io::Error),

        #[error("Wrong argument for create_temp_files: don't include the dot in the extension")]
        DotError(),

        #[error("Database operation failed: {0}")]
        DbError(#[from] SqlxError),

        #[error("Entity validation failed: {0}")]
        ValidationError(#[from] ValidationError),

        #[error("Repository operation failed: {0}")]
        RepositoryError(#[from] RepositoryError),

        #[error("Service operation failed: {0}")]
        ServiceError(#[from] ServiceError),
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

    pub fn init_logger() -> Result<(), TestSetupError> {
        static LOGGER_RESULT: OnceLock<Result<(), SetLoggerError>> = OnceLock::new();

        let init_result_ref = LOGGER_RESULT.get_or_init(|| {
            env_logger::builder()
                .is_test(true)
                .filter_level(log::LevelFilter::Warn)
                .try_init()
        });

        match init_result_ref {
            Ok(_) => Ok(()),
            Err(e) => Err(TestSetupError::LoggerError(e.to_string())),
        }
    }

    pub fn create_temp_files(path: &Path, amount: usize, ftype: &str) -> Result<Vec<NamedTempFile>, TestSetupError> {
        if ftype.contains('.') {
            return Err(TestSetupError::DotError());
        }

        (0..amount)
            .map(|i| {
                Builder::new()
                    .prefix(&format!("{}_file_{}", ftype, i))
                    .suffix(&format!(".{}", ftype))
                    .tempfile_in(path)
                    .map_err(TestSetupError::IOError)
            })
            .collect::<Result<Vec<NamedTempFile>, TestSetupError>>()
    }
}