use std::path::Path;

use anyhow::{anyhow, Error};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the catalog database at `db_path`. The path must already exist
    /// (the CLI's `-d` flag is validated at startup, per the spec's
    /// "existence is required at startup" contract) — this crate never
    /// creates the database file itself, only its schema.
    pub async fn open(db_path: &Path) -> Result<Self, Error> {
        if !db_path.is_file() {
            return Err(anyhow!("Database path does not exist: {}", db_path.display()));
        }

        let path_str = db_path
            .to_str()
            .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {:?}", db_path))?;
        let db_url = format!("sqlite:{path_str}");

        let pool = SqlitePoolOptions::new().max_connections(5).connect(&db_url).await?;

        let db = Database { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn run_migrations(&self) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
