//! Database module - SQLx with SQLite

use crate::error::Result;
use sqlx::{
    pool::PoolConnection,
    sqlite::{Sqlite, SqlitePoolOptions},
    SqlitePool,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Database state
///
/// Cloning is cheap; all clones share the pool and the schema flag.
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
    schema: Arc<OnceCell<()>>,
}

impl Database {
    /// Connect and make sure the schema exists
    pub async fn open(db_path: PathBuf) -> Result<Self> {
        let db = Self::connect(db_path).await?;
        db.ensure_schema().await?;
        Ok(db)
    }

    /// Connect without touching the schema
    ///
    /// The schema is created on the first `acquire`.
    pub async fn connect(db_path: PathBuf) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        log::info!("Connecting to database: {}", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        Ok(Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        })
    }

    /// Create the schema once per process lifetime
    pub async fn ensure_schema(&self) -> Result<()> {
        self.schema
            .get_or_try_init(|| async { self.run_migrations().await })
            .await?;
        Ok(())
    }

    /// Check out a connection for the duration of one request
    ///
    /// The connection goes back to the pool when dropped.
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.ensure_schema().await?;
        Ok(self.pool.acquire().await?)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        log::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reports (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                severity TEXT,
                solution TEXT,
                created TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reports_created ON reports(created)")
            .execute(&self.pool)
            .await?;

        log::info!("Database migrations completed");
        Ok(())
    }
}
