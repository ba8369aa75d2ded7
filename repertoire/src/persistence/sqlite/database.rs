//! Pool setup and schema migrations for the repertoire database.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::persistence::PersistenceError;

/// Shared handle to the migrated database. Clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open `path`, creating the file and its directory when missing, and
    /// bring the schema up to date.
    #[tracing::instrument(level = "debug", skip(path), fields(path = %path.display()))]
    pub async fn open(path: &Path) -> Result<Self, PersistenceError> {
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)?,
            _ => {}
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));
        Self::connect(options).await
    }

    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self, PersistenceError> {
        Self::connect("sqlite::memory:".parse()?).await
    }

    // One connection keeps an in-memory database alive for the pool's lifetime.
    async fn connect(options: SqliteConnectOptions) -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options.foreign_keys(true))
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| PersistenceError::Migration(e.to_string()))?;
        tracing::debug!("Schema up to date");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    const TABLES: [&str; 5] = [
        "evaluations",
        "opening_notes",
        "openings",
        "review_cards",
        "review_log",
    ];

    async fn table_names(pool: &SqlitePool) -> Vec<String> {
        sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(pool)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_schema_and_foreign_keys() {
        let db = Database::new_in_memory().await.unwrap();
        let names = table_names(db.pool()).await;
        for table in TABLES {
            assert!(names.iter().any(|n| n == table), "no {table} table");
        }

        let fk: i64 = sqlx::query("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get(0);
        assert_eq!(fk, 1);
    }

    #[tokio::test]
    async fn test_open_creates_directory_and_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("repertoire.sqlite3");

        let first = Database::open(&path).await.unwrap();
        assert!(path.is_file());
        first.close().await;

        let second = Database::open(&path).await.unwrap();
        assert!(table_names(second.pool()).await.len() >= TABLES.len());
        second.close().await;
    }
}
