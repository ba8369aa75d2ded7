//! SQLite-backed implementation of [`OpeningRepository`].

use sqlx::{Row, SqlitePool};
use trainer::{Opening, OpeningId};

use super::helpers::{decode_moves, encode_moves, like_prefix};
use crate::persistence::traits::OpeningRepository;
use crate::persistence::{now_timestamp, PersistenceError};

pub struct SqliteOpeningRepository {
    pool: SqlitePool,
}

impl SqliteOpeningRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_opening(row: &sqlx::sqlite::SqliteRow) -> Opening {
    let moves: String = row.get("moves_san");
    Opening {
        id: row.get("id"),
        name: row.get("name"),
        moves: decode_moves(&moves),
    }
}

impl OpeningRepository for SqliteOpeningRepository {
    async fn insert_opening(
        &self,
        name: &str,
        moves: &[String],
    ) -> Result<Opening, PersistenceError> {
        let result = sqlx::query(
            "INSERT INTO openings (name, moves_san, created_at) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(encode_moves(moves))
        .bind(now_timestamp())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(Opening {
                id: done.last_insert_rowid(),
                name: name.to_string(),
                moves: moves.to_vec(),
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(PersistenceError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_opening(&self, name: &str) -> Result<Option<Opening>, PersistenceError> {
        let row = sqlx::query("SELECT id, name, moves_san FROM openings WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_opening))
    }

    async fn list_openings(
        &self,
        prefix: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<Opening>, PersistenceError> {
        let pattern = like_prefix(prefix.unwrap_or(""));
        // SQLite treats a negative LIMIT as no limit.
        let limit = limit.map_or(-1, i64::from);
        let rows = sqlx::query(
            r#"
            SELECT id, name, moves_san
            FROM openings
            WHERE name LIKE ? ESCAPE '\'
            ORDER BY name ASC
            LIMIT ?
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_opening).collect())
    }

    async fn replace_moves(
        &self,
        id: OpeningId,
        moves: &[String],
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE openings SET moves_san = ? WHERE id = ?")
            .bind(encode_moves(moves))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM evaluations WHERE opening_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_opening(&self, name: &str) -> Result<bool, PersistenceError> {
        let done = sqlx::query("DELETE FROM openings WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(done.rows_affected() > 0)
    }
}
