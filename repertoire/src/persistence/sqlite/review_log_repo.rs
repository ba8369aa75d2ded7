//! SQLite-backed implementation of [`ReviewLogRepository`].

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use trainer::{OpeningId, ReviewLogEntry};

use super::helpers::{decode_moves, decode_outcome, encode_moves, encode_outcome, from_i64, to_i64};
use crate::persistence::traits::ReviewLogRepository;
use crate::persistence::PersistenceError;

pub struct SqliteReviewLogRepository {
    pool: SqlitePool,
}

impl SqliteReviewLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ReviewLogRepository for SqliteReviewLogRepository {
    async fn append(&self, entry: &ReviewLogEntry) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO review_log
                (opening_id, reviewed_on, outcome, typed_moves, correct_tokens, target_tokens)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.opening_id)
        .bind(entry.reviewed_on)
        .bind(encode_outcome(entry.outcome))
        .bind(encode_moves(&entry.typed))
        .bind(to_i64(entry.correct_tokens))
        .bind(to_i64(entry.target_tokens))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_opening(
        &self,
        opening_id: OpeningId,
    ) -> Result<Vec<ReviewLogEntry>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT reviewed_on, outcome, typed_moves, correct_tokens, target_tokens
            FROM review_log
            WHERE opening_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(opening_id)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let reviewed_on: NaiveDate = row.try_get("reviewed_on")?;
            let outcome: String = row.get("outcome");
            let typed: String = row.get("typed_moves");
            let correct: i64 = row.get("correct_tokens");
            let target: i64 = row.get("target_tokens");
            entries.push(ReviewLogEntry {
                opening_id,
                reviewed_on,
                outcome: decode_outcome(&outcome)?,
                typed: decode_moves(&typed),
                correct_tokens: from_i64(correct, "correct_tokens")?,
                target_tokens: from_i64(target, "target_tokens")?,
            });
        }
        Ok(entries)
    }
}
