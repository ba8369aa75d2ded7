//! SQLite-backed implementation of [`EvalRepository`].

use sqlx::{Row, SqlitePool};
use trainer::{EvalResult, OpeningId};

use super::helpers::{decode_score, encode_score, from_i64, to_i64};
use crate::persistence::traits::EvalRepository;
use crate::persistence::{now_timestamp, PersistenceError};

pub struct SqliteEvalRepository {
    pool: SqlitePool,
}

impl SqliteEvalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl EvalRepository for SqliteEvalRepository {
    async fn replace_evals(
        &self,
        opening_id: OpeningId,
        depth: u8,
        results: &[EvalResult],
    ) -> Result<(), PersistenceError> {
        let mut tx = self.pool.begin().await?;
        let evaluated_at = now_timestamp();

        let stale = sqlx::query("DELETE FROM evaluations WHERE opening_id = ? AND depth <> ?")
            .bind(opening_id)
            .bind(i64::from(depth))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if stale > 0 {
            tracing::debug!(opening_id, stale, "Dropped evaluations from another depth");
        }

        for result in results {
            let (score_type, score_value) = encode_score(&result.score);
            sqlx::query(
                r#"
                INSERT INTO evaluations
                    (opening_id, ply, score_type, score_value, best_move_san, depth, evaluated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT (opening_id, ply) DO UPDATE SET
                    score_type = excluded.score_type,
                    score_value = excluded.score_value,
                    best_move_san = excluded.best_move_san,
                    depth = excluded.depth,
                    evaluated_at = excluded.evaluated_at
                "#,
            )
            .bind(opening_id)
            .bind(to_i64(result.ply))
            .bind(score_type)
            .bind(score_value)
            .bind(&result.best_move)
            .bind(i64::from(depth))
            .bind(evaluated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn load_evals(&self, opening_id: OpeningId) -> Result<Vec<EvalResult>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT ply, score_type, score_value, best_move_san, depth
            FROM evaluations
            WHERE opening_id = ?
            ORDER BY ply ASC
            "#,
        )
        .bind(opening_id)
        .fetch_all(&self.pool)
        .await?;

        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let ply: i64 = row.get("ply");
            let score_type: String = row.get("score_type");
            let score_value: i64 = row.get("score_value");
            let depth: i64 = row.get("depth");
            results.push(EvalResult {
                opening_id,
                ply: from_i64(ply, "ply")?,
                score: decode_score(&score_type, score_value as i32)?,
                best_move: row.get("best_move_san"),
                depth: u8::try_from(depth).map_err(|_| {
                    PersistenceError::InvalidData(format!("depth out of range: {}", depth))
                })?,
            });
        }
        Ok(results)
    }
}
