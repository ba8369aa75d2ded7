//! SQLite-backed implementation of [`CardRepository`].

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use trainer::{OpeningId, ReviewCard};

use super::helpers::{from_i64, to_i64};
use crate::persistence::traits::CardRepository;
use crate::persistence::PersistenceError;

pub struct SqliteCardRepository {
    pool: SqlitePool,
}

impl SqliteCardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CardRepository for SqliteCardRepository {
    async fn load_card(&self, opening_id: OpeningId) -> Result<Option<ReviewCard>, PersistenceError> {
        let row = sqlx::query(
            r#"
            SELECT ease_factor, interval_days, repetitions, lapses, due_date, last_reviewed
            FROM review_cards
            WHERE opening_id = ?
            "#,
        )
        .bind(opening_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let interval_days: i64 = row.get("interval_days");
        let repetitions: i64 = row.get("repetitions");
        let lapses: i64 = row.get("lapses");
        let due_date: NaiveDate = row.try_get("due_date")?;
        let last_reviewed: Option<NaiveDate> = row.try_get("last_reviewed")?;

        Ok(Some(ReviewCard {
            opening_id,
            ease_factor: row.get("ease_factor"),
            interval_days: from_i64(interval_days, "interval_days")?,
            repetitions: from_i64(repetitions, "repetitions")?,
            lapses: from_i64(lapses, "lapses")?,
            due_date,
            last_reviewed,
        }))
    }

    async fn save_card(&self, card: &ReviewCard) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO review_cards
                (opening_id, ease_factor, interval_days, repetitions, lapses, due_date, last_reviewed)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (opening_id) DO UPDATE SET
                ease_factor = excluded.ease_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                lapses = excluded.lapses,
                due_date = excluded.due_date,
                last_reviewed = excluded.last_reviewed
            "#,
        )
        .bind(card.opening_id)
        .bind(card.ease_factor)
        .bind(to_i64(card.interval_days))
        .bind(to_i64(card.repetitions))
        .bind(to_i64(card.lapses))
        .bind(card.due_date)
        .bind(card.last_reviewed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
