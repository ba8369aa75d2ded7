//! SQLite-backed implementation of [`NoteRepository`].

use sqlx::{Row, SqlitePool};
use trainer::{Note, OpeningId};

use crate::persistence::traits::NoteRepository;
use crate::persistence::{now_timestamp, PersistenceError};

pub struct SqliteNoteRepository {
    pool: SqlitePool,
}

impl SqliteNoteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl NoteRepository for SqliteNoteRepository {
    async fn set_note(&self, opening_id: OpeningId, text: &str) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            INSERT INTO opening_notes (opening_id, text, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (opening_id) DO UPDATE SET
                text = excluded.text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(opening_id)
        .bind(text)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_note(&self, opening_id: OpeningId) -> Result<Option<Note>, PersistenceError> {
        let row = sqlx::query("SELECT text FROM opening_notes WHERE opening_id = ?")
            .bind(opening_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Note {
            opening_id,
            text: r.get("text"),
        }))
    }
}
