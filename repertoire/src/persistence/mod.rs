//! Storage for openings, evaluations and review state.

pub mod sqlite;
pub mod traits;

use std::time::{SystemTime, UNIX_EPOCH};

pub use sqlite::{
    Database, SqliteCardRepository, SqliteEvalRepository, SqliteNoteRepository,
    SqliteOpeningRepository, SqliteReviewLogRepository,
};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("An opening named '{0}' already exists")]
    DuplicateName(String),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// All repositories over one pool.
pub struct Store {
    pub openings: SqliteOpeningRepository,
    pub evals: SqliteEvalRepository,
    pub cards: SqliteCardRepository,
    pub notes: SqliteNoteRepository,
    pub reviews: SqliteReviewLogRepository,
}

impl Store {
    pub fn new(db: &Database) -> Self {
        let pool = db.pool().clone();
        Self {
            openings: SqliteOpeningRepository::new(pool.clone()),
            evals: SqliteEvalRepository::new(pool.clone()),
            cards: SqliteCardRepository::new(pool.clone()),
            notes: SqliteNoteRepository::new(pool.clone()),
            reviews: SqliteReviewLogRepository::new(pool),
        }
    }
}

/// Get the current unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
