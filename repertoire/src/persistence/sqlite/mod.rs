//! SQLite-backed repository implementations.
//!
//! [`Database`] wraps a `sqlx::SqlitePool` in WAL mode with foreign keys
//! enforced, and runs the embedded migrations from `migrations/` when
//! opened. Deleting an opening cascades to its evaluations, card, note and
//! review log.
//!
//! Scores are stored as a type tag plus an integer, quiz outcomes and move
//! lists as text; [`helpers`] converts both ways.

mod card_repo;
mod database;
mod eval_repo;
mod note_repo;
mod opening_repo;
mod review_log_repo;
pub(crate) mod helpers;

pub use card_repo::SqliteCardRepository;
pub use database::Database;
pub use eval_repo::SqliteEvalRepository;
pub use note_repo::SqliteNoteRepository;
pub use opening_repo::SqliteOpeningRepository;
pub use review_log_repo::SqliteReviewLogRepository;
