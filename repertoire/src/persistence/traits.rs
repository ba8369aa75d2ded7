//! Async repository trait definitions for the persistence layer.
//!
//! Methods return `impl Future + Send` so implementations can be written
//! with `async fn` while callers keep a `Send` guarantee.

use std::future::Future;

use trainer::{EvalResult, Note, Opening, OpeningId, ReviewCard, ReviewLogEntry};

use super::PersistenceError;

/// Repository for named opening lines.
///
/// Lines are validated before they reach storage.
pub trait OpeningRepository: Send + Sync {
    fn insert_opening(
        &self,
        name: &str,
        moves: &[String],
    ) -> impl Future<Output = Result<Opening, PersistenceError>> + Send;
    fn get_opening(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Opening>, PersistenceError>> + Send;
    /// Openings ordered by name, optionally filtered by a name prefix.
    fn list_openings(
        &self,
        prefix: Option<&str>,
        limit: Option<u32>,
    ) -> impl Future<Output = Result<Vec<Opening>, PersistenceError>> + Send;
    /// Replace a line's moves. Its stored evaluations are discarded in the
    /// same transaction.
    fn replace_moves(
        &self,
        id: OpeningId,
        moves: &[String],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    /// Returns false when no opening had that name.
    fn delete_opening(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<bool, PersistenceError>> + Send;
}

/// Repository for per-ply engine evaluations.
pub trait EvalRepository: Send + Sync {
    /// Store a run at `depth` for one opening. Rows from any other depth are
    /// dropped first, so a ply the run skipped reads as missing; rows at the
    /// same depth are overwritten ply by ply.
    fn replace_evals(
        &self,
        opening_id: OpeningId,
        depth: u8,
        results: &[EvalResult],
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn load_evals(
        &self,
        opening_id: OpeningId,
    ) -> impl Future<Output = Result<Vec<EvalResult>, PersistenceError>> + Send;
}

/// Repository for review cards.
pub trait CardRepository: Send + Sync {
    fn load_card(
        &self,
        opening_id: OpeningId,
    ) -> impl Future<Output = Result<Option<ReviewCard>, PersistenceError>> + Send;
    fn save_card(
        &self,
        card: &ReviewCard,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
}

/// Repository for per-opening mnemonics.
pub trait NoteRepository: Send + Sync {
    fn set_note(
        &self,
        opening_id: OpeningId,
        text: &str,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn get_note(
        &self,
        opening_id: OpeningId,
    ) -> impl Future<Output = Result<Option<Note>, PersistenceError>> + Send;
}

/// Append-only history of graded quizzes.
pub trait ReviewLogRepository: Send + Sync {
    fn append(
        &self,
        entry: &ReviewLogEntry,
    ) -> impl Future<Output = Result<(), PersistenceError>> + Send;
    fn list_for_opening(
        &self,
        opening_id: OpeningId,
    ) -> impl Future<Output = Result<Vec<ReviewLogEntry>, PersistenceError>> + Send;
}
