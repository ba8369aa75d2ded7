//! Repertoire training logic: opening trees, study sheets, critical-move
//! detection, review scheduling and batch evaluation.
//!
//! Nothing here touches storage; callers load and save the model types.

pub mod critical;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod scheduler;
pub mod study;
pub mod tree;

pub use critical::{detect_critical, line_report, LineReport, LineVerdict, PlyScore, Swing};
pub use error::TrainerError;
pub use evaluate::{
    evaluate_batch, evaluate_line, needs_evaluation, BatchReport, FailedLine, LineEvaluation,
};
pub use model::{EvalResult, Note, Opening, OpeningId, ReviewCard, ReviewLogEntry};
pub use scheduler::{
    apply_outcome, due_entries, is_due, pick_for_quiz, seed_or_load, Outcome, QueueEntry, Seeded,
};
pub use study::{build_study_sheet, check_typed_moves, chunk_moves, QuizCheck, StudySheet};
pub use tree::{NodeId, OpeningTree, TreeNode, TreeRow};
