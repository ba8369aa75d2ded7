use chess::Score;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scheduler::Outcome;

pub type OpeningId = i64;

/// A named repertoire line: SAN tokens from the initial position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub name: String,
    pub moves: Vec<String>,
}

impl Opening {
    pub fn moves_text(&self) -> String {
        self.moves.join(" ")
    }

    pub fn ply_count(&self) -> u32 {
        self.moves.len() as u32
    }
}

/// Stored engine verdict for the position after `ply` (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalResult {
    pub opening_id: OpeningId,
    pub ply: u32,
    /// White's perspective.
    pub score: Score,
    /// SAN; absent when the position has no legal move.
    pub best_move: Option<String>,
    /// Depth the run was requested at, whatever the engine reported.
    pub depth: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCard {
    pub opening_id: OpeningId,
    pub ease_factor: f64,
    pub interval_days: u32,
    /// Consecutive passes.
    pub repetitions: u32,
    /// Total fails.
    pub lapses: u32,
    pub due_date: NaiveDate,
    pub last_reviewed: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub opening_id: OpeningId,
    pub text: String,
}

/// One graded quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub opening_id: OpeningId,
    pub reviewed_on: NaiveDate,
    pub outcome: Outcome,
    pub typed: Vec<String>,
    pub correct_tokens: u32,
    pub target_tokens: u32,
}
