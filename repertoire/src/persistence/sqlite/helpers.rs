//! Shared encode/decode helpers for SQLite ↔ domain type conversions.

use chess::{PieceColor, Score};
use trainer::Outcome;

use crate::persistence::PersistenceError;

/// Encode a `Score` into `(score_type, score_value)`. Checkmate stores the
/// winner as +1 (White) or -1 (Black).
pub fn encode_score(score: &Score) -> (&'static str, i32) {
    match score {
        Score::Centipawns(v) => ("cp", *v),
        Score::Mate(v) => ("mate", *v),
        Score::Checkmate { winner } => match winner {
            PieceColor::White => ("checkmate", 1),
            PieceColor::Black => ("checkmate", -1),
        },
    }
}

pub fn decode_score(type_str: &str, value: i32) -> Result<Score, PersistenceError> {
    match type_str {
        "cp" => Ok(Score::Centipawns(value)),
        "mate" => Ok(Score::Mate(value)),
        "checkmate" => Ok(Score::Checkmate {
            winner: if value >= 0 {
                PieceColor::White
            } else {
                PieceColor::Black
            },
        }),
        other => Err(PersistenceError::InvalidData(format!(
            "unknown score type '{}'",
            other
        ))),
    }
}

pub fn encode_outcome(outcome: Outcome) -> String {
    outcome.to_string()
}

pub fn decode_outcome(s: &str) -> Result<Outcome, PersistenceError> {
    s.parse().map_err(PersistenceError::InvalidData)
}

pub fn encode_moves(moves: &[String]) -> String {
    moves.join(" ")
}

pub fn decode_moves(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
}

/// `LIKE` pattern matching names that start with `prefix`, with `%`, `_`
/// and the escape character itself escaped. Use with `ESCAPE '\'`.
pub fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Convert an unsigned domain count to a column value.
pub fn to_i64(v: u32) -> i64 {
    i64::from(v)
}

/// Convert a column value back, rejecting negatives and overflow.
pub fn from_i64(v: i64, column: &str) -> Result<u32, PersistenceError> {
    u32::try_from(v)
        .map_err(|_| PersistenceError::InvalidData(format!("{} out of range: {}", column, v)))
}
