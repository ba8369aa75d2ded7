//! Engine evaluation scores.

use serde::{Deserialize, Serialize};

use crate::types::PieceColor;

/// Centipawn value a mate score saturates to for swing arithmetic.
pub const MATE_SCORE_CP: i32 = 10_000;

/// Engine evaluation.
///
/// The UCI parser yields scores relative to the side to move. After
/// [`Score::to_white_perspective`] a positive value always favours White,
/// and `Mate(n)` means White mates in `n` (Black when negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
    /// The position itself is already mate.
    Checkmate { winner: PieceColor },
}

impl Score {
    /// Pawn units with sign ("+0.35"), or "+M3"/"-#" style mate text.
    pub fn display(&self) -> String {
        let sign = if self.to_cp() < 0 { '-' } else { '+' };
        match *self {
            Self::Centipawns(cp) => format!("{:+.2}", f64::from(cp) / 100.0),
            Self::Mate(n) => format!("{sign}M{}", n.unsigned_abs()),
            Self::Checkmate { .. } => format!("{sign}#"),
        }
    }

    /// Centipawn value used for swing arithmetic. Mates of either length
    /// saturate to [`MATE_SCORE_CP`] with the mating side's sign.
    pub fn to_cp(&self) -> i32 {
        match *self {
            Self::Centipawns(cp) => cp,
            Self::Mate(n) if n > 0 => MATE_SCORE_CP,
            Self::Mate(_) => -MATE_SCORE_CP,
            Self::Checkmate {
                winner: PieceColor::White,
            } => MATE_SCORE_CP,
            Self::Checkmate {
                winner: PieceColor::Black,
            } => -MATE_SCORE_CP,
        }
    }

    /// Same evaluation seen by the other side.
    pub fn negate(&self) -> Self {
        match *self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(n) => Self::Mate(-n),
            Self::Checkmate { winner } => Self::Checkmate {
                winner: winner.opposite(),
            },
        }
    }

    /// Convert an engine score for `side_to_move` to White's point of view.
    /// `mate 0` is reported when the side to move is already mated.
    pub fn to_white_perspective(&self, side_to_move: PieceColor) -> Self {
        match (*self, side_to_move) {
            (Self::Mate(0), side) => Self::Checkmate {
                winner: side.opposite(),
            },
            (score, PieceColor::White) => score,
            (score, PieceColor::Black) => score.negate(),
        }
    }
}

/// Plies are 1-indexed; odd ones are White's.
pub fn is_white_ply(ply: u32) -> bool {
    ply % 2 == 1
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}
