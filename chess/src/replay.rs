//! Replaying stored SAN lines from the standard starting position.

use cozy_chess::{Board, GameStatus};

use crate::pgn::{parse_san, SanError};
use crate::types::PieceColor;
use crate::uci::format_uci_move_in;

/// Board state after one ply of a replayed line.
#[derive(Debug, Clone)]
pub struct PositionSnapshot {
    /// Number of plies played to reach this position; 0 is the start.
    pub ply: u32,
    pub board: Board,
    /// SAN token that produced this position, as it was given.
    pub san: Option<String>,
    /// UCI moves from the start position up to and including this ply.
    pub uci_moves: Vec<String>,
}

impl PositionSnapshot {
    /// The standard initial position.
    pub fn start() -> Self {
        Self {
            ply: 0,
            board: Board::default(),
            san: None,
            uci_moves: Vec::new(),
        }
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.board.side_to_move().into()
    }

    pub fn fen(&self) -> String {
        crate::fen::format_fen(&self.board)
    }

    pub fn status(&self) -> GameStatus {
        self.board.status()
    }

    /// True when the side to move has no legal move (mate or stalemate).
    pub fn is_terminal(&self) -> bool {
        crate::pgn::legal_moves(&self.board).is_empty()
    }
}

/// Replay `tokens` from the standard start, returning one snapshot per ply.
///
/// Fails on the first token that is unparsable or illegal. Nothing is
/// returned for the plies that did replay.
pub fn replay_san<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<PositionSnapshot>, ReplayError> {
    let mut board = Board::default();
    let mut uci_moves: Vec<String> = Vec::with_capacity(tokens.len());
    let mut snapshots = Vec::with_capacity(tokens.len());

    for (idx, token) in tokens.iter().enumerate() {
        let token = token.as_ref();
        let ply = idx as u32 + 1;
        let mv = parse_san(&board, token).map_err(|reason| ReplayError::InvalidMove {
            ply,
            token: token.to_string(),
            reason,
        })?;

        uci_moves.push(format_uci_move_in(&board, mv));
        board.play_unchecked(mv);

        snapshots.push(PositionSnapshot {
            ply,
            board: board.clone(),
            san: Some(token.to_string()),
            uci_moves: uci_moves.clone(),
        });
    }

    Ok(snapshots)
}

/// Replay and return only the final position (the start position for an
/// empty line).
pub fn final_position<S: AsRef<str>>(tokens: &[S]) -> Result<PositionSnapshot, ReplayError> {
    Ok(replay_san(tokens)?
        .pop()
        .unwrap_or_else(PositionSnapshot::start))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("invalid move '{token}' at ply {ply}: {reason}")]
    InvalidMove {
        ply: u32,
        token: String,
        #[source]
        reason: SanError,
    },
}

impl ReplayError {
    pub fn ply(&self) -> u32 {
        match self {
            Self::InvalidMove { ply, .. } => *ply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_replay_scotch() {
        let line = ["e4", "e5", "Nf3", "Nc6", "d4", "exd4", "Nxd4"];
        let snaps = replay_san(&line).unwrap();
        assert_eq!(snaps.len(), 7);
        assert_eq!(snaps[0].ply, 1);
        assert_eq!(snaps[0].side_to_move(), PieceColor::Black);
        assert_eq!(snaps[6].side_to_move(), PieceColor::Black);
        assert_eq!(
            snaps[6].uci_moves,
            vec!["e2e4", "e7e5", "g1f3", "b8c6", "d2d4", "e5d4", "f3d4"]
        );
        assert_eq!(snaps[4].san.as_deref(), Some("d4"));
    }

    #[test]
    fn test_castling_sent_in_standard_uci() {
        let line = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"];
        let snaps = replay_san(&line).unwrap();
        assert_eq!(snaps.last().unwrap().uci_moves.last().unwrap(), "e1g1");
    }

    #[test]
    fn test_illegal_token_reports_ply() {
        let line = ["e4", "e5", "Ke3", "Nc6"];
        let err = replay_san(&line).unwrap_err();
        assert_eq!(err.ply(), 3);
        assert!(matches!(err, ReplayError::InvalidMove { ref token, .. } if token == "Ke3"));
    }

    #[test]
    fn test_garbage_after_error_is_irrelevant() {
        let a = replay_san(&["d4", "xx", "e4"]).unwrap_err();
        let b = replay_san(&["d4", "xx", "!!!", "Qh8"]).unwrap_err();
        assert_eq!(a.ply(), 2);
        assert_eq!(b.ply(), 2);
    }

    #[test]
    fn test_checkmate_is_information_only() {
        let line = ["f3", "e5", "g4", "Qh4#"];
        let snaps = replay_san(&line).unwrap();
        let last = snaps.last().unwrap();
        assert!(last.is_terminal());
        assert!(matches!(last.status(), GameStatus::Won));

        let err = replay_san(&["f3", "e5", "g4", "Qh4#", "Kf2"]).unwrap_err();
        assert_eq!(err.ply(), 5);
    }

    #[test]
    fn test_final_position_fen() {
        let snap = final_position(&["e4"]).unwrap();
        assert!(snap
            .fen()
            .starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"));
        assert_eq!(final_position::<&str>(&[]).unwrap().ply, 0);
    }

    proptest! {
        #[test]
        fn prop_snapshot_count_matches_legal_prefix(choices in proptest::collection::vec(0usize..64, 0..24)) {
            // Build a legal line by picking moves by index, then replay its SAN.
            let mut board = Board::default();
            let mut tokens = Vec::new();
            for c in choices {
                let moves = crate::pgn::legal_moves(&board);
                if moves.is_empty() {
                    break;
                }
                let mv = moves[c % moves.len()];
                tokens.push(crate::pgn::format_san(&board, mv));
                board.play_unchecked(mv);
            }
            let snaps = replay_san(&tokens).unwrap();
            prop_assert_eq!(snaps.len(), tokens.len());
        }

        #[test]
        fn prop_illegal_token_position_is_reported(prefix_len in 0usize..6, tail in proptest::collection::vec("[a-h][1-8]", 0..4)) {
            let legal = ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6"];
            let mut tokens: Vec<String> = legal[..prefix_len].iter().map(|s| s.to_string()).collect();
            tokens.push("Qz9".to_string());
            tokens.extend(tail);
            let err = replay_san(&tokens).unwrap_err();
            prop_assert_eq!(err.ply() as usize, prefix_len + 1);
        }
    }
}
