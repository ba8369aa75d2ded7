pub mod board_display;
pub mod converters;
pub mod fen;
pub mod pgn;
pub mod replay;
pub mod score;
pub mod types;
pub mod uci;

pub use board_display::DisplayBoard;
pub use converters::*;
pub use fen::format_fen;
pub use pgn::{format_san, legal_moves, movetext_tokens, parse_moves, parse_san, MovetextError, SanError};
pub use replay::{final_position, replay_san, PositionSnapshot, ReplayError};
pub use score::{is_white_ply, Score, MATE_SCORE_CP};
pub use types::PieceColor;
pub use uci::{
    convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move,
    format_uci_move_in, parse_uci_move_in,
};

pub use cozy_chess;
