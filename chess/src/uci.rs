//! Move text in the form UCI engines speak.
//!
//! cozy-chess encodes castling as the king capturing its own rook
//! (`e1h1`), while engines expect the king's two-square step (`e1g1`).

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::converters::{format_piece, format_square, parse_square};
use crate::pgn::san::is_castling;

/// Rewrite an engine-style castling move into cozy-chess form when the
/// king-takes-rook version is among `legal_moves`.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    if mv.promotion.is_some() || mv.from.file() != File::E {
        return mv;
    }
    let rook_file = match mv.to.file() {
        File::G => File::H,
        File::C => File::A,
        _ => return mv,
    };
    if mv.to.rank() != mv.from.rank() {
        return mv;
    }
    let candidate = Move {
        from: mv.from,
        to: Square::new(rook_file, mv.from.rank()),
        promotion: None,
    };
    if legal_moves.contains(&candidate) {
        candidate
    } else {
        mv
    }
}

/// Inverse of [`convert_uci_castling_to_cozy`]; non-castling moves pass through.
pub fn convert_cozy_castling_to_uci(board: &Board, mv: Move) -> Move {
    if !is_castling(board, mv) {
        return mv;
    }
    let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
        File::G
    } else {
        File::C
    };
    Move {
        to: Square::new(king_file, mv.from.rank()),
        ..mv
    }
}

/// "e2e4", or "e7e8q" for promotions.
pub fn format_uci_move(mv: Move) -> String {
    let mut text = format_square(mv.from) + &format_square(mv.to);
    text.extend(mv.promotion.map(format_piece));
    text
}

pub fn format_uci_move_in(board: &Board, mv: Move) -> String {
    format_uci_move(convert_cozy_castling_to_uci(board, mv))
}

/// Parse engine move text against `board`. Returns the move in cozy-chess
/// form, or `None` when the text is malformed or the move is illegal.
pub fn parse_uci_move_in(board: &Board, text: &str) -> Option<Move> {
    let from = parse_square(text.get(0..2)?)?;
    let to = parse_square(text.get(2..4)?)?;
    let promotion = match text.get(4..)? {
        "" => None,
        suffix => Some(promotion_piece(suffix)?),
    };
    let legal = crate::pgn::legal_moves(board);
    let mv = convert_uci_castling_to_cozy(Move { from, to, promotion }, &legal);
    legal.contains(&mv).then_some(mv)
}

fn promotion_piece(suffix: &str) -> Option<Piece> {
    match suffix {
        "q" => Some(Piece::Queen),
        "r" => Some(Piece::Rook),
        "b" => Some(Piece::Bishop),
        "n" => Some(Piece::Knight),
        _ => None,
    }
}
