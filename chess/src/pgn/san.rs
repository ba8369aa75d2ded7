use cozy_chess::{Board, File, GameStatus, Move, Piece, Rank, Square};

use crate::converters::{
    file_from_char, file_to_char, format_square, parse_square, piece_from_san_letter,
    rank_from_char, rank_to_char, san_piece_letter,
};

/// Collect every legal move in `board`.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}

/// True when `mv` is cozy-chess castling (king captures its own rook).
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastleSide {
    King,
    Queen,
}

/// Parse Standard Algebraic Notation (SAN) move
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let body = san.trim().trim_end_matches(['+', '#', '!', '?']);
    if body.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let castle = match body {
        "O-O" | "0-0" => Some(CastleSide::King),
        "O-O-O" | "0-0-0" => Some(CastleSide::Queen),
        _ => None,
    };
    if let Some(side) = castle {
        return find_castling(board, side).ok_or_else(|| SanError::NoLegalMove(san.to_string()));
    }

    let mut chars: Vec<char> = body.chars().collect();

    let piece = match chars.first().copied().and_then(piece_from_san_letter) {
        Some(p) => {
            chars.remove(0);
            p
        }
        None => Piece::Pawn,
    };

    let promotion = parse_promotion_suffix(&mut chars, piece, san)?;

    chars.retain(|&c| c != 'x' && c != ':');
    if chars.len() < 2 {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let dest_str: String = chars[chars.len() - 2..].iter().collect();
    let dest = parse_square(&dest_str).ok_or_else(|| SanError::InvalidSquare(dest_str.clone()))?;

    let mut from_file: Option<File> = None;
    let mut from_rank: Option<Rank> = None;
    for &c in &chars[..chars.len() - 2] {
        if let Some(f) = file_from_char(c) {
            if from_file.is_some() {
                return Err(SanError::InvalidFormat(san.to_string()));
            }
            from_file = Some(f);
        } else if let Some(r) = rank_from_char(c) {
            if from_rank.is_some() {
                return Err(SanError::InvalidFormat(san.to_string()));
            }
            from_rank = Some(r);
        } else {
            return Err(SanError::InvalidFormat(san.to_string()));
        }
    }

    let candidates: Vec<Move> = legal_moves(board)
        .into_iter()
        .filter(|mv| {
            mv.to == dest
                && board.piece_on(mv.from) == Some(piece)
                && mv.promotion == promotion
                && !is_castling(board, *mv)
                && from_file.map_or(true, |f| mv.from.file() == f)
                && from_rank.map_or(true, |r| mv.from.rank() == r)
        })
        .collect();

    match candidates.as_slice() {
        [mv] => Ok(*mv),
        [] => Err(SanError::NoLegalMove(san.to_string())),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

fn parse_promotion_suffix(
    chars: &mut Vec<char>,
    piece: Piece,
    san: &str,
) -> Result<Option<Piece>, SanError> {
    if let Some(eq) = chars.iter().position(|&c| c == '=') {
        let promo: String = chars[eq + 1..].iter().collect();
        let mut promo_chars = promo.chars();
        let letter = promo_chars.next();
        if piece != Piece::Pawn || promo_chars.next().is_some() {
            return Err(SanError::InvalidPromotion(san.to_string()));
        }
        let promo_piece = letter
            .and_then(piece_from_san_letter)
            .filter(|p| *p != Piece::King)
            .ok_or_else(|| SanError::InvalidPromotion(san.to_string()))?;
        chars.truncate(eq);
        return Ok(Some(promo_piece));
    }

    // "e8Q" without the equals sign. Lowercase letters are files, so only
    // uppercase counts here.
    if piece == Piece::Pawn {
        if let Some(promo_piece) = chars
            .last()
            .copied()
            .and_then(piece_from_san_letter)
            .filter(|p| *p != Piece::King)
        {
            chars.pop();
            return Ok(Some(promo_piece));
        }
    }

    Ok(None)
}

fn find_castling(board: &Board, side: CastleSide) -> Option<Move> {
    legal_moves(board).into_iter().find(|mv| {
        is_castling(board, *mv)
            && match side {
                CastleSide::King => (mv.to.file() as u8) > (mv.from.file() as u8),
                CastleSide::Queen => (mv.to.file() as u8) < (mv.from.file() as u8),
            }
    })
}

/// Format a legal move as SAN, including the check or mate suffix.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = String::new();

    let Some(piece) = board.piece_on(mv.from) else {
        return format!("{}{}", format_square(mv.from), format_square(mv.to));
    };

    if is_castling(board, mv) {
        if (mv.to.file() as u8) > (mv.from.file() as u8) {
            san.push_str("O-O");
        } else {
            san.push_str("O-O-O");
        }
    } else {
        let is_capture = board.color_on(mv.to).is_some()
            || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

        match san_piece_letter(piece) {
            Some(letter) => {
                san.push(letter);
                san.push_str(&disambiguation(board, mv, piece));
            }
            None => {
                if is_capture {
                    san.push(file_to_char(mv.from.file()));
                }
            }
        }

        if is_capture {
            san.push('x');
        }
        san.push_str(&format_square(mv.to));

        if let Some(promo) = mv.promotion.and_then(san_piece_letter) {
            san.push('=');
            san.push(promo);
        }
    }

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if matches!(after.status(), GameStatus::Won) {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
                && !is_castling(board, *other)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|sq| sq.file() != mv.from.file()) {
        return file_to_char(mv.from.file()).to_string();
    }
    if rivals.iter().all(|sq| sq.rank() != mv.from.rank()) {
        return rank_to_char(mv.from.rank()).to_string();
    }
    format_square(mv.from)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("no legal move matches {0}")]
    NoLegalMove(String),
    #[error("ambiguous move {0}")]
    AmbiguousMove(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid square: {0}")]
    InvalidSquare(String),
    #[error("invalid promotion: {0}")]
    InvalidPromotion(String),
}
