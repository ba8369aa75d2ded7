//! Plain-text board diagrams for terminal output.

use cozy_chess::{Board, Color, File, Piece, Rank, Square};

use crate::converters::{file_to_char, rank_to_char, san_piece_letter};
use crate::types::PieceColor;

/// Piece letters by square, White uppercase. Indexed `[rank][file]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayBoard {
    cells: [[Option<char>; 8]; 8],
}

impl DisplayBoard {
    pub fn from_board(board: &Board) -> Self {
        let mut cells = [[None; 8]; 8];
        for sq in Square::ALL {
            if let (Some(piece), Some(color)) = (board.piece_on(sq), board.color_on(sq)) {
                cells[sq.rank() as usize][sq.file() as usize] = Some(piece_char(piece, color));
            }
        }
        Self { cells }
    }

    /// Letter on the square at 0-based `file` and `rank`.
    pub fn piece_at(&self, file: u8, rank: u8) -> Option<char> {
        self.cells
            .get(rank as usize)
            .and_then(|row| row.get(file as usize))
            .copied()
            .flatten()
    }

    /// Diagram seen from `orientation`'s side with rank and file labels.
    pub fn render(&self, orientation: PieceColor) -> String {
        let mut ranks = Rank::ALL;
        let mut files = File::ALL;
        match orientation {
            PieceColor::White => ranks.reverse(),
            PieceColor::Black => files.reverse(),
        }

        let mut out = String::new();
        for rank in ranks {
            out.push(rank_to_char(rank));
            out.push(' ');
            for file in files {
                out.push(' ');
                out.push(self.piece_at(file as u8, rank as u8).unwrap_or('.'));
            }
            out.push('\n');
        }
        out.push_str("  ");
        for file in files {
            out.push(' ');
            out.push(file_to_char(file));
        }
        out.push('\n');
        out
    }
}

impl From<&Board> for DisplayBoard {
    fn from(board: &Board) -> Self {
        Self::from_board(board)
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let letter = san_piece_letter(piece).unwrap_or('P');
    match color {
        Color::White => letter,
        Color::Black => letter.to_ascii_lowercase(),
    }
}
