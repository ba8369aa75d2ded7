//! Character-level conversions between cozy-chess coordinates and notation.

use cozy_chess::{File, Piece, Rank, Square};

/// SAN letters for the pieces that have one.
const PIECE_LETTERS: [(Piece, char); 5] = [
    (Piece::Knight, 'N'),
    (Piece::Bishop, 'B'),
    (Piece::Rook, 'R'),
    (Piece::Queen, 'Q'),
    (Piece::King, 'K'),
];

pub fn file_to_char(file: File) -> char {
    char::from(b'a' + file as u8)
}

pub fn rank_to_char(rank: Rank) -> char {
    char::from(b'1' + rank as u8)
}

pub fn file_from_char(c: char) -> Option<File> {
    let offset = u32::from(c).checked_sub(u32::from('a'))?;
    File::try_index(offset as usize)
}

pub fn rank_from_char(c: char) -> Option<Rank> {
    let offset = u32::from(c).checked_sub(u32::from('1'))?;
    Rank::try_index(offset as usize)
}

/// Lowercase algebraic square, e.g. "e4".
pub fn format_square(sq: Square) -> String {
    [file_to_char(sq.file()), rank_to_char(sq.rank())]
        .iter()
        .collect()
}

/// Parse exactly two characters as a square.
pub fn parse_square(s: &str) -> Option<Square> {
    match s.as_bytes() {
        [f, r] => Some(Square::new(
            file_from_char(char::from(*f))?,
            rank_from_char(char::from(*r))?,
        )),
        _ => None,
    }
}

/// Lowercase letter used for UCI promotion suffixes.
pub fn format_piece(piece: Piece) -> char {
    san_piece_letter(piece).map_or('p', |c| c.to_ascii_lowercase())
}

/// Uppercase SAN letter. Pawns have none.
pub fn san_piece_letter(piece: Piece) -> Option<char> {
    PIECE_LETTERS
        .iter()
        .find(|(p, _)| *p == piece)
        .map(|(_, c)| *c)
}

pub fn piece_from_san_letter(c: char) -> Option<Piece> {
    PIECE_LETTERS
        .iter()
        .find(|(_, letter)| *letter == c)
        .map(|(p, _)| *p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_round_trip() {
        let sq = Square::new(File::E, Rank::Fourth);
        assert_eq!(format_square(sq), "e4");
        assert_eq!(parse_square("e4"), Some(sq));
        assert_eq!(parse_square("h8"), Some(Square::new(File::H, Rank::Eighth)));
    }

    #[test]
    fn test_parse_square_rejects_garbage() {
        assert_eq!(parse_square("i9"), None);
        assert_eq!(parse_square("e"), None);
        assert_eq!(parse_square("e44"), None);
        assert_eq!(parse_square("E4"), None);
        assert_eq!(parse_square("é"), None);
    }

    #[test]
    fn test_piece_letters() {
        assert_eq!(san_piece_letter(Piece::Pawn), None);
        assert_eq!(san_piece_letter(Piece::Knight), Some('N'));
        assert_eq!(format_piece(Piece::Queen), 'q');
        assert_eq!(format_piece(Piece::Pawn), 'p');
        assert_eq!(piece_from_san_letter('R'), Some(Piece::Rook));
        assert_eq!(piece_from_san_letter('P'), None);
    }
}
