use cozy_chess::Board;

/// FEN of `board`, as shown next to a line's final position.
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}
