pub mod movetext;
pub mod san;

pub use movetext::{movetext_tokens, parse_moves, MovetextError};
pub use san::{format_san, is_castling, legal_moves, parse_san, SanError};
