//! Turning free-form movetext into bare SAN tokens.

/// Split a stored move string into SAN tokens.
///
/// Stored lines are plain whitespace-separated SAN. Empty input is rejected
/// because every opening needs at least one move.
pub fn parse_moves(moves: &str) -> Result<Vec<String>, MovetextError> {
    let tokens: Vec<String> = moves.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return Err(MovetextError::Empty);
    }
    Ok(tokens)
}

/// Strip PGN decoration from movetext and return the SAN tokens.
///
/// Removes move numbers (`12.`, `12...`, also glued to the move as in
/// `1.e4`), game results, numeric annotation glyphs (`$1`) and brace
/// comments. Variations in parentheses are not supported and are dropped
/// along with their contents.
pub fn movetext_tokens(movetext: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(movetext.len());
    let mut brace_depth = 0usize;
    let mut paren_depth = 0usize;
    for c in movetext.chars() {
        match c {
            '{' => brace_depth += 1,
            '}' => brace_depth = brace_depth.saturating_sub(1),
            '(' if brace_depth == 0 => paren_depth += 1,
            ')' if brace_depth == 0 => paren_depth = paren_depth.saturating_sub(1),
            _ if brace_depth == 0 && paren_depth == 0 => cleaned.push(c),
            _ => {}
        }
    }

    cleaned
        .split_whitespace()
        .filter_map(|raw| {
            if matches!(raw, "1-0" | "0-1" | "1/2-1/2" | "*") || raw.starts_with('$') {
                return None;
            }
            let stripped = strip_move_number(raw);
            if stripped.is_empty() {
                None
            } else {
                Some(stripped.to_string())
            }
        })
        .collect()
}

fn strip_move_number(token: &str) -> &str {
    let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return token;
    }
    let rest = &token[digits..];
    if rest.starts_with('.') {
        rest.trim_start_matches('.')
    } else {
        token
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MovetextError {
    #[error("no moves provided")]
    Empty,
}
