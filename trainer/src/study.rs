//! Study sheets and quiz answer checking.

use chess::{is_white_ply, movetext_tokens, Score};
use serde::Serialize;

use crate::critical::LineReport;
use crate::model::{Opening, OpeningId};
use crate::tree::move_label;

/// One move pair per chunk.
pub const DEFAULT_CHUNK: usize = 2;

/// Slice `moves` into consecutive chunks of `size` from the start. The last
/// chunk may be shorter. A size of 0 is treated as 1.
pub fn chunk_moves<T: Clone>(moves: &[T], size: usize) -> Vec<Vec<T>> {
    moves.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudyChunk {
    /// Ply of the first token in the chunk (1-based).
    pub start_ply: u32,
    pub tokens: Vec<String>,
    /// Numbered movetext, e.g. `2. Nf3 Nc6`.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudySheet {
    pub opening_id: OpeningId,
    pub name: String,
    pub chunks: Vec<StudyChunk>,
    pub report: Option<LineReport>,
    pub note: Option<String>,
}

impl StudySheet {
    pub fn final_score(&self) -> Option<Score> {
        self.report.as_ref().and_then(|r| r.final_score)
    }
}

pub fn build_study_sheet(
    opening: &Opening,
    chunk: usize,
    report: Option<LineReport>,
    note: Option<String>,
) -> StudySheet {
    let mut start_ply = 1u32;
    let chunks = chunk_moves(&opening.moves, chunk)
        .into_iter()
        .map(|tokens| {
            let text = numbered_movetext(start_ply, &tokens);
            let chunk = StudyChunk {
                start_ply,
                tokens,
                text,
            };
            start_ply += chunk.tokens.len() as u32;
            chunk
        })
        .collect();

    StudySheet {
        opening_id: opening.id,
        name: opening.name.clone(),
        chunks,
        report,
        note,
    }
}

/// Movetext with move numbers, starting at `start_ply`.
pub fn numbered_movetext(start_ply: u32, tokens: &[String]) -> String {
    let mut parts = Vec::with_capacity(tokens.len());
    for (offset, token) in tokens.iter().enumerate() {
        let ply = start_ply + offset as u32;
        if is_white_ply(ply) || offset == 0 {
            parts.push(move_label(ply, token));
        } else {
            parts.push(token.clone());
        }
    }
    parts.join(" ")
}

/// Result of comparing typed moves with the first tokens of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizCheck {
    pub target: Vec<String>,
    pub typed: Vec<String>,
    /// Length of the longest correct prefix.
    pub correct_tokens: usize,
}

impl QuizCheck {
    pub fn target_tokens(&self) -> usize {
        self.target.len()
    }

    pub fn fully_correct(&self) -> bool {
        self.correct_tokens == self.target.len()
    }

    /// The first wrong token as `(expected, typed)`; typed is `None` when
    /// the answer stopped short.
    pub fn first_mistake(&self) -> Option<(&str, Option<&str>)> {
        let expected = self.target.get(self.correct_tokens)?;
        Some((
            expected.as_str(),
            self.typed.get(self.correct_tokens).map(String::as_str),
        ))
    }
}

/// Compare typed moves with the first `n_tokens` of `line`.
///
/// Move numbers are allowed in the answer. Check marks, annotation glyphs
/// and zero-spelled castling do not count as mistakes.
pub fn check_typed_moves(line: &[String], typed: &str, n_tokens: usize) -> QuizCheck {
    let target: Vec<String> = line.iter().take(n_tokens).cloned().collect();
    let typed = movetext_tokens(typed);
    let correct_tokens = target
        .iter()
        .zip(&typed)
        .take_while(|(want, got)| normalize_san(want) == normalize_san(got))
        .count();
    QuizCheck {
        target,
        typed,
        correct_tokens,
    }
}

fn normalize_san(token: &str) -> String {
    let body = token.trim().trim_end_matches(['+', '#', '!', '?']);
    match body {
        "0-0" => "O-O".to_string(),
        "0-0-0" => "O-O-O".to_string(),
        other => other.to_string(),
    }
}
