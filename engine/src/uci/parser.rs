use chess::{parse_square, Score};

use super::UciError;

/// Incoming message from a UCI engine.
///
/// Moves stay as UCI text here; turning them into board moves needs the
/// position they were played in.
#[derive(Debug, Clone, PartialEq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`.
    BestMove { mv: Option<String> },
    Info(EngineInfo),
}

/// Whether an info score is exact or only a search-window bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    Lower,
    Upper,
}

/// Fields of one `info` line that matter for evaluating a position.
///
/// The score is from the side to move's perspective, as UCI sends it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineInfo {
    pub depth: Option<u8>,
    pub score: Option<Score>,
    pub bound: Option<ScoreBound>,
    pub multipv: Option<u8>,
}

impl EngineInfo {
    /// True for lines describing the principal (first) variation.
    pub fn is_primary(&self) -> bool {
        self.multipv.map_or(true, |n| n <= 1)
    }
}

pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let mut tokens = line.split_whitespace();
    let malformed = || UciError::MalformedMessage(line.to_string());

    match tokens.next() {
        Some("uciok") => Ok(UciMessage::UciOk),
        Some("readyok") => Ok(UciMessage::ReadyOk),
        Some("id") => {
            let name = tokens.next().ok_or_else(malformed)?.to_string();
            let value = tokens.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                return Err(malformed());
            }
            Ok(UciMessage::Id { name, value })
        }
        Some("bestmove") => {
            let mv = match tokens.next().ok_or_else(malformed)? {
                "(none)" | "0000" => None,
                text if is_uci_move_text(text) => Some(text.to_string()),
                text => return Err(UciError::InvalidMove(text.to_string())),
            };
            // A trailing `ponder` move is not needed.
            Ok(UciMessage::BestMove { mv })
        }
        Some("info") => Ok(UciMessage::Info(parse_info(tokens))),
        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

fn parse_info<'a>(mut tokens: impl Iterator<Item = &'a str>) -> EngineInfo {
    let mut info = EngineInfo::default();

    while let Some(key) = tokens.next() {
        match key {
            "depth" => info.depth = next_number(&mut tokens),
            "multipv" => info.multipv = next_number(&mut tokens),
            "score" => {
                let kind = tokens.next();
                let value = next_number::<i32>(&mut tokens);
                info.score = match (kind, value) {
                    (Some("cp"), Some(cp)) => Some(Score::Centipawns(cp)),
                    (Some("mate"), Some(n)) => Some(Score::Mate(n)),
                    _ => None,
                };
            }
            "lowerbound" => info.bound = Some(ScoreBound::Lower),
            "upperbound" => info.bound = Some(ScoreBound::Upper),
            // Free text runs to the end of the line.
            "string" => break,
            _ => {}
        }
    }

    info
}

fn next_number<'a, T: std::str::FromStr>(tokens: &mut impl Iterator<Item = &'a str>) -> Option<T> {
    tokens.next().and_then(|t| t.parse().ok())
}

/// Shape check for UCI move text (e2e4, e7e8q). Legality needs a board.
fn is_uci_move_text(s: &str) -> bool {
    let squares_ok = s.get(0..2).and_then(parse_square).is_some()
        && s.get(2..4).and_then(parse_square).is_some();
    squares_ok && matches!(s.get(4..), Some("" | "q" | "r" | "b" | "n"))
}
