pub mod parser;

pub use parser::{parse_uci_message, EngineInfo, ScoreBound, UciMessage};

#[derive(Debug, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move: {0}")]
    InvalidMove(String),
}
