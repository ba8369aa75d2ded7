use chess::ReplayError;
use engine::EngineError;

#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error(transparent)]
    Replay(#[from] ReplayError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
