use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Chess engine executable not found")]
    NotFound,
    /// The engine could not be started or has failed; evaluation is off for
    /// the rest of this client's life.
    #[error("Chess engine unavailable: {0}")]
    Unavailable(String),
    #[error("Engine search timed out after {0:?}")]
    Timeout(Duration),
    #[error("Engine protocol error: {0}")]
    Protocol(String),
}

impl EngineError {
    /// Errors after which no further evaluation can succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound | Self::Unavailable(_))
    }
}
