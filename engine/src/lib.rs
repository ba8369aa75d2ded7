pub mod client;
pub mod error;
pub mod locate;
pub mod uci;

use std::future::Future;

use chess::PositionSnapshot;

pub use client::{ClientState, EngineClient, EngineConfig, Evaluation};
pub use error::EngineError;
pub use locate::locate_engine;
pub use uci::{parse_uci_message, EngineInfo, UciError, UciMessage};

/// Something that can score positions. [`EngineClient`] is the real one;
/// tests script their own.
pub trait Evaluator {
    fn evaluate(
        &mut self,
        position: &PositionSnapshot,
        depth: u8,
    ) -> impl Future<Output = Result<Evaluation, EngineError>> + Send;

    /// False once evaluation can no longer succeed.
    fn is_available(&self) -> bool {
        true
    }
}

impl Evaluator for EngineClient {
    async fn evaluate(
        &mut self,
        position: &PositionSnapshot,
        depth: u8,
    ) -> Result<Evaluation, EngineError> {
        EngineClient::evaluate(self, position, depth).await
    }

    fn is_available(&self) -> bool {
        EngineClient::is_available(self)
    }
}
