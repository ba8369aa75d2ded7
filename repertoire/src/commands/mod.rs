//! Command implementations. Each submodule exposes `execute`-style entry
//! points called from `main`.

pub mod eval;
pub mod import;
pub mod learn;
pub mod openings;
pub mod review;
pub mod tree;

use anyhow::Result;
use chess::replay_san;
use engine::{locate_engine, EngineClient, EngineError};
use trainer::{Opening, TrainerError};

use crate::config::EngineSettings;
use crate::persistence::traits::OpeningRepository;
use crate::persistence::{Database, Store};

/// Everything a command needs: open storage and engine settings.
pub struct Context {
    pub db: Database,
    pub store: Store,
    pub engine: EngineSettings,
}

impl Context {
    pub fn new(db: Database, engine: EngineSettings) -> Self {
        let store = Store::new(&db);
        Self { db, store, engine }
    }

    /// Fetch an opening by exact name.
    pub async fn opening(&self, name: &str) -> Result<Opening> {
        self.store
            .openings
            .get_opening(name)
            .await?
            .ok_or_else(|| TrainerError::NotFound(format!("opening '{}'", name)).into())
    }

    /// Openings ordered by name, filtered by `prefix` and capped at `limit`.
    pub async fn openings(&self, prefix: Option<&str>, limit: Option<u32>) -> Result<Vec<Opening>> {
        Ok(self.store.openings.list_openings(prefix, limit).await?)
    }

    /// Locate and start the engine.
    pub async fn start_engine(&self) -> Result<EngineClient, EngineError> {
        let path = locate_engine(self.engine.explicit_path.as_deref())?;
        tracing::info!("Using engine at {}", path.display());
        EngineClient::spawn(self.engine.to_engine_config(path)).await
    }
}

/// Replay `tokens` from the initial position, returning them unchanged when
/// every move is legal.
pub fn validate_line(tokens: Vec<String>) -> Result<Vec<String>, TrainerError> {
    if tokens.is_empty() {
        return Err(TrainerError::InvalidInput("no moves provided".to_string()));
    }
    replay_san(&tokens)?;
    Ok(tokens)
}
