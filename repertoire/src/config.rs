//! Configuration for the repertoire CLI.
//!
//! Every value has a compile-time default and can be overridden by an
//! environment variable. Command-line flags override both and are applied
//! in `main`.

use std::path::PathBuf;
use std::time::Duration;

use engine::EngineConfig;

/// File name of the database inside the data directory.
const DB_FILE_NAME: &str = "repertoire.sqlite3";

/// Fallback database location when no platform data directory is known.
const DEV_DB_PATH: &str = "./data/repertoire.sqlite3";

/// Default per-search engine timeout (in seconds).
const DEFAULT_ENGINE_TIMEOUT_SECS: u64 = 30;

/// Get the SQLite database path.
///
/// Priority:
/// 1. `CHESS_DB_PATH` env variable if set
/// 2. `<platform data dir>/repertoire.sqlite3`
/// 3. `./data/repertoire.sqlite3` as fallback
pub fn get_db_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHESS_DB_PATH") {
        return PathBuf::from(path);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "repertoire") {
        return dirs.data_dir().join(DB_FILE_NAME);
    }

    PathBuf::from(DEV_DB_PATH)
}

/// Get the explicitly configured engine path, if any.
///
/// Reads `STOCKFISH_PATH`. When unset the engine is located on `PATH` or in
/// the usual install directories.
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var_os("STOCKFISH_PATH")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Get the per-search engine timeout in seconds.
///
/// Priority:
/// 1. `REPERTOIRE_ENGINE_TIMEOUT_SECS` env variable if set (falls back to the
///    default if it cannot be parsed)
/// 2. `30` seconds as fallback
pub fn get_engine_timeout_secs() -> u64 {
    parse_or(
        std::env::var("REPERTOIRE_ENGINE_TIMEOUT_SECS").ok().as_deref(),
        DEFAULT_ENGINE_TIMEOUT_SECS,
    )
}

/// `REPERTOIRE_ENGINE_THREADS`, or the engine's own default.
pub fn get_engine_threads() -> Option<u32> {
    parse_opt(std::env::var("REPERTOIRE_ENGINE_THREADS").ok().as_deref())
}

/// `REPERTOIRE_ENGINE_HASH_MB`, or the engine's own default.
pub fn get_engine_hash_mb() -> Option<u32> {
    parse_opt(std::env::var("REPERTOIRE_ENGINE_HASH_MB").ok().as_deref())
}

/// Directory for rolling log files. Unset means logs go to stderr only.
pub fn get_log_dir() -> Option<PathBuf> {
    std::env::var_os("REPERTOIRE_LOG_DIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Engine tuning gathered from the environment and flags. The executable is
/// resolved only when an evaluation actually needs it.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub explicit_path: Option<PathBuf>,
    pub search_timeout: Duration,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl EngineSettings {
    pub fn from_env(flag_path: Option<PathBuf>) -> Self {
        Self {
            explicit_path: flag_path.or_else(get_engine_path),
            search_timeout: Duration::from_secs(get_engine_timeout_secs()),
            threads: get_engine_threads(),
            hash_mb: get_engine_hash_mb(),
        }
    }

    pub fn to_engine_config(&self, path: PathBuf) -> EngineConfig {
        let mut config = EngineConfig::new(path);
        config.search_timeout = self.search_timeout;
        config.threads = self.threads;
        config.hash_mb = self.hash_mb;
        config
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<&str>, default: T) -> T {
    parse_opt(raw).unwrap_or(default)
}

fn parse_opt<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.and_then(|v| v.trim().parse().ok())
}
