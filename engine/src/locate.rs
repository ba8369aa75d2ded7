use std::path::{Path, PathBuf};

use crate::EngineError;

const ENGINE_BINARY: &str = "stockfish";

const COMMON_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

/// Resolve the engine executable.
///
/// An explicit path must exist. Without one, `PATH` is searched first and
/// then the usual install locations.
pub fn locate_engine(explicit: Option<&Path>) -> Result<PathBuf, EngineError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!("Configured engine path does not exist: {}", path.display());
        return Err(EngineError::NotFound);
    }

    if let Some(found) = search_path_var(std::env::var_os("PATH").as_deref()) {
        tracing::debug!("Found engine on PATH at {}", found.display());
        return Ok(found);
    }

    COMMON_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .ok_or(EngineError::NotFound)
}

fn search_path_var(path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(ENGINE_BINARY))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("my-engine");
        std::fs::write(&path, "").unwrap();
        assert_eq!(locate_engine(Some(&path)).unwrap(), path);
    }

    #[test]
    fn test_explicit_missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope");
        assert!(matches!(
            locate_engine(Some(&path)),
            Err(EngineError::NotFound)
        ));
    }

    #[test]
    fn test_search_path_var() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENGINE_BINARY), "").unwrap();
        let joined = std::env::join_paths([Path::new("/definitely/missing"), dir.path()]).unwrap();
        assert_eq!(
            search_path_var(Some(&joined)),
            Some(dir.path().join(ENGINE_BINARY))
        );
        assert_eq!(search_path_var(None), None);
    }
}
