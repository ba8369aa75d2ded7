//! UCI engine subprocess with an explicit protocol state machine.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use chess::{format_san, parse_uci_move_in, PositionSnapshot, Score};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::uci::{parse_uci_message, EngineInfo, UciError, UciMessage};
use crate::EngineError;

pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// How to launch and tune the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    pub handshake_timeout: Duration,
    pub search_timeout: Duration,
    /// How long to wait for `bestmove` after sending `stop`.
    pub drain_grace: Duration,
}

impl EngineConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            threads: None,
            hash_mb: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    NotStarted,
    Ready,
    Searching,
    /// Terminal. Carries the reason the engine was given up on.
    Failed(String),
}

/// Result of searching one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// White's perspective.
    pub score: Score,
    pub best_move_uci: Option<String>,
    pub best_move_san: Option<String>,
    pub depth: u8,
}

struct Session {
    process: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

struct SearchResult {
    best_move: Option<String>,
    info: Option<EngineInfo>,
}

pub struct EngineClient {
    config: EngineConfig,
    state: ClientState,
    session: Option<Session>,
}

impl EngineClient {
    /// Create a client without starting the engine. The process is spawned
    /// on [`start`](Self::start) or the first evaluation that needs it.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: ClientState::NotStarted,
            session: None,
        }
    }

    pub async fn spawn(config: EngineConfig) -> Result<Self, EngineError> {
        let mut client = Self::new(config);
        client.start().await?;
        Ok(client)
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.state, ClientState::Failed(_))
    }

    #[tracing::instrument(level = "info", skip(self), fields(path = %self.config.path.display()))]
    pub async fn start(&mut self) -> Result<(), EngineError> {
        match &self.state {
            ClientState::Ready => return Ok(()),
            ClientState::Failed(reason) => return Err(EngineError::Unavailable(reason.clone())),
            ClientState::Searching => {
                return Err(EngineError::Protocol("search already in progress".to_string()))
            }
            ClientState::NotStarted => {}
        }

        tracing::debug!("Spawning engine process");
        let spawned = Command::new(&self.config.path)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                return Err(self.fail(format!(
                    "failed to spawn {}: {}",
                    self.config.path.display(),
                    e
                )))
            }
        };

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            let _ = process.start_kill();
            return Err(self.fail("engine pipes unavailable".to_string()));
        };
        self.session = Some(Session {
            process,
            stdin,
            lines: BufReader::new(stdout).lines(),
        });

        let limit = self.config.handshake_timeout;
        match tokio::time::timeout(limit, self.handshake()).await {
            Ok(Ok(())) => {
                self.state = ClientState::Ready;
                tracing::info!("Engine initialized");
                Ok(())
            }
            Ok(Err(e)) => Err(self.fail(format!("handshake failed: {}", e))),
            Err(_) => Err(self.fail(format!("no handshake response within {:?}", limit))),
        }
    }

    async fn handshake(&mut self) -> io::Result<()> {
        self.send("uci").await?;
        self.wait_for(UciMessage::UciOk).await?;

        if let Some(threads) = self.config.threads {
            let threads = threads.clamp(1, 16);
            tracing::info!("Setting Threads to {}", threads);
            self.send(&format!("setoption name Threads value {}", threads))
                .await?;
        }
        if let Some(hash_mb) = self.config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 2048);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            self.send(&format!("setoption name Hash value {}", hash_mb))
                .await?;
        }

        self.send("isready").await?;
        self.wait_for(UciMessage::ReadyOk).await
    }

    /// Search `position` to `depth` and return a White-perspective score.
    ///
    /// Positions with no legal move are answered without asking the engine.
    #[tracing::instrument(level = "debug", skip(self, position), fields(ply = position.ply))]
    pub async fn evaluate(
        &mut self,
        position: &PositionSnapshot,
        depth: u8,
    ) -> Result<Evaluation, EngineError> {
        if let ClientState::Failed(reason) = &self.state {
            return Err(EngineError::Unavailable(reason.clone()));
        }
        if position.is_terminal() {
            return Ok(terminal_evaluation(position));
        }
        self.start().await?;

        let commands = [
            position_command(&position.uci_moves),
            format!("go depth {}", depth),
        ];
        for command in &commands {
            if let Err(e) = self.send(command).await {
                return Err(self.fail(format!("failed to write to engine: {}", e)));
            }
        }
        self.state = ClientState::Searching;

        let limit = self.config.search_timeout;
        let result = match tokio::time::timeout(limit, self.read_search()).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(self.fail(format!("protocol error during search: {}", e)))
            }
            Ok(Err(e)) => return Err(self.fail(format!("engine stopped responding: {}", e))),
            Err(_) => return Err(self.recover_from_timeout().await),
        };
        self.state = ClientState::Ready;

        build_evaluation(position, depth, result)
    }

    /// Stop a search that overran and drain its output so the next search
    /// starts clean.
    async fn recover_from_timeout(&mut self) -> EngineError {
        let limit = self.config.search_timeout;
        tracing::warn!("Search exceeded {:?}, sending stop", limit);

        if let Err(e) = self.send("stop").await {
            self.fail(format!("failed to stop search: {}", e));
            return EngineError::Timeout(limit);
        }

        match tokio::time::timeout(self.config.drain_grace, self.read_search()).await {
            Ok(Ok(_)) => {
                tracing::debug!("Stopped search drained");
                self.state = ClientState::Ready;
            }
            Ok(Err(e)) => {
                self.fail(format!("engine failed while stopping: {}", e));
            }
            Err(_) => {
                self.fail("engine ignored stop".to_string());
            }
        }
        EngineError::Timeout(limit)
    }

    /// Read until `bestmove`, keeping the last scored principal-variation
    /// line. Exact scores win over search-window bounds.
    ///
    /// Unrecognised lines are skipped, but a recognised message that does
    /// not parse (a garbled `bestmove`) is an `InvalidData` error.
    async fn read_search(&mut self) -> io::Result<SearchResult> {
        let mut exact: Option<EngineInfo> = None;
        let mut bounded: Option<EngineInfo> = None;
        loop {
            match self.next_message().await? {
                Ok(UciMessage::Info(info)) if info.score.is_some() && info.is_primary() => {
                    if info.bound.is_none() {
                        exact = Some(info);
                    } else {
                        bounded = Some(info);
                    }
                }
                Ok(UciMessage::BestMove { mv }) => {
                    return Ok(SearchResult {
                        best_move: mv,
                        info: exact.or(bounded),
                    });
                }
                Ok(_) | Err(UciError::UnknownMessage(_)) => {}
                Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            }
        }
    }

    async fn wait_for(&mut self, expected: UciMessage) -> io::Result<()> {
        loop {
            match self.next_message().await? {
                Ok(message) if message == expected => return Ok(()),
                Ok(UciMessage::Id { name, value }) => tracing::info!("Engine {}: {}", name, value),
                Ok(_) => {}
                Err(e) => tracing::trace!("Ignoring engine output: {}", e),
            }
        }
    }

    async fn send(&mut self, command: &str) -> io::Result<()> {
        let session = self.session.as_mut().ok_or_else(not_running)?;
        tracing::debug!("UCI >> {}", command);
        session.stdin.write_all(command.as_bytes()).await?;
        session.stdin.write_all(b"\n").await?;
        session.stdin.flush().await
    }

    /// Next line from the engine, parsed. EOF is an I/O error.
    async fn next_message(&mut self) -> io::Result<Result<UciMessage, UciError>> {
        let session = self.session.as_mut().ok_or_else(not_running)?;
        let Some(line) = session.lines.next_line().await? else {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "engine closed its output",
            ));
        };
        let line = line.trim();
        tracing::debug!("UCI << {}", line);
        Ok(parse_uci_message(line))
    }

    fn fail(&mut self, reason: String) -> EngineError {
        tracing::error!("Engine failed: {}", reason);
        if let Some(session) = self.session.as_mut() {
            let _ = session.process.start_kill();
        }
        self.state = ClientState::Failed(reason.clone());
        EngineError::Unavailable(reason)
    }

    /// Ask the engine to quit, then kill it if it lingers.
    #[tracing::instrument(level = "info", skip(self))]
    pub async fn shutdown(mut self) {
        if self.state == ClientState::Ready {
            let _ = self.send("quit").await;
        }
        if let Some(mut session) = self.session.take() {
            let waited =
                tokio::time::timeout(Duration::from_secs(1), session.process.wait()).await;
            if waited.is_err() {
                tracing::warn!("Engine did not exit after quit, killing it");
                let _ = session.process.kill().await;
            }
        }
    }
}

impl Drop for EngineClient {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            let _ = session.process.start_kill();
        }
    }
}

fn not_running() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "engine is not running")
}

fn position_command(uci_moves: &[String]) -> String {
    if uci_moves.is_empty() {
        "position startpos".to_string()
    } else {
        format!("position startpos moves {}", uci_moves.join(" "))
    }
}

fn terminal_evaluation(position: &PositionSnapshot) -> Evaluation {
    let score = if position.board.checkers().is_empty() {
        Score::Centipawns(0)
    } else {
        Score::Checkmate {
            winner: position.side_to_move().opposite(),
        }
    };
    Evaluation {
        score,
        best_move_uci: None,
        best_move_san: None,
        depth: 0,
    }
}

fn build_evaluation(
    position: &PositionSnapshot,
    requested_depth: u8,
    result: SearchResult,
) -> Result<Evaluation, EngineError> {
    let Some(info) = result.info else {
        return Err(EngineError::Protocol(
            "search finished without a score".to_string(),
        ));
    };
    let Some(raw) = info.score else {
        return Err(EngineError::Protocol(
            "search finished without a score".to_string(),
        ));
    };

    let best_move_san = result.best_move.as_deref().and_then(|uci| {
        match parse_uci_move_in(&position.board, uci) {
            Some(mv) => Some(format_san(&position.board, mv)),
            None => {
                tracing::warn!("Engine suggested illegal move {}", uci);
                None
            }
        }
    });

    Ok(Evaluation {
        score: raw.to_white_perspective(position.side_to_move()),
        best_move_uci: result.best_move,
        best_move_san,
        depth: info.depth.unwrap_or(requested_depth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_command() {
        assert_eq!(position_command(&[]), "position startpos");
        assert_eq!(
            position_command(&["e2e4".to_string(), "e7e5".to_string()]),
            "position startpos moves e2e4 e7e5"
        );
    }

    #[test]
    fn test_terminal_evaluation_mate_and_stalemate() {
        let mated = chess::final_position(&["f3", "e5", "g4", "Qh4#"]).unwrap();
        assert_eq!(
            terminal_evaluation(&mated).score,
            Score::Checkmate {
                winner: chess::PieceColor::Black
            }
        );

        let stalemate = PositionSnapshot {
            board: "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".parse().unwrap(),
            ..PositionSnapshot::start()
        };
        assert!(stalemate.is_terminal());
        assert_eq!(terminal_evaluation(&stalemate).score, Score::Centipawns(0));
    }

    #[test]
    fn test_build_evaluation_requires_score() {
        let pos = PositionSnapshot::start();
        let result = SearchResult {
            best_move: Some("e2e4".to_string()),
            info: None,
        };
        assert!(matches!(
            build_evaluation(&pos, 10, result),
            Err(EngineError::Protocol(_))
        ));
    }

    #[test]
    fn test_build_evaluation_converts_best_move() {
        let pos = PositionSnapshot::start();
        let result = SearchResult {
            best_move: Some("g1f3".to_string()),
            info: Some(EngineInfo {
                depth: Some(14),
                score: Some(Score::Centipawns(30)),
                ..Default::default()
            }),
        };
        let eval = build_evaluation(&pos, 10, result).unwrap();
        assert_eq!(eval.best_move_san.as_deref(), Some("Nf3"));
        assert_eq!(eval.score, Score::Centipawns(30));
        assert_eq!(eval.depth, 14);
    }
}
