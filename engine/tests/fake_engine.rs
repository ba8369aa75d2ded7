#![cfg(unix)]

use std::time::Duration;

use chess::{final_position, PieceColor, Score};
use engine::{ClientState, EngineClient, EngineConfig, EngineError, Evaluator};
use tempfile::TempDir;

const HANDSHAKE: &str = r#"
    uci) echo "id name Fake Engine"; echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
"#;

/// A shell script speaking just enough UCI, run through `/bin/sh`.
fn fake_engine(dir: &TempDir, prelude: &str, cases: &str) -> EngineConfig {
    let script = dir.path().join("engine.sh");
    let body = format!(
        "{prelude}\nwhile read -r line; do\n  case \"$line\" in\n{HANDSHAKE}{cases}\n  esac\ndone\n"
    );
    std::fs::write(&script, body).unwrap();

    let mut config = EngineConfig::new("/bin/sh");
    config.args = vec![script.display().to_string()];
    config.handshake_timeout = Duration::from_secs(5);
    config.search_timeout = Duration::from_secs(5);
    config.drain_grace = Duration::from_secs(2);
    config
}

#[tokio::test]
async fn test_black_to_move_score_is_negated() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(
        &dir,
        "",
        r#"    go*) echo "info depth 12 score cp 50 pv e7e5"; echo "bestmove e7e5 ponder g1f3" ;;"#,
    );
    let mut client = EngineClient::spawn(config).await.unwrap();
    assert_eq!(client.state(), &ClientState::Ready);

    let position = final_position(&["e4"]).unwrap();
    let eval = client.evaluate(&position, 12).await.unwrap();
    assert_eq!(eval.score, Score::Centipawns(-50));
    assert_eq!(eval.best_move_uci.as_deref(), Some("e7e5"));
    assert_eq!(eval.best_move_san.as_deref(), Some("e5"));
    assert_eq!(eval.depth, 12);
    assert_eq!(client.state(), &ClientState::Ready);

    client.shutdown().await;
}

#[tokio::test]
async fn test_white_to_move_mate_kept_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(
        &dir,
        "",
        r#"    go*) echo "info depth 5 score cp 10"; echo "info depth 6 score mate 3 pv g1f3"; echo "bestmove g1f3" ;;"#,
    );
    let mut client = EngineClient::new(config);

    let position = final_position(&["e4", "e5"]).unwrap();
    let eval = client.evaluate(&position, 6).await.unwrap();
    assert_eq!(eval.score, Score::Mate(3));
    assert_eq!(eval.best_move_san.as_deref(), Some("Nf3"));
}

#[tokio::test]
async fn test_timeout_drains_and_stays_ready() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fake_engine(
        &dir,
        "n=0",
        r#"    go*)
      n=$((n + 1))
      if [ "$n" -eq 1 ]; then
        echo "info depth 1 score cp 5"
      else
        echo "info depth 8 score cp 20 pv e7e5"
        echo "bestmove e7e5"
      fi ;;
    stop) echo "bestmove e7e5" ;;"#,
    );
    config.search_timeout = Duration::from_millis(300);
    let mut client = EngineClient::new(config);
    let position = final_position(&["e4"]).unwrap();

    let err = client.evaluate(&position, 8).await.unwrap_err();
    assert!(matches!(err, EngineError::Timeout(_)));
    assert!(!err.is_fatal());
    assert_eq!(client.state(), &ClientState::Ready);

    // The stopped search's bestmove was drained, so this reads fresh output.
    let eval = client.evaluate(&position, 8).await.unwrap();
    assert_eq!(eval.score, Score::Centipawns(-20));
}

#[tokio::test]
async fn test_engine_exit_latches_failed() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(&dir, "", "    go*) exit 0 ;;");
    let mut client = EngineClient::new(config);
    let position = final_position(&["d4"]).unwrap();

    let err = client.evaluate(&position, 10).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(matches!(client.state(), ClientState::Failed(_)));
    assert!(!Evaluator::is_available(&client));

    let again = client.evaluate(&position, 10).await.unwrap_err();
    assert!(again.is_fatal());
}

#[tokio::test]
async fn test_missing_binary_is_unavailable() {
    let mut client = EngineClient::new(EngineConfig::new("/nonexistent/dir/stockfish"));
    let position = final_position(&["e4"]).unwrap();
    let err = client.evaluate(&position, 10).await.unwrap_err();
    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(matches!(client.state(), ClientState::Failed(_)));
}

#[tokio::test]
async fn test_silent_engine_fails_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("silent.sh");
    std::fs::write(&script, "while read -r line; do :; done\n").unwrap();
    let mut config = EngineConfig::new("/bin/sh");
    config.args = vec![script.display().to_string()];
    config.handshake_timeout = Duration::from_millis(300);

    let err = EngineClient::spawn(config).await.err().unwrap();
    assert!(matches!(err, EngineError::Unavailable(_)));
}

#[tokio::test]
async fn test_terminal_position_needs_no_engine() {
    let mut client = EngineClient::new(EngineConfig::new("/nonexistent/dir/stockfish"));
    let position = final_position(&["f3", "e5", "g4", "Qh4#"]).unwrap();
    let eval = client.evaluate(&position, 10).await.unwrap();
    assert_eq!(
        eval.score,
        Score::Checkmate {
            winner: PieceColor::Black
        }
    );
    assert_eq!(eval.best_move_san, None);
    assert_eq!(client.state(), &ClientState::NotStarted);
}

#[tokio::test]
async fn test_search_without_score_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(&dir, "", r#"    go*) echo "bestmove (none)" ;;"#);
    let mut client = EngineClient::new(config);
    let position = final_position(&["e4"]).unwrap();

    let err = client.evaluate(&position, 10).await.unwrap_err();
    assert!(matches!(err, EngineError::Protocol(_)));
    assert_eq!(client.state(), &ClientState::Ready);
}

#[tokio::test]
async fn test_garbled_bestmove_fails_search() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(&dir, "", r#"    go*) echo "info depth 3 score cp 9"; echo "bestmove zz99" ;;"#);
    let mut client = EngineClient::new(config);
    let position = final_position(&["e4"]).unwrap();

    let started = std::time::Instant::now();
    let err = client.evaluate(&position, 10).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(err.to_string().contains("zz99"));
    assert!(matches!(client.state(), ClientState::Failed(_)));
}

#[tokio::test]
async fn test_banner_lines_are_skipped_during_search() {
    let dir = tempfile::tempdir().unwrap();
    let config = fake_engine(
        &dir,
        "",
        r#"    go*) echo "Fake Engine 1.0 by nobody"; echo "info depth 4 score cp 15"; echo "bestmove d2d4" ;;"#,
    );
    let mut client = EngineClient::new(config);
    let position = final_position(&["Nf3", "Nf6"]).unwrap();

    let eval = client.evaluate(&position, 4).await.unwrap();
    assert_eq!(eval.score, Score::Centipawns(15));
    assert_eq!(client.state(), &ClientState::Ready);
}

/// Records the engine shell's PID so tests can check it was reaped or killed.
#[cfg(target_os = "linux")]
fn pid_prelude(dir: &TempDir) -> (String, std::path::PathBuf) {
    let pid_file = dir.path().join("engine.pid");
    (format!("echo $$ > \"{}\"", pid_file.display()), pid_file)
}

/// Gone means no /proc entry or a zombie waiting to be reaped.
#[cfg(target_os = "linux")]
async fn process_gone(pid: u32) -> bool {
    for _ in 0..40 {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => return true,
            Ok(stat) => {
                let state = stat.rsplit_once(')').and_then(|(_, rest)| rest.trim_start().chars().next());
                if matches!(state, Some('Z' | 'X')) {
                    return true;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[cfg(target_os = "linux")]
fn read_pid(path: &std::path::Path) -> u32 {
    std::fs::read_to_string(path).unwrap().trim().parse().unwrap()
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_drop_kills_engine_process() {
    let dir = tempfile::tempdir().unwrap();
    let (prelude, pid_file) = pid_prelude(&dir);
    let config = fake_engine(&dir, &prelude, "");
    let client = EngineClient::spawn(config).await.unwrap();
    let pid = read_pid(&pid_file);
    assert!(std::path::Path::new(&format!("/proc/{}", pid)).exists());

    drop(client);
    assert!(process_gone(pid).await);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_failed_client_kills_engine_process() {
    let dir = tempfile::tempdir().unwrap();
    let (prelude, pid_file) = pid_prelude(&dir);
    let config = fake_engine(&dir, &prelude, r#"    go*) echo "bestmove zz99" ;;"#);
    let mut client = EngineClient::new(config);
    let position = final_position(&["e4"]).unwrap();

    client.evaluate(&position, 10).await.unwrap_err();
    assert!(matches!(client.state(), ClientState::Failed(_)));
    let pid = read_pid(&pid_file);
    assert!(process_gone(pid).await);
}
