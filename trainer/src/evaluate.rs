//! Per-ply engine evaluation of stored lines.

use chess::replay_san;
use engine::Evaluator;
use serde::Serialize;

use crate::model::{EvalResult, Opening, OpeningId};
use crate::TrainerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedPly {
    pub ply: u32,
    pub reason: String,
}

/// Whatever could be evaluated for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineEvaluation {
    pub opening_id: OpeningId,
    pub results: Vec<EvalResult>,
    pub skipped: Vec<SkippedPly>,
    /// Set when the engine became unusable partway through this line.
    pub aborted: Option<String>,
}

impl LineEvaluation {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty() && self.aborted.is_none()
    }
}

/// A stored line that could not be evaluated at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLine {
    pub opening_id: OpeningId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Lines that were attempted, including a partially done aborted one.
    pub lines: Vec<LineEvaluation>,
    pub failed: Vec<FailedLine>,
    pub aborted: Option<String>,
    pub not_attempted: Vec<OpeningId>,
}

/// Evaluate the position after every ply of `opening`.
///
/// Non-fatal engine errors skip the ply; a fatal one stops the line and is
/// recorded in [`LineEvaluation::aborted`]. Results gathered so far are
/// always returned.
#[tracing::instrument(level = "info", skip(evaluator, opening), fields(opening = %opening.name))]
pub async fn evaluate_line<E: Evaluator>(
    evaluator: &mut E,
    opening: &Opening,
    depth: u8,
) -> Result<LineEvaluation, TrainerError> {
    let snapshots = replay_san(&opening.moves)?;
    let mut line = LineEvaluation {
        opening_id: opening.id,
        results: Vec::with_capacity(snapshots.len()),
        skipped: Vec::new(),
        aborted: None,
    };

    for snapshot in &snapshots {
        match evaluator.evaluate(snapshot, depth).await {
            Ok(eval) => line.results.push(EvalResult {
                opening_id: opening.id,
                ply: snapshot.ply,
                score: eval.score,
                best_move: eval.best_move_san,
                depth,
            }),
            Err(e) if e.is_fatal() => {
                tracing::warn!("Engine unavailable at ply {}: {}", snapshot.ply, e);
                line.aborted = Some(e.to_string());
                break;
            }
            Err(e) => {
                tracing::warn!("Skipping ply {}: {}", snapshot.ply, e);
                line.skipped.push(SkippedPly {
                    ply: snapshot.ply,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(line)
}

/// Evaluate several lines in order with one evaluator.
///
/// A line that fails on its own (it no longer replays) is recorded in
/// [`BatchReport::failed`] and the batch moves on. Only a fatal engine error
/// stops it; the lines after that are listed as not attempted.
pub async fn evaluate_batch<E: Evaluator>(
    evaluator: &mut E,
    openings: &[Opening],
    depth: u8,
) -> BatchReport {
    let mut report = BatchReport::default();

    for (idx, opening) in openings.iter().enumerate() {
        if !evaluator.is_available() {
            report.aborted = Some("engine unavailable".to_string());
            report.not_attempted = openings[idx..].iter().map(|o| o.id).collect();
            break;
        }
        let line = match evaluate_line(evaluator, opening, depth).await {
            Ok(line) => line,
            Err(TrainerError::Engine(e)) if e.is_fatal() => {
                report.aborted = Some(e.to_string());
                report.not_attempted = openings[idx..].iter().map(|o| o.id).collect();
                break;
            }
            Err(e) => {
                tracing::warn!("Cannot evaluate {}: {}", opening.name, e);
                report.failed.push(FailedLine {
                    opening_id: opening.id,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let aborted = line.aborted.clone();
        report.lines.push(line);
        if let Some(reason) = aborted {
            report.aborted = Some(reason);
            report.not_attempted = openings[idx + 1..].iter().map(|o| o.id).collect();
            break;
        }
    }

    report
}

/// True unless every ply already has a result at `depth`.
pub fn needs_evaluation(ply_count: u32, stored: &[EvalResult], depth: u8) -> bool {
    (1..=ply_count).any(|ply| !stored.iter().any(|e| e.ply == ply && e.depth == depth))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use chess::{PositionSnapshot, Score};
    use engine::{EngineError, Evaluation};

    /// Answers from a fixed script, one entry per call.
    struct ScriptedEvaluator {
        script: VecDeque<Result<i32, EngineError>>,
        calls: usize,
        failed: bool,
    }

    impl ScriptedEvaluator {
        fn new(script: Vec<Result<i32, EngineError>>) -> Self {
            Self {
                script: script.into(),
                calls: 0,
                failed: false,
            }
        }
    }

    impl Evaluator for ScriptedEvaluator {
        async fn evaluate(
            &mut self,
            position: &PositionSnapshot,
            depth: u8,
        ) -> Result<Evaluation, EngineError> {
            self.calls += 1;
            if self.failed {
                return Err(EngineError::Unavailable("gone".to_string()));
            }
            match self.script.pop_front() {
                Some(Ok(cp)) => Ok(Evaluation {
                    score: Score::Centipawns(cp).to_white_perspective(position.side_to_move()),
                    best_move_uci: None,
                    best_move_san: None,
                    depth,
                }),
                Some(Err(e)) => {
                    if e.is_fatal() {
                        self.failed = true;
                    }
                    Err(e)
                }
                None => Err(EngineError::Protocol("script exhausted".to_string())),
            }
        }

        fn is_available(&self) -> bool {
            !self.failed
        }
    }

    fn opening(id: OpeningId, moves: &str) -> Opening {
        Opening {
            id,
            name: format!("line {}", id),
            moves: moves.split_whitespace().map(str::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_line_scores_every_ply() {
        let mut evaluator = ScriptedEvaluator::new(vec![Ok(30), Ok(-25), Ok(40)]);
        let line = evaluate_line(&mut evaluator, &opening(1, "e4 e5 Nf3"), 12)
            .await
            .unwrap();
        assert!(line.is_complete());
        let plies: Vec<u32> = line.results.iter().map(|r| r.ply).collect();
        assert_eq!(plies, vec![1, 2, 3]);
        // Ply 1 leaves Black to move, so the raw score is flipped.
        assert_eq!(line.results[0].score, Score::Centipawns(-30));
        assert_eq!(line.results[1].score, Score::Centipawns(-25));
        assert_eq!(line.results[0].depth, 12);
    }

    #[tokio::test]
    async fn test_timeout_skips_ply() {
        let mut evaluator = ScriptedEvaluator::new(vec![
            Ok(10),
            Err(EngineError::Timeout(std::time::Duration::from_secs(1))),
            Ok(20),
        ]);
        let line = evaluate_line(&mut evaluator, &opening(1, "d4 d5 c4"), 10)
            .await
            .unwrap();
        assert_eq!(line.results.len(), 2);
        assert_eq!(line.skipped.len(), 1);
        assert_eq!(line.skipped[0].ply, 2);
        assert!(line.aborted.is_none());
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_batch_with_partial_results() {
        let mut evaluator = ScriptedEvaluator::new(vec![
            Ok(10),
            Ok(10),
            Ok(15),
            Err(EngineError::Unavailable("crashed".to_string())),
        ]);
        let openings = vec![
            opening(1, "e4 e5"),
            opening(2, "d4 d5 c4"),
            opening(3, "c4"),
        ];
        let report = evaluate_batch(&mut evaluator, &openings, 10).await;
        assert_eq!(report.lines.len(), 2);
        assert!(report.lines[0].is_complete());
        assert_eq!(report.lines[1].results.len(), 1);
        assert!(report.lines[1].aborted.is_some());
        assert!(report.aborted.is_some());
        assert_eq!(report.not_attempted, vec![3]);
        assert_eq!(evaluator.calls, 4);
    }

    #[tokio::test]
    async fn test_unavailable_evaluator_attempts_nothing() {
        let mut evaluator = ScriptedEvaluator::new(vec![]);
        evaluator.failed = true;
        let report = evaluate_batch(&mut evaluator, &[opening(1, "e4"), opening(2, "d4")], 10).await;
        assert!(report.lines.is_empty());
        assert_eq!(report.not_attempted, vec![1, 2]);
        assert_eq!(evaluator.calls, 0);
    }

    #[tokio::test]
    async fn test_invalid_stored_line_is_an_error() {
        let mut evaluator = ScriptedEvaluator::new(vec![]);
        let err = evaluate_line(&mut evaluator, &opening(1, "e4 Ke7 Ke3"), 10)
            .await
            .unwrap_err();
        assert!(matches!(err, TrainerError::Replay(_)));
    }

    #[tokio::test]
    async fn test_bad_line_is_reported_and_batch_continues() {
        let mut evaluator = ScriptedEvaluator::new(vec![Ok(10), Ok(20), Ok(-5)]);
        let openings = vec![
            opening(1, "e4"),
            opening(2, "e4 Ke7 Ke3"),
            opening(3, "d4 d5"),
        ];
        let report = evaluate_batch(&mut evaluator, &openings, 10).await;

        let done: Vec<OpeningId> = report.lines.iter().map(|l| l.opening_id).collect();
        assert_eq!(done, vec![1, 3]);
        assert!(report.lines.iter().all(LineEvaluation::is_complete));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].opening_id, 2);
        assert!(report.failed[0].reason.contains("ply 2"), "{}", report.failed[0].reason);
        assert!(report.aborted.is_none());
        assert!(report.not_attempted.is_empty());
        assert_eq!(evaluator.calls, 3);
    }

    #[tokio::test]
    async fn test_results_carry_requested_depth() {
        struct ShallowEngine;
        impl Evaluator for ShallowEngine {
            async fn evaluate(
                &mut self,
                _position: &PositionSnapshot,
                _depth: u8,
            ) -> Result<Evaluation, EngineError> {
                Ok(Evaluation {
                    score: Score::Centipawns(0),
                    best_move_uci: None,
                    best_move_san: None,
                    depth: 7,
                })
            }
        }

        let line = evaluate_line(&mut ShallowEngine, &opening(1, "c4 e5"), 16)
            .await
            .unwrap();
        assert!(line.results.iter().all(|r| r.depth == 16));
        assert!(!needs_evaluation(2, &line.results, 16));
    }

    #[test]
    fn test_needs_evaluation() {
        let stored = vec![
            EvalResult {
                opening_id: 1,
                ply: 1,
                score: Score::Centipawns(0),
                best_move: None,
                depth: 10,
            },
            EvalResult {
                opening_id: 1,
                ply: 2,
                score: Score::Centipawns(0),
                best_move: None,
                depth: 10,
            },
        ];
        assert!(!needs_evaluation(2, &stored, 10));
        assert!(needs_evaluation(2, &stored, 14));
        assert!(needs_evaluation(3, &stored, 10));
    }
}
