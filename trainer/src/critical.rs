//! Finding the move where a line's evaluation swings the most.

use chess::Score;
use serde::Serialize;

use crate::model::EvalResult;

/// Swings at or above this many centipawns are flagged.
pub const DEFAULT_SWING_CP: i32 = 120;

/// Score of the position after `ply`, if one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlyScore {
    pub ply: u32,
    pub score: Option<Score>,
}

/// Evaluation change caused by one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Swing {
    /// The move that produced `after`.
    pub ply: u32,
    /// `after - before` in White-perspective centipawns.
    pub delta: i32,
    pub before: Score,
    pub after: Score,
    /// Unscored plies between `before` and `after`.
    pub gap: u32,
}

impl Swing {
    pub fn magnitude(&self) -> i32 {
        self.delta.abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineVerdict {
    Critical(Swing),
    /// Evaluated, but no swing reached the threshold.
    Stable { largest: Option<Swing> },
    /// Fewer than two scored plies.
    Unevaluated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineReport {
    pub verdict: LineVerdict,
    /// Score after the line's last ply, if that ply was scored.
    pub final_score: Option<Score>,
    pub missing_plies: Vec<u32>,
}

impl LineReport {
    pub fn critical(&self) -> Option<&Swing> {
        match &self.verdict {
            LineVerdict::Critical(swing) => Some(swing),
            _ => None,
        }
    }
}

/// Locate the critical move of a line.
///
/// `scores` must be in ply order. Unscored plies are skipped and the delta
/// is taken against the previous scored ply. The largest absolute delta
/// wins, the earliest on ties, and is critical when it reaches `swing_cp`.
pub fn detect_critical(scores: &[PlyScore], swing_cp: i32) -> LineReport {
    let missing_plies: Vec<u32> = scores
        .iter()
        .filter(|s| s.score.is_none())
        .map(|s| s.ply)
        .collect();
    let final_score = scores.last().and_then(|s| s.score);

    let mut previous: Option<(u32, Score)> = None;
    let mut largest: Option<Swing> = None;
    let mut scored = 0usize;

    for entry in scores {
        let Some(after) = entry.score else {
            continue;
        };
        scored += 1;
        if let Some((prev_ply, before)) = previous {
            let swing = Swing {
                ply: entry.ply,
                delta: after.to_cp() - before.to_cp(),
                before,
                after,
                gap: entry.ply.saturating_sub(prev_ply + 1),
            };
            if largest.map_or(true, |best| swing.magnitude() > best.magnitude()) {
                largest = Some(swing);
            }
        }
        previous = Some((entry.ply, after));
    }

    let verdict = if scored < 2 {
        LineVerdict::Unevaluated
    } else {
        match largest {
            Some(swing) if swing.magnitude() >= swing_cp => LineVerdict::Critical(swing),
            _ => LineVerdict::Stable { largest },
        }
    };

    LineReport {
        verdict,
        final_score,
        missing_plies,
    }
}

/// Per-ply scores for a line of `ply_count` plies from stored results.
/// Plies without a stored result come back unscored.
pub fn scores_for_line(ply_count: u32, evals: &[EvalResult]) -> Vec<PlyScore> {
    (1..=ply_count)
        .map(|ply| PlyScore {
            ply,
            score: evals.iter().find(|e| e.ply == ply).map(|e| e.score),
        })
        .collect()
}

pub fn line_report(ply_count: u32, evals: &[EvalResult], swing_cp: i32) -> LineReport {
    detect_critical(&scores_for_line(ply_count, evals), swing_cp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::MATE_SCORE_CP;

    fn cp_line(values: &[i32]) -> Vec<PlyScore> {
        values
            .iter()
            .enumerate()
            .map(|(i, cp)| PlyScore {
                ply: i as u32 + 1,
                score: Some(Score::Centipawns(*cp)),
            })
            .collect()
    }

    #[test]
    fn test_critical_swing_found() {
        let report = detect_critical(&cp_line(&[0, 10, 10, 200, 190]), 120);
        let swing = report.critical().unwrap();
        assert_eq!(swing.ply, 4);
        assert_eq!(swing.delta, 190);
        assert_eq!(swing.gap, 0);
        assert_eq!(report.final_score, Some(Score::Centipawns(190)));
        assert!(report.missing_plies.is_empty());
    }

    #[test]
    fn test_below_threshold_is_stable() {
        let report = detect_critical(&cp_line(&[0, 10, 10, 200, 190]), 250);
        assert!(report.critical().is_none());
        match report.verdict {
            LineVerdict::Stable { largest } => assert_eq!(largest.unwrap().ply, 4),
            other => panic!("unexpected verdict {:?}", other),
        }
    }

    #[test]
    fn test_earliest_ply_wins_ties() {
        let report = detect_critical(&cp_line(&[0, 150, 0]), 100);
        assert_eq!(report.critical().unwrap().ply, 2);
    }

    #[test]
    fn test_missing_plies_are_bridged_not_zeroed() {
        let mut scores = cp_line(&[20, 0, 0, -300]);
        scores[1].score = None;
        scores[2].score = None;
        let report = detect_critical(&scores, 120);
        let swing = report.critical().unwrap();
        assert_eq!(swing.ply, 4);
        assert_eq!(swing.delta, -320);
        assert_eq!(swing.gap, 2);
        assert_eq!(report.missing_plies, vec![2, 3]);
    }

    #[test]
    fn test_too_few_scores_is_unevaluated() {
        let mut scores = cp_line(&[0, 500]);
        scores[1].score = None;
        let report = detect_critical(&scores, 120);
        assert_eq!(report.verdict, LineVerdict::Unevaluated);
        assert_eq!(report.final_score, None);
        assert_eq!(detect_critical(&[], 120).verdict, LineVerdict::Unevaluated);
    }

    #[test]
    fn test_mate_scores_saturate() {
        let scores = vec![
            PlyScore {
                ply: 1,
                score: Some(Score::Mate(5)),
            },
            PlyScore {
                ply: 2,
                score: Some(Score::Mate(2)),
            },
            PlyScore {
                ply: 3,
                score: Some(Score::Centipawns(0)),
            },
        ];
        let report = detect_critical(&scores, 120);
        let swing = report.critical().unwrap();
        assert_eq!(swing.ply, 3);
        assert_eq!(swing.delta, -MATE_SCORE_CP);
    }

    #[test]
    fn test_line_report_from_stored_results() {
        let evals = vec![
            EvalResult {
                opening_id: 1,
                ply: 1,
                score: Score::Centipawns(30),
                best_move: Some("e5".to_string()),
                depth: 10,
            },
            EvalResult {
                opening_id: 1,
                ply: 3,
                score: Score::Centipawns(-200),
                best_move: None,
                depth: 10,
            },
        ];
        let report = line_report(3, &evals, 120);
        assert_eq!(report.missing_plies, vec![2]);
        assert_eq!(report.critical().unwrap().delta, -230);
    }

    #[test]
    fn test_verdict_serializes_with_kind() {
        let json = serde_json::to_value(LineVerdict::Unevaluated).unwrap();
        assert_eq!(json["kind"], "unevaluated");
    }
}
