//! Study sheets: chunked lines with the critical move and final evaluation.

use anyhow::Result;
use trainer::study::DEFAULT_CHUNK;
use trainer::{build_study_sheet, evaluate_line, line_report, needs_evaluation, StudySheet};

use super::eval::LazyEngine;
use super::Context;
use crate::output::{missing_text, print_json, score_text, verdict_text};
use crate::persistence::traits::{EvalRepository, NoteRepository};

pub const DEFAULT_LEARN_DEPTH: u8 = 10;
pub const DEFAULT_LEARN_LIMIT: u32 = 20;

pub struct LearnOptions<'a> {
    pub prefix: Option<&'a str>,
    pub limit: u32,
    pub chunk: usize,
    pub depth: u8,
    pub swing_cp: i32,
    pub evaluate: bool,
    pub json: bool,
}

impl Default for LearnOptions<'_> {
    fn default() -> Self {
        Self {
            prefix: None,
            limit: DEFAULT_LEARN_LIMIT,
            chunk: DEFAULT_CHUNK,
            depth: DEFAULT_LEARN_DEPTH,
            swing_cp: trainer::critical::DEFAULT_SWING_CP,
            evaluate: true,
            json: false,
        }
    }
}

pub async fn execute(ctx: &Context, opts: &LearnOptions<'_>) -> Result<()> {
    let sheets = build_sheets(ctx, opts).await?;
    if opts.json {
        return print_json(&sheets);
    }
    if sheets.is_empty() {
        println!("No openings match");
        return Ok(());
    }
    for sheet in &sheets {
        print_sheet(sheet);
    }
    Ok(())
}

/// Build one sheet per matching opening, evaluating lines whose stored
/// results are missing or were made at another depth.
pub async fn build_sheets(ctx: &Context, opts: &LearnOptions<'_>) -> Result<Vec<StudySheet>> {
    let openings = ctx.openings(opts.prefix, Some(opts.limit)).await?;
    let mut engine = LazyEngine::new(ctx);
    let mut sheets = Vec::with_capacity(openings.len());

    for opening in &openings {
        let mut evals = ctx.store.evals.load_evals(opening.id).await?;

        if opts.evaluate && needs_evaluation(opening.ply_count(), &evals, opts.depth) {
            if let Some(client) = engine.client().await {
                match evaluate_line(client, opening, opts.depth).await {
                    Ok(line) => {
                        ctx.store
                            .evals
                            .replace_evals(opening.id, opts.depth, &line.results)
                            .await?;
                        evals = ctx.store.evals.load_evals(opening.id).await?;
                    }
                    Err(e) => tracing::warn!("Cannot evaluate {}: {}", opening.name, e),
                }
            }
        }

        let report = line_report(opening.ply_count(), &evals, opts.swing_cp);
        let note = ctx.store.notes.get_note(opening.id).await?.map(|n| n.text);
        sheets.push(build_study_sheet(opening, opts.chunk, Some(report), note));
    }

    engine.shutdown().await;
    Ok(sheets)
}

fn print_sheet(sheet: &StudySheet) {
    let moves: Vec<String> = sheet
        .chunks
        .iter()
        .flat_map(|c| c.tokens.iter().cloned())
        .collect();
    let critical_ply = sheet
        .report
        .as_ref()
        .and_then(|r| r.critical())
        .map(|s| s.ply);

    println!("== {} ({} plies) ==", sheet.name, moves.len());
    for chunk in &sheet.chunks {
        let end_ply = chunk.start_ply + chunk.tokens.len() as u32;
        let marker = match critical_ply {
            Some(ply) if (chunk.start_ply..end_ply).contains(&ply) => "   <- critical",
            _ => "",
        };
        println!("  {}{}", chunk.text, marker);
    }
    if let Some(report) = &sheet.report {
        println!("  final eval: {}", score_text(report.final_score));
        println!("  {}", verdict_text(report, &moves));
        if let Some(missing) = missing_text(report) {
            println!("  {}", missing);
        }
    }
    if let Some(note) = &sheet.note {
        println!("  note: {}", note);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::persistence::traits::OpeningRepository;
    use crate::persistence::Database;
    use chess::Score;
    use trainer::{EvalResult, LineVerdict};

    fn line(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn test_sheets_use_stored_evals_without_engine() {
        let db = Database::new_in_memory().await.unwrap();
        let ctx = Context::new(db, EngineSettings::from_env(None));

        let op = ctx
            .store
            .openings
            .insert_opening("Petrov", &line("e4 e5 Nf3 Nf6 Nxe5"))
            .await
            .unwrap();
        let scores = [0, 10, 10, 200, 190];
        let evals: Vec<EvalResult> = scores
            .iter()
            .enumerate()
            .map(|(i, cp)| EvalResult {
                opening_id: op.id,
                ply: i as u32 + 1,
                score: Score::Centipawns(*cp),
                best_move: None,
                depth: 10,
            })
            .collect();
        ctx.store.evals.replace_evals(op.id, 10, &evals).await.unwrap();
        ctx.store.notes.set_note(op.id, "grab the pawn").await.unwrap();

        let opts = LearnOptions {
            evaluate: false,
            ..LearnOptions::default()
        };
        let sheets = build_sheets(&ctx, &opts).await.unwrap();
        assert_eq!(sheets.len(), 1);

        let sheet = &sheets[0];
        assert_eq!(sheet.chunks.len(), 3);
        assert_eq!(sheet.chunks[2].tokens, vec!["Nxe5"]);
        assert_eq!(sheet.note.as_deref(), Some("grab the pawn"));
        let report = sheet.report.as_ref().unwrap();
        match report.verdict {
            LineVerdict::Critical(swing) => {
                assert_eq!(swing.ply, 4);
                assert_eq!(swing.delta, 190);
            }
            other => panic!("unexpected verdict: {other:?}"),
        }
        assert_eq!(sheet.final_score(), Some(Score::Centipawns(190)));
    }

    #[tokio::test]
    async fn test_unevaluated_lines_report_missing_plies() {
        let db = Database::new_in_memory().await.unwrap();
        let ctx = Context::new(db, EngineSettings::from_env(None));
        ctx.store
            .openings
            .insert_opening("Dutch", &line("d4 f5"))
            .await
            .unwrap();

        let opts = LearnOptions {
            evaluate: false,
            ..LearnOptions::default()
        };
        let sheets = build_sheets(&ctx, &opts).await.unwrap();
        let report = sheets[0].report.as_ref().unwrap();
        assert_eq!(report.verdict, LineVerdict::Unevaluated);
        assert_eq!(report.missing_plies, vec![1, 2]);
        assert_eq!(sheets[0].final_score(), None);
    }
}
