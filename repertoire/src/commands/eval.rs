//! Engine evaluation of stored lines.

use std::collections::HashMap;

use anyhow::{Context as _, Result};
use comfy_table::Cell;
use engine::EngineClient;
use trainer::critical::DEFAULT_SWING_CP;
use trainer::evaluate::LineEvaluation;
use trainer::{evaluate_batch, evaluate_line, line_report, Opening};

use super::Context;
use crate::output::{missing_text, score_text, table, verdict_text};
use crate::persistence::traits::EvalRepository;

pub const DEFAULT_EVAL_DEPTH: u8 = 14;

pub async fn eval_one(ctx: &Context, name: &str, depth: u8) -> Result<()> {
    let opening = ctx.opening(name).await?;
    let mut engine = ctx
        .start_engine()
        .await
        .context("cannot evaluate without a chess engine")?;

    let line = evaluate_line(&mut engine, &opening, depth).await;
    engine.shutdown().await;
    let line = line?;

    ctx.store
        .evals
        .replace_evals(opening.id, depth, &line.results)
        .await?;
    print_line(&opening, &line);

    let evals = ctx.store.evals.load_evals(opening.id).await?;
    let report = line_report(opening.ply_count(), &evals, DEFAULT_SWING_CP);
    println!("Final: {}", score_text(report.final_score));
    println!("{}", verdict_text(&report, &opening.moves));
    if let Some(missing) = missing_text(&report) {
        println!("{}", missing);
    }

    if let Some(reason) = &line.aborted {
        anyhow::bail!("engine failed partway through: {}", reason);
    }
    Ok(())
}

pub async fn eval_all(ctx: &Context, prefix: Option<&str>, depth: u8) -> Result<()> {
    let openings = ctx.openings(prefix, None).await?;
    if openings.is_empty() {
        println!("No openings match");
        return Ok(());
    }

    let mut engine = ctx
        .start_engine()
        .await
        .context("cannot evaluate without a chess engine")?;
    let report = evaluate_batch(&mut engine, &openings, depth).await;
    engine.shutdown().await;

    for line in &report.lines {
        ctx.store
            .evals
            .replace_evals(line.opening_id, depth, &line.results)
            .await?;
    }

    let by_id: HashMap<_, _> = openings.iter().map(|o| (o.id, o)).collect();
    let mut t = table(["Name", "Evaluated", "Skipped", "Status"]);
    for line in &report.lines {
        let name = by_id.get(&line.opening_id).map_or("?", |o| o.name.as_str());
        let status = match &line.aborted {
            Some(reason) => format!("aborted: {}", reason),
            None if line.is_complete() => "complete".to_string(),
            None => "partial".to_string(),
        };
        t.add_row(vec![
            Cell::new(name),
            Cell::new(line.results.len()),
            Cell::new(line.skipped.len()),
            Cell::new(status),
        ]);
    }
    for failed in &report.failed {
        let name = by_id.get(&failed.opening_id).map_or("?", |o| o.name.as_str());
        t.add_row(vec![
            Cell::new(name),
            Cell::new(0),
            Cell::new(0),
            Cell::new(format!("failed: {}", failed.reason)),
        ]);
    }
    println!("{t}");

    if let Some(reason) = &report.aborted {
        let names: Vec<&str> = report
            .not_attempted
            .iter()
            .filter_map(|id| by_id.get(id).map(|o| o.name.as_str()))
            .collect();
        println!("Stopped early: {}", reason);
        if !names.is_empty() {
            println!("Not attempted: {}", names.join(", "));
        }
        anyhow::bail!("evaluation aborted");
    }
    if !report.failed.is_empty() {
        anyhow::bail!("{} line(s) could not be evaluated", report.failed.len());
    }
    Ok(())
}

fn print_line(opening: &Opening, line: &LineEvaluation) {
    let mut t = table(["Ply", "Move", "Score", "Best", "Depth"]);
    for result in &line.results {
        let token = opening
            .moves
            .get(result.ply.saturating_sub(1) as usize)
            .map_or("?", String::as_str);
        t.add_row(vec![
            Cell::new(result.ply),
            Cell::new(trainer::tree::move_label(result.ply, token)),
            Cell::new(result.score.display()),
            Cell::new(result.best_move.as_deref().unwrap_or("-")),
            Cell::new(result.depth),
        ]);
    }
    println!("{}", opening.name);
    println!("{t}");
    for skipped in &line.skipped {
        println!("ply {} skipped: {}", skipped.ply, skipped.reason);
    }
}

/// Engine started on first use. A failed start is remembered so it is not
/// retried for every line.
pub struct LazyEngine<'a> {
    ctx: &'a Context,
    state: LazyState,
}

enum LazyState {
    Idle,
    Running(EngineClient),
    Unavailable,
}

impl<'a> LazyEngine<'a> {
    pub fn new(ctx: &'a Context) -> Self {
        Self {
            ctx,
            state: LazyState::Idle,
        }
    }

    /// The running engine, or `None` when evaluation is unavailable.
    pub async fn client(&mut self) -> Option<&mut EngineClient> {
        if matches!(self.state, LazyState::Idle) {
            self.state = match self.ctx.start_engine().await {
                Ok(client) => LazyState::Running(client),
                Err(e) => {
                    tracing::warn!("Engine unavailable: {}", e);
                    eprintln!("warning: {}; showing stored evaluations only", e);
                    LazyState::Unavailable
                }
            };
        }
        match &mut self.state {
            LazyState::Running(client) if client.is_available() => Some(client),
            _ => None,
        }
    }

    pub async fn shutdown(self) {
        if let LazyState::Running(client) = self.state {
            client.shutdown().await;
        }
    }
}
