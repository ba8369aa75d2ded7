//! Creating, editing and inspecting stored openings.

use anyhow::{Context as _, Result};
use chess::{final_position, parse_moves, DisplayBoard, PieceColor};
use comfy_table::Cell;
use trainer::critical::DEFAULT_SWING_CP;
use trainer::line_report;

use super::{validate_line, Context};
use crate::output::{missing_text, score_text, table, verdict_text};
use crate::persistence::traits::{
    CardRepository, EvalRepository, NoteRepository, OpeningRepository, ReviewLogRepository,
};

pub async fn add(ctx: &Context, name: &str, moves: &str) -> Result<()> {
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "opening name must not be empty");
    let tokens = validate_line(parse_moves(moves)?)
        .with_context(|| format!("rejected line for '{}'", name))?;

    let opening = ctx.store.openings.insert_opening(name, &tokens).await?;
    tracing::info!(id = opening.id, "Added opening {}", opening.name);
    println!("Added '{}' ({} plies)", opening.name, opening.ply_count());
    Ok(())
}

pub async fn edit(ctx: &Context, name: &str, moves: &str) -> Result<()> {
    let opening = ctx.opening(name).await?;
    let tokens = validate_line(parse_moves(moves)?)
        .with_context(|| format!("rejected line for '{}'", name))?;

    ctx.store.openings.replace_moves(opening.id, &tokens).await?;
    println!(
        "Updated '{}' ({} plies); stored evaluations cleared",
        opening.name,
        tokens.len()
    );
    Ok(())
}

pub async fn delete(ctx: &Context, name: &str) -> Result<()> {
    if ctx.store.openings.delete_opening(name).await? {
        println!("Deleted '{}'", name);
        Ok(())
    } else {
        Err(trainer::TrainerError::NotFound(format!("opening '{}'", name)).into())
    }
}

pub async fn list(ctx: &Context, prefix: Option<&str>, limit: Option<u32>) -> Result<()> {
    let openings = ctx.openings(prefix, limit).await?;
    if openings.is_empty() {
        println!("No openings stored");
        return Ok(());
    }

    let mut t = table(["Name", "Plies", "Moves"]);
    for opening in &openings {
        t.add_row(vec![
            Cell::new(&opening.name),
            Cell::new(opening.ply_count()),
            Cell::new(opening.moves_text()),
        ]);
    }
    println!("{t}");
    Ok(())
}

pub async fn show(ctx: &Context, name: &str) -> Result<()> {
    let opening = ctx.opening(name).await?;
    let position = final_position(&opening.moves)?;

    println!("{}", opening.name);
    println!("Moves: {}", trainer::study::numbered_movetext(1, &opening.moves));
    println!("FEN:   {}", position.fen());
    println!();
    print!("{}", DisplayBoard::from_board(&position.board).render(PieceColor::White));
    println!();

    if let Some(note) = ctx.store.notes.get_note(opening.id).await? {
        println!("Note: {}", note.text);
    }

    let evals = ctx.store.evals.load_evals(opening.id).await?;
    if evals.is_empty() {
        println!("Evaluations: none stored");
    } else {
        let report = line_report(opening.ply_count(), &evals, DEFAULT_SWING_CP);
        println!(
            "Evaluations: {}/{} plies, final {}",
            evals.len(),
            opening.ply_count(),
            score_text(report.final_score)
        );
        println!("  {}", verdict_text(&report, &opening.moves));
        if let Some(missing) = missing_text(&report) {
            println!("  {}", missing);
        }
    }

    match ctx.store.cards.load_card(opening.id).await? {
        Some(card) => println!(
            "Review: due {}, interval {}d, ease {:.2}, reps {}, lapses {}",
            card.due_date, card.interval_days, card.ease_factor, card.repetitions, card.lapses
        ),
        None => println!("Review: not scheduled yet"),
    }

    let history = ctx.store.reviews.list_for_opening(opening.id).await?;
    if let Some(last) = history.last() {
        let passes = history.iter().filter(|e| e.outcome.is_pass()).count();
        println!(
            "History: {} reviews, {} passed; last {} on {} ({}/{} correct)",
            history.len(),
            passes,
            last.outcome,
            last.reviewed_on,
            last.correct_tokens,
            last.target_tokens
        );
    }
    Ok(())
}

pub async fn note(ctx: &Context, name: &str, text: &str) -> Result<()> {
    let opening = ctx.opening(name).await?;
    ctx.store.notes.set_note(opening.id, text.trim()).await?;
    println!("Saved note for '{}'", opening.name);
    Ok(())
}
