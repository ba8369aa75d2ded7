//! Review queue and interactive quizzing.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use trainer::{
    apply_outcome, check_typed_moves, due_entries, pick_for_quiz, seed_or_load, Opening,
    OpeningId, Outcome, QueueEntry, ReviewLogEntry,
};

use super::Context;
use crate::output::{print_json, table};
use crate::persistence::traits::{
    CardRepository, NoteRepository, OpeningRepository, ReviewLogRepository,
};

pub const DEFAULT_DUE_LIMIT: usize = 20;
pub const DEFAULT_QUIZ_LIMIT: usize = 10;
pub const DEFAULT_QUIZ_TOKENS: usize = 10;

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Cards for every matching opening, creating the missing ones. New cards
/// are only saved when `persist` is set.
pub async fn load_queue(
    ctx: &Context,
    prefix: Option<&str>,
    today: NaiveDate,
    persist: bool,
) -> Result<(Vec<QueueEntry>, HashMap<OpeningId, Opening>)> {
    let openings = ctx.store.openings.list_openings(prefix, None).await?;
    let mut entries = Vec::with_capacity(openings.len());
    let mut seeded = 0usize;

    for opening in &openings {
        let existing = ctx.store.cards.load_card(opening.id).await?;
        let card = seed_or_load(opening.id, existing, today);
        if card.was_created() && persist {
            ctx.store.cards.save_card(card.card()).await?;
            seeded += 1;
        }
        entries.push(QueueEntry {
            opening_id: opening.id,
            name: opening.name.clone(),
            card: card.into_card(),
        });
    }
    if seeded > 0 {
        tracing::info!("Seeded {} review cards", seeded);
    }

    let by_id = openings.into_iter().map(|o| (o.id, o)).collect();
    Ok((entries, by_id))
}

pub async fn due(ctx: &Context, prefix: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let today = today();
    let (entries, _) = load_queue(ctx, prefix, today, true).await?;
    let due = due_entries(&entries, today, limit);

    if json {
        return print_json(&due);
    }
    if due.is_empty() {
        println!("Nothing due today");
        return Ok(());
    }

    let mut t = table(["Name", "Due", "Interval", "Ease", "Reps", "Lapses"]);
    for entry in &due {
        let card = &entry.card;
        t.add_row(vec![
            Cell::new(&entry.name),
            Cell::new(card.due_date),
            Cell::new(format!("{}d", card.interval_days)),
            Cell::new(format!("{:.2}", card.ease_factor)),
            Cell::new(card.repetitions),
            Cell::new(card.lapses),
        ]);
    }
    println!("{t}");
    Ok(())
}

pub struct QuizOptions<'a> {
    pub prefix: Option<&'a str>,
    pub limit: usize,
    pub tokens: usize,
    pub dry_run: bool,
    pub grade: Option<Outcome>,
}

pub async fn quiz(ctx: &Context, opts: &QuizOptions<'_>) -> Result<()> {
    let mut out = tokio::io::stdout();
    if opts.dry_run {
        return quiz_preview(ctx, opts, today(), &mut out).await;
    }
    let mut input = BufReader::new(tokio::io::stdin());
    quiz_with_io(ctx, opts, today(), &mut input, &mut out).await
}

/// Lines a quiz would ask today, in order. Reads only.
pub async fn quiz_preview<W>(
    ctx: &Context,
    opts: &QuizOptions<'_>,
    today: NaiveDate,
    out: &mut W,
) -> Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let (entries, _) = load_queue(ctx, opts.prefix, today, false).await?;
    let picked = pick_for_quiz(&entries, today, opts.limit);
    if picked.is_empty() {
        write_line(out, "No openings to quiz").await?;
        return Ok(());
    }

    write_line(out, &format!("[dry run] {} line(s) would be quizzed:", picked.len())).await?;
    for entry in picked {
        write_line(out, &format!("  {} (due {})", entry.name, entry.card.due_date)).await?;
    }
    Ok(())
}

/// Quiz loop over arbitrary input and output, so it can run without a
/// terminal.
pub async fn quiz_with_io<R, W>(
    ctx: &Context,
    opts: &QuizOptions<'_>,
    today: NaiveDate,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    let (entries, openings) = load_queue(ctx, opts.prefix, today, true).await?;
    let picked = pick_for_quiz(&entries, today, opts.limit);
    if picked.is_empty() {
        write_line(out, "No openings to quiz").await?;
        return Ok(());
    }

    for entry in picked {
        let Some(opening) = openings.get(&entry.opening_id) else {
            continue;
        };
        let n_tokens = opts.tokens.min(opening.moves.len());
        write_line(out, &format!("\n{} (due {})", opening.name, entry.card.due_date)).await?;
        write_prompt(out, &format!("Type the first {} moves: ", n_tokens)).await?;
        let Some(typed) = read_line(input).await? else {
            break;
        };

        let check = check_typed_moves(&opening.moves, &typed, n_tokens);
        write_line(
            out,
            &format!("Correct: {}/{}", check.correct_tokens, check.target_tokens()),
        )
        .await?;
        if let Some((expected, got)) = check.first_mistake() {
            let ply = check.correct_tokens as u32 + 1;
            write_line(
                out,
                &format!(
                    "First mistake at {}: got {}",
                    trainer::tree::move_label(ply, expected),
                    got.unwrap_or("nothing")
                ),
            )
            .await?;
        }
        write_line(
            out,
            &format!("Line: {}", trainer::study::numbered_movetext(1, &check.target)),
        )
        .await?;

        let default = if check.fully_correct() {
            Outcome::Pass
        } else {
            Outcome::Fail
        };
        let outcome = match opts.grade {
            Some(grade) => grade,
            None => match ask_grade(input, out, default).await? {
                Some(outcome) => outcome,
                None => break,
            },
        };

        let next = apply_outcome(&entry.card, outcome, today);
        ctx.store.cards.save_card(&next).await?;
        ctx.store
            .reviews
            .append(&ReviewLogEntry {
                opening_id: opening.id,
                reviewed_on: today,
                outcome,
                typed: check.typed.clone(),
                correct_tokens: check.correct_tokens as u32,
                target_tokens: check.target_tokens() as u32,
            })
            .await?;
        write_line(
            out,
            &format!(
                "Recorded {}; next review {} (in {}d)",
                outcome, next.due_date, next.interval_days
            ),
        )
        .await?;

        if let Some(note) = ctx.store.notes.get_note(opening.id).await? {
            write_line(out, &format!("Note: {}", note.text)).await?;
        }
    }
    Ok(())
}

/// Prompt until the answer parses. An empty answer takes `default`; end of
/// input yields `None`.
async fn ask_grade<R, W>(input: &mut R, out: &mut W, default: Outcome) -> Result<Option<Outcome>>
where
    R: AsyncBufRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    loop {
        write_prompt(out, &format!("Grade 0-5, pass or fail [{}]: ", default)).await?;
        let Some(answer) = read_line(input).await? else {
            return Ok(None);
        };
        if answer.trim().is_empty() {
            return Ok(Some(default));
        }
        match answer.parse::<Outcome>() {
            Ok(outcome) => return Ok(Some(outcome)),
            Err(e) => write_line(out, &e).await?,
        }
    }
}

async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
}

async fn write_line<W: tokio::io::AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

async fn write_prompt<W: tokio::io::AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}
