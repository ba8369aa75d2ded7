//! Terminal formatting shared by the commands.

use anyhow::Result;
use chess::Score;
use comfy_table::{Cell, Table};
use serde::Serialize;
use trainer::{LineReport, LineVerdict, Swing};

/// Placeholder for an evaluation that is not available.
pub const MISSING: &str = "n/a";

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn table<I, S>(header: I) -> Table
where
    I: IntoIterator<Item = S>,
    S: Into<Cell>,
{
    let mut table = Table::new();
    table.set_header(header);
    table
}

pub fn score_text(score: Option<Score>) -> String {
    score.map_or_else(|| MISSING.to_string(), |s| s.display())
}

/// `2... Nf6 (+0.10 -> +2.00, +190 cp)`. `token` is the SAN played at the
/// swing's ply.
pub fn swing_text(swing: &Swing, token: &str) -> String {
    format!(
        "{} ({} -> {}, {:+} cp{})",
        trainer::tree::move_label(swing.ply, token),
        swing.before.display(),
        swing.after.display(),
        swing.delta,
        if swing.gap > 0 {
            format!(", across {} missing", swing.gap)
        } else {
            String::new()
        }
    )
}

/// One-line summary of a line report.
pub fn verdict_text(report: &LineReport, moves: &[String]) -> String {
    let token_at = |ply: u32| {
        moves
            .get(ply.saturating_sub(1) as usize)
            .map(String::as_str)
            .unwrap_or("?")
    };
    match &report.verdict {
        LineVerdict::Critical(swing) => {
            format!("critical: {}", swing_text(swing, token_at(swing.ply)))
        }
        LineVerdict::Stable { largest: Some(swing) } => {
            format!("stable, largest swing {}", swing_text(swing, token_at(swing.ply)))
        }
        LineVerdict::Stable { largest: None } => "stable".to_string(),
        LineVerdict::Unevaluated => "not enough evaluations".to_string(),
    }
}

pub fn missing_text(report: &LineReport) -> Option<String> {
    if report.missing_plies.is_empty() {
        return None;
    }
    let plies: Vec<String> = report.missing_plies.iter().map(u32::to_string).collect();
    Some(format!("missing evaluations at ply {}", plies.join(", ")))
}
