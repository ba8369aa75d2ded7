//! Bulk import of lines from a tab-separated file.
//!
//! Each non-blank line that does not start with `#` is either
//! `<name>\t<movetext>` or bare movetext, which gets a generated name.
//! Movetext may carry PGN move numbers and a result token.

use std::path::Path;

use anyhow::{Context as _, Result};
use chess::movetext_tokens;

use super::{validate_line, Context};
use crate::persistence::traits::OpeningRepository;
use crate::persistence::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    /// 1-based line number in the source file.
    pub line_no: usize,
    pub name: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub fn parse_import(text: &str) -> Vec<ImportRow> {
    let mut rows = Vec::new();
    let mut auto = 1usize;
    let mut next_auto_name = || {
        let name = format!("Imported line {}", auto);
        auto += 1;
        name
    };

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, movetext) = match line.split_once('\t') {
            Some((name, movetext)) => {
                let name = name.trim();
                let name = if name.is_empty() {
                    next_auto_name()
                } else {
                    name.to_string()
                };
                (name, movetext)
            }
            None => (next_auto_name(), line),
        };
        rows.push(ImportRow {
            line_no: idx + 1,
            name,
            tokens: movetext_tokens(movetext),
        });
    }
    rows
}

pub async fn execute(
    ctx: &Context,
    path: &Path,
    name_prefix: &str,
    dry_run: bool,
) -> Result<ImportSummary> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = parse_import(&text);
    anyhow::ensure!(
        !rows.is_empty(),
        "no importable lines found in {}",
        path.display()
    );

    let mut summary = ImportSummary::default();
    for row in rows {
        let full_name = format!("{}{}", name_prefix, row.name).trim().to_string();

        let tokens = match validate_line(row.tokens) {
            Ok(tokens) => tokens,
            Err(e) => {
                summary.failed += 1;
                println!("FAIL (line {}): {}: {}", row.line_no, full_name, e);
                continue;
            }
        };

        if dry_run {
            summary.added += 1;
            println!("OK (validated): {}", full_name);
            continue;
        }

        match ctx.store.openings.insert_opening(&full_name, &tokens).await {
            Ok(_) => {
                summary.added += 1;
                println!("ADDED: {}", full_name);
            }
            Err(PersistenceError::DuplicateName(_)) => {
                summary.skipped += 1;
                println!("SKIP (already exists): {}", full_name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!(
        "Done. added={} skipped={} failed={} dry_run={}",
        summary.added, summary.skipped, summary.failed, dry_run
    );
    Ok(summary)
}
