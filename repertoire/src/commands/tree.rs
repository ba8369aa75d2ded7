//! Branching view of the stored lines.

use anyhow::Result;
use serde::Serialize;
use trainer::{OpeningTree, TreeRow};

use super::Context;
use crate::output::print_json;

pub const DEFAULT_TREE_LIMIT: u32 = 200;
pub const DEFAULT_TREE_LEVELS: u32 = 3;

#[derive(Debug, Serialize)]
pub struct TreeView {
    pub line_count: usize,
    /// Moves every line shares.
    pub common_prefix: Vec<String>,
    /// Rows below the common start, at most `levels` deep.
    pub rows: Vec<TreeRow>,
    /// Paths to every node with more than one continuation.
    pub decision_points: Vec<Vec<String>>,
}

pub fn tree_view(tree: &OpeningTree, line_count: usize, levels: u32) -> TreeView {
    let common_prefix = tree.common_prefix();
    let shared = common_prefix.len() as u32;
    let rows = tree
        .render(shared.saturating_add(levels))
        .into_iter()
        .filter(|row| row.depth > shared)
        .collect();
    let decision_points = tree
        .decision_points()
        .into_iter()
        .map(|id| tree.path(id))
        .collect();

    TreeView {
        line_count,
        common_prefix,
        rows,
        decision_points,
    }
}

pub async fn execute(
    ctx: &Context,
    prefix: Option<&str>,
    limit: u32,
    levels: u32,
    json: bool,
) -> Result<()> {
    let openings = ctx.openings(prefix, Some(limit)).await?;
    let tree = OpeningTree::build(&openings);
    let view = tree_view(&tree, openings.len(), levels);

    if json {
        return print_json(&view);
    }
    if openings.is_empty() {
        println!("No openings match");
        return Ok(());
    }

    let shared = view.common_prefix.len() as u32;
    if view.common_prefix.is_empty() {
        println!("{} lines, no common start", view.line_count);
    } else {
        println!(
            "{} lines, common start: {}",
            view.line_count,
            trainer::study::numbered_movetext(1, &view.common_prefix)
        );
    }
    for row in &view.rows {
        let indent = "  ".repeat((row.depth - shared - 1) as usize);
        let ends = if row.ends_here.is_empty() { "" } else { " *" };
        println!("{}{} ({}){}", indent, row.label, row.line_count, ends);
    }
    println!("{} decision points", view.decision_points.len());
    Ok(())
}
