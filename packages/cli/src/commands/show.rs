use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_mirror::{NodePath, Tree};
use folio_tree::NodeKey;

use super::open_gate;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Live path to show (defaults to the live root)
    pub path: Option<NodePath>,

    /// Print the subtree as a JSON snapshot
    #[arg(long)]
    pub json: bool,
}

pub fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let gate = open_gate(&config, cwd)?;
    let live = gate.live();

    let path = args
        .path
        .unwrap_or_else(|| config.mirror.live_root.clone());
    let key = live
        .lookup(&path)
        .with_context(|| format!("{} is not in the live tree", path))?;

    if args.json {
        let snapshot = live.snapshot_of(key).unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!(
        "{} revision {} ({} nodes)",
        "Live tree".bright_blue().bold(),
        gate.revision(),
        live.len()
    );
    for line in render(live, key) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per node, indented by depth below `key`
fn render(tree: &Tree, key: NodeKey) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack = vec![(key, 0usize)];

    while let Some((current, depth)) = stack.pop() {
        let Some(node) = tree.node(current) else {
            continue;
        };
        let name = if node.name().is_empty() { "/" } else { node.name() };
        let identifier = node
            .identifier()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let order = node
            .order()
            .map(|order| order.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!(
            "{}{} {} {}",
            "  ".repeat(depth),
            name,
            format!("[{}]", identifier).dimmed(),
            format!("order={}", order).dimmed()
        ));

        for child in tree.children(current).iter().rev() {
            stack.push((*child, depth + 1));
        }
    }
    lines
}
