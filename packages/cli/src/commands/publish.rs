use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_mirror::{MirrorOutcome, OperationLog, Pipeline, RunReport};
use std::path::PathBuf;

use super::{load_draft, open_store};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Operation log (JSON array or JSON lines)
    pub ops: PathBuf,

    /// Draft tree snapshot (defaults to "draft" from the config)
    #[arg(short, long)]
    pub draft: Option<PathBuf>,

    /// Commit operations left after the last commit in the log
    #[arg(short, long)]
    pub commit: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn publish(args: PublishArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let draft = load_draft(&config.get_draft(cwd, args.draft.as_ref())?)?;
    let ops_path = PathBuf::from(cwd).join(&args.ops);
    let log = OperationLog::load(&ops_path)?;

    let mut pipeline = Pipeline::from_config(&config.mirror, open_store(&config, cwd)?)?;

    if args.format == "text" {
        println!("🚀 {} Folio publish", "Starting".green().bold());
        println!("   Operations: {} ({} units)", log.len(), log.units().len());
        println!();
    }

    let mut report = pipeline
        .run(&draft, &log)
        .with_context(|| format!("publishing {}", ops_path.display()))?;

    if report.uncommitted > 0 {
        if args.commit {
            let receipt = pipeline.commit()?;
            report.receipts.push(receipt);
            report.uncommitted = 0;
        } else {
            let lost = pipeline.discard();
            tracing::warn!(lost, "trailing operations were not committed");
        }
    }

    match args.format.as_str() {
        "json" => print_json(&report)?,
        _ => print_text(&report, args.commit),
    }
    Ok(())
}

fn print_text(report: &RunReport, committed_tail: bool) {
    for applied in &report.outcomes {
        let marker = match &applied.outcome {
            MirrorOutcome::Committed(_) => "●".blue(),
            outcome if outcome.is_noop() => "·".yellow(),
            _ => "✓".green(),
        };
        println!(
            "   {} #{:<4} {:<10} {}",
            marker,
            applied.sequence,
            applied.operation,
            describe(&applied.outcome)
        );
    }

    println!();
    println!("✨ {} Publish complete!", "Done".green().bold());
    println!("   Applied: {}", report.applied);
    println!("   Skipped: {}", report.skipped);
    for receipt in &report.receipts {
        println!(
            "   Committed {} → revision {} ({} changes)",
            receipt.unit_id.bright_white(),
            receipt.revision,
            receipt.change_count()
        );
    }
    if report.uncommitted > 0 && !committed_tail {
        println!(
            "   {} {} staged changes were discarded (no trailing commit, use --commit)",
            "Warning:".yellow(),
            report.uncommitted
        );
    }
}

fn print_json(report: &RunReport) -> Result<()> {
    let outcomes: Vec<serde_json::Value> = report
        .outcomes
        .iter()
        .map(|applied| {
            serde_json::json!({
                "sequence": applied.sequence,
                "operation": applied.operation,
                "outcome": applied.outcome.label(),
                "detail": describe(&applied.outcome),
            })
        })
        .collect();

    let json = serde_json::json!({
        "applied": report.applied,
        "skipped": report.skipped,
        "uncommitted": report.uncommitted,
        "receipts": report.receipts,
        "outcomes": outcomes,
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn describe(outcome: &MirrorOutcome) -> String {
    match outcome {
        MirrorOutcome::Created { path, count } => format!("created {} ({} nodes)", path, count),
        MirrorOutcome::Renamed { from, to } => format!("renamed {} → {}", from, to),
        MirrorOutcome::Moved { from, to } => format!("moved {} → {}", from, to),
        MirrorOutcome::Removed { path, count } => format!("removed {} ({} nodes)", path, count),
        MirrorOutcome::Reordered { path, siblings } => {
            format!("reordered {} ({} siblings)", path, siblings)
        }
        MirrorOutcome::Bound(node) => format!("{} bound as {:?}", node.path, node.stage),
        MirrorOutcome::AlreadyMirrored { path } => format!("{} already mirrored", path),
        MirrorOutcome::Unchanged { path } => format!("{} unchanged", path),
        MirrorOutcome::NeverPublished { path } => format!("{} was never published", path),
        MirrorOutcome::Committed(receipt) => {
            format!("revision {} ({} changes)", receipt.revision, receipt.change_count())
        }
    }
}
