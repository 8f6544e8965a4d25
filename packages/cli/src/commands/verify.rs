use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_mirror::{IdentityBinder, IdentityIssue};
use std::path::PathBuf;

use super::{load_draft, open_gate};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Draft tree snapshot (defaults to "draft" from the config)
    #[arg(short, long)]
    pub draft: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn verify(args: VerifyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let draft = load_draft(&config.get_draft(cwd, args.draft.as_ref())?)?;
    let gate = open_gate(&config, cwd)?;

    let issues = IdentityBinder::new().audit(&draft, gate.live(), gate.resolver());

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&issues)?);
    } else {
        println!("🔍 {} live tree at revision {}", "Verifying".green().bold(), gate.revision());
        println!();
        for issue in &issues {
            println!("   {} {}", "✗".red(), describe(issue));
        }
        if issues.is_empty() {
            println!("   {} Live tree matches the draft", "✓".green());
        }
    }

    if !issues.is_empty() {
        return Err(anyhow::anyhow!("{} identity issue(s) found", issues.len()));
    }
    Ok(())
}

fn describe(issue: &IdentityIssue) -> String {
    match issue {
        IdentityIssue::Orphaned { path } => format!("{} has no draft counterpart", path),
        IdentityIssue::Mismatch { path, live, draft } => format!(
            "{} carries {} but the draft has {}",
            path,
            live.as_ref().map_or("no identifier".to_string(), |id| id.to_string()),
            draft.as_ref().map_or("no identifier".to_string(), |id| id.to_string())
        ),
        IdentityIssue::NotReferenceable { path } => format!("{} is not identity-bearing", path),
        IdentityIssue::MissingOrder { path } => format!("{} has no order", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{init, publish, InitArgs, PublishArgs};
    use folio_mirror::NodePath;

    #[test]
    fn test_verify_after_publish() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().display().to_string();
        init(
            InitArgs {
                draft_root: NodePath::root(),
                live_root: NodePath::root(),
                force: false,
            },
            &cwd,
        )
        .unwrap();
        publish(
            PublishArgs {
                ops: PathBuf::from("ops.jsonl"),
                draft: None,
                commit: false,
                format: "text".to_string(),
            },
            &cwd,
        )
        .unwrap();

        let args = || VerifyArgs {
            draft: None,
            format: "text".to_string(),
        };
        assert!(verify(args(), &cwd).is_ok());

        // A draft without /home orphans the live nodes
        std::fs::write(dir.path().join("draft.json"), "{}").unwrap();
        assert!(verify(args(), &cwd).is_err());
    }
}
