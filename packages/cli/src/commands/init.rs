use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_mirror::{Identifier, MirrorConfig, NodePath, Operation, OperationLog, Tree};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Root of the mirrored draft hierarchy
    #[arg(long, default_value = "/")]
    pub draft_root: NodePath,

    /// Root the draft is mirrored under
    #[arg(long, default_value = "/")]
    pub live_root: NodePath,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Folio project...".bright_blue().bold());

    // Create example draft snapshot
    let draft_file = PathBuf::from(cwd).join("draft.json");
    if !draft_file.exists() {
        fs::write(&draft_file, example_draft(&args.draft_root)?.to_json()?)?;
        println!("  {} Created draft.json", "✓".green());
    }

    // Create example operation log
    let ops_file = PathBuf::from(cwd).join("ops.jsonl");
    if !ops_file.exists() {
        fs::write(&ops_file, example_log(&args.draft_root)?)?;
        println!("  {} Created ops.jsonl", "✓".green());
    }

    let config = Config {
        mirror: MirrorConfig {
            draft_root: args.draft_root.clone(),
            live_root: args.live_root.clone(),
            ..MirrorConfig::default()
        },
        draft: Some("draft.json".to_string()),
        ..Config::default()
    };
    config.mirror.validate()?;

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    if !args.live_root.is_root() {
        println!("  0. Make sure {} exists in the live store", args.live_root);
    }
    println!("  1. Edit draft.json and ops.jsonl");
    println!("  2. Run: folio publish ops.jsonl");
    println!("  3. Check the result with: folio show");

    Ok(())
}

fn example_draft(root: &NodePath) -> Result<Tree> {
    let mut draft = Tree::new();
    let mut path = NodePath::root();
    for segment in root.segments() {
        path = path.join(segment)?;
        draft.insert(&path, Some(Identifier::new(format!("draft:{}", path))))?;
    }

    let home = root.join("home")?;
    draft.insert(&home, Some(Identifier::new("home")))?;
    draft.insert(&home.join("about")?, Some(Identifier::new("about")))?;
    Ok(draft)
}

fn example_log(root: &NodePath) -> Result<String> {
    let home = root.join("home")?;
    let log: OperationLog = vec![
        Operation::Create {
            path: home.clone(),
            is_new: true,
            prior_path: None,
        },
        Operation::Copy {
            path: home.join("about")?,
        },
        Operation::Publish { path: home },
        Operation::Commit,
    ]
    .into_iter()
    .collect();

    let mut lines = String::new();
    for entry in log.iter() {
        lines.push_str(&serde_json::to_string(&entry.operation)?);
        lines.push('\n');
    }
    Ok(lines)
}
