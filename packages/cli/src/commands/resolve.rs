use anyhow::Result;
use clap::Args;
use colored::Colorize;
use folio_mirror::{NodePath, ReadTarget};

use super::open_gate;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Draft path of the document
    pub path: NodePath,

    /// Print the live node reference as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn resolve(args: ResolveArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let gate = open_gate(&config, cwd)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&gate.resolve(&args.path))?);
        return Ok(());
    }

    match gate.read_target(&args.path) {
        ReadTarget::Live(node) => {
            println!("{} {} → {}", "live".green().bold(), args.path, node.path);
            println!("   Identifier: {}", node.identifier);
            if let Some(order) = node.order {
                println!("   Order:      {}", order);
            }
        }
        ReadTarget::Draft => match gate.resolve(&args.path) {
            Some(node) => {
                println!("{} {} ({} is unpublished)", "draft".yellow().bold(), args.path, node.path);
            }
            None => {
                println!("{} {} (never published)", "draft".yellow().bold(), args.path);
            }
        },
    }
    Ok(())
}
