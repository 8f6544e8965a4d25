mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    init, publish, resolve, show, verify, InitArgs, PublishArgs, ResolveArgs, ShowArgs, VerifyArgs,
};
use tracing_subscriber::EnvFilter;

/// Folio CLI - mirror a draft content tree into its published live tree
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log engine activity (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Folio project
    Init(InitArgs),

    /// Apply an operation log to the live tree
    Publish(PublishArgs),

    /// Show which tree a read for a document targets
    Resolve(ResolveArgs),

    /// Check live identities against the draft
    Verify(VerifyArgs),

    /// Print the live tree
    Show(ShowArgs),
}

/// FOLIO_LOG, then RUST_LOG, then warn (debug with --verbose)
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("FOLIO_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(anyhow::Error::from)
        .and_then(|dir| {
            let cwd = dir.display().to_string();
            match cli.command {
                Command::Init(args) => init(args, &cwd),
                Command::Publish(args) => publish(args, &cwd),
                Command::Resolve(args) => resolve(args, &cwd),
                Command::Verify(args) => verify(args, &cwd),
                Command::Show(args) => show(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
