pub mod init;
pub mod publish;
pub mod resolve;
pub mod show;
pub mod verify;

pub use init::{init, InitArgs};
pub use publish::{publish, PublishArgs};
pub use resolve::{resolve, ResolveArgs};
pub use show::{show, ShowArgs};
pub use verify::{verify, VerifyArgs};

use anyhow::{Context, Result};
use folio_mirror::{LiveStore, PublicationGate, Tree};
use std::path::Path;

use crate::config::Config;

/// Load a draft tree snapshot
pub(crate) fn load_draft(path: &Path) -> Result<Tree> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading draft {}", path.display()))?;
    Tree::from_json(&json).with_context(|| format!("parsing draft {}", path.display()))
}

/// Open the configured live store
pub(crate) fn open_store(config: &Config, cwd: &str) -> Result<LiveStore> {
    let path = config.get_live_store(cwd);
    LiveStore::open(&path).with_context(|| format!("opening live store {}", path.display()))
}

/// Open the configured live store behind a gate
pub(crate) fn open_gate(config: &Config, cwd: &str) -> Result<PublicationGate> {
    Ok(PublicationGate::new(open_store(config, cwd)?, config.mirror.resolver()))
}
