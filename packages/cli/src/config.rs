use anyhow::Context;
use folio_mirror::MirrorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Engine settings (roots, order step, history, content mapping)
    #[serde(flatten)]
    pub mirror: MirrorConfig,

    /// File holding the committed live tree
    #[serde(default = "default_live_store")]
    pub live_store: String,

    /// Draft snapshot used when a command gets no `--draft`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
}

fn default_live_store() -> String {
    "live.json".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        let config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("reading {}", config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parsing {}", config_path.display()))?
        } else {
            // Return default config if none exists
            Config::default()
        };

        config.mirror.validate()?;
        Ok(config)
    }

    /// Get absolute path to the live store file
    pub fn get_live_store(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.live_store)
    }

    /// Draft snapshot path, preferring an explicit argument
    pub fn get_draft(&self, cwd: &str, explicit: Option<&PathBuf>) -> anyhow::Result<PathBuf> {
        match (explicit, &self.draft) {
            (Some(path), _) => Ok(PathBuf::from(cwd).join(path)),
            (None, Some(path)) => Ok(PathBuf::from(cwd).join(path)),
            (None, None) => Err(anyhow::anyhow!(
                "No draft snapshot given. Pass --draft or set \"draft\" in {}",
                DEFAULT_CONFIG_NAME
            )),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror: MirrorConfig::default(),
            live_store: default_live_store(),
            draft: None,
        }
    }
}
