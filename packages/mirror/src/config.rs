use std::sync::Arc;

use folio_tree::NodePath;
use serde::{Deserialize, Serialize};

use crate::content::{ContentMapper, CopyProperties, StructureOnly};
use crate::errors::{MirrorError, MirrorResult};
use crate::resolver::PathResolver;
use crate::sequencer::{OrderSequencer, DEFAULT_ORDER_STEP};

/// Engine settings shared by every component of one mirror
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Root of the mirrored draft hierarchy
    #[serde(default = "NodePath::root")]
    pub draft_root: NodePath,

    /// Root the draft hierarchy is mirrored under
    #[serde(default = "NodePath::root")]
    pub live_root: NodePath,

    /// Gap between consecutive sibling orders
    #[serde(default = "default_order_step")]
    pub order_step: i64,

    /// Number of commit receipts kept (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Copy draft properties onto created live nodes
    #[serde(default)]
    pub copy_properties: bool,
}

fn default_order_step() -> i64 {
    DEFAULT_ORDER_STEP
}

fn default_history_limit() -> usize {
    50
}

impl MirrorConfig {
    pub fn validate(&self) -> MirrorResult<()> {
        if self.order_step <= 0 {
            return Err(MirrorError::InvalidConfig(format!(
                "orderStep must be positive, got {}",
                self.order_step
            )));
        }
        Ok(())
    }

    pub fn resolver(&self) -> PathResolver {
        PathResolver::new(self.draft_root.clone(), self.live_root.clone())
    }

    pub fn sequencer(&self) -> OrderSequencer {
        OrderSequencer::new(self.resolver(), self.order_step)
    }

    pub fn mapper(&self) -> Arc<dyn ContentMapper> {
        if self.copy_properties {
            Arc::new(CopyProperties)
        } else {
            Arc::new(StructureOnly)
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            draft_root: NodePath::root(),
            live_root: NodePath::root(),
            order_step: default_order_step(),
            history_limit: default_history_limit(),
            copy_properties: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "draftRoot": "/cmf/sulu_io/contents",
            "liveRoot": "/live/sulu_io",
            "orderStep": 100,
            "copyProperties": true
        }"#;

        let config: MirrorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.draft_root.as_str(), "/cmf/sulu_io/contents");
        assert_eq!(config.live_root.as_str(), "/live/sulu_io");
        assert_eq!(config.order_step, 100);
        assert_eq!(config.history_limit, 50);
        assert_eq!(config.mapper().name(), "copy-properties");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config() {
        let config: MirrorConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config, MirrorConfig::default());
        assert_eq!(config.sequencer().step(), 10);
        assert_eq!(config.mapper().name(), "structure-only");
    }

    #[test]
    fn test_rejects_non_positive_step() {
        let config = MirrorConfig {
            order_step: 0,
            ..MirrorConfig::default()
        };

        assert!(matches!(config.validate(), Err(MirrorError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_relative_root() {
        let result: Result<MirrorConfig, _> = serde_json::from_str(r#"{ "liveRoot": "live" }"#);
        assert!(result.is_err());
    }
}
