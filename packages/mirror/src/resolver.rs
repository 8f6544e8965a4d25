use folio_tree::NodePath;

use crate::errors::{MirrorError, MirrorResult};

/// Maps draft paths onto their live counterparts and back
///
/// Both trees share the same relative hierarchy; only the root differs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    draft_root: NodePath,
    live_root: NodePath,
}

impl PathResolver {
    pub fn new(draft_root: NodePath, live_root: NodePath) -> Self {
        Self {
            draft_root,
            live_root,
        }
    }

    /// Resolver for two trees rooted at `/`
    pub fn identity() -> Self {
        Self::new(NodePath::root(), NodePath::root())
    }

    pub fn draft_root(&self) -> &NodePath {
        &self.draft_root
    }

    pub fn live_root(&self) -> &NodePath {
        &self.live_root
    }

    pub fn to_live(&self, draft_path: &NodePath) -> MirrorResult<NodePath> {
        draft_path
            .rebase(&self.draft_root, &self.live_root)
            .ok_or_else(|| MirrorError::outside_root(draft_path, &self.draft_root))
    }

    pub fn to_draft(&self, live_path: &NodePath) -> MirrorResult<NodePath> {
        live_path
            .rebase(&self.live_root, &self.draft_root)
            .ok_or_else(|| MirrorError::outside_root(live_path, &self.live_root))
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::identity()
    }
}
