use folio_tree::{Node, NodeKey, Tree, TreeResult, ORDER_PROPERTY};

/// Content-mapping hook run for every live node created by create or copy
///
/// Structure and identity are handled by the mirror itself; a mapper only
/// decides which draft values travel along.
pub trait ContentMapper: Send + Sync {
    /// Map draft content onto the freshly created live node
    fn map(&self, draft: &Node, live: &mut Tree, key: NodeKey) -> TreeResult<()>;

    /// Get a debug name for this mapper
    fn name(&self) -> &'static str;
}

/// Mirror structure and identity only
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureOnly;

impl ContentMapper for StructureOnly {
    fn map(&self, _draft: &Node, _live: &mut Tree, _key: NodeKey) -> TreeResult<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "structure-only"
    }
}

/// Copy every draft property except the live-managed `order`
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyProperties;

impl ContentMapper for CopyProperties {
    fn map(&self, draft: &Node, live: &mut Tree, key: NodeKey) -> TreeResult<()> {
        for (name, value) in draft.properties() {
            if name != ORDER_PROPERTY {
                live.set_property(key, name, value.clone())?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "copy-properties"
    }
}
