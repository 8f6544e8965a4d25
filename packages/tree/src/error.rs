use thiserror::Error;

pub type TreeResult<T> = Result<T, TreeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Path is empty")]
    Empty,

    #[error("Path is not absolute: {0}")]
    NotAbsolute(String),

    #[error("Invalid segment {segment:?} in path {path}")]
    InvalidSegment { path: String, segment: String },

    #[error("Invalid node name: {0:?}")]
    InvalidName(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Parent not found for {0}")]
    ParentNotFound(String),

    #[error("An item named {name:?} already exists under {parent}")]
    NameConflict { parent: String, name: String },

    #[error("Identifier {0} is already bound to another node")]
    DuplicateIdentifier(String),

    #[error("Moving {0} would create a cycle")]
    CycleDetected(String),

    #[error("{node} and {other} are not siblings")]
    NotSiblings { node: String, other: String },

    #[error("The root node cannot be {0}")]
    RootImmutable(&'static str),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

impl TreeError {
    pub fn name_conflict(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NameConflict {
            parent: parent.into(),
            name: name.into(),
        }
    }

    pub fn not_siblings(node: impl Into<String>, other: impl Into<String>) -> Self {
        Self::NotSiblings {
            node: node.into(),
            other: other.into(),
        }
    }
}
