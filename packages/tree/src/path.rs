//! # Node Paths
//!
//! Slash-delimited, absolute paths addressing nodes in a content tree.
//!
//! A `NodePath` is always normalized:
//! - starts with `/`
//! - no trailing slash (except the root itself)
//! - no empty, `.` or `..` segments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// Absolute path of a node inside a tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath(String);

impl NodePath {
    /// The root path `/`
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and normalize a path
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PathError::NotAbsolute(raw.to_string()));
        }

        let mut normalized = String::with_capacity(raw.len());
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(PathError::InvalidSegment {
                    path: raw.to_string(),
                    segment: segment.to_string(),
                });
            }
            normalized.push('/');
            normalized.push_str(segment);
        }

        if normalized.is_empty() {
            normalized.push('/');
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Last segment, `None` for the root
    pub fn name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Append a single child segment
    pub fn join(&self, name: &str) -> Result<NodePath, PathError> {
        validate_name(name)?;
        if self.is_root() {
            Ok(Self(format!("/{}", name)))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// True when `self` equals `ancestor` or lies below it
    pub fn starts_with(&self, ancestor: &NodePath) -> bool {
        if ancestor.is_root() {
            return true;
        }
        self.0 == ancestor.0
            || (self.0.starts_with(&ancestor.0) && self.0.as_bytes().get(ancestor.0.len()) == Some(&b'/'))
    }

    /// Re-anchor a path from one root onto another
    ///
    /// `/cmf/a/b` rebased from `/cmf` onto `/live` becomes `/live/a/b`.
    /// Returns `None` when `self` is not under `from`.
    pub fn rebase(&self, from: &NodePath, to: &NodePath) -> Option<NodePath> {
        if !self.starts_with(from) {
            return None;
        }
        let mut rebased = to.clone();
        for segment in self.segments().skip(from.depth()) {
            // Segments of a parsed path are already valid names.
            rebased = rebased.join(segment).ok()?;
        }
        Some(rebased)
    }
}

/// Validate a single node name
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(PathError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NodePath> for String {
    fn from(path: NodePath) -> Self {
        path.0
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> NodePath {
        NodePath::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_normalizes_slashes() {
        assert_eq!(p("/cmf//sulu/").as_str(), "/cmf/sulu");
        assert_eq!(p("///").as_str(), "/");
        assert!(p("/").is_root());
    }

    #[test]
    fn test_parse_rejects_relative_and_dot_segments() {
        assert_eq!(NodePath::parse(""), Err(PathError::Empty));
        assert!(matches!(NodePath::parse("cmf"), Err(PathError::NotAbsolute(_))));
        assert!(matches!(
            NodePath::parse("/cmf/../etc"),
            Err(PathError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn test_name_and_parent() {
        let path = p("/cmf/sulu_io/contents");
        assert_eq!(path.name(), Some("contents"));
        assert_eq!(path.parent(), Some(p("/cmf/sulu_io")));
        assert_eq!(p("/cmf").parent(), Some(NodePath::root()));
        assert_eq!(NodePath::root().parent(), None);
        assert_eq!(NodePath::root().name(), None);
    }

    #[test]
    fn test_join_validates_name() {
        assert_eq!(NodePath::root().join("cmf").unwrap(), p("/cmf"));
        assert_eq!(p("/cmf").join("sulu").unwrap(), p("/cmf/sulu"));
        assert!(p("/cmf").join("a/b").is_err());
        assert!(p("/cmf").join("").is_err());
    }

    #[test]
    fn test_starts_with_respects_segment_boundaries() {
        assert!(p("/cmf/sulu").starts_with(&p("/cmf")));
        assert!(p("/cmf").starts_with(&p("/cmf")));
        assert!(!p("/cmf-test").starts_with(&p("/cmf")));
        assert!(p("/anything").starts_with(&NodePath::root()));
    }

    #[test]
    fn test_rebase() {
        let draft_root = p("/cmf/sulu_io/contents");
        let live_root = p("/live/sulu_io/contents");
        assert_eq!(
            p("/cmf/sulu_io/contents/page/child").rebase(&draft_root, &live_root),
            Some(p("/live/sulu_io/contents/page/child"))
        );
        assert_eq!(draft_root.rebase(&draft_root, &live_root), Some(live_root.clone()));
        assert_eq!(p("/other").rebase(&draft_root, &live_root), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("/cmf/sulu")).unwrap();
        assert_eq!(json, "\"/cmf/sulu\"");

        let parsed: NodePath = serde_json::from_str("\"/cmf//sulu\"").unwrap();
        assert_eq!(parsed, p("/cmf/sulu"));

        assert!(serde_json::from_str::<NodePath>("\"relative\"").is_err());
    }
}
