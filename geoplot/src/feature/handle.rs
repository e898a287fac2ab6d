//! Opaque feature references.
//!
//! The spatial index stores handles, not geometry; the [`FeatureStore`]
//! owns the records a handle points at. A handle stays valid as a lookup
//! key even if its record was never registered or has been replaced.
//!
//! [`FeatureStore`]: super::FeatureStore

use std::fmt;

/// Identifier of a point feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i64);

/// Identifier of a polyline feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WayId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// An opaque reference to a feature record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureHandle {
    Node(NodeId),
    Way(WayId),
}

impl FeatureHandle {
    /// Whether this handle points at a point feature.
    pub fn is_node(&self) -> bool {
        matches!(self, FeatureHandle::Node(_))
    }

    /// Whether this handle points at a polyline feature.
    pub fn is_way(&self) -> bool {
        matches!(self, FeatureHandle::Way(_))
    }
}

impl fmt::Display for FeatureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureHandle::Node(id) => write!(f, "{}", id),
            FeatureHandle::Way(id) => write!(f, "{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_variants() {
        let n = FeatureHandle::Node(NodeId(42));
        let w = FeatureHandle::Way(WayId(42));
        assert!(n.is_node());
        assert!(!n.is_way());
        assert!(w.is_way());
        assert_ne!(n, w);
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(FeatureHandle::Node(NodeId(7)).to_string(), "n7");
        assert_eq!(FeatureHandle::Way(WayId(9)).to_string(), "w9");
    }
}
