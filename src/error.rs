use std::error::Error;
use std::fmt;

/// A broken structural invariant of an [`AvlTree`](crate::AvlTree).
///
/// Node ids are arena slots. Seeing one of these means the tree implementation
/// has a bug; no sequence of public operations should produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root node has a parent link.
    RootHasParent { node: usize },
    /// A child does not link back to its parent.
    BrokenParentLink { node: usize },
    /// An element is out of order relative to its neighbours.
    Unordered { node: usize },
    /// A cached height differs from the height of the node's subtrees.
    StaleHeight {
        node: usize,
        cached: usize,
        actual: usize,
    },
    /// Subtree heights differ by more than one.
    Unbalanced {
        node: usize,
        left_height: usize,
        right_height: usize,
    },
    /// The number of reachable nodes differs from the stored length.
    LengthMismatch { reachable: usize, len: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::RootHasParent { node } => {
                write!(f, "root node {} has a parent", node)
            }
            InvariantViolation::BrokenParentLink { node } => {
                write!(f, "node {} does not link back to its parent", node)
            }
            InvariantViolation::Unordered { node } => {
                write!(f, "node {} is out of order", node)
            }
            InvariantViolation::StaleHeight {
                node,
                cached,
                actual,
            } => write!(
                f,
                "node {} caches height {} but has height {}",
                node, cached, actual
            ),
            InvariantViolation::Unbalanced {
                node,
                left_height,
                right_height,
            } => write!(
                f,
                "node {} is unbalanced (left height {}, right height {})",
                node, left_height, right_height
            ),
            InvariantViolation::LengthMismatch { reachable, len } => write!(
                f,
                "{} nodes reachable but length is {}",
                reachable, len
            ),
        }
    }
}

impl Error for InvariantViolation {}
