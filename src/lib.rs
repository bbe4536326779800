//! An ordered multiset implemented with an AVL tree.
//!
//! Nodes are kept in an index-addressed arena with parent links and a cached
//! height per node. After every insert or remove, the heights of the two
//! subtrees of any node differ by at most one.
//!
//! ```
//! use avltree::AvlTree;
//!
//! let tree: AvlTree<i32> = (0..10).collect();
//! assert_eq!(tree.len(), 10);
//! assert_eq!(tree.pre_order()[0], &3);
//! assert!(tree.iter().copied().eq(0..10));
//! ```

mod error;
mod tree;

pub use error::InvariantViolation;
pub use tree::{AvlTree, IntoIter, Iter};
