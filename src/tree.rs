//! An ordered multiset implemented with an AVL tree.

use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::mem;

use log::{debug, trace};

#[cfg(any(test, feature = "consistency_check"))]
use crate::error::InvariantViolation;

/// An ordered multiset implemented with an AVL tree.
///
/// Equal elements are all kept; an element equal to a node on the insert path
/// is placed into that node's left subtree.
///
/// ```
/// use avltree::AvlTree;
/// let mut tree = AvlTree::new();
/// tree.insert(2);
/// tree.insert(1);
/// tree.insert(3);
/// assert_eq!(tree.find(&1), Some(&1));
/// assert_eq!(tree.remove(&1), Some(1));
/// assert!(tree.find(&1).is_none());
/// assert_eq!(tree.in_order(), vec![&2, &3]);
/// ```
#[derive(Clone)]
pub struct AvlTree<T> {
    nodes: Vec<Node<T>>,
    root: Link,
}

#[derive(Clone)]
struct Node<T> {
    value: T,
    left: Link,
    right: Link,
    parent: Link,
    height: usize,
}

type NodeId = usize;
type Link = Option<NodeId>;

enum Side {
    Left,
    Right,
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

/// An in-order iterator over the elements of a tree.
pub struct Iter<'a, T> {
    tree: &'a AvlTree<T>,
    front: Link,
    back: Link,
    remaining: usize,
}

/// An owning in-order iterator over the elements of a tree.
pub struct IntoIter<T> {
    values: std::vec::IntoIter<T>,
}

impl<T> AvlTree<T> {
    /// Creates an empty tree.
    /// No memory is allocated until the first element is inserted.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    /// Creates an empty tree with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root: None,
        }
    }

    /// Returns true if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges on the longest root-to-leaf path.
    /// Both an empty tree and a single-element tree have height 0.
    pub fn height(&self) -> usize {
        match self.root {
            None => 0,
            Some(root_id) => self.nodes[root_id].height,
        }
    }

    /// Clears the tree, dropping all elements.
    pub fn clear(&mut self) {
        debug!("clearing tree of {} elements", self.nodes.len());
        self.nodes.clear();
        self.root = None;
    }

    /// Returns the smallest element.
    pub fn first(&self) -> Option<&T> {
        self.root
            .map(|root_id| &self.nodes[self.leftmost(root_id)].value)
    }

    /// Returns the largest element.
    pub fn last(&self) -> Option<&T> {
        self.root
            .map(|root_id| &self.nodes[self.rightmost(root_id)].value)
    }

    /// Gets an in-order iterator over the elements of the tree.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            front: self.root.map(|root_id| self.leftmost(root_id)),
            back: self.root.map(|root_id| self.rightmost(root_id)),
            remaining: self.nodes.len(),
        }
    }

    /// Returns the elements in (left, node, right) order.
    pub fn in_order(&self) -> Vec<&T> {
        let mut values = Vec::with_capacity(self.len());
        self.traverse_in_order(|value| values.push(value));
        values
    }

    /// Returns the elements in (node, left, right) order.
    pub fn pre_order(&self) -> Vec<&T> {
        let mut values = Vec::with_capacity(self.len());
        self.traverse_pre_order(|value| values.push(value));
        values
    }

    /// Returns the elements in (left, right, node) order.
    pub fn post_order(&self) -> Vec<&T> {
        let mut values = Vec::with_capacity(self.len());
        self.traverse_post_order(|value| values.push(value));
        values
    }

    /// Returns the elements level by level, starting at the root.
    pub fn level_order(&self) -> Vec<&T> {
        let mut values = Vec::with_capacity(self.len());
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(node_id) = queue.pop_front() {
            let node = &self.nodes[node_id];
            values.push(&node.value);
            queue.extend(node.left);
            queue.extend(node.right);
        }
        values
    }

    /// Calls `f` for every element in in-order.
    pub fn traverse_in_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        self.traverse(|_| {}, |node_id| f(&self.nodes[node_id].value), |_| {});
    }

    /// Calls `f` for every element in pre-order.
    pub fn traverse_pre_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        self.traverse(|node_id| f(&self.nodes[node_id].value), |_| {}, |_| {});
    }

    /// Calls `f` for every element in post-order.
    pub fn traverse_post_order<'a, F: FnMut(&'a T)>(&'a self, mut f: F) {
        self.traverse(|_| {}, |_| {}, |node_id| f(&self.nodes[node_id].value));
    }

    /// Renders one line per node in pre-order: `value: left, right`,
    /// with `-` standing in for a missing child.
    pub fn dump(&self) -> String
    where
        T: fmt::Display,
    {
        let describe = |link: Link| match link {
            None => String::from("-"),
            Some(node_id) => self.nodes[node_id].value.to_string(),
        };
        let mut out = String::new();
        self.traverse(
            |node_id| {
                let node = &self.nodes[node_id];
                out.push_str(&format!(
                    "{}: {}, {}\n",
                    node.value,
                    describe(node.left),
                    describe(node.right)
                ));
            },
            |_| {},
            |_| {},
        );
        out
    }

    fn leftmost(&self, mut node_id: NodeId) -> NodeId {
        while let Some(left_id) = self.nodes[node_id].left {
            node_id = left_id;
        }
        node_id
    }

    fn rightmost(&self, mut node_id: NodeId) -> NodeId {
        while let Some(right_id) = self.nodes[node_id].right {
            node_id = right_id;
        }
        node_id
    }

    fn successor(&self, mut node_id: NodeId) -> Link {
        if let Some(right_id) = self.nodes[node_id].right {
            return Some(self.leftmost(right_id));
        }
        while let Some(parent_id) = self.nodes[node_id].parent {
            if self.nodes[parent_id].left == Some(node_id) {
                return Some(parent_id);
            }
            node_id = parent_id;
        }
        None
    }

    fn predecessor(&self, mut node_id: NodeId) -> Link {
        if let Some(left_id) = self.nodes[node_id].left {
            return Some(self.rightmost(left_id));
        }
        while let Some(parent_id) = self.nodes[node_id].parent {
            if self.nodes[parent_id].right == Some(node_id) {
                return Some(parent_id);
            }
            node_id = parent_id;
        }
        None
    }

    /// Points the child link of `parent` that held `old` at `new`.
    /// A missing parent means `old` was the root.
    fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent_id) => {
                let parent_node = &mut self.nodes[parent_id];
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else {
                    parent_node.right = new;
                }
            }
        }
    }

    /// Removes a node that is no longer linked into the tree from the arena.
    /// The last arena node moves into the freed slot.
    fn free_node(&mut self, node_id: NodeId) -> T {
        let last_id = self.nodes.len() - 1;
        if node_id != last_id {
            let (parent, left, right) = {
                let last = &self.nodes[last_id];
                (last.parent, last.left, last.right)
            };
            self.replace_child(parent, last_id, Some(node_id));
            for child_id in [left, right].into_iter().flatten() {
                self.nodes[child_id].parent = Some(node_id);
            }
        }
        trace!("freed node {} (moved node {} into its slot)", node_id, last_id);
        self.nodes.swap_remove(node_id).value
    }

    fn left_height(&self, node_id: NodeId) -> usize {
        match self.nodes[node_id].left {
            None => 0,
            Some(left_id) => self.nodes[left_id].height + 1,
        }
    }

    fn right_height(&self, node_id: NodeId) -> usize {
        match self.nodes[node_id].right {
            None => 0,
            Some(right_id) => self.nodes[right_id].height + 1,
        }
    }

    fn adjust_height(&mut self, node_id: NodeId) {
        self.nodes[node_id].height = cmp::max(self.left_height(node_id), self.right_height(node_id));
    }

    fn rotate_left(&mut self, node_id: NodeId) {
        if let Some(right_id) = self.nodes[node_id].right {
            let right_left = self.nodes[right_id].left;
            self.nodes[node_id].right = right_left;
            if let Some(right_left_id) = right_left {
                self.nodes[right_left_id].parent = Some(node_id);
            }

            let parent = self.nodes[node_id].parent;
            self.nodes[right_id].parent = parent;
            self.replace_child(parent, node_id, Some(right_id));

            self.nodes[right_id].left = Some(node_id);
            self.nodes[node_id].parent = Some(right_id);

            self.adjust_height(node_id);
            self.adjust_height(right_id);
            trace!("rotated left at node {}", node_id);
        }
    }

    fn rotate_right(&mut self, node_id: NodeId) {
        if let Some(left_id) = self.nodes[node_id].left {
            let left_right = self.nodes[left_id].right;
            self.nodes[node_id].left = left_right;
            if let Some(left_right_id) = left_right {
                self.nodes[left_right_id].parent = Some(node_id);
            }

            let parent = self.nodes[node_id].parent;
            self.nodes[left_id].parent = parent;
            self.replace_child(parent, node_id, Some(left_id));

            self.nodes[left_id].right = Some(node_id);
            self.nodes[node_id].parent = Some(left_id);

            self.adjust_height(node_id);
            self.adjust_height(left_id);
            trace!("rotated right at node {}", node_id);
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(node_id) = current {
            let parent = self.nodes[node_id].parent;
            self.rebalance_node(node_id);
            current = parent;
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    /// Stops after first rebalance operation.
    /// This is enough to restore balance after a single insert operation.
    fn rebalance_once(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(node_id) = current {
            let parent = self.nodes[node_id].parent;
            if self.rebalance_node(node_id) {
                break;
            }
            current = parent;
        }
    }

    /// Restores AVL condition (balance) at given node if necessary and adjusts height.
    /// Resulting balance will be +1, 0 or -1 height difference between left and right subtree.
    /// Initial balance must not exceed +2 or -2, which always holds after a single update.
    /// Returns whether rebalancing had been necessary.
    fn rebalance_node(&mut self, node_id: NodeId) -> bool {
        let left_height = self.left_height(node_id);
        let right_height = self.right_height(node_id);
        debug_assert!(left_height <= right_height + 2);
        debug_assert!(right_height <= left_height + 2);
        if left_height > right_height + 1 {
            // Rebalance right
            if let Some(left_id) = self.nodes[node_id].left {
                if self.right_height(left_id) > self.left_height(left_id) {
                    self.rotate_left(left_id);
                }
            }
            self.rotate_right(node_id);
            true
        } else if right_height > left_height + 1 {
            // Rebalance left
            if let Some(right_id) = self.nodes[node_id].right {
                if self.left_height(right_id) > self.right_height(right_id) {
                    self.rotate_right(right_id);
                }
            }
            self.rotate_left(node_id);
            true
        } else {
            self.adjust_height(node_id);
            false
        }
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodeId),
        In: FnMut(NodeId),
        Post: FnMut(NodeId),
    {
        if let Some(mut node_id) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_id);
                        if let Some(left_id) = self.nodes[node_id].left {
                            node_id = left_id;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_id);
                        if let Some(right_id) = self.nodes[node_id].right {
                            node_id = right_id;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        postorder(node_id);
                        match self.nodes[node_id].parent {
                            Some(parent_id) => {
                                if self.nodes[parent_id].left == Some(node_id) {
                                    dir = Direction::FromLeft;
                                } else {
                                    dir = Direction::FromRight;
                                }
                                node_id = parent_id;
                            }
                            None => break,
                        }
                    }
                }
            }
        }
    }
}

impl<T: Ord> AvlTree<T> {
    /// Returns a reference to the element in the tree that is equal to the given value.
    ///
    /// The value may be any borrowed form of the tree's element type, but the ordering
    /// on the borrowed form *must* match the ordering on the element type.
    pub fn find<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(value).map(|node_id| &self.nodes[node_id].value)
    }

    /// Returns true if the tree contains an element equal to the given value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find_node(value).is_some()
    }

    /// Inserts an element into the tree.
    /// Equal elements are never rejected, so the length always grows by one.
    pub fn insert(&mut self, value: T) {
        let node_id = self.nodes.len();
        match self.find_insert_pos(&value) {
            None => {
                self.nodes.push(Node::new(None, value));
                self.root = Some(node_id);
            }
            Some((parent_id, side)) => {
                self.nodes.push(Node::new(Some(parent_id), value));
                match side {
                    Side::Left => self.nodes[parent_id].left = Some(node_id),
                    Side::Right => self.nodes[parent_id].right = Some(node_id),
                }
                self.rebalance_once(Some(parent_id));
            }
        }
    }

    /// Removes one element equal to the given value from the tree.
    /// Returns the removed element if there was one.
    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node_id = self.find_node(value)?;
        debug_assert!(!self.nodes.is_empty());
        let unlinked_id = self.unlink_node(node_id);
        Some(self.free_node(unlinked_id))
    }

    /// Checks parent links, ordering, cached heights, the AVL condition and the length.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) -> Result<(), InvariantViolation> {
        // Check root link
        if let Some(root_id) = self.root {
            if self.nodes[root_id].parent.is_some() {
                return Err(InvariantViolation::RootHasParent { node: root_id });
            }
        }

        // Check tree nodes
        let mut num_nodes = 0;
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(node_id) = stack.pop() {
            num_nodes += 1;
            if num_nodes > self.nodes.len() {
                return Err(InvariantViolation::LengthMismatch {
                    reachable: num_nodes,
                    len: self.nodes.len(),
                });
            }

            let node = &self.nodes[node_id];
            let mut height = 0;
            let mut left_height = 0;
            let mut right_height = 0;

            // Check link for left child node
            if let Some(left_id) = node.left {
                let left = &self.nodes[left_id];
                if left.parent != Some(node_id) {
                    return Err(InvariantViolation::BrokenParentLink { node: left_id });
                }
                if left.value > node.value {
                    return Err(InvariantViolation::Unordered { node: left_id });
                }
                left_height = left.height + 1;
                height = cmp::max(height, left_height);
                stack.push(left_id);
            }

            // Check link for right child node
            if let Some(right_id) = node.right {
                let right = &self.nodes[right_id];
                if right.parent != Some(node_id) {
                    return Err(InvariantViolation::BrokenParentLink { node: right_id });
                }
                if right.value < node.value {
                    return Err(InvariantViolation::Unordered { node: right_id });
                }
                right_height = right.height + 1;
                height = cmp::max(height, right_height);
                stack.push(right_id);
            }

            if node.height != height {
                return Err(InvariantViolation::StaleHeight {
                    node: node_id,
                    cached: node.height,
                    actual: height,
                });
            }

            // Check AVL condition (nearly balance)
            if left_height > right_height + 1 || right_height > left_height + 1 {
                return Err(InvariantViolation::Unbalanced {
                    node: node_id,
                    left_height,
                    right_height,
                });
            }
        }

        if num_nodes != self.nodes.len() {
            return Err(InvariantViolation::LengthMismatch {
                reachable: num_nodes,
                len: self.nodes.len(),
            });
        }

        // Parent/child order alone does not cover whole subtrees
        let mut previous: Option<NodeId> = None;
        let mut unordered: Option<NodeId> = None;
        self.traverse(
            |_| {},
            |node_id| {
                if let Some(previous_id) = previous {
                    if unordered.is_none() && self.nodes[previous_id].value > self.nodes[node_id].value {
                        unordered = Some(node_id);
                    }
                }
                previous = Some(node_id);
            },
            |_| {},
        );
        match unordered {
            Some(node_id) => Err(InvariantViolation::Unordered { node: node_id }),
            None => Ok(()),
        }
    }

    fn find_node<Q>(&self, value: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(node_id) = current {
            let node = &self.nodes[node_id];
            current = match value.cmp(node.value.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        current
    }

    /// Returns the parent and the free child slot for a new element,
    /// or nothing when the tree is empty.
    fn find_insert_pos(&self, value: &T) -> Option<(NodeId, Side)> {
        let mut node_id = self.root?;
        loop {
            let node = &self.nodes[node_id];
            let (side, next) = if *value <= node.value {
                (Side::Left, node.left)
            } else {
                (Side::Right, node.right)
            };
            match next {
                Some(child_id) => node_id = child_id,
                None => return Some((node_id, side)),
            }
        }
    }

    /// Takes the node's element out of the tree structure and rebalances.
    /// Returns the id of the node that ended up unlinked, which holds the element.
    fn unlink_node(&mut self, node_id: NodeId) -> NodeId {
        let node = &self.nodes[node_id];
        match (node.left, node.right) {
            (Some(_), Some(right_id)) => {
                // Swap in the smallest element of the right sub tree,
                // then unlink its node which has no left child.
                let successor_id = self.leftmost(right_id);
                self.swap_values(node_id, successor_id);
                self.splice(successor_id);
                successor_id
            }
            _ => {
                self.splice(node_id);
                node_id
            }
        }
    }

    /// Replaces a node that has at most one child by that child.
    fn splice(&mut self, node_id: NodeId) {
        let node = &self.nodes[node_id];
        debug_assert!(node.left.is_none() || node.right.is_none());
        let parent = node.parent;
        let child = node.left.or(node.right);
        if let Some(child_id) = child {
            self.nodes[child_id].parent = parent;
        }
        self.replace_child(parent, node_id, child);

        // Parent node might be out of balance now
        self.rebalance(parent);
    }

    fn swap_values(&mut self, a: NodeId, b: NodeId) {
        debug_assert_ne!(a, b);
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.nodes.split_at_mut(high);
        mem::swap(&mut head[low].value, &mut tail[0].value);
    }
}

impl<T> Node<T> {
    fn new(parent: Link, value: T) -> Self {
        Node {
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        }
    }
}

impl<T> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for AvlTree<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for AvlTree<T> {}

impl<T: Hash> Hash for AvlTree<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for value in self {
            value.hash(state);
        }
    }
}

impl<T: Ord> FromIterator<T> for AvlTree<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<T: Ord> Extend<T> for AvlTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T> IntoIterator for &'a AvlTree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlTree<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.len());
        self.traverse(|_| {}, |node_id| order.push(node_id), |_| {});
        let mut slots: Vec<Option<T>> = self.nodes.into_iter().map(|node| Some(node.value)).collect();
        let values: Vec<T> = order
            .into_iter()
            .filter_map(|node_id| slots[node_id].take())
            .collect();
        IntoIter {
            values: values.into_iter(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node_id = self.front?;
        self.front = tree.successor(node_id);
        self.remaining -= 1;
        Some(&tree.nodes[node_id].value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let tree = self.tree;
        let node_id = self.back?;
        self.back = tree.predecessor(node_id);
        self.remaining -= 1;
        Some(&tree.nodes[node_id].value)
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

impl<'a, T> FusedIterator for Iter<'a, T> {}

impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.values.next_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
