use alloc::boxed::Box;

use smallvec::SmallVec;

/// Inline capacity for per-node key storage. Minimum degrees up to 4
/// (`2t - 1 = 7` keys) fit without spilling to the heap; larger degrees
/// spill but keep the same contiguous layout.
pub(crate) const INLINE_KEYS: usize = 7;
pub(crate) const INLINE_CHILDREN: usize = INLINE_KEYS + 1;

/// A single B-tree node: strictly ascending keys, owned children (empty for
/// a leaf), and the number of keys stored in the whole subtree rooted here.
pub(crate) struct Node {
    pub(crate) keys: SmallVec<[u64; INLINE_KEYS]>,
    pub(crate) children: SmallVec<[Box<Node>; INLINE_CHILDREN]>,
    pub(crate) size: usize,
    pub(crate) leaf: bool,
}

impl Node {
    /// Creates a new empty leaf node.
    pub(crate) fn new_leaf() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
            size: 0,
            leaf: true,
        }
    }

    /// Creates a new empty internal node.
    pub(crate) fn new_internal() -> Self {
        Self {
            keys: SmallVec::new(),
            children: SmallVec::new(),
            size: 0,
            leaf: false,
        }
    }

    /// Returns the number of keys in this node (not the subtree).
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if this node holds the maximum `2t - 1` keys.
    pub(crate) fn is_full(&self, t: usize) -> bool {
        self.keys.len() == 2 * t - 1
    }

    /// Returns true if this node holds only the minimum `t - 1` keys.
    pub(crate) fn at_minimum(&self, t: usize) -> bool {
        self.keys.len() == t - 1
    }

    /// Returns true if this node can lend a key without dropping below the
    /// `t - 1` minimum.
    pub(crate) fn can_lend(&self, t: usize) -> bool {
        self.keys.len() >= t
    }

    /// Recomputes `size` from this node's own keys and its children.
    pub(crate) fn refresh_size(&mut self) {
        self.size = self.keys.len() + self.children.iter().map(|c| c.size).sum::<usize>();
    }

    /// Largest key in the subtree rooted here.
    pub(crate) fn max_key(&self) -> u64 {
        let mut node = self;
        while !node.leaf {
            node = node.children.last().expect("internal node has children");
        }
        *node.keys.last().expect("leaf on a search path has keys")
    }

    /// Smallest key in the subtree rooted here.
    pub(crate) fn min_key(&self) -> u64 {
        let mut node = self;
        while !node.leaf {
            node = node.children.first().expect("internal node has children");
        }
        *node.keys.first().expect("leaf on a search path has keys")
    }

    /// Splits the full child at index `i` into two half-full siblings and
    /// promotes its median key into this node at position `i`.
    ///
    /// The child must hold exactly `2t - 1` keys. Sizes of the two halves
    /// are recomputed; this node's own `size` is unchanged because no key
    /// left the subtree.
    pub(crate) fn split_child(&mut self, t: usize, i: usize) {
        let child = &mut self.children[i];
        debug_assert!(child.is_full(t), "split_child on a non-full child");

        let mut right = if child.leaf {
            Node::new_leaf()
        } else {
            Node::new_internal()
        };

        // Upper t - 1 keys move right, the median moves up.
        right.keys = child.keys.drain(t..).collect();
        let median = child.keys.pop().expect("full child has a median");
        if !child.leaf {
            right.children = child.children.drain(t..).collect();
        }

        child.refresh_size();
        right.refresh_size();

        self.keys.insert(i, median);
        self.children.insert(i + 1, Box::new(right));
    }

    /// Merges `children[i]`, the separator `keys[i]`, and `children[i + 1]`
    /// into a single node at index `i`.
    ///
    /// Both children must hold exactly `t - 1` keys. The merged child's
    /// size is recomputed; this node's own `size` is unchanged.
    pub(crate) fn merge_children(&mut self, i: usize) {
        let separator = self.keys.remove(i);
        let right = self.children.remove(i + 1);

        let left = &mut self.children[i];
        left.keys.push(separator);
        left.keys.extend(right.keys);
        left.children.extend(right.children);
        left.refresh_size();
    }

    /// Rotates one key from the left sibling of `children[i]` through the
    /// separator `keys[i - 1]`, moving the donor's rightmost child along
    /// when the nodes are internal.
    pub(crate) fn borrow_from_left(&mut self, i: usize) {
        let (donated, moved_child) = {
            let left = &mut self.children[i - 1];
            let donated = left.keys.pop().expect("left sibling can lend");
            let moved_child = if left.leaf { None } else { left.children.pop() };
            left.refresh_size();
            (donated, moved_child)
        };
        let separator = core::mem::replace(&mut self.keys[i - 1], donated);

        let target = &mut self.children[i];
        target.keys.insert(0, separator);
        if let Some(child) = moved_child {
            target.children.insert(0, child);
        }
        target.refresh_size();
    }

    /// Rotates one key from the right sibling of `children[i]` through the
    /// separator `keys[i]`, moving the donor's leftmost child along when
    /// the nodes are internal.
    pub(crate) fn borrow_from_right(&mut self, i: usize) {
        let (donated, moved_child) = {
            let right = &mut self.children[i + 1];
            let donated = right.keys.remove(0);
            let moved_child = if right.leaf {
                None
            } else {
                Some(right.children.remove(0))
            };
            right.refresh_size();
            (donated, moved_child)
        };
        let separator = core::mem::replace(&mut self.keys[i], donated);

        let target = &mut self.children[i];
        target.keys.push(separator);
        if let Some(child) = moved_child {
            target.children.push(child);
        }
        target.refresh_size();
    }

    /// Guarantees that `children[i]` holds at least `t` keys before a
    /// delete descends into it, borrowing from a sibling when one can lend
    /// and merging otherwise. Returns the index of the child to descend
    /// into (merging with the left sibling shifts it down by one).
    pub(crate) fn ensure_child_min(&mut self, t: usize, i: usize) -> usize {
        if !self.children[i].at_minimum(t) {
            return i;
        }
        if i > 0 && self.children[i - 1].can_lend(t) {
            self.borrow_from_left(i);
            i
        } else if i + 1 < self.children.len() && self.children[i + 1].can_lend(t) {
            self.borrow_from_right(i);
            i
        } else if i + 1 < self.children.len() {
            self.merge_children(i);
            i
        } else {
            self.merge_children(i - 1);
            i - 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use static_assertions::const_assert_eq;

    // An internal node always has one more child slot than key slot.
    const_assert_eq!(INLINE_CHILDREN, INLINE_KEYS + 1);

    fn leaf_with(keys: &[u64]) -> Box<Node> {
        let mut node = Node::new_leaf();
        node.keys.extend(keys.iter().copied());
        node.refresh_size();
        Box::new(node)
    }

    fn parent_over(children: Vec<Box<Node>>, separators: &[u64]) -> Node {
        let mut node = Node::new_internal();
        node.keys.extend(separators.iter().copied());
        node.children.extend(children);
        node.refresh_size();
        node
    }

    #[test]
    fn split_child_promotes_the_median() {
        // t = 2: a full child has 3 keys.
        let mut parent = parent_over(vec![leaf_with(&[10, 20, 30]), leaf_with(&[50, 60])], &[40]);

        parent.split_child(2, 0);

        assert_eq!(parent.keys.as_slice(), &[20, 40]);
        assert_eq!(parent.children.len(), 3);
        assert_eq!(parent.children[0].keys.as_slice(), &[10]);
        assert_eq!(parent.children[1].keys.as_slice(), &[30]);
        assert_eq!(parent.children[0].size, 1);
        assert_eq!(parent.children[1].size, 1);
    }

    #[test]
    fn merge_children_pulls_the_separator_down() {
        let mut parent = parent_over(vec![leaf_with(&[10]), leaf_with(&[30])], &[20]);

        parent.merge_children(0);

        assert!(parent.keys.is_empty());
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].keys.as_slice(), &[10, 20, 30]);
        assert_eq!(parent.children[0].size, 3);
    }

    #[test]
    fn borrow_rotates_through_the_separator() {
        let mut parent = parent_over(vec![leaf_with(&[10, 15]), leaf_with(&[30])], &[20]);
        parent.borrow_from_left(1);
        assert_eq!(parent.keys.as_slice(), &[15]);
        assert_eq!(parent.children[0].keys.as_slice(), &[10]);
        assert_eq!(parent.children[1].keys.as_slice(), &[20, 30]);

        let mut parent = parent_over(vec![leaf_with(&[10]), leaf_with(&[30, 35])], &[20]);
        parent.borrow_from_right(0);
        assert_eq!(parent.keys.as_slice(), &[30]);
        assert_eq!(parent.children[0].keys.as_slice(), &[10, 20]);
        assert_eq!(parent.children[1].keys.as_slice(), &[35]);
    }

    #[test]
    fn ensure_child_min_prefers_borrowing_over_merging() {
        // Left sibling can lend: index unchanged.
        let mut parent = parent_over(vec![leaf_with(&[10, 15]), leaf_with(&[30])], &[20]);
        assert_eq!(parent.ensure_child_min(2, 1), 1);
        assert_eq!(parent.children.len(), 2);

        // Neither sibling can lend: merge, rightmost child shifts left.
        let mut parent = parent_over(vec![leaf_with(&[10]), leaf_with(&[30])], &[20]);
        assert_eq!(parent.ensure_child_min(2, 1), 0);
        assert_eq!(parent.children.len(), 1);
    }
}
