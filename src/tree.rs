use core::fmt;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::node::Node;
use crate::primality::is_prime;

/// An ordered set of distinct positive `u64` keys with order-statistic and
/// range queries.
///
/// The set is a B-tree of minimum degree `t` (fixed at construction): every
/// node except the root holds between `t - 1` and `2t - 1` keys, all leaves
/// sit at the same depth, and every node tracks the number of keys in its
/// subtree. That augmentation is what makes [`rank`](RankSet::rank) and
/// [`select`](RankSet::select) run in O(t · log_t n) instead of a full
/// in-order walk.
///
/// Keys must be `>= 1`. Inserting a key that is already present and removing
/// a key that is absent are silent no-ops.
///
/// # Examples
///
/// ```
/// use rankset::RankSet;
///
/// let mut set = RankSet::new(2);
/// for key in 1..=10 {
///     set.insert(key);
/// }
/// for key in [5, 3, 8, 1, 10] {
///     set.remove(key);
/// }
///
/// assert_eq!(set.len(), 5);
/// assert_eq!(set.select(3), Some(6));
/// assert_eq!(set.rank(4), Some(2));
/// ```
pub struct RankSet {
    /// Root node; an empty leaf when the set is empty. `root.size` is the
    /// authoritative key count.
    root: Box<Node>,
    min_degree: usize,
}

impl RankSet {
    /// Creates an empty set with the given minimum degree.
    ///
    /// # Panics
    ///
    /// Panics if `min_degree < 2`.
    #[must_use]
    pub fn new(min_degree: usize) -> Self {
        assert!(min_degree >= 2, "minimum degree must be at least 2");
        Self {
            root: Box::new(Node::new_leaf()),
            min_degree,
        }
    }

    /// Returns the minimum degree the set was constructed with.
    #[must_use]
    pub fn min_degree(&self) -> usize {
        self.min_degree
    }

    /// Returns the number of keys in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.size
    }

    /// Returns true if the set contains no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.size == 0
    }

    /// Removes all keys from the set.
    pub fn clear(&mut self) {
        self.root = Box::new(Node::new_leaf());
    }

    /// Returns the smallest key, or `None` if the set is empty.
    #[must_use]
    pub fn first(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.root.min_key())
        }
    }

    /// Returns the largest key, or `None` if the set is empty.
    #[must_use]
    pub fn last(&self) -> Option<u64> {
        if self.is_empty() {
            None
        } else {
            Some(self.root.max_key())
        }
    }

    /// Returns true if `key` is in the set.
    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        let mut node = &*self.root;
        loop {
            match node.keys.binary_search(&key) {
                Ok(_) => return true,
                Err(idx) => {
                    if node.leaf {
                        return false;
                    }
                    node = &node.children[idx];
                }
            }
        }
    }

    /// Inserts `key` into the set. Returns true if the key was not already
    /// present; a duplicate insert changes nothing and returns false.
    ///
    /// Splits any full node on the descent, so the final leaf insertion is
    /// unconditional. Splitting a full root is the only way the tree grows
    /// in height.
    ///
    /// # Panics
    ///
    /// Panics if `key` is zero.
    pub fn insert(&mut self, key: u64) -> bool {
        assert!(key >= 1, "keys must be positive");
        if self.contains(key) {
            return false;
        }

        let t = self.min_degree;
        if self.root.is_full(t) {
            let old_root = core::mem::replace(&mut self.root, Box::new(Node::new_internal()));
            self.root.children.push(old_root);
            self.root.split_child(t, 0);
        }
        insert_into(&mut self.root, t, key);
        true
    }

    /// Removes `key` from the set. Returns true if the key was present;
    /// removing an absent key changes nothing and returns false.
    ///
    /// Every node entered on the descent (other than the root) is first
    /// topped up to at least `t` keys by borrowing or merging, so the final
    /// removal is unconditional. A merge that leaves the root keyless
    /// replaces the root with the merged child - the only way the tree
    /// gets shorter.
    pub fn remove(&mut self, key: u64) -> bool {
        if !self.contains(key) {
            return false;
        }

        remove_from(&mut self.root, self.min_degree, key);
        if !self.root.leaf && self.root.keys.is_empty() {
            self.root = self
                .root
                .children
                .pop()
                .expect("keyless internal root keeps its merged child");
        }
        true
    }

    /// Returns the 1-based position of `key` in sorted order, or `None` if
    /// the key is absent.
    ///
    /// # Complexity
    ///
    /// O(t · log_t n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rankset::RankSet;
    ///
    /// let mut set = RankSet::new(2);
    /// for key in [10, 20, 30] {
    ///     set.insert(key);
    /// }
    ///
    /// assert_eq!(set.rank(20), Some(2));
    /// assert_eq!(set.rank(15), None);
    /// ```
    #[must_use]
    pub fn rank(&self, key: u64) -> Option<usize> {
        let mut node = &*self.root;
        let mut before = 0usize;
        loop {
            match node.keys.binary_search(&key) {
                Ok(idx) => {
                    // Keys k_0..k_{idx-1} plus everything under children
                    // c_0..c_idx precede the match.
                    let mut rank = before + idx + 1;
                    if !node.leaf {
                        rank += node.children[..=idx].iter().map(|c| c.size).sum::<usize>();
                    }
                    return Some(rank);
                }
                Err(idx) => {
                    if node.leaf {
                        return None;
                    }
                    before += idx;
                    before += node.children[..idx].iter().map(|c| c.size).sum::<usize>();
                    node = &node.children[idx];
                }
            }
        }
    }

    /// Returns the k-th smallest key (1-based), or `None` if `k` is zero or
    /// exceeds the number of keys.
    ///
    /// # Complexity
    ///
    /// O(t · log_t n)
    ///
    /// # Examples
    ///
    /// ```
    /// use rankset::RankSet;
    ///
    /// let mut set = RankSet::new(2);
    /// for key in [10, 20, 30] {
    ///     set.insert(key);
    /// }
    ///
    /// assert_eq!(set.select(2), Some(20));
    /// assert_eq!(set.select(4), None);
    /// ```
    #[must_use]
    pub fn select(&self, k: usize) -> Option<u64> {
        if k == 0 || k > self.len() {
            return None;
        }

        let mut node = &*self.root;
        let mut k = k;
        loop {
            if node.leaf {
                return Some(node.keys[k - 1]);
            }
            let mut idx = 0;
            loop {
                let child_size = node.children[idx].size;
                if k <= child_size {
                    break;
                }
                k -= child_size;
                if k == 1 {
                    return Some(node.keys[idx]);
                }
                k -= 1;
                idx += 1;
            }
            node = &node.children[idx];
        }
    }

    /// Returns every key in the inclusive range `[lo, hi]`, ascending.
    ///
    /// Returns an empty vector when no keys fall in the range, or when
    /// `lo > hi`. The traversal prunes both ends: only nodes that can
    /// contain in-range keys are visited.
    #[must_use]
    pub fn keys_in_range(&self, lo: u64, hi: u64) -> Vec<u64> {
        let mut out = Vec::new();
        if lo <= hi {
            collect_range(&self.root, lo, hi, &mut |key| out.push(key));
        }
        out
    }

    /// Returns every prime key in the inclusive range `[lo, hi]`, ascending.
    ///
    /// Runs the same pruned traversal as
    /// [`keys_in_range`](RankSet::keys_in_range), filtering each emitted key
    /// through [`is_prime`].
    #[must_use]
    pub fn primes_in_range(&self, lo: u64, hi: u64) -> Vec<u64> {
        let mut out = Vec::new();
        if lo <= hi {
            collect_range(&self.root, lo, hi, &mut |key| {
                if is_prime(key) {
                    out.push(key);
                }
            });
        }
        out
    }
}

impl fmt::Debug for RankSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys_in_range(1, u64::MAX)).finish()
    }
}

/// Inserts `key` below `node`, which must not be full. Splits any full
/// child before descending into it; the leaf insertion therefore cannot
/// overflow. Each frame recomputes its node's size on the way back up.
fn insert_into(node: &mut Node, t: usize, key: u64) {
    let Err(mut idx) = node.keys.binary_search(&key) else {
        // Duplicates are rejected by the caller before the descent starts.
        return;
    };
    if node.leaf {
        node.keys.insert(idx, key);
    } else {
        if node.children[idx].is_full(t) {
            node.split_child(t, idx);
            // The promoted median may shift the target child one slot right.
            if key > node.keys[idx] {
                idx += 1;
            }
        }
        insert_into(&mut node.children[idx], t, key);
    }
    node.refresh_size();
}

/// Removes `key` from the subtree rooted at `node`. The caller guarantees
/// the key is present and that `node` holds at least `t` keys unless it is
/// the root. Each frame recomputes its node's size on the way back up.
fn remove_from(node: &mut Node, t: usize, key: u64) {
    match node.keys.binary_search(&key) {
        Ok(idx) => {
            if node.leaf {
                node.keys.remove(idx);
            } else if node.children[idx].can_lend(t) {
                // Overwrite with the predecessor, then delete the
                // predecessor from the left subtree.
                let pred = node.children[idx].max_key();
                node.keys[idx] = pred;
                remove_from(&mut node.children[idx], t, pred);
            } else if node.children[idx + 1].can_lend(t) {
                let succ = node.children[idx + 1].min_key();
                node.keys[idx] = succ;
                remove_from(&mut node.children[idx + 1], t, succ);
            } else {
                // Both neighbors are minimal: absorb the key into a merged
                // child and delete it from there.
                node.merge_children(idx);
                remove_from(&mut node.children[idx], t, key);
            }
        }
        Err(idx) => {
            if node.leaf {
                // Absence is rejected by the caller before the descent.
                return;
            }
            let idx = node.ensure_child_min(t, idx);
            remove_from(&mut node.children[idx], t, key);
        }
    }
    node.refresh_size();
}

/// Emits every key of `node`'s subtree within `[lo, hi]`, in ascending
/// order, visiting only subtrees that can intersect the range.
fn collect_range(node: &Node, lo: u64, hi: u64, emit: &mut impl FnMut(u64)) {
    let start = node.keys.partition_point(|&k| k < lo);
    if !node.leaf {
        collect_range(&node.children[start], lo, hi, emit);
    }
    for i in start..node.keys.len() {
        let key = node.keys[i];
        if key > hi {
            return;
        }
        emit(key);
        if !node.leaf {
            collect_range(&node.children[i + 1], lo, hi, emit);
        }
    }
}
