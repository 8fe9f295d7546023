//! An order-statistic B-tree set for positive integer keys.
//!
//! This crate provides [`RankSet`], an ordered set of distinct `u64` keys
//! (all `>= 1`) backed by a B-tree whose nodes carry a subtree-size
//! augmentation. On top of membership it answers four queries in
//! O(t · log_t n):
//!
//! - [`rank`](RankSet::rank) - the 1-based position of a key in sorted order
//! - [`select`](RankSet::select) - the k-th smallest key
//! - [`keys_in_range`](RankSet::keys_in_range) - all keys within an inclusive range
//! - [`primes_in_range`](RankSet::primes_in_range) - the probable primes within a range
//!
//! # Example
//!
//! ```
//! use rankset::RankSet;
//!
//! let mut set = RankSet::new(2);
//! for key in [10, 20, 5, 6, 12, 30, 7, 17] {
//!     set.insert(key);
//! }
//!
//! assert_eq!(set.select(1), Some(5));
//! assert_eq!(set.rank(12), Some(5));
//! assert_eq!(set.keys_in_range(6, 17), vec![6, 7, 10, 12, 17]);
//! assert_eq!(set.primes_in_range(6, 17), vec![7, 17]);
//! ```
//!
//! # Implementation
//!
//! The tree follows the classic split-on-descent / ensure-minimum-on-descent
//! protocol: inserts split full nodes on the way down, deletes top up
//! minimum-sized children before entering them, so the final leaf mutation
//! is unconditional. Every node tracks the number of keys in its subtree,
//! which is what makes `rank` and `select` logarithmic.
//!
//! The primality filter is Miller-Rabin over a fixed witness set that is
//! deterministic for the whole `u64` range; see [`is_prime`].

#![no_std]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

extern crate alloc;

mod node;
mod primality;
mod tree;

pub use primality::is_prime;
pub use tree::RankSet;
