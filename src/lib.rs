//! This crate provides the classic routing-table data structure: a radix
//! (PATRICIA) trie over length-prefixed byte-string keys with masked,
//! longest-prefix-match lookup. Routes are (key, netmask) pairs; lookups
//! find the most specific route covering a key, masks are canonicalized and
//! shared, and several routes may coexist on one key with different masks.
//! Keys are treated purely as bit strings; nothing in the table interprets
//! them as addresses (the optional `ipnet` feature only adds constructors).
//!
//! # Description of the tree
//!
//! Each internal node (branch) tests exactly one bit of the key: clear goes
//! left, set goes right. One-way branches are elided, so a descent takes at
//! most one step per key bit and ends at a leaf whose key is the nearest in
//! the tree. A leaf holds a key, an optional canonical mask, and a chain of
//! further routes with the identical key ordered most-to-least specific.
//!
//! Three auxiliary mechanisms make masked matching work:
//!
//! - a shared **mask cache** ([`TrieRuntime`]) deduplicates netmask byte
//!   strings, so mask equality is handle identity ([`MaskRef`]);
//! - sorted, refcounted **mask lists** on branch nodes record routes whose
//!   mask reaches higher up the tree than their own leaf, letting a failed
//!   descent find them while walking back toward the root;
//! - **node twins** ([`NodeTwin`]): the caller owns the two-slot storage of
//!   every route, supplying it to [`add_route`](RadixTable::add_route) and
//!   receiving it back from [`remove_route`](RadixTable::remove_route); the
//!   table itself only allocates mask bookkeeping.
//!
//! # Operations on the table
//!
//! The following are the computational complexities of the operations,
//! where `b` is the bit length of a key and `m` the length of a mask list
//! (small in practice).
//!
//! | Operation                        | Complexity |
//! |----------------------------------|------------|
//! | `add_route`, `remove_route`      | `O(b + m)` |
//! | `best_match`, `exact_match`      | `O(b · m)` |
//! | `walk_tree`, `walk_tree_mut`     | `O(n)`     |
//! | `clear`                          | `O(n)`     |
//! | `len` and `is_empty`             | `O(1)`     |
//!
//! # Example
//!
//! ```
//! use radix_route::{ByteKey, NodeTwin, RadixTable, TrieRuntime};
//!
//! // Keys of up to 5 bytes (one length byte + an IPv4 address), compared
//! // starting after the length byte.
//! let runtime = TrieRuntime::new(5);
//! let mut table = RadixTable::new(&runtime, 8);
//!
//! let wide = ByteKey::from_octets(&[10, 0, 0, 0]);
//! let narrow = ByteKey::from_octets(&[10, 1, 0, 0]);
//! table.add_route(wide, Some(&ByteKey::from_octets(&[255, 0, 0, 0])), NodeTwin::new())
//!     .unwrap();
//! table.add_route(narrow.clone(), Some(&ByteKey::from_octets(&[255, 255, 0, 0])), NodeTwin::new())
//!     .unwrap();
//!
//! let probe = ByteKey::from_octets(&[10, 1, 2, 3]);
//! let hit = table.best_match(&probe).unwrap();
//! assert_eq!(table.key(hit), &narrow);
//! ```
//!
//! # Synchronization
//!
//! A table and its [`TrieRuntime`] are single-threaded; the caller
//! serializes access. No operation blocks, and all work is bounded by the
//! key bit length and the mask-list lengths.

#![allow(clippy::collapsible_else_if)]
#![deny(missing_docs)]

mod errors;
mod fmt;
mod insert;
mod iter;
mod key;
mod mask;
mod mklist;
mod node;
mod remove;
mod runtime;
#[cfg(feature = "serde")]
mod serde;
mod table;

#[cfg(test)]
#[cfg(feature = "ipnet")]
mod fuzzing;

pub use errors::{InsertError, RadixError};
pub use iter::Iter;
pub use key::ByteKey;
pub use node::{LeafRef, MaskRef, NodeTwin};
pub use runtime::TrieRuntime;
pub use table::RadixTable;
