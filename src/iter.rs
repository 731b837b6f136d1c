//! Tree traversals: iteration and the mutation-safe walk.

use crate::key::ByteKey;
use crate::node::{LeafRef, NodeIx, Slot};
use crate::table::RadixTable;

impl RadixTable {
    /// Visit every active route in lexicographic order, duplicate-key
    /// chains included, most specific first. Return `Err` from the callback
    /// to stop the walk.
    ///
    /// ```
    /// # use radix_route::{ByteKey, NodeTwin, RadixTable, TrieRuntime};
    /// let runtime = TrieRuntime::new(5);
    /// let mut table = RadixTable::new(&runtime, 8);
    /// for octet in [20u8, 10, 30] {
    ///     table.add_route(ByteKey::from_octets(&[octet, 0, 0, 0]), None, NodeTwin::new()).unwrap();
    /// }
    /// let mut seen = Vec::new();
    /// table.walk_tree::<(), _>(|t, leaf| {
    ///     seen.push(t.key(leaf).octets()[0]);
    ///     Ok(())
    /// }).unwrap();
    /// assert_eq!(seen, vec![10, 20, 30]);
    /// ```
    pub fn walk_tree<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&Self, LeafRef) -> Result<(), E>,
    {
        let mut rn = self.leftmost(self.top);
        loop {
            let base = rn;
            let next = self.walk_successor(rn);
            let mut chain = Some(base);
            while let Some(ix) = chain {
                chain = self.store.leaf(ix).dup_next;
                if !self.store.leaf(ix).root {
                    f(self, LeafRef(ix))?;
                }
            }
            rn = next;
            if self.store.leaf(rn).root {
                return Ok(());
            }
        }
    }

    /// Like [`walk_tree`](Self::walk_tree), but the callback gets the table
    /// mutably and may remove the leaf it is handed (and only that leaf):
    /// the in-order successor is computed before each visit, so freeing the
    /// current pair cannot strand the walk.
    pub fn walk_tree_mut<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, LeafRef) -> Result<(), E>,
    {
        let mut rn = self.leftmost(self.top);
        loop {
            let next = self.walk_successor(rn);
            let mut chain = Some(rn);
            while let Some(ix) = chain {
                chain = self.store.leaf(ix).dup_next;
                if !self.store.leaf(ix).root {
                    f(self, LeafRef(ix))?;
                }
            }
            rn = next;
            if self.store.leaf(rn).root {
                return Ok(());
            }
        }
    }

    /// The next tree leaf in order after `rn`: climb while sitting on a
    /// right child, step over, then descend leftmost.
    fn walk_successor(&self, rn: NodeIx) -> NodeIx {
        let mut cur = rn;
        loop {
            if self.node_is_root(cur) {
                break;
            }
            let p = self.store.parent_of(cur);
            if self.store.branch(p).right == cur {
                cur = p;
            } else {
                break;
            }
        }
        let p = self.store.parent_of(cur);
        self.leftmost(self.store.branch(p).right)
    }

    /// Remove every route, tearing the tree back down to its sentinels
    /// through the regular delete path.
    ///
    /// ```
    /// # use radix_route::{ByteKey, NodeTwin, RadixTable, TrieRuntime};
    /// let runtime = TrieRuntime::new(5);
    /// let mut table = RadixTable::new(&runtime, 8);
    /// table.add_route(ByteKey::from_octets(&[10, 0, 0, 0]), None, NodeTwin::new()).unwrap();
    /// table.clear();
    /// assert!(table.is_empty());
    /// ```
    pub fn clear(&mut self) {
        let result: Result<(), ()> = self.walk_tree_mut(|table, leaf| {
            let key = table.key(leaf).clone();
            let mask = table.mask(leaf).map(|m| table.mask_key(m));
            if table.remove_route(&key, mask.as_ref()).is_err() {
                log::error!("radix: clear failed to remove a visited route");
            }
            Ok(())
        });
        let _ = result;
    }

    /// An iterator over the handles of all active routes in lexicographic
    /// order. The table must not be mutated while iterating.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            stack: vec![self.top],
            chain: None,
        }
    }

    /// An iterator over `(key, mask)` pairs of all active routes.
    pub fn routes(&self) -> impl Iterator<Item = (&ByteKey, Option<ByteKey>)> + '_ {
        self.iter()
            .map(|l| (self.key(l), self.mask(l).map(|m| self.mask_key(m))))
    }
}

/// An iterator over all routes of a [`RadixTable`] in lexicographic order.
/// Created by [`RadixTable::iter`].
#[derive(Clone)]
pub struct Iter<'a> {
    table: &'a RadixTable,
    stack: Vec<NodeIx>,
    chain: Option<NodeIx>,
}

impl Iterator for Iter<'_> {
    type Item = LeafRef;

    fn next(&mut self) -> Option<LeafRef> {
        loop {
            if let Some(c) = self.chain {
                self.chain = self.table.store.leaf(c).dup_next;
                if !self.table.store.leaf(c).root {
                    return Some(LeafRef(c));
                }
                continue;
            }
            let ix = self.stack.pop()?;
            match &self.table.store.slots[ix] {
                Slot::Branch(b) => {
                    self.stack.push(b.right);
                    self.stack.push(b.left);
                }
                Slot::Leaf(_) => self.chain = Some(ix),
                Slot::Vacant => unreachable!("vacant slot reached from the tree"),
            }
        }
    }
}

impl<'a> IntoIterator for &'a RadixTable {
    type Item = LeafRef;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
