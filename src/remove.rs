//! Route removal.

use log::error;

use crate::errors::RadixError;
use crate::key::ByteKey;
use crate::mklist::MkIx;
use crate::node::{NodeIx, NodeTwin, Slot};
use crate::table::RadixTable;

impl RadixTable {
    /// Remove the route with this key and mask, returning its storage twin
    /// to the caller.
    ///
    /// With `mask: None`, the most specific entry at the key (the chain
    /// head) is removed. A missing key/mask pair reports
    /// [`RadixError::NotFound`]; a broken mask-annotation link reports
    /// [`RadixError::Inconsistent`] and aborts instead of desynchronizing
    /// the tree.
    ///
    /// ```
    /// # use radix_route::{ByteKey, NodeTwin, RadixTable, TrieRuntime};
    /// let runtime = TrieRuntime::new(5);
    /// let mut table = RadixTable::new(&runtime, 8);
    /// let key = ByteKey::from_octets(&[10, 0, 0, 0]);
    /// let mask = ByteKey::from_octets(&[255, 0, 0, 0]);
    /// table.add_route(key.clone(), Some(&mask), NodeTwin::new()).unwrap();
    /// let twin = table.remove_route(&key, Some(&mask)).unwrap();
    /// assert_eq!(twin.key().unwrap(), &key);
    /// assert!(table.is_empty());
    /// ```
    pub fn remove_route(
        &mut self,
        key: &ByteKey,
        mask: Option<&ByteKey>,
    ) -> Result<NodeTwin, RadixError> {
        if key.len() > self.runtime.borrow().max_key_len {
            return Err(RadixError::KeyTooLong);
        }
        let head = self.store.descend(self.top, key);
        {
            let lf = self.store.leaf(head);
            for i in self.byte_offset..key.len() {
                if key.byte(i) != lf.key.byte(i) {
                    return Err(RadixError::NotFound);
                }
            }
        }

        // Resolve the chain entry carrying the canonical mask.
        let mut tt = head;
        if let Some(m) = mask {
            let info = self
                .runtime
                .borrow_mut()
                .add_mask(m, true, self.byte_offset)
                .ok_or(RadixError::NotFound)?;
            while self.store.leaf(tt).mask != Some(info.ix) {
                tt = self.store.leaf(tt).dup_next.ok_or(RadixError::NotFound)?;
            }
        }

        self.release_annotation(tt, head)?;
        if self.store.leaf(tt).root {
            return Err(RadixError::NotFound);
        }
        self.count -= 1;
        Ok(self.remove_leaf_structural(tt))
    }

    /// Drop the leaf's entry from the mask list it was attached to,
    /// honoring shared refcounts. The attachment ancestor is re-derived
    /// exactly as insertion derived it.
    fn release_annotation(&mut self, tt: NodeIx, head: NodeIx) -> Result<(), RadixError> {
        let (mask, annotation, normal, bit) = {
            let lf = self.store.leaf(tt);
            (lf.mask, lf.annotation, lf.normal, lf.bit)
        };
        if mask.is_none() {
            return Ok(());
        }
        let Some(m0) = annotation else {
            return Ok(());
        };

        if normal {
            let a = self.mk.get(m0);
            if a.leaf != Some(tt) || a.refs > 0 {
                error!("radix: inconsistent mask annotation on delete");
                return Err(RadixError::Inconsistent);
            }
        } else {
            if self.mk.get(m0).mask != mask {
                error!("radix: inconsistent mask annotation on delete");
                return Err(RadixError::Inconsistent);
            }
            let refs = {
                let a = self.mk.get_mut(m0);
                a.refs -= 1;
                a.refs
            };
            if refs >= 0 {
                // Other duplicate-key leaves still share the entry.
                self.store.leaf_mut(tt).annotation = None;
                return Ok(());
            }
        }

        let b = -1 - bit;
        let t0 = self.store.leaf(head).parent;
        if b > self.store.branch(t0).bit {
            // Wasn't lifted at all.
            self.store.leaf_mut(tt).annotation = None;
            return Ok(());
        }
        let x = self.attachment_ancestor(t0, b);

        let mut prev: Option<MkIx> = None;
        let mut cur = self.store.branch(x).mask_list;
        let mut found = false;
        while let Some(c) = cur {
            if c == m0 {
                let next = self.mk.get(c).next;
                match prev {
                    None => self.store.branch_mut(x).mask_list = next,
                    Some(p) => self.mk.get_mut(p).next = next,
                }
                self.mk.release(c);
                found = true;
                break;
            }
            prev = Some(c);
            cur = self.mk.get(c).next;
        }
        if !found {
            error!("radix: lost mask annotation on delete");
            if normal {
                // A dangling reference to the dying leaf would corrupt
                // later matches.
                return Err(RadixError::Inconsistent);
            }
        }
        self.store.leaf_mut(tt).annotation = None;
        Ok(())
    }

    /// Unsplice a leaf from the tree (or its duplicate chain) and hand the
    /// (leaf, branch) pair back. Mask lists that were only held up by the
    /// removed branch are demoted onto the surviving sibling.
    pub(crate) fn remove_leaf_structural(&mut self, tt: NodeIx) -> NodeTwin {
        let head = self.chain_head(tt);
        if self.store.leaf(head).dup_next.is_some() || tt != head {
            return self.remove_from_chain(tt, head);
        }

        // Sole leaf: the parent branch goes with it.
        let t = self.store.leaf(tt).parent;
        let x = self.store.sibling(t, tt);
        let p = self.store.branch(t).parent;
        self.store.replace_child(p, t, x);
        self.store.set_parent(x, p);

        if let Some(list) = self.store.branch(t).mask_list {
            self.demote_masks(list, x);
            self.store.branch_mut(t).mask_list = None;
        }

        // The branch half of this pair may be holding up an unrelated
        // subtree; if so, park it in the slot the unspliced branch vacated.
        let tw = self.store.leaf(tt).twin;
        if tw != t {
            let _unspliced = std::mem::take(&mut self.store.slots[t]);
            if matches!(self.store.slots[tw], Slot::Branch(_)) {
                self.store.move_branch(tw, t);
            }
        }
        self.extract_twin(tt)
    }

    /// Remove a chain member, keeping the tree shape.
    fn remove_from_chain(&mut self, tt: NodeIx, head: NodeIx) -> NodeTwin {
        let survivor;
        if tt == head {
            let next = self
                .store
                .leaf(tt)
                .dup_next
                .expect("chain head without successor");
            let parent = self.store.leaf(tt).parent;
            self.store.leaf_mut(next).parent = parent;
            self.store.replace_child(parent, tt, next);
            survivor = next;
        } else {
            let mut p = head;
            let mut found = false;
            loop {
                match self.store.leaf(p).dup_next {
                    Some(d) if d == tt => {
                        found = true;
                        break;
                    }
                    Some(d) => p = d,
                    None => break,
                }
            }
            if found {
                let next = self.store.leaf(tt).dup_next;
                self.store.leaf_mut(p).dup_next = next;
                if let Some(n) = next {
                    self.store.leaf_mut(n).parent = p;
                }
            } else {
                error!("radix: leaf missing from its duplicate chain");
            }
            survivor = head;
        }

        // At most one twin branch per chain is active; if it is ours,
        // migrate it into the surviving head's unused slot.
        let tw = self.store.leaf(tt).twin;
        if matches!(self.store.slots[tw], Slot::Branch(_)) {
            let target = self.store.leaf(survivor).twin;
            if matches!(self.store.slots[target], Slot::Vacant) {
                self.store.move_branch(tw, target);
            } else {
                error!("radix: no vacant twin slot for branch migration");
            }
        }
        self.extract_twin(tt)
    }

    /// Release promoted mask-list entries down onto the surviving sibling
    /// of a removed branch.
    fn demote_masks(&mut self, list: MkIx, x: NodeIx) {
        if self.store.is_leaf(x) {
            // Entries for routes in the sibling's own chain are no longer
            // needed above it; drop one reference each.
            let mut m = Some(list);
            let mut xi = Some(x);
            while let (Some(mc), Some(xc)) = (m, xi) {
                if self.store.leaf(xc).annotation == Some(mc) {
                    let next = self.mk.get(mc).next;
                    self.store.leaf_mut(xc).annotation = None;
                    let refs = {
                        let a = self.mk.get_mut(mc);
                        a.refs -= 1;
                        a.refs
                    };
                    if refs < 0 {
                        self.mk.release(mc);
                    }
                    m = next;
                }
                xi = self.store.leaf(xc).dup_next;
            }
            if m.is_some() {
                error!("radix: orphaned mask annotation on delete");
            }
        } else {
            // Everything promoted onto the dying branch is more general
            // than anything on the sibling: append at the tail.
            match self.store.branch(x).mask_list {
                None => self.store.branch_mut(x).mask_list = Some(list),
                Some(first) => {
                    let mut last = first;
                    while let Some(n) = self.mk.get(last).next {
                        last = n;
                    }
                    self.mk.get_mut(last).next = Some(list);
                }
            }
        }
    }

    /// Pull both slots of a removed pair out of the arena, deactivated.
    fn extract_twin(&mut self, tt: NodeIx) -> NodeTwin {
        let tw = self.store.leaf(tt).twin;
        let mut leaf_slot = self.store.release(tt);
        let branch_slot = if tw != tt {
            self.store.release(tw)
        } else {
            Slot::Vacant
        };
        if let Slot::Leaf(l) = &mut leaf_slot {
            l.dup_next = None;
            l.annotation = None;
        }
        NodeTwin {
            slots: [leaf_slot, branch_slot],
        }
    }
}
