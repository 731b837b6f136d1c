//! Route insertion.

use log::error;

use crate::errors::{InsertError, RadixError};
use crate::key::{first_diff_bit, ByteKey};
use crate::mask::{lexo_greater, refines, MaskInfo};
use crate::mklist::MkIx;
use crate::node::{Leaf, LeafRef, NodeIx, NodeTwin, Slot};
use crate::table::RadixTable;

impl RadixTable {
    /// Insert a route, consuming the caller-supplied [`NodeTwin`].
    ///
    /// On success, returns the handle of the new leaf. On failure the table
    /// is unchanged and the twin rides back inside the [`InsertError`]:
    /// the key+mask pair may already be present, the mask cache may be
    /// exhausted, or the route's normal mask may collide with a different
    /// normal mask at the same attachment slot.
    ///
    /// ```
    /// # use radix_route::{ByteKey, NodeTwin, RadixTable, RadixError, TrieRuntime};
    /// let runtime = TrieRuntime::new(5);
    /// let mut table = RadixTable::new(&runtime, 8);
    /// let key = ByteKey::from_octets(&[10, 0, 0, 0]);
    /// let mask = ByteKey::from_octets(&[255, 255, 0, 0]);
    /// assert!(table.add_route(key.clone(), Some(&mask), NodeTwin::new()).is_ok());
    /// let err = table.add_route(key, Some(&mask), NodeTwin::new()).unwrap_err();
    /// assert_eq!(err.kind, RadixError::DuplicateRoute);
    /// ```
    pub fn add_route(
        &mut self,
        key: ByteKey,
        mask: Option<&ByteKey>,
        twin: NodeTwin,
    ) -> Result<LeafRef, InsertError> {
        if key.len() > self.runtime.borrow().max_key_len {
            return Err(InsertError::new(RadixError::KeyTooLong, twin));
        }

        // Canonicalize up front; the mask's index decides both the chain
        // position and the attachment ancestor.
        let minfo: Option<MaskInfo> = match mask {
            Some(m) => match self
                .runtime
                .borrow_mut()
                .add_mask(m, false, self.byte_offset)
            {
                Some(info) => Some(info),
                None => return Err(InsertError::new(RadixError::AllocationFailure, twin)),
            },
            None => None,
        };

        let nearest = self.store.descend(self.top, &key);
        let diff = first_diff_bit(&key, &self.store.leaf(nearest).key, self.byte_offset);

        let (new_ix, head) = match diff {
            Some(b) => {
                let leaf = self.fresh_leaf(key, minfo);
                let (leaf_ix, branch_ix) = self.store.install_twin(twin);
                self.store.splice_pair(self.top, leaf, b, leaf_ix, branch_ix);
                self.promote_masks(leaf_ix);
                (leaf_ix, leaf_ix)
            }
            None => self.splice_duplicate(key, minfo, nearest, twin)?,
        };

        if let Some(mi) = minfo {
            if let Err(kind) = self.attach_mask(new_ix, head, mi) {
                let twin = self.remove_leaf_structural(new_ix);
                return Err(InsertError::new(kind, twin));
            }
        }
        self.count += 1;
        Ok(LeafRef(new_ix))
    }

    fn fresh_leaf(&self, key: ByteKey, minfo: Option<MaskInfo>) -> Leaf {
        Leaf {
            key,
            mask: minfo.map(|m| m.ix),
            bit: minfo.map(|m| m.bit).unwrap_or(-1),
            normal: minfo.map(|m| m.normal).unwrap_or(false),
            root: false,
            parent: 0,
            dup_next: None,
            annotation: None,
            twin: 0,
        }
    }

    /// Splice a route whose key is already in the tree into the existing
    /// duplicate-key chain, most-to-least specific. Returns the new leaf and
    /// the (possibly relocated) chain head.
    fn splice_duplicate(
        &mut self,
        key: ByteKey,
        minfo: Option<MaskInfo>,
        head: NodeIx,
        twin: NodeTwin,
    ) -> Result<(NodeIx, NodeIx), InsertError> {
        let new_mask = minfo.map(|m| m.ix);

        // Find the first entry the new route is more specific than. An
        // unmasked route outranks everything; unmasked entries already in
        // the chain rank above any masked newcomer.
        let mut prev: Option<NodeIx> = None;
        let mut cur = Some(head);
        while let Some(c) = cur {
            let lf = self.store.leaf(c);
            if lf.mask == new_mask {
                return Err(InsertError::new(RadixError::DuplicateRoute, twin));
            }
            let outranks = match (minfo, lf.mask) {
                (None, _) => true,
                (Some(mi), Some(lm)) => {
                    mi.bit < lf.bit || {
                        let rt = self.runtime.borrow();
                        let new_key = rt.masks.key(mi.ix);
                        let old_key = rt.masks.key(lm);
                        refines(new_key, old_key) || lexo_greater(new_key, old_key)
                    }
                }
                (Some(_), None) => false,
            };
            if outranks {
                break;
            }
            prev = Some(c);
            cur = lf.dup_next;
        }

        let (leaf_ix, branch_ix) = self.store.install_twin(twin);
        let mut leaf = self.fresh_leaf(key, minfo);
        leaf.twin = branch_ix;
        match prev {
            None => {
                // New chain head: take over the old head's place in the
                // tree, pushing it down the chain.
                let old_parent = self.store.leaf(head).parent;
                leaf.root = self.store.leaf(head).root;
                leaf.parent = old_parent;
                leaf.dup_next = Some(head);
                self.store.slots[leaf_ix] = Slot::Leaf(leaf);
                self.store.leaf_mut(head).parent = leaf_ix;
                self.store.replace_child(old_parent, head, leaf_ix);
                Ok((leaf_ix, leaf_ix))
            }
            Some(p) => {
                let next = self.store.leaf(p).dup_next;
                leaf.parent = p;
                leaf.dup_next = next;
                self.store.slots[leaf_ix] = Slot::Leaf(leaf);
                self.store.leaf_mut(p).dup_next = Some(leaf_ix);
                if let Some(n) = next {
                    self.store.leaf_mut(n).parent = leaf_ix;
                }
                Ok((leaf_ix, head))
            }
        }
    }

    /// A fresh branch may now sit above masks that belong higher in the
    /// tree: pull qualifying entries from the displaced sibling up onto the
    /// new branch so the match ascent can see them.
    fn promote_masks(&mut self, new_leaf: NodeIx) {
        let t = self.store.leaf(new_leaf).parent;
        let b_leaf = -1 - self.store.branch(t).bit;
        let x = self.store.sibling(t, new_leaf);

        if self.store.is_leaf(x) {
            // Sibling is a leaf chain: annotate members whose mask reaches
            // at or above the new branch and is not yet annotated.
            let mut tail: Option<MkIx> = None;
            let mut cur = Some(x);
            while let Some(c) = cur {
                let lf = self.store.leaf(c);
                let next = lf.dup_next;
                if lf.mask.is_some() && lf.bit >= b_leaf && lf.annotation.is_none() {
                    let mk = self.new_annotation(c, None);
                    match tail {
                        None => self.store.branch_mut(t).mask_list = Some(mk),
                        Some(last) => self.mk.get_mut(last).next = Some(mk),
                    }
                    tail = Some(mk);
                }
                cur = next;
            }
        } else if self.store.branch(x).mask_list.is_some() {
            // Sibling is a branch: move the general tail of its sorted list
            // up, keeping the more specific head where it is.
            let mut prev: Option<MkIx> = None;
            let mut cur = self.store.branch(x).mask_list;
            while let Some(c) = cur {
                if self.mk.get(c).bit >= b_leaf {
                    break;
                }
                prev = Some(c);
                cur = self.mk.get(c).next;
            }
            self.store.branch_mut(t).mask_list = cur;
            match prev {
                None => self.store.branch_mut(x).mask_list = None,
                Some(p) => self.mk.get_mut(p).next = None,
            }
        }
    }

    /// Attach the new route's mask at the highest ancestor still testing a
    /// bit the mask keeps, merging with an existing entry for the identical
    /// mask instead of duplicating it.
    fn attach_mask(
        &mut self,
        new_ix: NodeIx,
        head: NodeIx,
        mi: MaskInfo,
    ) -> Result<(), RadixError> {
        let t0 = self.store.leaf(head).parent;
        let b = -1 - mi.bit;
        if b > self.store.branch(t0).bit {
            // The mask is more specific than the leaf's own branch; chain
            // scans will find it without an annotation.
            return Ok(());
        }
        let b_leaf = self.store.leaf(new_ix).bit;
        let x = self.attachment_ancestor(t0, b);

        let mut prev: Option<MkIx> = None;
        let mut cur = self.store.branch(x).mask_list;
        while let Some(c) = cur {
            let (ann_bit, ann_normal, ann_leaf, ann_mask, ann_next) = {
                let a = self.mk.get(c);
                (a.bit, a.normal, a.leaf, a.mask, a.next)
            };
            if ann_bit < b_leaf {
                prev = Some(c);
                cur = ann_next;
                continue;
            }
            if ann_bit > b_leaf {
                break;
            }
            // Same index: share, collide, or order by refinement.
            let mmask = if ann_normal {
                if mi.normal {
                    error!("radix: non-unique normal route, mask not entered");
                    return Err(RadixError::MaskConflict);
                }
                let leaf = ann_leaf.expect("normal annotation without leaf");
                self.store
                    .leaf(leaf)
                    .mask
                    .expect("normal annotation leaf without mask")
            } else {
                ann_mask.expect("non-normal annotation without mask")
            };
            if Some(mmask) == self.store.leaf(new_ix).mask {
                self.mk.get_mut(c).refs += 1;
                self.store.leaf_mut(new_ix).annotation = Some(c);
                return Ok(());
            }
            let outranks = {
                let rt = self.runtime.borrow();
                let new_key = rt.masks.key(mi.ix);
                let old_key = rt.masks.key(mmask);
                refines(new_key, old_key) || lexo_greater(new_key, old_key)
            };
            if outranks {
                break;
            }
            prev = Some(c);
            cur = ann_next;
        }

        let mk = self.new_annotation(new_ix, cur);
        match prev {
            None => self.store.branch_mut(x).mask_list = Some(mk),
            Some(p) => self.mk.get_mut(p).next = Some(mk),
        }
        Ok(())
    }
}
