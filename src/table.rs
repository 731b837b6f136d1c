//! The routing-table head and the match operations.

use crate::key::ByteKey;
use crate::mklist::{Annotation, AnnotationArena, MkIx};
use crate::node::{LeafRef, MaskRef, NodeIx, NodeStore, Slot};
use crate::runtime::{RuntimeInner, TrieRuntime};

/// A radix (PATRICIA) trie keyed by length-prefixed byte strings, with
/// masked longest-prefix matching.
///
/// The table skips a fixed number of leading key bits (`key_bit_offset`,
/// e.g. an address-family tag) before comparing. All mutating and searching
/// operations are plain methods; the caller serializes access.
///
/// ```
/// # use radix_route::{ByteKey, NodeTwin, RadixTable, TrieRuntime};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = TrieRuntime::new(5);
/// let mut table = RadixTable::new(&runtime, 8);
///
/// let net = ByteKey::from_octets(&[10, 0, 0, 0]);
/// let mask = ByteKey::from_octets(&[255, 0, 0, 0]);
/// table.add_route(net, Some(&mask), NodeTwin::new()).map_err(|e| e.kind)?;
///
/// let probe = ByteKey::from_octets(&[10, 1, 2, 3]);
/// let hit = table.best_match(&probe).expect("10.0.0.0/8 covers 10.1.2.3");
/// assert_eq!(table.key(hit).octets(), &[10, 0, 0, 0]);
/// # Ok(())
/// # }
/// ```
pub struct RadixTable {
    pub(crate) store: NodeStore,
    pub(crate) mk: AnnotationArena,
    pub(crate) runtime: TrieRuntime,
    pub(crate) top: NodeIx,
    pub(crate) byte_offset: usize,
    pub(crate) count: usize,
}

impl RadixTable {
    /// Create an empty table whose keys are compared starting at bit
    /// `key_bit_offset`.
    pub fn new(runtime: &TrieRuntime, key_bit_offset: u32) -> Self {
        let (zeros, ones) = {
            let rt = runtime.borrow();
            (rt.zeros.clone(), rt.ones.clone())
        };
        let mut store = NodeStore::new();
        let top = store.seed_head(key_bit_offset, zeros, ones);
        Self {
            store,
            mk: AnnotationArena::new(),
            runtime: runtime.clone(),
            top,
            byte_offset: (key_bit_offset >> 3) as usize,
            count: 0,
        }
    }

    /// The runtime this table was created from.
    pub fn runtime(&self) -> &TrieRuntime {
        &self.runtime
    }

    /// Number of routes in the table (duplicate-key entries each count).
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The key of a route.
    pub fn key(&self, leaf: LeafRef) -> &ByteKey {
        &self.store.leaf(leaf.0).key
    }

    /// The canonical mask of a route, or `None` for an unmasked (host)
    /// route. Equal `MaskRef`s mean byte-identical (trimmed) masks.
    pub fn mask(&self, leaf: LeafRef) -> Option<MaskRef> {
        self.store.leaf(leaf.0).mask
    }

    /// The trimmed byte string of a canonical mask.
    pub fn mask_key(&self, mask: MaskRef) -> ByteKey {
        self.runtime.borrow().masks.key(mask).clone()
    }

    /// The next, less specific route with the same key, if any.
    pub fn dup_next(&self, leaf: LeafRef) -> Option<LeafRef> {
        self.store.leaf(leaf.0).dup_next.map(LeafRef)
    }

    /// Find the most specific route matching `key`.
    pub fn best_match(&self, key: &ByteKey) -> Option<LeafRef> {
        let rt = self.runtime.borrow();
        if key.len() > rt.max_key_len {
            return None;
        }
        let vlen = key.len();
        let nearest = self.store.descend(self.top, key);

        // Compare as a host destination first.
        let mut diff = None;
        {
            let t = self.store.leaf(nearest);
            for i in self.byte_offset..vlen {
                let x = key.byte(i) ^ t.key.byte(i);
                if x != 0 {
                    diff = Some(((i as u32) << 3) + x.leading_zeros());
                    break;
                }
            }
        }
        let Some(b) = diff else {
            // Exact match. An explicitly stored default hangs off the
            // all-zeros sentinel's chain.
            let mut ix = nearest;
            if self.store.leaf(ix).root {
                ix = self.store.leaf(ix).dup_next?;
            }
            if self.store.leaf(ix).root {
                return None;
            }
            return Some(LeafRef(ix));
        };

        let probe_bit = -1 - b as i32;
        let matched_off = (b >> 3) as usize;

        // The nearest leaf is a net, not our host: one of its duplicates
        // may still cover the key. An unmasked chain head cannot.
        let mut cur = {
            let head = self.store.leaf(nearest);
            if head.mask.is_none() {
                head.dup_next
            } else {
                Some(nearest)
            }
        };
        while let Some(ix) = cur {
            let lf = self.store.leaf(ix);
            if lf.normal {
                if probe_bit <= lf.bit {
                    return Some(LeafRef(ix));
                }
            } else if self.satisfies_leaf(&rt, key, ix, matched_off) {
                return Some(LeafRef(ix));
            }
            cur = lf.dup_next;
        }

        // Ascend, scanning each ancestor's mask list for a net that was
        // attached above its leaf.
        let mut t = nearest;
        loop {
            t = self.store.parent_of(t);
            let branch = self.store.branch(t);
            let mut m = branch.mask_list;
            while let Some(mk) = m {
                let ann = self.mk.get(mk);
                if ann.normal {
                    if probe_bit <= ann.bit {
                        return ann.leaf.map(LeafRef);
                    }
                } else {
                    let skip = branch.byte_off.min(matched_off);
                    let mask = ann.mask.expect("non-normal annotation without mask");
                    let mut x = Some(self.store.descend_masked(t, key, rt.masks.key(mask)));
                    while let Some(ix) = x {
                        if self.store.leaf(ix).mask == Some(mask) {
                            break;
                        }
                        x = self.store.leaf(ix).dup_next;
                    }
                    if let Some(ix) = x {
                        if self.satisfies_leaf(&rt, key, ix, skip) {
                            return Some(LeafRef(ix));
                        }
                    }
                }
                m = ann.next;
            }
            if t == self.top {
                return None;
            }
        }
    }

    /// Find the route with exactly this key and mask. The mask is
    /// canonicalized first; `None` resolves through [`best_match`]
    /// (matching the most specific entry at the key).
    ///
    /// [`best_match`]: Self::best_match
    pub fn exact_match(&self, key: &ByteKey, mask: Option<&ByteKey>) -> Option<LeafRef> {
        let canonical = match mask {
            Some(m) => Some(
                self.runtime
                    .borrow_mut()
                    .add_mask(m, true, self.byte_offset)?
                    .ix,
            ),
            None => None,
        };
        let mut x = self.best_match(key)?;
        if let Some(cm) = canonical {
            while self.store.leaf(x.0).mask != Some(cm) {
                x = LeafRef(self.store.leaf(x.0).dup_next?);
            }
        }
        Some(x)
    }

    /// Whether `key` agrees with the leaf's key on every bit the leaf's
    /// mask keeps, comparing bytes from `skip` on.
    pub(crate) fn satisfies_leaf(
        &self,
        rt: &RuntimeInner,
        key: &ByteKey,
        leaf: NodeIx,
        skip: usize,
    ) -> bool {
        let lf = self.store.leaf(leaf);
        let mut length = key.len().min(lf.key.len());
        let mask = lf.mask.map(|m| rt.masks.key(m));
        if let Some(mk) = mask {
            length = length.min(mk.len());
        }
        for i in skip..length {
            let significant = mask.map(|mk| mk.byte(i)).unwrap_or(0xff);
            if (key.byte(i) ^ lf.key.byte(i)) & significant != 0 {
                return false;
            }
        }
        true
    }

    /// The ancestor at which a mask of (positive) index `b` attaches: the
    /// highest branch, starting from `t0`, still testing a bit at or below
    /// the mask's index. Insertion and removal must agree on this node.
    pub(crate) fn attachment_ancestor(&self, t0: NodeIx, b: i32) -> NodeIx {
        let mut x;
        let mut t = t0;
        loop {
            x = t;
            t = self.store.branch(t).parent;
            if b <= self.store.branch(t).bit && x != self.top {
                continue;
            }
            return x;
        }
    }

    /// Allocate the mask-list entry describing `leaf`, link the leaf to it,
    /// and return it with `next` as its tail.
    pub(crate) fn new_annotation(&mut self, leaf: NodeIx, next: Option<MkIx>) -> MkIx {
        let lf = self.store.leaf(leaf);
        let ann = Annotation {
            bit: lf.bit,
            normal: lf.normal,
            leaf: lf.normal.then_some(leaf),
            mask: if lf.normal { None } else { lf.mask },
            refs: 0,
            next,
        };
        let mk = self.mk.alloc(ann);
        self.store.leaf_mut(leaf).annotation = Some(mk);
        mk
    }

    /// Find the duplicate-key chain head of a leaf: chain members' parents
    /// are the previous chain elements, the head's parent is a branch.
    pub(crate) fn chain_head(&self, mut leaf: NodeIx) -> NodeIx {
        loop {
            let p = self.store.leaf(leaf).parent;
            if self.store.is_leaf(p) {
                leaf = p;
            } else {
                return leaf;
            }
        }
    }

    /// Leftmost leaf under `from`.
    pub(crate) fn leftmost(&self, from: NodeIx) -> NodeIx {
        let mut x = from;
        while let Slot::Branch(b) = &self.store.slots[x] {
            x = b.left;
        }
        x
    }

    pub(crate) fn node_is_root(&self, ix: NodeIx) -> bool {
        match &self.store.slots[ix] {
            Slot::Leaf(l) => l.root,
            Slot::Branch(b) => b.root,
            Slot::Vacant => panic!("node {ix} is vacant"),
        }
    }
}
