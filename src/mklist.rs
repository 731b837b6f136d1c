//! Refcounted mask annotations attached to tree nodes.
//!
//! A branch (or leaf) carries a sorted, singly-linked list of annotations
//! describing the masks of routes that were attached above their own leaf so
//! that [`best_match`](crate::RadixTable::best_match) can find them while
//! ascending. Annotations are allocated from a per-table arena with an
//! explicit free list and shared by refcount when several duplicate-key
//! leaves use the identical canonical mask.

use crate::node::{MaskRef, NodeIx};

pub(crate) type MkIx = usize;

/// One entry of a node's mask list.
#[derive(Clone, Debug)]
pub(crate) struct Annotation {
    /// Mask index in the negative leaf encoding (`-1 - first_zero_bit`).
    pub bit: i32,
    /// Copied from the annotated leaf: normal masks support the fast
    /// index-only satisfaction check.
    pub normal: bool,
    /// The annotated leaf, set for normal masks.
    pub leaf: Option<NodeIx>,
    /// The canonical mask, set for non-normal masks.
    pub mask: Option<MaskRef>,
    /// Extra references beyond the first; the entry is released when this
    /// drops below zero.
    pub refs: i32,
    /// Next entry, kept sorted most-specific first.
    pub next: Option<MkIx>,
}

/// Arena of [`Annotation`]s with an explicit free list.
#[derive(Clone, Default)]
pub(crate) struct AnnotationArena {
    slots: Vec<Option<Annotation>>,
    free: Vec<MkIx>,
}

impl AnnotationArena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, ix: MkIx) -> &Annotation {
        self.slots[ix].as_ref().expect("annotation slot is free")
    }

    pub(crate) fn get_mut(&mut self, ix: MkIx) -> &mut Annotation {
        self.slots[ix].as_mut().expect("annotation slot is free")
    }

    pub(crate) fn alloc(&mut self, ann: Annotation) -> MkIx {
        if let Some(ix) = self.free.pop() {
            self.slots[ix] = Some(ann);
            ix
        } else {
            self.slots.push(Some(ann));
            self.slots.len() - 1
        }
    }

    pub(crate) fn release(&mut self, ix: MkIx) {
        let freed = self.slots[ix].take();
        debug_assert!(freed.is_some(), "double free of annotation {ix}");
        self.free.push(ix);
    }

    /// Number of live annotations, for consistency checks in tests.
    #[cfg(test)]
    pub(crate) fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
