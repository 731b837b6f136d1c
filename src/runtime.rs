//! The shared runtime context: maximum key length, sentinel key buffers,
//! and the process-wide mask cache.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use crate::key::ByteKey;
use crate::mask::MaskCache;

/// Shared context for one or more [`RadixTable`](crate::RadixTable)s.
///
/// The runtime fixes the maximum key length, owns the all-zeros and all-ones
/// sentinel buffers derived from it, and hosts the mask cache that
/// canonicalizes netmasks for every table created from it. Cloning the
/// handle is cheap and shares the same state.
///
/// A runtime is built once per maximum key length; to change the limit,
/// build a new runtime (and new tables). There is no implicit global state.
///
/// ```
/// # use radix_route::{RadixTable, TrieRuntime};
/// let runtime = TrieRuntime::new(5);
/// let v4 = RadixTable::new(&runtime, 8);
/// let another = RadixTable::new(&runtime, 8);
/// # drop((v4, another));
/// ```
#[derive(Clone)]
pub struct TrieRuntime {
    inner: Rc<RefCell<RuntimeInner>>,
}

pub(crate) struct RuntimeInner {
    pub max_key_len: usize,
    pub zeros: ByteKey,
    pub ones: ByteKey,
    pub masks: MaskCache,
}

impl TrieRuntime {
    /// Create a runtime for keys of up to `max_key_len` bytes (length byte
    /// included).
    ///
    /// # Panics
    ///
    /// Panics unless `2 <= max_key_len <= 255`.
    pub fn new(max_key_len: usize) -> Self {
        Self::build(max_key_len, None)
    }

    /// Like [`new`](Self::new), but bound the number of distinct canonical
    /// masks the cache may hold. Exhaustion surfaces as
    /// [`RadixError::AllocationFailure`](crate::RadixError::AllocationFailure)
    /// from inserts that would need a new mask.
    pub fn with_mask_capacity(max_key_len: usize, masks: usize) -> Self {
        Self::build(max_key_len, Some(masks))
    }

    fn build(max_key_len: usize, limit: Option<usize>) -> Self {
        assert!(
            (2..=255).contains(&max_key_len),
            "max_key_len {max_key_len} out of range"
        );
        let inner = RuntimeInner {
            max_key_len,
            zeros: ByteKey::from_raw(vec![0u8; max_key_len]),
            ones: ByteKey::from_raw(vec![0xffu8; max_key_len]),
            masks: MaskCache::new(max_key_len, limit),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// The maximum declared key length, in bytes.
    pub fn max_key_len(&self) -> usize {
        self.inner.borrow().max_key_len
    }

    pub(crate) fn borrow(&self) -> Ref<'_, RuntimeInner> {
        self.inner.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, RuntimeInner> {
        self.inner.borrow_mut()
    }
}

impl RuntimeInner {
    /// Canonicalize a mask through the shared cache; see
    /// [`MaskCache::add`].
    pub(crate) fn add_mask(
        &mut self,
        mask: &ByteKey,
        search_only: bool,
        skip: usize,
    ) -> Option<crate::mask::MaskInfo> {
        self.masks.add(mask, search_only, skip, self.max_key_len)
    }
}
