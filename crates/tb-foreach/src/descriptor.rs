//! Per-tensor address descriptors and the span abstraction kernels index
//! through.
//!
//! A `TensorMeta` is one AddressDescriptor: up to `DEPTH` slot base
//! addresses plus the tensor's element count. Descriptors are built once
//! per call, after result allocation, into one contiguous `Vec` in input
//! list order; chunk offsets are applied at kernel execution time, never
//! baked in.

use tb_tensor::Element;

/// Elements moved per vectorized load/store. `CHUNK_SIZE` is a multiple of
/// this so full chunks always vectorize cleanly.
pub const VEC_WIDTH: usize = 4;

/// A (base, element-count) view into one tensor slot.
///
/// This is the only form in which addresses cross the descriptor-building /
/// dispatch boundary. Indexing is bounds-checked in debug builds and
/// unchecked in release builds.
///
/// # Safety contract
/// Work-groups write through disjoint chunk ranges of distinct result
/// slots, so concurrent access never overlaps. Spans built with `from_ref`
/// are read-only by convention: the engine only ever writes through the
/// result-slot span of each descriptor, which is always built with
/// `from_mut`.
#[derive(Debug, Clone, Copy)]
pub struct SlotSpan<T> {
    base: *mut T,
    len: usize,
}

unsafe impl<T: Send> Send for SlotSpan<T> {}
unsafe impl<T: Send> Sync for SlotSpan<T> {}

impl<T: Element> SlotSpan<T> {
    /// Span over a mutable slice (writable slot).
    pub fn from_mut(slice: &mut [T]) -> Self {
        SlotSpan {
            base: slice.as_mut_ptr(),
            len: slice.len(),
        }
    }

    /// Span over a shared slice (read-only slot; must never be written).
    pub fn from_ref(slice: &[T]) -> Self {
        SlotSpan {
            base: slice.as_ptr() as *mut T,
            len: slice.len(),
        }
    }

    /// Remaining element count from the span base.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A sub-span starting `elems` elements into this one. Used to rebase
    /// a tensor span onto one chunk.
    pub fn offset_by(&self, elems: usize) -> SlotSpan<T> {
        debug_assert!(elems <= self.len, "offset {} past span of {}", elems, self.len);
        SlotSpan {
            base: unsafe { self.base.add(elems) },
            len: self.len - elems,
        }
    }

    /// True if the base address is aligned for `VEC_WIDTH`-wide moves.
    pub fn is_vec_aligned(&self) -> bool {
        (self.base as usize) % (VEC_WIDTH * std::mem::size_of::<T>()) == 0
    }

    /// Reads the element at `i`.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        debug_assert!(i < self.len, "read at {} past span of {}", i, self.len);
        unsafe { *self.base.add(i) }
    }

    /// Writes `value` at `i`.
    #[inline]
    pub fn set(&self, i: usize, value: T) {
        debug_assert!(i < self.len, "write at {} past span of {}", i, self.len);
        unsafe { self.base.add(i).write(value) }
    }

    /// One bulk load of `VEC_WIDTH` elements starting at `start`.
    #[inline]
    pub fn load_run(&self, start: usize) -> [T; VEC_WIDTH] {
        debug_assert!(start + VEC_WIDTH <= self.len);
        unsafe { std::ptr::read(self.base.add(start) as *const [T; VEC_WIDTH]) }
    }

    /// One bulk store of `VEC_WIDTH` elements starting at `start`.
    #[inline]
    pub fn store_run(&self, start: usize, run: [T; VEC_WIDTH]) {
        debug_assert!(start + VEC_WIDTH <= self.len);
        unsafe { std::ptr::write(self.base.add(start) as *mut [T; VEC_WIDTH], run) }
    }
}

/// Address descriptor for one tensor in the batch: `DEPTH` slot spans (all
/// describing the same logical tensor position across the call's tensor
/// lists) and that tensor's element count.
#[derive(Debug, Clone, Copy)]
pub struct TensorMeta<T, const DEPTH: usize> {
    pub slots: [SlotSpan<T>; DEPTH],
    pub numel: usize,
}

impl<T: Element, const DEPTH: usize> TensorMeta<T, DEPTH> {
    pub fn new(slots: [SlotSpan<T>; DEPTH], numel: usize) -> Self {
        debug_assert!(slots.iter().all(|s| s.len() == numel));
        TensorMeta { slots, numel }
    }
}
