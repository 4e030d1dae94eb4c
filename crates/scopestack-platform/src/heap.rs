//! Heap-allocated backing buffer.

use std::alloc::{Layout, alloc, dealloc};
use std::ptr::NonNull;

use scopestack_core::{DEFAULT_ALIGNMENT, StackError, StackResult};

use crate::{Backing, BackingBuffer};

/// One aligned block from the global allocator, freed on drop.
#[derive(Debug)]
pub struct HeapBuffer {
    base: NonNull<u8>,
    layout: Layout,
}

// SAFETY: the block is uniquely owned and carries no thread affinity.
unsafe impl Send for HeapBuffer {}

impl HeapBuffer {
    /// Allocates `capacity` bytes aligned to [`DEFAULT_ALIGNMENT`].
    pub fn new(capacity: usize) -> StackResult<Self> {
        Self::with_alignment(capacity, DEFAULT_ALIGNMENT)
    }

    /// Allocates `capacity` bytes aligned to `alignment`.
    pub fn with_alignment(capacity: usize, alignment: usize) -> StackResult<Self> {
        if capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }
        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|_| StackError::InvalidAlignment { align: alignment })?;

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc(layout) };
        let base = NonNull::new(ptr).ok_or(StackError::AllocFailed { capacity })?;

        Ok(Self { base, layout })
    }

    /// Returns the alignment of the first byte.
    pub fn alignment(&self) -> usize {
        self.layout.align()
    }
}

// SAFETY: `base` is fixed at construction, valid for `layout.size()` bytes
// and only released in `Drop`.
unsafe impl BackingBuffer for HeapBuffer {
    fn capacity(&self) -> usize {
        self.layout.size()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.base.as_ptr()
    }

    fn backing(&self) -> Backing {
        Backing::Heap
    }
}

impl Drop for HeapBuffer {
    fn drop(&mut self) {
        // SAFETY: allocated in `with_alignment` with this exact layout.
        unsafe {
            dealloc(self.base.as_ptr(), self.layout);
        }
    }
}
