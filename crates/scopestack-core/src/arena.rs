//! Arena state: the `{current, end}` bump record behind every stack handle.

use std::cell::Cell;
use std::ptr::{self, NonNull};

use crate::address::Region;
use crate::stack::Stack;

/// Bump record over a borrowed buffer.
///
/// The arena never owns its memory. It is `!Sync`: one arena belongs to one
/// thread, and handles mutate it through shared references.
#[derive(Debug)]
pub struct ArenaState {
    base: Cell<*mut u8>,
    capacity: Cell<usize>,
    offset: Cell<usize>,
    generation: Cell<u64>,
}

impl ArenaState {
    /// Creates an uninitialized arena. Every allocation against it fails.
    pub const fn new() -> Self {
        Self {
            base: Cell::new(ptr::null_mut()),
            capacity: Cell::new(0),
            offset: Cell::new(0),
            generation: Cell::new(0),
        }
    }

    /// Binds the arena to `[buffer, buffer + len)`.
    ///
    /// Rebinding an active arena is allowed; handles acquired before the call
    /// become stale. A null `buffer` leaves the arena with zero capacity.
    ///
    /// # Safety
    /// `buffer` must be valid for reads and writes of `len` bytes until the
    /// next `initialize` or `shutdown` on this arena, and must not be accessed
    /// through any other path while the arena is bound to it.
    pub unsafe fn initialize(&self, buffer: *mut u8, len: usize) {
        let len = if buffer.is_null() { 0 } else { len };
        self.base.set(buffer);
        self.capacity.set(len);
        self.offset.set(0);
        self.bump_generation();
        tracing::debug!("Stack arena initialized: capacity={}", len);
    }

    /// Returns the arena to the uninitialized state. Outstanding handles become stale.
    pub fn shutdown(&self) {
        let used = self.offset.get();
        self.base.set(ptr::null_mut());
        self.capacity.set(0);
        self.offset.set(0);
        self.bump_generation();
        tracing::debug!("Stack arena shut down: {} bytes were in use", used);
    }

    /// Acquires a handle whose rewind point is the current bump offset.
    pub fn stack(&self) -> Stack<'_> {
        Stack::new(self)
    }

    /// Returns true once a non-empty buffer is bound.
    pub fn is_initialized(&self) -> bool {
        !self.base.get().is_null()
    }

    /// Returns bytes in use, including alignment padding.
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Returns total capacity.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Returns bytes left after the bump pointer.
    pub fn remaining(&self) -> usize {
        self.capacity.get() - self.offset.get()
    }

    /// Returns base address pointer. Null when uninitialized.
    pub fn as_ptr(&self) -> *const u8 {
        self.base.get()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.get()
    }

    pub(crate) fn region(&self) -> Region {
        Region::new(self.base.get() as usize, self.capacity.get())
    }

    pub(crate) fn offset(&self) -> usize {
        self.offset.get()
    }

    pub(crate) fn set_offset(&self, offset: usize) {
        debug_assert!(offset <= self.capacity.get());
        self.offset.set(offset);
    }

    /// Pointer to `offset` bytes past the base, derived from the base pointer.
    pub(crate) fn ptr_at(&self, offset: usize) -> NonNull<u8> {
        let base = self.base.get();
        debug_assert!(!base.is_null() && offset <= self.capacity.get());
        // SAFETY: callers only pass offsets produced by `Region::fit` or
        // `Region::offset_of`, which reject a null base and stay within
        // `[0, capacity]`, so the result is in-bounds (or one past the end)
        // of the bound buffer and therefore non-null.
        unsafe { NonNull::new_unchecked(base.add(offset)) }
    }

    fn bump_generation(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl Default for ArenaState {
    fn default() -> Self {
        Self::new()
    }
}
