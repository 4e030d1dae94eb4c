//! Stack handle: allocation, reallocation and rewind against one arena.

use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};

use crate::address::{Region, byte_len, check_alignment};
use crate::arena::ArenaState;
use crate::error::{StackError, StackResult};
use crate::scope::StackScope;

/// A position in the arena, as a byte offset from its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(usize);

impl Mark {
    pub fn offset(self) -> usize {
        self.0
    }
}

/// Short-lived view of an arena.
///
/// Mutations through the handle are mutations of the arena. The handle keeps
/// the capacity seen at acquisition and the bump offset to rewind to.
#[derive(Debug, Clone, Copy)]
pub struct Stack<'a> {
    arena: &'a ArenaState,
    end: usize,
    original: usize,
    generation: u64,
}

impl<'a> Stack<'a> {
    pub(crate) fn new(arena: &'a ArenaState) -> Self {
        Self {
            arena,
            end: arena.capacity(),
            original: arena.offset(),
            generation: arena.generation(),
        }
    }

    /// Allocates `count * elem_size` bytes at an `align`-aligned address.
    ///
    /// On failure the bump pointer is unchanged. Memory is not initialized.
    pub fn alloc_bytes(
        &self,
        count: usize,
        elem_size: usize,
        align: usize,
    ) -> StackResult<NonNull<u8>> {
        self.check_live()?;
        let bytes = byte_len(count, elem_size)?;
        let span = self
            .region()
            .fit(self.arena.offset(), bytes, align)
            .inspect_err(|e| tracing::trace!("Stack allocation rejected: {}", e))?;

        self.arena.set_offset(span.end);
        Ok(self.arena.ptr_at(span.start))
    }

    /// Allocates room for `count` values of `T`.
    pub fn alloc<T>(&self, count: usize) -> StackResult<NonNull<T>> {
        self.alloc_bytes(count, size_of::<T>(), align_of::<T>())
            .map(NonNull::cast)
    }

    /// Allocates a copy of `src`.
    pub fn alloc_copy<T: Copy>(&self, src: &[T]) -> StackResult<NonNull<T>> {
        let dst = self.alloc::<T>(src.len())?;
        // SAFETY: `dst` was just carved out for `src.len()` values of `T` and
        // cannot overlap a live Rust slice.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), src.len()) };
        Ok(dst)
    }

    /// Grows or shrinks a block previously returned by this arena.
    ///
    /// `old` of `None` is a plain [`alloc_bytes`](Self::alloc_bytes). When the
    /// block ends exactly at the bump pointer it is resized in place (moved
    /// forward only if `align` demands it); otherwise a new block is carved
    /// out and the first `copy_size` bytes are copied over, leaving the old
    /// block as dead space until the enclosing rewind.
    ///
    /// On failure the arena and the old block are untouched.
    pub fn realloc_bytes(
        &self,
        old: Option<NonNull<u8>>,
        old_size: usize,
        copy_size: usize,
        new_count: usize,
        elem_size: usize,
        align: usize,
    ) -> StackResult<NonNull<u8>> {
        let Some(old) = old else {
            return self.alloc_bytes(new_count, elem_size, align);
        };

        self.check_live()?;
        check_alignment(align)?;
        let new_size = byte_len(new_count, elem_size)?;
        if copy_size > old_size {
            return Err(StackError::CopyOverrun {
                copy: copy_size,
                limit: old_size,
            });
        }
        if copy_size > new_size {
            return Err(StackError::CopyOverrun {
                copy: copy_size,
                limit: new_size,
            });
        }

        let region = self.region();
        let current = self.arena.offset();
        let old_start = region
            .offset_of(old.as_ptr() as usize)
            .ok_or(StackError::ForeignPointer)?;
        let old_end = old_start
            .checked_add(old_size)
            .filter(|end| *end <= current)
            .ok_or(StackError::ForeignPointer)?;

        if old_end == current {
            let span = region
                .fit(old_start, new_size, align)
                .inspect_err(|e| tracing::trace!("Stack in-place resize rejected: {}", e))?;
            let src = self.arena.ptr_at(old_start);
            let dst = self.arena.ptr_at(span.start);
            if span.start != old_start {
                // SAFETY: both ranges lie inside the bound buffer:
                // `[old_start, old_start + copy_size)` is within the old block
                // and `[span.start, span.start + copy_size)` within the new
                // span. They may overlap, hence `copy`.
                unsafe { ptr::copy(src.as_ptr(), dst.as_ptr(), copy_size) };
            }
            self.arena.set_offset(span.end);
            return Ok(dst);
        }

        let fresh = self.alloc_bytes(new_count, elem_size, align)?;
        let src = self.arena.ptr_at(old_start);
        // SAFETY: the old block ends at or before the previous bump offset and
        // the fresh block starts at or after it, so they are disjoint and both
        // inside the bound buffer.
        unsafe { ptr::copy_nonoverlapping(src.as_ptr(), fresh.as_ptr(), copy_size) };
        Ok(fresh)
    }

    /// Element-count form of [`realloc_bytes`](Self::realloc_bytes) for `T`.
    pub fn realloc<T>(
        &self,
        old: Option<NonNull<T>>,
        old_len: usize,
        copy_len: usize,
        new_len: usize,
    ) -> StackResult<NonNull<T>> {
        let size = size_of::<T>();
        let old_size = byte_len(old_len, size)?;
        let copy_size = byte_len(copy_len, size)?;
        self.realloc_bytes(
            old.map(NonNull::cast),
            old_size,
            copy_size,
            new_len,
            size,
            align_of::<T>(),
        )
        .map(NonNull::cast)
    }

    /// Returns true if a block of `size` bytes at `ptr` ends at the bump pointer.
    ///
    /// A stale handle never reports a topmost block.
    pub fn is_topmost(&self, ptr: NonNull<u8>, size: usize) -> bool {
        self.is_live()
            && self
                .region()
                .offset_of(ptr.as_ptr() as usize)
                .and_then(|start| start.checked_add(size))
                == Some(self.arena.offset())
    }

    /// Rewinds the arena to where it stood when this handle was acquired.
    ///
    /// The bump pointer is set to the captured offset even if it currently
    /// sits below it, which happens after an older block was shrunk in place.
    pub fn reset(&self) -> StackResult<()> {
        self.check_live()?;
        self.arena.set_offset(self.original);
        Ok(())
    }

    /// Rewinds the arena to an earlier mark.
    pub fn reset_to(&self, mark: Mark) -> StackResult<()> {
        self.check_live()?;
        let current = self.arena.offset();
        if mark.0 > current {
            return Err(StackError::RewindForward {
                target: mark.0,
                current,
            });
        }
        self.arena.set_offset(mark.0);
        Ok(())
    }

    /// Opens a nested scope that rewinds to the current bump pointer on drop.
    pub fn scope(&self) -> StackScope<'a> {
        StackScope::from_arena(self.arena)
    }

    /// Returns the current bump offset.
    pub fn mark(&self) -> Mark {
        Mark(self.arena.offset())
    }

    /// Returns the rewind point captured at acquisition.
    pub fn original(&self) -> Mark {
        Mark(self.original)
    }

    /// Returns the next free byte, or null for an uninitialized arena.
    pub fn current_ptr(&self) -> *const u8 {
        self.arena.as_ptr().wrapping_add(self.arena.offset())
    }

    /// Returns bytes allocated since this handle was acquired.
    pub fn used(&self) -> usize {
        self.arena.offset().saturating_sub(self.original)
    }

    /// Returns bytes left before the arena limit.
    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.arena.offset())
    }

    /// Returns the arena capacity seen at acquisition.
    pub fn capacity(&self) -> usize {
        self.end
    }

    /// Returns true while the arena is still bound to the buffer seen at acquisition.
    pub fn is_live(&self) -> bool {
        self.generation == self.arena.generation()
    }

    fn check_live(&self) -> StackResult<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(StackError::StaleHandle)
        }
    }

    fn region(&self) -> Region {
        Region::new(self.arena.region().base(), self.end)
    }
}
