//! Growable buffer on top of [`Stack::realloc`].
//!
//! While the buffer is the most recent allocation it grows in place; once
//! something else is allocated after it, growth copies to the top of the stack.

use std::mem::size_of;
use std::ptr::NonNull;

use crate::error::{StackError, StackResult};
use crate::stack::Stack;

const MIN_CAPACITY: usize = 4;

/// A vector of `Copy` values living in a stack arena.
///
/// Every method that reads or writes the elements is `unsafe`: a rewind of
/// the arena releases the buffer without the vector noticing, and the next
/// allocation may reuse those bytes.
///
/// # Safety
/// While the element methods are used, the arena must not have been rewound
/// below the end of the vector's buffer since that buffer was last allocated
/// or grown. Growth inside a scope opened after the vector is released when
/// that scope ends; reserve before opening it instead.
#[derive(Debug)]
pub struct StackVec<'a, T: Copy> {
    stack: Stack<'a>,
    ptr: Option<NonNull<T>>,
    len: usize,
    cap: usize,
}

impl<'a, T: Copy> StackVec<'a, T> {
    /// Creates an empty vector. Nothing is allocated until the first push.
    pub fn new(stack: Stack<'a>) -> Self {
        Self {
            stack,
            ptr: None,
            len: 0,
            cap: 0,
        }
    }

    pub fn with_capacity(stack: Stack<'a>, capacity: usize) -> StackResult<Self> {
        let mut vec = Self::new(stack);
        vec.reserve(capacity)?;
        Ok(vec)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns the start of the buffer, or a dangling pointer if nothing was allocated.
    pub fn as_ptr(&self) -> *const T {
        self.ptr.unwrap_or(NonNull::dangling()).as_ptr()
    }

    /// Makes room for at least `additional` more values.
    ///
    /// Tries to double the capacity first and falls back to the exact amount
    /// when the arena cannot fit the doubled size.
    pub fn reserve(&mut self, additional: usize) -> StackResult<()> {
        let needed = self
            .len
            .checked_add(additional)
            .ok_or(StackError::SizeOverflow {
                count: additional,
                elem_size: size_of::<T>(),
            })?;
        if needed <= self.cap {
            return Ok(());
        }

        let doubled = self.cap.saturating_mul(2).max(MIN_CAPACITY).max(needed);
        match self.grow_to(doubled) {
            Err(e) if e.is_out_of_space() && doubled > needed => self.grow_to(needed),
            other => other,
        }
    }

    /// Appends `value`, growing the buffer if needed.
    ///
    /// # Safety
    /// See the [type-level contract](StackVec#safety).
    pub unsafe fn push(&mut self, value: T) -> StackResult<()> {
        self.check_live()?;
        self.reserve(1)?;
        // SAFETY: `reserve` guarantees `cap > len` and `ptr` is set; the
        // buffer is still ours per the caller's contract.
        unsafe { self.slot(self.len).write(value) };
        self.len += 1;
        Ok(())
    }

    /// Appends every value of `values`.
    ///
    /// # Safety
    /// See the [type-level contract](StackVec#safety).
    pub unsafe fn extend_from_slice(&mut self, values: &[T]) -> StackResult<()> {
        self.check_live()?;
        self.reserve(values.len())?;
        for (i, value) in values.iter().enumerate() {
            // SAFETY: `reserve` made room for `values.len()` more values.
            unsafe { self.slot(self.len + i).write(*value) };
        }
        self.len += values.len();
        Ok(())
    }

    /// Removes and returns the last value.
    ///
    /// # Safety
    /// See the [type-level contract](StackVec#safety).
    pub unsafe fn pop(&mut self) -> StackResult<Option<T>> {
        self.check_live()?;
        if self.len == 0 {
            return Ok(None);
        }
        self.len -= 1;
        // SAFETY: index `len` was written before and is below `cap`.
        Ok(Some(unsafe { self.slot(self.len).read() }))
    }

    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Gives unused capacity back to the stack if the buffer is still topmost.
    pub fn shrink_to_fit(&mut self) -> StackResult<()> {
        let Some(ptr) = self.ptr else {
            return Ok(());
        };
        let cap_bytes = self.cap * size_of::<T>();
        if self.len == self.cap || !self.stack.is_topmost(ptr.cast(), cap_bytes) {
            return Ok(());
        }
        let shrunk = self.stack.realloc(Some(ptr), self.cap, self.len, self.len)?;
        self.ptr = Some(shrunk);
        self.cap = self.len;
        Ok(())
    }

    /// Views the contents.
    ///
    /// # Safety
    /// See the [type-level contract](StackVec#safety). The arena must also
    /// still be bound to the buffer the vector was created on.
    pub unsafe fn as_slice(&self) -> &[T] {
        // SAFETY: forwarded from the caller; `as_ptr` is dangling only when `len == 0`.
        unsafe { std::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// Mutable view of the contents.
    ///
    /// # Safety
    /// Same as [`as_slice`](Self::as_slice).
    pub unsafe fn as_mut_slice(&mut self) -> &mut [T] {
        let ptr = self.ptr.unwrap_or(NonNull::dangling()).as_ptr();
        // SAFETY: forwarded from the caller.
        unsafe { std::slice::from_raw_parts_mut(ptr, self.len) }
    }

    fn check_live(&self) -> StackResult<()> {
        if self.stack.is_live() {
            Ok(())
        } else {
            Err(StackError::StaleHandle)
        }
    }

    fn grow_to(&mut self, cap: usize) -> StackResult<()> {
        let ptr = self.stack.realloc(self.ptr, self.cap, self.len, cap)?;
        self.ptr = Some(ptr);
        self.cap = cap;
        Ok(())
    }

    /// # Safety
    /// `index < cap` and the buffer must be allocated.
    unsafe fn slot(&self, index: usize) -> *mut T {
        debug_assert!(index < self.cap);
        // SAFETY: forwarded from the caller.
        unsafe { self.as_ptr().cast_mut().add(index) }
    }
}
