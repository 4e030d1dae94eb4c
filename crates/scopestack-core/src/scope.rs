//! RAII scope guard that rewinds the stack on every exit path.

use std::ops::Deref;

use crate::arena::ArenaState;
use crate::stack::Stack;
use crate::thread;

/// Captures the bump pointer on construction and rewinds to it on drop.
///
/// Guards nest: an inner guard only releases what was allocated after it
/// was created.
///
/// ```
/// use scopestack_core::{ArenaState, StackScope};
///
/// let mut buf = vec![0u64; 128];
/// let arena = ArenaState::new();
/// unsafe { arena.initialize(buf.as_mut_ptr().cast(), buf.len() * 8) };
///
/// {
///     let scope = StackScope::from_arena(&arena);
///     let _tmp = scope.alloc::<u32>(16).unwrap();
///     assert_eq!(arena.used(), 64);
/// }
/// assert_eq!(arena.used(), 0);
/// ```
#[derive(Debug)]
#[must_use = "the scope rewinds as soon as the guard is dropped"]
pub struct StackScope<'a> {
    stack: Stack<'a>,
}

impl StackScope<'static> {
    /// Opens a scope on the calling thread's stack.
    pub fn new() -> Self {
        Self {
            stack: thread::thread_stack(),
        }
    }
}

impl Default for StackScope<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> StackScope<'a> {
    /// Opens a scope on an explicit arena.
    pub fn from_arena(arena: &'a ArenaState) -> Self {
        Self {
            stack: arena.stack(),
        }
    }

    /// Returns a copy of the underlying handle.
    pub fn stack(&self) -> Stack<'a> {
        self.stack
    }
}

impl<'a> Deref for StackScope<'a> {
    type Target = Stack<'a>;

    fn deref(&self) -> &Self::Target {
        &self.stack
    }
}

impl Drop for StackScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.stack.reset() {
            tracing::warn!("Stack scope could not rewind: {}", e);
        }
    }
}
