//! RAII installation of a backing buffer as the calling thread's stack.

use std::marker::PhantomData;

use scopestack_core::{
    Stack, StackError, StackResult, StackScope, initialize_thread_stack, shutdown_thread_stack,
    thread_stack, thread_stack_usage,
};

use crate::registry::{self, StackInfo};
use crate::{BackingBuffer, BoxedBuffer, StackConfig, buffer_for};

/// Owns the calling thread's stack memory.
///
/// Installing binds the thread arena to the buffer; dropping shuts the arena
/// down before the buffer is released, so the buffer always outlives it.
/// Not `Send`: it must be dropped on the thread it was installed on.
#[derive(Debug)]
pub struct ThreadStack<B: BackingBuffer = BoxedBuffer> {
    buffer: B,
    info: StackInfo,
    _not_send: PhantomData<*const ()>,
}

impl ThreadStack<BoxedBuffer> {
    /// Sources a buffer as described by `config` and installs it.
    pub fn from_config(config: &StackConfig) -> StackResult<Self> {
        Self::install(buffer_for(config)?)
    }
}

impl<B: BackingBuffer> ThreadStack<B> {
    /// Installs `buffer` as the calling thread's stack.
    pub fn install(mut buffer: B) -> StackResult<Self> {
        let capacity = buffer.capacity();
        if capacity == 0 {
            return Err(StackError::InvalidCapacity);
        }

        let info = registry::register(capacity, buffer.backing())?;

        // SAFETY: `BackingBuffer` guarantees the pointer is valid for
        // `capacity` bytes and stable while `buffer` lives. `buffer` is owned
        // by the returned value, whose `Drop` shuts the arena down first.
        unsafe { initialize_thread_stack(buffer.as_mut_ptr(), capacity) };

        tracing::debug!(
            "Installed thread stack: thread={:?}, capacity={}, backing={}",
            info.thread,
            capacity,
            info.backing
        );

        Ok(Self {
            buffer,
            info,
            _not_send: PhantomData,
        })
    }

    /// Acquires a handle on the installed stack.
    pub fn stack(&self) -> Stack<'static> {
        thread_stack()
    }

    /// Opens a scope on the installed stack.
    pub fn scope(&self) -> StackScope<'static> {
        StackScope::new()
    }

    /// Returns the registry entry for this stack.
    pub fn info(&self) -> &StackInfo {
        &self.info
    }

    /// Returns bytes currently in use on the stack.
    pub fn used(&self) -> usize {
        thread_stack_usage().0
    }

    /// Returns total capacity.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }
}

impl<B: BackingBuffer> Drop for ThreadStack<B> {
    fn drop(&mut self) {
        let used = self.used();
        shutdown_thread_stack();
        registry::unregister();
        tracing::debug!(
            "Removed thread stack: thread={:?}, {} bytes still in use",
            self.info.thread,
            used
        );
    }
}
