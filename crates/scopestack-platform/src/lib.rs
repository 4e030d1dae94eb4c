//! Backing memory and per-thread installation for scopestack.
//!
//! The allocator in `scopestack-core` only consumes a `(pointer, size)` pair.
//! This crate sources that memory and ties it to a thread's lifetime.
//!
//! # Backings
//!
//! - **Heap**: one `std::alloc` block, aligned to [`DEFAULT_ALIGNMENT`]
//! - **Mapped**: anonymous private mapping via `memmap2`, page aligned
//!
//! # Usage
//!
//! ```no_run
//! use scopestack_platform::{StackConfig, ThreadStack};
//!
//! let config = StackConfig::from_env()?;
//! let installed = ThreadStack::from_config(&config)?;
//!
//! let scope = installed.scope();
//! let scratch = scope.alloc::<f32>(1024)?;
//! # Ok::<(), scopestack_core::StackError>(())
//! ```

use std::fmt::Debug;

pub mod config;
pub mod heap;
pub mod mapped;
pub mod registry;
pub mod thread_stack;

pub use config::{Backing, StackConfig};
pub use heap::HeapBuffer;
pub use mapped::MappedBuffer;
pub use registry::{StackInfo, installed_stacks, is_installed};
pub use thread_stack::ThreadStack;

pub use scopestack_core::{DEFAULT_ALIGNMENT, StackError, StackResult};

/// Memory that can back a stack arena.
///
/// # Safety
/// `as_mut_ptr` must return the same pointer for the whole life of the value,
/// even across moves, and that pointer must be valid for reads and writes of
/// `capacity()` bytes until the value is dropped.
pub unsafe trait BackingBuffer: Send + Debug {
    /// Returns usable size in bytes.
    fn capacity(&self) -> usize;

    /// Returns pointer to the first usable byte.
    fn as_mut_ptr(&mut self) -> *mut u8;

    /// Returns where the memory comes from.
    fn backing(&self) -> Backing;
}

pub type BoxedBuffer = Box<dyn BackingBuffer>;

// SAFETY: forwards to the boxed value, which upholds the contract itself.
unsafe impl BackingBuffer for BoxedBuffer {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        (**self).as_mut_ptr()
    }

    fn backing(&self) -> Backing {
        (**self).backing()
    }
}

// SAFETY: a `Vec`'s heap block does not move when the `Vec` moves, and the
// arena never grows it.
unsafe impl BackingBuffer for Vec<u8> {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }

    fn backing(&self) -> Backing {
        Backing::Heap
    }
}

/// Creates the backing buffer described by `config`.
pub fn buffer_for(config: &StackConfig) -> StackResult<BoxedBuffer> {
    config.validate()?;
    let buffer: BoxedBuffer = match config.backing {
        Backing::Heap => Box::new(HeapBuffer::with_alignment(
            config.capacity,
            config.alignment,
        )?),
        Backing::Mapped => Box::new(MappedBuffer::new(config.capacity)?),
    };
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_for_each_backing() {
        for backing in [Backing::Heap, Backing::Mapped] {
            let config = StackConfig::new(8192).with_backing(backing);
            let mut buffer = buffer_for(&config).unwrap();
            assert_eq!(buffer.capacity(), 8192);
            assert_eq!(buffer.backing(), backing);
            assert_eq!(buffer.as_mut_ptr() as usize % DEFAULT_ALIGNMENT, 0);
        }
    }

    #[test]
    fn test_vec_backing() {
        let mut buffer = vec![0u8; 32];
        let ptr = buffer.as_ptr();
        assert_eq!(BackingBuffer::capacity(&buffer), 32);
        assert_eq!(BackingBuffer::as_mut_ptr(&mut buffer) as *const u8, ptr);
    }

    #[test]
    fn test_buffer_for_rejects_zero_capacity() {
        let config = StackConfig::new(0);
        assert_eq!(buffer_for(&config).unwrap_err(), StackError::InvalidCapacity);
    }
}
