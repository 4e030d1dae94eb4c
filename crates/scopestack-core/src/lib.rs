//! Linear stack allocator over a borrowed buffer.
//!
//! Memory is handed out in strict bump order and released in bulk by
//! rewinding to a mark. The most recent block can grow or shrink in place.
//!
//! # Layers
//!
//! - [`ArenaState`]: the `{base, capacity, offset}` record. Use it directly as
//!   an explicit context, or through the per-thread instance in [`thread`].
//! - [`Stack`]: a copyable handle that allocates, reallocates and rewinds.
//! - [`StackScope`]: RAII guard that rewinds to its entry point on drop.
//!
//! ```
//! use scopestack_core::{initialize_thread_stack, shutdown_thread_stack, StackScope};
//!
//! let mut buf = vec![0u8; 4096];
//! unsafe { initialize_thread_stack(buf.as_mut_ptr(), buf.len()) };
//! {
//!     let scope = StackScope::new();
//!     let words = scope.alloc::<u64>(32).unwrap();
//!     let grown = scope.realloc(Some(words), 32, 32, 64).unwrap();
//!     assert_eq!(grown, words);
//! }
//! shutdown_thread_stack();
//! ```

pub mod address;
pub mod arena;
pub mod error;
pub mod scope;
pub mod stack;
pub mod thread;
pub mod vec;

pub use address::{Region, Span, align_up, byte_len, check_alignment};
pub use arena::ArenaState;
pub use error::{StackError, StackResult};
pub use scope::StackScope;
pub use stack::{Mark, Stack};
pub use thread::{
    initialize_thread_stack, shutdown_thread_stack, thread_stack, thread_stack_usage,
    with_thread_stack,
};
pub use vec::StackVec;

/// Alignment used when callers have no stronger requirement.
pub const DEFAULT_ALIGNMENT: usize = 16;
