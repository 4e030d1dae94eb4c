//! # Scopestack
//!
//! Per-thread linear ("stack") allocator: O(1) bump allocation, O(1) bulk
//! release by rewinding to a scope's entry point, and in-place growth of the
//! most recent allocation.
//!
//! This is the **single entry point**. Add `scopestack` to your dependencies
//! and you have everything you need.
//!
//! # Quick Start
//!
//! ```rust
//! use scopestack::prelude::*;
//!
//! // Give this thread a stack sized from SCOPESTACK_* variables (1 MiB heap by default)
//! let installed = scopestack::install_thread_stack()?;
//!
//! {
//!     let scope = StackScope::new();
//!     let mut buf = StackVec::<u8>::new(scope.stack());
//!     // SAFETY: nothing rewinds below `buf` while it is in use.
//!     unsafe {
//!         buf.extend_from_slice(b"hello ")?;
//!         buf.extend_from_slice(b"world")?;
//!     }
//!     assert_eq!(unsafe { buf.as_slice() }, b"hello world");
//! } // everything above is released here
//!
//! assert_eq!(installed.used(), 0);
//! # Ok::<(), StackError>(())
//! ```
//!
//! # Module Organization
//!
//! - [`prelude`] - Import everything you need with `use scopestack::prelude::*`
//! - [`Stack`] - Allocation handle
//! - [`StackScope`] / [`stack_scope`] - Scope-bound rewind
//! - [`ThreadStack`] - Owns and installs a thread's backing memory

// ============================================================================
// RE-EXPORTS: Everything the user needs from one place
// ============================================================================

// Core types
pub use scopestack_core::{
    ArenaState, DEFAULT_ALIGNMENT, Mark, Stack, StackError, StackResult, StackScope, StackVec,
    initialize_thread_stack, shutdown_thread_stack, thread_stack, thread_stack_usage,
    with_thread_stack,
};

// Backing memory and installation
pub use scopestack_platform::{
    Backing, BackingBuffer, BoxedBuffer, HeapBuffer, MappedBuffer, StackConfig, StackInfo,
    ThreadStack, buffer_for, installed_stacks, is_installed,
};

// Attribute macro
pub use scopestack_macros::stack_scope;

/// Installs a stack on the calling thread, configured from the environment.
pub fn install_thread_stack() -> StackResult<ThreadStack> {
    let config = StackConfig::from_env()?;
    let installed = ThreadStack::from_config(&config)?;
    tracing::info!(
        "Thread stack ready: capacity={}, backing={}",
        config.capacity,
        config.backing
    );
    Ok(installed)
}

// ============================================================================
// PRELUDE: Import everything with `use scopestack::prelude::*`
// ============================================================================

/// Prelude module - import everything you need with one line.
///
/// ```rust,ignore
/// use scopestack::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Stack, StackConfig, StackError, StackResult, StackScope, StackVec, ThreadStack,
        stack_scope,
    };
}

// ============================================================================
// LOW-LEVEL APIs (For advanced use cases only)
// ============================================================================

/// Alignment arithmetic and registry internals.
///
/// Most users should use [`Stack`] and [`ThreadStack`] instead.
pub mod raw {
    pub use scopestack_core::{Region, Span, align_up, byte_len, check_alignment};
    pub use scopestack_platform::config::{
        DEFAULT_CAPACITY, ENV_ALIGNMENT, ENV_BACKING, ENV_CAPACITY, parse_size,
    };
    pub use scopestack_platform::registry::reserved_bytes;
}
