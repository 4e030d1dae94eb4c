//! Per-thread arena.
//!
//! Each thread owns one [`ArenaState`]; nothing here is shared across threads.

use crate::arena::ArenaState;
use crate::stack::Stack;

thread_local! {
    static THREAD_ARENA: ArenaState = const { ArenaState::new() };
}

/// Binds the calling thread's stack to `[buffer, buffer + len)`.
///
/// Calling it again rebinds the stack; handles acquired earlier become stale.
///
/// # Safety
/// `buffer` must be valid for reads and writes of `len` bytes until
/// [`shutdown_thread_stack`] (or the next call to this function) on the same
/// thread, and must not be accessed through any other path meanwhile.
pub unsafe fn initialize_thread_stack(buffer: *mut u8, len: usize) {
    // SAFETY: forwarded from the caller.
    THREAD_ARENA.with(|arena| unsafe { arena.initialize(buffer, len) });
}

/// Clears the calling thread's stack. Outstanding handles become stale.
pub fn shutdown_thread_stack() {
    THREAD_ARENA.with(ArenaState::shutdown);
}

/// Acquires a handle on the calling thread's stack.
///
/// An uninitialized stack yields a handle with zero capacity.
pub fn thread_stack() -> Stack<'static> {
    THREAD_ARENA.with(|arena| {
        // SAFETY: `ArenaState` has no destructor and is initialized in a
        // `const` block, so its thread-local slot stays valid for the whole
        // life of the thread. `&ArenaState` is `!Send` (the state is built
        // from `Cell`s), so the handle cannot leave the thread.
        let arena: &'static ArenaState = unsafe { &*(arena as *const ArenaState) };
        arena.stack()
    })
}

/// Runs `f` with a handle on the calling thread's stack, then rewinds
/// everything `f` allocated.
pub fn with_thread_stack<R>(f: impl FnOnce(&Stack<'static>) -> R) -> R {
    let scope = crate::scope::StackScope::new();
    f(&scope)
}

/// Returns `(used, capacity)` of the calling thread's stack.
pub fn thread_stack_usage() -> (usize, usize) {
    THREAD_ARENA.with(|arena| (arena.used(), arena.capacity()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::StackScope;

    #[test]
    fn test_uninitialized_thread_stack() {
        std::thread::spawn(|| {
            let stack = thread_stack();
            assert_eq!(stack.capacity(), 0);
            assert!(stack.alloc_bytes(1, 1, 1).unwrap_err().is_out_of_space());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_thread_stack_lifecycle() {
        std::thread::spawn(|| {
            let mut buf = vec![0u64; 128];
            unsafe { initialize_thread_stack(buf.as_mut_ptr().cast(), buf.len() * 8) };

            {
                let scope = StackScope::new();
                scope.alloc_bytes(3, 100, 8).unwrap();
                assert_eq!(thread_stack_usage(), (300, 1024));
            }
            assert_eq!(thread_stack_usage(), (0, 1024));

            let used = with_thread_stack(|stack| {
                stack.alloc::<u64>(8).unwrap();
                stack.used()
            });
            assert_eq!(used, 64);
            assert_eq!(thread_stack_usage().0, 0);

            shutdown_thread_stack();
            assert_eq!(thread_stack_usage(), (0, 0));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_threads_are_isolated() {
        let mut buf = vec![0u8; 256];
        unsafe { initialize_thread_stack(buf.as_mut_ptr(), buf.len()) };
        let stack = thread_stack();
        stack.alloc_bytes(100, 1, 1).unwrap();

        std::thread::spawn(|| {
            assert_eq!(thread_stack_usage(), (0, 0));
        })
        .join()
        .unwrap();

        assert_eq!(thread_stack_usage(), (100, 256));
        stack.reset().unwrap();
        shutdown_thread_stack();
    }
}
