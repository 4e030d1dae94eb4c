use std::ptr::NonNull;

use proptest::prelude::*;
use scopestack_core::ArenaState;

const ARENA_BYTES: usize = 4096;

#[repr(C, align(64))]
struct Buffer([u8; ARENA_BYTES]);

fn with_arena<R>(f: impl FnOnce(&ArenaState) -> R) -> R {
    let mut buf = Box::new(Buffer([0; ARENA_BYTES]));
    let arena = ArenaState::new();
    unsafe { arena.initialize(buf.0.as_mut_ptr(), ARENA_BYTES) };
    let out = f(&arena);
    arena.shutdown();
    out
}

fn fill(ptr: NonNull<u8>, len: usize, seed: u8) {
    for i in 0..len {
        unsafe { ptr.as_ptr().add(i).write(seed ^ (i as u8)) };
    }
}

fn snapshot(ptr: NonNull<u8>, len: usize) -> Vec<u8> {
    unsafe { std::slice::from_raw_parts(ptr.as_ptr(), len).to_vec() }
}

fn request() -> impl Strategy<Value = (usize, usize)> {
    (0usize..600, 0u32..7).prop_map(|(size, shift)| (size, 1usize << shift))
}

proptest! {
    #[test]
    fn allocations_are_aligned_disjoint_and_rewind_exactly(
        prefix in 0usize..64,
        requests in prop::collection::vec(request(), 1..40),
    ) {
        with_arena(|arena| {
            let outer = arena.stack();
            outer.alloc_bytes(prefix, 1, 1).unwrap();

            let stack = arena.stack();
            let entry = stack.original();
            let mut last_end = arena.as_ptr() as usize + entry.offset();

            for (size, align) in requests {
                let before = stack.mark();
                match stack.alloc_bytes(size, 1, align) {
                    Ok(ptr) => {
                        let addr = ptr.as_ptr() as usize;
                        prop_assert_eq!(addr % align, 0);
                        prop_assert!(addr >= last_end);
                        last_end = addr + size;
                        prop_assert!(last_end <= arena.as_ptr() as usize + ARENA_BYTES);
                        prop_assert!(stack.mark() >= before);
                    }
                    Err(e) => {
                        prop_assert!(e.is_out_of_space());
                        prop_assert_eq!(stack.mark(), before);
                    }
                }
            }

            stack.reset().unwrap();
            prop_assert_eq!(stack.mark(), entry);
            prop_assert_eq!(arena.used(), prefix);
            Ok(())
        })?;
    }

    #[test]
    fn topmost_resize_preserves_kept_bytes(
        pad in 0usize..17,
        old_size in 1usize..256,
        new_size in 1usize..1024,
        shift in 0u32..7,
        seed in any::<u8>(),
    ) {
        with_arena(|arena| {
            let stack = arena.stack();
            stack.alloc_bytes(pad, 1, 1).unwrap();
            let block = stack.alloc_bytes(old_size, 1, 1).unwrap();
            fill(block, old_size, seed);

            let copy = old_size.min(new_size);
            let expected = snapshot(block, copy);
            let align = 1usize << shift;

            let resized = stack.realloc_bytes(Some(block), old_size, copy, new_size, 1, align).unwrap();
            prop_assert_eq!(resized.as_ptr() as usize % align, 0);
            prop_assert!(resized.as_ptr() as usize >= block.as_ptr() as usize);
            prop_assert_eq!(snapshot(resized, copy), expected);
            prop_assert!(stack.is_topmost(resized, new_size));
            Ok(())
        })?;
    }

    #[test]
    fn buried_resize_leaves_old_block_alone(
        x_size in 1usize..256,
        y_size in 1usize..256,
        new_size in 1usize..1024,
        seed in any::<u8>(),
    ) {
        with_arena(|arena| {
            let stack = arena.stack();
            let x = stack.alloc_bytes(x_size, 1, 8).unwrap();
            fill(x, x_size, seed);
            let y = stack.alloc_bytes(y_size, 1, 8).unwrap();
            let x_before = snapshot(x, x_size);
            let y_end = y.as_ptr() as usize + y_size;
            let mark = stack.mark();

            let copy = x_size.min(new_size);
            match stack.realloc_bytes(Some(x), x_size, copy, new_size, 1, 8) {
                Ok(moved) => {
                    let start = moved.as_ptr() as usize;
                    prop_assert!(start >= y_end);
                    prop_assert!(start + new_size <= arena.as_ptr() as usize + ARENA_BYTES);
                    prop_assert_eq!(snapshot(moved, copy), x_before[..copy].to_vec());
                }
                Err(e) => {
                    prop_assert!(e.is_out_of_space());
                    prop_assert_eq!(stack.mark(), mark);
                }
            }
            prop_assert_eq!(snapshot(x, x_size), x_before);
            Ok(())
        })?;
    }

    #[test]
    fn oversized_requests_change_nothing(
        used in 0usize..ARENA_BYTES,
        extra in 1usize..4096,
    ) {
        with_arena(|arena| {
            let stack = arena.stack();
            stack.alloc_bytes(used, 1, 1).unwrap();
            let mark = stack.mark();

            let err = stack.alloc_bytes(ARENA_BYTES - used + extra, 1, 1).unwrap_err();
            prop_assert!(err.is_out_of_space());
            prop_assert_eq!(stack.mark(), mark);
            Ok(())
        })?;
    }
}
