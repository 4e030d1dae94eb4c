//! Benchmark for stack allocation, rewind and in-place growth.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use scopestack_core::{
    DEFAULT_ALIGNMENT, StackScope, StackVec, initialize_thread_stack, shutdown_thread_stack,
    thread_stack,
};

const STACK_BYTES: usize = 1 << 20;

fn benchmark_stack(c: &mut Criterion) {
    let mut buffer = vec![0u8; STACK_BYTES];
    unsafe { initialize_thread_stack(buffer.as_mut_ptr(), buffer.len()) };

    c.bench_function("alloc 8 KiB + reset", |b| {
        b.iter(|| {
            let stack = thread_stack();
            let block = stack.alloc_bytes(8192, 1, DEFAULT_ALIGNMENT).unwrap();
            black_box(block);
            stack.reset().unwrap();
        });
    });

    c.bench_function("scope with 64 blocks", |b| {
        b.iter(|| {
            let scope = StackScope::new();
            for _ in 0..64 {
                black_box(scope.alloc_bytes(512, 1, DEFAULT_ALIGNMENT).unwrap());
            }
        });
    });

    c.bench_function("grow topmost buffer to 4096 u32", |b| {
        b.iter(|| {
            let scope = StackScope::new();
            let mut vec = StackVec::<u32>::new(scope.stack());
            for i in 0..4096u32 {
                unsafe { vec.push(i).unwrap() };
            }
            black_box(vec.len());
        });
    });

    shutdown_thread_stack();
}

criterion_group!(benches, benchmark_stack);
criterion_main!(benches);
