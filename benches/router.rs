use bumpalo::Bump;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tlpool::{alloc_memory, free_memory, Pool, PoolConfig};

// =============================================================================
// SINGLE ALLOCATION BENCHMARKS
// =============================================================================

fn bench_single_alloc_64(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_alloc_64B");
    group.throughput(Throughput::Bytes(64));

    group.bench_function("attached_pool", |b| {
        let mut pool = Pool::create();
        pool.attach_to_thread();
        b.iter(|| {
            let ptr = alloc_memory(64);
            unsafe { free_memory(black_box(ptr)) };
        });
        pool.detach_from_thread();
    });

    group.bench_function("fallback", |b| {
        b.iter(|| {
            let ptr = alloc_memory(64);
            unsafe { free_memory(black_box(ptr)) };
        });
    });

    group.bench_function("box", |b| {
        b.iter(|| {
            let v: Box<[u8; 64]> = Box::new([0u8; 64]);
            black_box(v);
        });
    });

    group.finish();
}

// =============================================================================
// BATCH BENCHMARKS (allocate N, then free all)
// =============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_alloc_free");

    for count in [100usize, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("attached_pool", count), &count, |b, &n| {
            let mut pool = Pool::with_config(PoolConfig::large());
            pool.attach_to_thread();
            let mut blocks = Vec::with_capacity(n);
            b.iter(|| {
                blocks.extend((0..n).map(|i| alloc_memory(16 + i % 112)));
                for ptr in blocks.drain(..).rev() {
                    unsafe { free_memory(ptr) };
                }
            });
            pool.detach_from_thread();
        });

        group.bench_with_input(BenchmarkId::new("fallback", count), &count, |b, &n| {
            let mut blocks = Vec::with_capacity(n);
            b.iter(|| {
                blocks.extend((0..n).map(|i| alloc_memory(16 + i % 112)));
                for ptr in blocks.drain(..).rev() {
                    unsafe { free_memory(ptr) };
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("bumpalo", count), &count, |b, &n| {
            let mut bump = Bump::with_capacity(1 << 20);
            b.iter(|| {
                for i in 0..n {
                    black_box(bump.alloc_slice_fill_copy(16 + i % 112, 0u8));
                }
                bump.reset();
            });
        });
    }

    group.finish();
}

// =============================================================================
// ATTACHMENT OVERHEAD
// =============================================================================

fn bench_attach_detach(c: &mut Criterion) {
    let mut group = c.benchmark_group("attach_detach");

    group.bench_function("explicit", |b| {
        let mut pool = Pool::create();
        b.iter(|| {
            pool.attach_to_thread();
            pool.detach_from_thread();
        });
    });

    group.bench_function("guard", |b| {
        let mut pool = Pool::create();
        b.iter(|| {
            let guard = pool.attach();
            black_box(&guard);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_alloc_64, bench_batch, bench_attach_detach);
criterion_main!(benches);
