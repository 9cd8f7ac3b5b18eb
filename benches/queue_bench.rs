//! Benchmarks for the concurrency primitives.
//!
//! Benchmarks cover:
//! - `ConcurrentQueue` push/pop throughput and producer/consumer handoff
//! - `ThreadPool` task submission and `parallel_for` partitioning
//! - `Delegate`/`MulticastDelegate` call overhead
//! - `Future`/`Promise` completion latency

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot_core_async::delegate::{Delegate, MulticastDelegate};
use parking_lot_core_async::future::Promise;
use parking_lot_core_async::pool::{ThreadPool, ThreadPoolConfig};
use parking_lot_core_async::queue::ConcurrentQueue;

// ============================================================================
// ConcurrentQueue Benchmarks
// ============================================================================

fn bench_queue_push_try_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_push_try_pop");

    for size in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let q = ConcurrentQueue::new();
                for i in 0..size {
                    q.push(i);
                }
                while let Some(item) = q.try_pop() {
                    black_box(item);
                }
            });
        });
    }
    group.finish();
}

fn bench_queue_producer_consumer(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_producer_consumer");
    group.throughput(Throughput::Elements(1_000));

    group.bench_function("handoff_1000", |b| {
        b.iter(|| {
            let q = Arc::new(ConcurrentQueue::new());
            let producer_q = Arc::clone(&q);
            let producer = thread::spawn(move || {
                for i in 0..1_000u64 {
                    producer_q.push(i);
                }
            });
            let mut received = 0u64;
            while received < 1_000 {
                if q.wait_pop().is_some() {
                    received += 1;
                }
            }
            producer.join().unwrap();
            black_box(received);
        });
    });
    group.finish();
}

// ============================================================================
// ThreadPool Benchmarks
// ============================================================================

fn bench_pool_parallel_task(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_parallel_task");
    group.throughput(Throughput::Elements(200));

    group.bench_function("200_tasks", |b| {
        let pool = ThreadPool::new();
        b.iter(|| {
            let counter = Arc::new(AtomicUsize::new(0));
            let mut handles = Vec::with_capacity(200);
            for _ in 0..200 {
                let counter = Arc::clone(&counter);
                handles.push(pool.parallel_task(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                }));
            }
            for h in handles {
                h.wait();
            }
            black_box(counter.load(Ordering::Relaxed));
        });
        pool.shutdown();
    });
    group.finish();
}

fn bench_pool_parallel_for(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_parallel_for");

    for size in [1_000usize, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let pool = ThreadPool::with_config(ThreadPoolConfig {
                max_parallelism: num_cpus::get(),
                max_task_idle_time_ms: 15_000,
            });
            b.iter(|| {
                let sum = Arc::new(AtomicUsize::new(0));
                let sum_ref = Arc::clone(&sum);
                pool.parallel_for(size, 0, move |start, end| {
                    let mut local = 0usize;
                    for i in start..end {
                        local = local.wrapping_add(i);
                    }
                    sum_ref.fetch_add(local, Ordering::Relaxed);
                });
                black_box(sum.load(Ordering::Relaxed));
            });
            pool.shutdown();
        });
    }
    group.finish();
}

// ============================================================================
// Delegate Benchmarks
// ============================================================================

fn bench_delegate_call(c: &mut Criterion) {
    let mut group = c.benchmark_group("delegate_call");

    group.bench_function("free_fn", |b| {
        let d: Delegate<i32, i32> = Delegate::from_fn(|x| x + 1);
        b.iter(|| black_box(d.call(black_box(41))));
    });

    group.bench_function("boxed_closure", |b| {
        let captured = 10;
        let d = Delegate::new(move |x: i32| x + captured);
        b.iter(|| black_box(d.call(black_box(41))));
    });

    group.bench_function("multicast_10_subscribers", |b| {
        let mut m: MulticastDelegate<i32, i32> = MulticastDelegate::new();
        for _ in 0..10 {
            m.add(Delegate::from_fn(|x| x + 1));
        }
        b.iter(|| black_box(m.call(black_box(1))));
    });
    group.finish();
}

// ============================================================================
// Future/Promise Benchmarks
// ============================================================================

fn bench_future_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("future_round_trip");

    group.bench_function("set_value_then_get", |b| {
        b.iter(|| {
            let (future, promise) = Promise::<u64>::new();
            promise.set_value(42);
            black_box(future.get());
        });
    });

    group.bench_function("cross_thread_completion", |b| {
        b.iter(|| {
            let (future, promise) = Promise::<u64>::new();
            let handle = thread::spawn(move || {
                promise.set_value(7);
            });
            black_box(future.wait());
            handle.join().unwrap();
        });
    });
    group.finish();
}

// ============================================================================
// Benchmark Groups
// ============================================================================

criterion_group!(
    queue_benches,
    bench_queue_push_try_pop,
    bench_queue_producer_consumer
);

criterion_group!(pool_benches, bench_pool_parallel_task, bench_pool_parallel_for);

criterion_group!(delegate_benches, bench_delegate_call);

criterion_group!(future_benches, bench_future_round_trip);

criterion_main!(queue_benches, pool_benches, delegate_benches, future_benches);
