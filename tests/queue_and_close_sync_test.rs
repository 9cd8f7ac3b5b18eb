//! Integration tests for `ConcurrentQueue` and `CloseSync`.
//!
//! These tests validate:
//! - Multi-producer/single-consumer FIFO delivery under real threads
//! - `clear()` waking every blocked waiter with `None`
//! - `CloseSync` blocking a close until outstanding readers release

use parking_lot_core_async::close_sync::CloseSync;
use parking_lot_core_async::queue::ConcurrentQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_multi_producer_single_consumer_preserves_all_items() {
    const PRODUCERS: usize = 4;
    const ITEMS_PER_PRODUCER: usize = 250;

    let queue = Arc::new(ConcurrentQueue::new());
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    queue.push(p * ITEMS_PER_PRODUCER + i);
                }
            })
        })
        .collect();

    let mut received = Vec::with_capacity(PRODUCERS * ITEMS_PER_PRODUCER);
    while received.len() < PRODUCERS * ITEMS_PER_PRODUCER {
        if let Some(item) = queue.wait_pop_timeout(Duration::from_secs(5)) {
            received.push(item);
        }
    }

    for p in producers {
        p.join().unwrap();
    }

    received.sort_unstable();
    let expected: Vec<usize> = (0..PRODUCERS * ITEMS_PER_PRODUCER).collect();
    assert_eq!(received, expected);
}

#[test]
fn test_clear_unblocks_every_waiter() {
    const WAITERS: usize = 8;
    let queue = Arc::new(ConcurrentQueue::<i32>::new());
    let woken = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..WAITERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let woken = Arc::clone(&woken);
            thread::spawn(move || {
                let result = queue.wait_pop();
                if result.is_none() {
                    woken.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    thread::sleep(Duration::from_millis(50));
    queue.clear();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(woken.load(Ordering::SeqCst), WAITERS);
}

#[test]
fn test_push_no_notify_batch_then_single_notify_wakes_one() {
    let queue = Arc::new(ConcurrentQueue::new());
    for i in 0..5 {
        queue.push_no_notify(i);
    }
    queue.notify(|| {});
    assert_eq!(queue.len(), 5);
    assert_eq!(queue.try_pop(), Some(0));
}

#[test]
fn test_close_sync_blocks_close_until_all_readers_release() {
    const READERS: usize = 6;
    let sync = Arc::new(CloseSync::new());
    let released = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(std::sync::Barrier::new(READERS + 1));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let sync = Arc::clone(&sync);
            let released = Arc::clone(&released);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let guard = sync.try_readonly_lock().expect("alive at spawn time");
                barrier.wait();
                thread::sleep(Duration::from_millis(30));
                released.fetch_add(1, Ordering::SeqCst);
                drop(guard);
            })
        })
        .collect();

    barrier.wait();
    assert!(sync.is_alive());

    sync.lock_for_close();
    assert_eq!(
        released.load(Ordering::SeqCst),
        READERS,
        "lock_for_close must not return before every reader dropped its guard"
    );
    assert!(!sync.is_alive());
    assert!(sync.try_readonly_lock().is_none());

    for r in readers {
        r.join().unwrap();
    }
}
