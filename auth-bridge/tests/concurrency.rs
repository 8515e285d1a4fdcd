// Delivery guarantees under concurrent platform callbacks

use auth_bridge::{Bridge, Dispatch, FnReceiver, Handle, Recorder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock};
use std::thread;

const THREADS: usize = 8;

#[test]
fn racing_terminal_callbacks_deliver_once() {
    let _ = env_logger::builder().is_test(true).try_init();

    for _ in 0..200 {
        let recorder = Arc::new(Recorder::new());
        let bridge = Bridge::new(Arc::clone(&recorder));
        let handle = bridge.begin_session();
        let barrier = Barrier::new(THREADS);
        let delivered = AtomicUsize::new(0);

        thread::scope(|scope| {
            for i in 0..THREADS {
                let (bridge, barrier, delivered) = (&bridge, &barrier, &delivered);
                scope.spawn(move || {
                    barrier.wait();
                    let dispatch = if i % 2 == 0 {
                        bridge.on_succeeded(handle)
                    } else {
                        bridge.on_error(handle, 7, "lockout")
                    };
                    if dispatch == Dispatch::Delivered {
                        delivered.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        assert_eq!(recorder.terminals(handle).len(), 1);
        assert!(bridge.registry().is_empty());
    }
}

#[test]
fn progress_never_follows_terminal_under_races() {
    for _ in 0..100 {
        let recorder = Arc::new(Recorder::new());
        let bridge = Bridge::new(Arc::clone(&recorder));
        let handle = bridge.begin_session();
        let barrier = Barrier::new(THREADS);

        thread::scope(|scope| {
            for i in 0..THREADS {
                let (bridge, barrier) = (&bridge, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    match i % 4 {
                        0 => bridge.on_succeeded(handle),
                        1 => bridge.on_help(handle, 4, "too slow"),
                        _ => bridge.on_failed(handle),
                    };
                });
            }
        });

        let seen = recorder.for_handle(handle);
        let terminal_at = seen.iter().position(|n| n.is_terminal());
        assert_eq!(terminal_at, Some(seen.len() - 1));
        assert_eq!(recorder.terminals(handle).len(), 1);
    }
}

#[test]
fn distinct_sessions_in_parallel() {
    let recorder = Arc::new(Recorder::new());
    let bridge = Bridge::new(Arc::clone(&recorder));
    const PER_THREAD: usize = 100;

    let handles: Vec<Vec<Handle>> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                let bridge = &bridge;
                scope.spawn(move || {
                    (0..PER_THREAD)
                        .map(|n| {
                            let handle = bridge.begin_session();
                            bridge.on_failed(handle);
                            if n % 3 == 0 {
                                bridge.on_error(handle, 10, "user canceled");
                            } else {
                                bridge.on_succeeded(handle);
                            }
                            handle
                        })
                        .collect::<Vec<Handle>>()
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    let all: Vec<Handle> = handles.into_iter().flatten().collect();
    let mut unique = all.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), THREADS * PER_THREAD);

    for handle in all {
        let terminals = recorder.terminals(handle);
        assert_eq!(terminals.len(), 1);
        assert_eq!(terminals[0].failed_attempts, 1);
    }
    assert_eq!(bridge.stats().delivered, (THREADS * PER_THREAD) as u64);
    assert!(bridge.registry().is_empty());
}

#[test]
fn cancel_racing_success_delivers_at_most_once() {
    for _ in 0..200 {
        let recorder = Arc::new(Recorder::new());
        let bridge = Bridge::new(Arc::clone(&recorder));
        let handle = bridge.begin_session();
        let barrier = Barrier::new(2);

        thread::scope(|scope| {
            scope.spawn(|| {
                barrier.wait();
                bridge.cancel(handle);
            });
            scope.spawn(|| {
                barrier.wait();
                bridge.on_succeeded(handle);
            });
        });

        assert!(recorder.terminals(handle).len() <= 1);
        assert!(bridge.registry().is_empty());
    }
}

#[test]
fn slow_delivery_does_not_block_other_sessions() {
    let slow = Arc::new(OnceLock::<Handle>::new());
    let release = Arc::new(Barrier::new(2));
    let delivered = Arc::new(AtomicUsize::new(0));

    let receiver = {
        let (slow, release, delivered) =
            (Arc::clone(&slow), Arc::clone(&release), Arc::clone(&delivered));
        FnReceiver::terminal_only(move |handle, _| {
            if slow.get() == Some(&handle) {
                release.wait();
            }
            delivered.fetch_add(1, Ordering::SeqCst);
        })
    };
    let bridge = Bridge::new(receiver);
    let slow_handle = bridge.begin_session();
    let fast_handle = bridge.begin_session();
    slow.set(slow_handle).unwrap();

    thread::scope(|scope| {
        scope.spawn(|| bridge.on_succeeded(slow_handle));
        // Completes while the slow delivery is parked in the receiver
        assert_eq!(bridge.on_succeeded(fast_handle), Dispatch::Delivered);
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
        release.wait();
    });

    assert_eq!(delivered.load(Ordering::SeqCst), 2);
}
