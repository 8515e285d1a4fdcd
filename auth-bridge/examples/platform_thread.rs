//! Simulated platform callback thread
//!
//! Spawns one thread per authentication attempt that plays the platform's
//! role, firing callbacks (including a stray one after the terminal event)
//! at a shared bridge. The main thread waits for every terminal outcome.
//!
//! Usage:
//!   cargo run --example platform_thread [attempts]

use auth_bridge::{Bridge, FnReceiver, Handle, Progress, RawSignal, Terminal};
use std::env;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let attempts: usize = env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(4);

    let (tx, rx) = mpsc::channel::<(Handle, Terminal)>();
    let receiver = FnReceiver::new(
        move |handle, terminal: &Terminal| {
            // Hand off to the application's own thread; never block the platform
            let _ = tx.send((handle, terminal.clone()));
        },
        |handle, progress: &Progress| println!("  {} progress: {}", handle, progress),
    );
    let bridge = Arc::new(Bridge::new(receiver));

    let workers: Vec<_> = (0..attempts)
        .map(|n| {
            let bridge = Arc::clone(&bridge);
            let handle = bridge.begin_session();
            thread::spawn(move || {
                for _ in 0..n % 3 {
                    bridge.signal(handle, RawSignal::Failed);
                    thread::sleep(Duration::from_millis(5));
                }
                let terminal = if n % 4 == 3 {
                    RawSignal::Error { code: 7, message: Some("lockout".into()) }
                } else {
                    RawSignal::Succeeded { authentication_type: 2 }
                };
                bridge.signal(handle, terminal);
                // Stray callback, discarded
                bridge.signal(handle, RawSignal::Failed);
            })
        })
        .collect();

    for _ in 0..attempts {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok((handle, terminal)) => println!(
                "{} finished: {} ({} failed attempt(s))",
                handle, terminal.outcome, terminal.failed_attempts
            ),
            Err(e) => {
                eprintln!("Timed out waiting for a terminal outcome: {}", e);
                break;
            }
        }
    }

    for worker in workers {
        let _ = worker.join();
    }

    let stats = bridge.stats();
    println!("\n=== BRIDGE SUMMARY ===");
    println!("Delivered: {}", stats.delivered);
    println!("Progress relayed: {}", stats.progress_relayed);
    println!("Discarded: {}", stats.discarded);
    println!("Live sessions: {}", stats.live_sessions);
}
