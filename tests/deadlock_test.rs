// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Deadlock detection tests using parking_lot's built-in deadlock detector.
//!
//! These tests share one machine between many threads and verify that the
//! single machine lock neither deadlocks nor lets a purchase be observed
//! half-applied.
//!
//! The machine uses parking_lot::Mutex; the `deadlock_detection` feature
//! enabled for tests detects cycles in the lock graph.

use book_vending_rs::{Book, Machine, VendingError};
use parking_lot::deadlock;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

const SECRET: &str = "s3cret";

fn make_books(count: usize, pages: u32) -> Vec<Book> {
    (0..count)
        .map(|i| Book::with_pages(format!("Book {i}"), "Author", "", 1, pages))
        .collect()
}

// === Deadlock Detection Infrastructure ===

/// Starts a background thread that checks for deadlocks.
/// Returns a handle to stop the detector.
fn start_deadlock_detector() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();

    thread::spawn(move || {
        while running_clone.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(100));
            let deadlocks = deadlock::check_deadlock();
            if !deadlocks.is_empty() {
                eprintln!("\n=== DEADLOCK DETECTED ===");
                for (i, threads) in deadlocks.iter().enumerate() {
                    eprintln!("\nDeadlock #{}", i + 1);
                    for t in threads {
                        eprintln!("Thread ID: {:?}", t.thread_id());
                        eprintln!("Backtrace:\n{:#?}", t.backtrace());
                    }
                }
                panic!("Deadlock detected! See output above for details.");
            }
        }
    });

    running
}

/// Stops the deadlock detector.
fn stop_deadlock_detector(running: Arc<AtomicBool>) {
    running.store(false, Ordering::SeqCst);
    thread::sleep(Duration::from_millis(150)); // Let detector thread exit
}

// === Tests ===

/// Many buyers racing for the same shelf.
#[test]
fn no_deadlock_high_contention_buyers() {
    let detector = start_deadlock_detector();
    let machine = Arc::new(Machine::new(dec!(1), SECRET).unwrap());
    machine.restock(make_books(500, 10), SECRET).unwrap();
    let inserted = Arc::new(AtomicU64::new(0));

    const NUM_THREADS: usize = 20;
    const OPS_PER_THREAD: usize = 100;

    let mut handles = Vec::with_capacity(NUM_THREADS);

    for _ in 0..NUM_THREADS {
        let machine = machine.clone();
        let inserted = inserted.clone();

        let handle = thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                if i % 2 == 0 {
                    machine.insert_coin(10).unwrap();
                    inserted.fetch_add(10, Ordering::SeqCst);
                } else {
                    match machine.purchase(0) {
                        Ok(book) => assert_eq!(book.pages(), 10),
                        Err(VendingError::InsufficientFunds { .. })
                        | Err(VendingError::IndexOutOfRange { .. }) => {}
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    // Every inserted coin is either still deposited or in the vault
    let status = machine.status();
    assert_eq!(inserted.load(Ordering::SeqCst), status.deposited + status.vault);
    // Every sale moved exactly one price into the vault
    assert_eq!(status.vault, (500 - status.books as u64) * 10);
}

/// Operator restocking and withdrawing while buyers shop.
#[test]
fn no_deadlock_operator_and_buyers() {
    let detector = start_deadlock_detector();
    let machine = Arc::new(Machine::new(dec!(0.5), SECRET).unwrap());
    let inserted = Arc::new(AtomicU64::new(0));
    let refunded = Arc::new(AtomicU64::new(0));
    let withdrawn = Arc::new(AtomicU64::new(0));

    const NUM_BUYERS: usize = 10;
    const OPS_PER_THREAD: usize = 200;

    let mut handles = Vec::with_capacity(NUM_BUYERS + 1);

    {
        let machine = machine.clone();
        let withdrawn = withdrawn.clone();
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                if i % 2 == 0 {
                    machine.restock(make_books(5, 20), SECRET).unwrap();
                } else {
                    withdrawn.fetch_add(machine.withdraw(SECRET).unwrap(), Ordering::SeqCst);
                }
                assert_eq!(machine.withdraw("guess"), Err(VendingError::Unauthorized));
            }
        }));
    }

    for buyer in 0..NUM_BUYERS {
        let machine = machine.clone();
        let inserted = inserted.clone();
        let refunded = refunded.clone();

        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                match (i + buyer) % 4 {
                    0 | 1 => {
                        machine.insert_coin(5).unwrap();
                        inserted.fetch_add(5, Ordering::SeqCst);
                    }
                    2 => {
                        let _ = machine.purchase(0);
                    }
                    _ => {
                        if i % 20 == 3 {
                            refunded.fetch_add(machine.cancel(), Ordering::SeqCst);
                        } else {
                            let _ = machine.catalogue();
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    let status = machine.status();
    assert_eq!(
        inserted.load(Ordering::SeqCst),
        status.deposited
            + status.vault
            + refunded.load(Ordering::SeqCst)
            + withdrawn.load(Ordering::SeqCst)
    );
}

/// Readers never observe a half-applied purchase.
#[test]
fn no_torn_reads_during_purchases() {
    let detector = start_deadlock_detector();
    let machine = Arc::new(Machine::new(dec!(1), SECRET).unwrap());
    machine.restock(make_books(1_000, 1), SECRET).unwrap();
    for _ in 0..5 {
        machine.insert_coin(200).unwrap();
    }
    let done = Arc::new(AtomicBool::new(false));

    let buyer = {
        let machine = machine.clone();
        let done = done.clone();
        thread::spawn(move || {
            while machine.purchase(0).is_ok() {}
            done.store(true, Ordering::SeqCst);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let machine = machine.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::SeqCst) {
                    let status = machine.status();
                    // Each book costs 1: sold books == vault, and funds are conserved
                    assert_eq!(1_000 - status.books as u64, status.vault);
                    assert_eq!(status.deposited + status.vault, 1_000);
                }
            })
        })
        .collect();

    buyer.join().expect("Thread panicked");
    for reader in readers {
        reader.join().expect("Thread panicked");
    }

    stop_deadlock_detector(detector);

    assert!(machine.is_empty());
    assert_eq!(machine.deposited(), 0);
    assert_eq!(machine.vault(), 1_000);
}
