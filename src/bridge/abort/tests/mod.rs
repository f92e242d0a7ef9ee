//! Abort signal tests

use std::sync::{Arc, Barrier};
use std::thread;

use crate::bridge::abort::{AbortReason, AbortSignal};
use crate::bridge::error::BridgeError;

#[test]
fn test_failed_action_always_aborts() {
    let signal = AbortSignal::new();
    assert_eq!(
        signal.check(false),
        Err(BridgeError::AbortRequested(AbortReason::ActionFailed))
    );
    signal.request();
    // Failure is reported ahead of cancellation.
    assert_eq!(
        signal.check(false),
        Err(BridgeError::AbortRequested(AbortReason::ActionFailed))
    );
}

#[test]
fn test_success_without_flag_never_aborts() {
    let signal = AbortSignal::new();
    for _ in 0..100 {
        assert!(signal.check(true).is_ok());
    }
}

#[test]
fn test_cancellation_flag() {
    let signal = AbortSignal::new();
    signal.request();
    assert!(signal.is_requested());
    assert_eq!(
        signal.check(true),
        Err(BridgeError::AbortRequested(AbortReason::Cancelled))
    );

    signal.clear();
    assert!(signal.check(true).is_ok());
    assert_eq!(signal.request_count(), 1);
}

#[test]
fn test_request_from_other_threads() {
    let signal = AbortSignal::new();
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let signal = signal.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                signal.request();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert!(signal.is_requested());
    assert_eq!(signal.request_count(), 4);
}
