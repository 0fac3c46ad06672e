//! Integration tests for the deadline set.
//!
//! Uses tokio's paused clock so `sleep_until` resolves as soon as the
//! runtime is idle, and elapsed times are exact.

use std::time::Duration;

use tokio::time::Instant;
use typerace_timer::Timers;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Tick,
    Deadline,
    Idle,
}

// =========================================================================
// Arming and cancelling
// =========================================================================

#[test]
fn test_new_set_is_empty() {
    let timers = Timers::<Key>::new();
    assert!(timers.is_empty());
    assert_eq!(timers.len(), 0);
    assert!(!timers.is_armed(Key::Tick));
}

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_deadline() {
    let mut timers = Timers::new();
    let now = Instant::now();
    timers.arm_at(Key::Tick, now + Duration::from_secs(5));
    timers.arm_at(Key::Tick, now + Duration::from_secs(1));

    assert_eq!(timers.len(), 1);
    assert_eq!(timers.deadline(Key::Tick), Some(now + Duration::from_secs(1)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_and_clear() {
    let mut timers = Timers::new();
    timers.arm_in(Key::Tick, Duration::from_secs(1));
    timers.arm_in(Key::Deadline, Duration::from_secs(2));

    assert!(timers.cancel(Key::Tick));
    assert!(!timers.cancel(Key::Tick));
    assert_eq!(timers.len(), 1);

    assert_eq!(timers.clear(), 1);
    assert!(timers.is_empty());
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_fires_earliest_first() {
    let mut timers = Timers::new();
    let start = Instant::now();
    timers.arm_in(Key::Deadline, Duration::from_secs(10));
    timers.arm_in(Key::Tick, Duration::from_secs(1));
    timers.arm_in(Key::Idle, Duration::from_secs(30));

    let first = timers.fired().await;
    assert_eq!(first.key, Key::Tick);
    assert_eq!(first.deadline - start, Duration::from_secs(1));

    let second = timers.fired().await;
    assert_eq!(second.key, Key::Deadline);
    assert_eq!(Instant::now() - start, Duration::from_secs(10));

    let third = timers.fired().await;
    assert_eq!(third.key, Key::Idle);
    assert!(timers.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fired_disarms_key() {
    let mut timers = Timers::new();
    timers.arm_in(Key::Tick, Duration::from_millis(100));

    let fired = timers.fired().await;
    assert_eq!(fired.key, Key::Tick);
    assert!(!timers.is_armed(Key::Tick));
}

#[tokio::test(start_paused = true)]
async fn test_past_deadline_fires_immediately() {
    let mut timers = Timers::new();
    let start = Instant::now();
    timers.arm_at(Key::Deadline, start);

    let fired = timers.fired().await;
    assert_eq!(fired.key, Key::Deadline);
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn test_empty_set_pends_forever() {
    let mut timers = Timers::<Key>::new();
    let result =
        tokio::time::timeout(Duration::from_secs(3600), timers.fired()).await;
    assert!(result.is_err(), "an empty set must never fire");
}

#[tokio::test(start_paused = true)]
async fn test_fired_is_cancel_safe() {
    let mut timers = Timers::new();
    timers.arm_in(Key::Deadline, Duration::from_secs(5));

    // A shorter branch wins the select; the timer must survive.
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(1)) => {}
        _ = timers.fired() => panic!("deadline fired too early"),
    }
    assert!(timers.is_armed(Key::Deadline));

    let fired = timers.fired().await;
    assert_eq!(fired.key, Key::Deadline);
}
