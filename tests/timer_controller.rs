use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, OnceLock, Weak,
    },
    time::Duration,
};

use pausable_timer::{TimerCommand, TimerController, TimerError, TimerOptions, TimerStatus};
use tokio::time::sleep;

const TOTAL_MS: u64 = 1_000;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn counting_controller() -> (TimerController, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let controller = TimerController::new(TimerOptions::from_millis(TOTAL_MS, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }))
    .unwrap();
    (controller, fired)
}

fn assert_close(actual: Duration, expected: Duration) {
    let low = expected.saturating_sub(ms(2));
    assert!(
        actual >= low && actual <= expected,
        "expected about {:?}, got {:?}",
        expected,
        actual
    );
}

#[tokio::test(start_paused = true)]
async fn new_controller_is_stopped_with_full_duration() {
    let (timer, fired) = counting_controller();

    assert_eq!(timer.state().status, TimerStatus::Stopped);
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));
    assert!(!timer.is_running());
    assert!(!timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS * 3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn restart_expires_once_and_stops() {
    let (timer, fired) = counting_controller();

    let state = timer.restart().unwrap();
    assert!(state.is_running());
    assert!(timer.is_running());
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));
    assert!(timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS - 5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(timer.is_running());

    sleep(ms(10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(timer.state().status, TimerStatus::Stopped);
    assert!(!timer.has_pending_wake_up());
    // Stop keeps the stored value, which was never reduced by a pause
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    sleep(ms(TOTAL_MS * 3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn pause_stores_remaining_and_prevents_expiry() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(300)).await;
    let state = timer.pause().unwrap();

    assert_eq!(state.status, TimerStatus::Paused);
    assert_close(timer.remaining_time(), ms(700));
    assert!(!timer.is_running());
    assert!(!timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS * 2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert_eq!(timer.state().status, TimerStatus::Paused);
}

#[tokio::test(start_paused = true)]
async fn resume_expires_relative_to_resume() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(300)).await;
    timer.pause().unwrap();
    let remaining = timer.remaining_time();

    sleep(ms(5_000)).await;
    let state = timer.resume().unwrap();
    assert!(state.is_running());
    assert_eq!(timer.remaining_time(), remaining);

    sleep(ms(650)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(ms(100)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(timer.state().status, TimerStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_expiry_from_running() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(200)).await;
    let state = timer.stop().unwrap();

    assert_eq!(state.status, TimerStatus::Stopped);
    assert!(!timer.is_running());
    assert!(!timer.has_pending_wake_up());
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    sleep(ms(TOTAL_MS * 2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn stop_from_paused_keeps_remaining() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(400)).await;
    timer.pause().unwrap();
    let paused_remaining = timer.remaining_time();

    timer.stop().unwrap();
    assert_eq!(timer.remaining_time(), paused_remaining);
    assert!(!timer.is_running());

    sleep(ms(TOTAL_MS * 2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn second_pause_changes_nothing() {
    let (timer, _fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(100)).await;
    let first = timer.pause().unwrap();

    let mut rx = timer.subscribe();
    rx.borrow_and_update();

    sleep(ms(500)).await;
    let second = timer.pause().unwrap();

    assert_eq!(first, second);
    assert!(!timer.has_pending_wake_up());
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn unknown_command_is_rejected_without_side_effects() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    let before = timer.state();

    let result = timer.dispatch_named("rewind");
    assert_eq!(result, Err(TimerError::InvalidCommand("rewind".to_string())));
    assert_eq!(timer.state(), before);
    assert!(timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS + 10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn named_commands_dispatch() {
    let (timer, _fired) = counting_controller();

    assert!(timer.dispatch_named("RESTART_TIMER").unwrap().is_running());
    assert_eq!(timer.dispatch_named("pause").unwrap().status, TimerStatus::Paused);
    assert!(timer.dispatch(TimerCommand::Resume).unwrap().is_running());
    assert_eq!(timer.dispatch_named("Stop").unwrap().status, TimerStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_pending_wake_up() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(500)).await;
    timer.teardown();

    assert!(timer.is_torn_down());
    assert!(!timer.has_pending_wake_up());
    assert_eq!(timer.restart(), Err(TimerError::TornDown));

    sleep(ms(TOTAL_MS * 3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_cancels_pending_wake_up() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    drop(timer);

    sleep(ms(TOTAL_MS * 3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn resume_while_running_rebases_start() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(400)).await;
    timer.resume().unwrap();
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    // First deadline passes without expiry
    sleep(ms(700)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(ms(400)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn restart_while_running_replaces_wake_up() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(600)).await;
    timer.restart().unwrap();

    sleep(ms(600)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(ms(500)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_expiry() {
    let (timer, fired) = counting_controller();
    let mut rx = timer.subscribe();

    timer.restart().unwrap();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_running());

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().status, TimerStatus::Stopped);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_while_stopped_changes_nothing() {
    let (timer, fired) = counting_controller();
    let mut rx = timer.subscribe();

    let state = timer.stop().unwrap();
    assert_eq!(state.status, TimerStatus::Stopped);
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));
    assert!(!timer.has_pending_wake_up());
    assert!(!rx.has_changed().unwrap());

    timer.restart().unwrap();
    timer.stop().unwrap();
    rx.borrow_and_update();

    sleep(ms(300)).await;
    timer.stop().unwrap();
    assert!(!rx.has_changed().unwrap());
    assert!(!timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS * 2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn pause_after_stop_subtracts_time_since_restart() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(300)).await;
    timer.stop().unwrap();
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    sleep(ms(100)).await;
    let state = timer.pause().unwrap();
    assert_eq!(state.status, TimerStatus::Paused);
    assert_close(timer.remaining_time(), ms(600));
    assert!(!timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS * 2)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn resume_after_stop_expires_relative_to_resume() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(300)).await;
    timer.stop().unwrap();

    sleep(ms(2_000)).await;
    timer.resume().unwrap();
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    sleep(ms(TOTAL_MS - 5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    sleep(ms(10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(timer.state().status, TimerStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn resume_after_expiry_runs_full_stored_duration_again() {
    let (timer, fired) = counting_controller();

    timer.restart().unwrap();
    sleep(ms(TOTAL_MS + 10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    sleep(ms(500)).await;
    timer.resume().unwrap();
    assert!(timer.has_pending_wake_up());

    sleep(ms(TOTAL_MS - 5)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    sleep(ms(10)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert!(!timer.is_running());
}

#[tokio::test(start_paused = true)]
async fn restart_from_expiry_callback_ends_stopped() {
    let slot: Arc<OnceLock<Weak<TimerController>>> = Arc::new(OnceLock::new());
    let fired = Arc::new(AtomicUsize::new(0));

    let callback_slot = Arc::clone(&slot);
    let counter = Arc::clone(&fired);
    let timer = Arc::new(
        TimerController::new(TimerOptions::from_millis(TOTAL_MS, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(timer) = callback_slot.get().and_then(Weak::upgrade) {
                assert!(timer.restart().unwrap().is_running());
            }
        }))
        .unwrap(),
    );
    slot.set(Arc::downgrade(&timer)).unwrap();

    timer.restart().unwrap();
    sleep(ms(TOTAL_MS + 10)).await;

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(timer.state().status, TimerStatus::Stopped);
    assert!(!timer.has_pending_wake_up());
    assert_eq!(timer.remaining_time(), ms(TOTAL_MS));

    sleep(ms(TOTAL_MS * 3)).await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unrepresentable_duration_is_rejected() {
    let result = TimerController::new(TimerOptions::new(Duration::MAX, || {}));
    assert_eq!(result.unwrap_err(), TimerError::InvalidDuration);
}

#[tokio::test]
async fn zero_duration_is_rejected() {
    let result = TimerController::new(TimerOptions::new(Duration::ZERO, || {}));
    assert_eq!(result.unwrap_err(), TimerError::InvalidDuration);
}

#[test]
fn construction_requires_runtime() {
    let result = TimerController::new(TimerOptions::from_millis(TOTAL_MS, || {}));
    assert_eq!(result.unwrap_err(), TimerError::NoRuntime);
}
