use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard},
    task::{Context, Poll},
    time::Duration,
};

use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{TimerOutcome, TimerState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

struct Completion {
    signal: oneshot::Sender<()>,
    on_complete: Option<CompletionCallback>,
}

impl Completion {
    fn fire(self) {
        if let Some(callback) = self.on_complete {
            callback();
        }
        let _ = self.signal.send(());
    }
}

/// Holds the pending completion of one run. Whoever takes it first decides
/// the run's outcome: the ticker at zero, or `cancel`.
type CompletionSlot = Arc<Mutex<Option<Completion>>>;

fn lock_slot(slot: &CompletionSlot) -> MutexGuard<'_, Option<Completion>> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct ActiveRun {
    slot: CompletionSlot,
    cancel_token: CancellationToken,
    ticker: JoinHandle<()>,
}

/// Single-fire completion signal for one countdown run.
///
/// Resolves to [`TimerOutcome::Completed`] when the countdown reaches zero and
/// to [`TimerOutcome::Cancelled`] if the run is cancelled or replaced first.
#[must_use = "dropping the handle does not stop the countdown"]
pub struct TimerHandle {
    rx: oneshot::Receiver<()>,
}

impl Future for TimerHandle {
    type Output = TimerOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| match result {
            Ok(()) => TimerOutcome::Completed,
            Err(_) => TimerOutcome::Cancelled,
        })
    }
}

/// One-second countdown with at most one run outstanding.
///
/// Must be driven from inside a tokio runtime; each run spawns its ticker task.
pub struct CountdownTimer {
    label: String,
    state: Arc<watch::Sender<TimerState>>,
    active: Option<ActiveRun>,
    tick_interval: Duration,
}

impl CountdownTimer {
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_tick_interval(label, Duration::from_secs(1))
    }

    pub fn with_tick_interval(label: impl Into<String>, tick_interval: Duration) -> Self {
        let (state, _) = watch::channel(TimerState::Idle);
        Self {
            label: label.into(),
            state: Arc::new(state),
            active: None,
            tick_interval,
        }
    }

    pub fn state(&self) -> TimerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    pub fn start(&mut self, seconds: u32, on_complete: Option<CompletionCallback>) -> TimerHandle {
        self.cancel();

        let (signal, rx) = oneshot::channel();
        let completion = Completion {
            signal,
            on_complete,
        };

        if seconds == 0 {
            log_info!("[{}] zero-length countdown finished immediately", self.label);
            self.state.send_replace(TimerState::Finished);
            completion.fire();
            return TimerHandle { rx };
        }

        log_info!("[{}] countdown started: {}s", self.label, seconds);
        self.state.send_replace(TimerState::Running {
            seconds_remaining: seconds,
        });

        let slot: CompletionSlot = Arc::new(Mutex::new(Some(completion)));
        let cancel_token = CancellationToken::new();
        let ticker = tokio::spawn(run_countdown(
            self.label.clone(),
            self.state.clone(),
            slot.clone(),
            cancel_token.clone(),
            seconds,
            self.tick_interval,
        ));

        self.active = Some(ActiveRun {
            slot,
            cancel_token,
            ticker,
        });

        TimerHandle { rx }
    }

    /// Stops the current run, if any, and returns to `Idle`. Once this returns
    /// the cancelled run can no longer publish state or fire its completion.
    pub fn cancel(&mut self) {
        if let Some(run) = self.active.take() {
            let pending = lock_slot(&run.slot).take();
            run.cancel_token.cancel();
            run.ticker.abort();

            if pending.is_some() {
                log_info!("[{}] countdown cancelled", self.label);
            }
            // Dropping the completion resolves its handle as cancelled.
            drop(pending);
        }

        self.state.send_if_modified(|state| {
            if *state == TimerState::Idle {
                false
            } else {
                *state = TimerState::Idle;
                true
            }
        });
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_countdown(
    label: String,
    state: Arc<watch::Sender<TimerState>>,
    slot: CompletionSlot,
    cancel_token: CancellationToken,
    seconds: u32,
    tick_interval: Duration,
) {
    let mut ticker = time::interval_at(Instant::now() + tick_interval, tick_interval);
    // Late ticks are delivered back to back, one decrement each, so the run
    // still ends close to its wall-clock deadline.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    let mut remaining = seconds;
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                remaining = remaining.saturating_sub(1);
                if !publish_tick(&label, &state, &slot, remaining) {
                    break;
                }
            }
        }
    }
}

/// Publishes one tick. Returns `false` once the run is over, either because it
/// was cancelled or because this tick completed it.
fn publish_tick(
    label: &str,
    state: &watch::Sender<TimerState>,
    slot: &CompletionSlot,
    remaining: u32,
) -> bool {
    let mut guard = lock_slot(slot);
    if guard.is_none() {
        return false;
    }

    if remaining > 0 {
        log::debug!("[{label}] {remaining}s remaining");
        state.send_replace(TimerState::Running {
            seconds_remaining: remaining,
        });
        return true;
    }

    state.send_replace(TimerState::Finished);
    if let Some(completion) = guard.take() {
        log_info!("[{}] countdown finished", label);
        completion.fire();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, CompletionCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let callback: CompletionCallback = Box::new(move || {
            inner.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_one_per_tick_and_completes_once() {
        let mut timer = CountdownTimer::new("test");
        let mut rx = timer.subscribe();
        let (fired, callback) = counter();

        let handle = timer.start(3, Some(callback));

        let mut seen = vec![rx.borrow_and_update().seconds_remaining()];
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            seen.push(state.seconds_remaining());
            if state == TimerState::Finished {
                break;
            }
        }

        assert_eq!(seen, [3, 2, 1, 0]);
        assert_eq!(handle.await, TimerOutcome::Completed);
        assert_eq!(timer.state(), TimerState::Finished);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn total_runtime_matches_duration() {
        let mut timer = CountdownTimer::new("test");
        let started = Instant::now();

        assert_eq!(timer.start(5, None).await, TimerOutcome::Completed);

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_never_fires() {
        let mut timer = CountdownTimer::new("test");
        let (fired, callback) = counter();

        let handle = timer.start(5, Some(callback));
        timer.cancel();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(handle.await, TimerOutcome::Cancelled);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_run_stops_ticking() {
        let mut timer = CountdownTimer::new("test");
        let handle = timer.start(5, None);

        time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(timer.state(), TimerState::Running { seconds_remaining: 3 });

        timer.cancel();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(handle.await, TimerOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_on_a_tick_deadline_never_fires() {
        let mut timer = CountdownTimer::new("test");
        let (fired, callback) = counter();
        let handle = timer.start(3, Some(callback));

        // Wakes at the same instant the second tick is due.
        time::sleep(Duration::from_secs(2)).await;
        timer.cancel();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(handle.await, TimerOutcome::Cancelled);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_on_the_final_deadline_picks_one_outcome() {
        let mut timer = CountdownTimer::new("test");
        let (fired, callback) = counter();
        let handle = timer.start(1, Some(callback));

        time::sleep(Duration::from_secs(1)).await;
        let finished_first = timer.state() == TimerState::Finished;
        timer.cancel();
        time::sleep(Duration::from_secs(5)).await;

        let outcome = handle.await;
        if finished_first {
            assert_eq!(outcome, TimerOutcome::Completed);
            assert_eq!(fired.load(Ordering::SeqCst), 1);
        } else {
            assert_eq!(outcome, TimerOutcome::Cancelled);
            assert_eq!(fired.load(Ordering::SeqCst), 0);
        }
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test]
    async fn final_tick_after_cancel_publishes_nothing() {
        let (state, _) = watch::channel(TimerState::Running {
            seconds_remaining: 1,
        });
        let (signal, rx) = oneshot::channel();
        let (fired, callback) = counter();
        let slot: CompletionSlot = Arc::new(Mutex::new(Some(Completion {
            signal,
            on_complete: Some(callback),
        })));

        // `cancel` got the lock first and emptied the slot.
        drop(lock_slot(&slot).take());
        assert!(!publish_tick("test", &state, &slot, 0));

        assert_eq!(*state.borrow(), TimerState::Running { seconds_remaining: 1 });
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(TimerHandle { rx }.await, TimerOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_replaces_previous_run() {
        let mut timer = CountdownTimer::new("test");
        let (first_fired, first_cb) = counter();
        let (second_fired, second_cb) = counter();

        let first = timer.start(2, Some(first_cb));
        time::sleep(Duration::from_millis(1500)).await;
        let second = timer.start(4, Some(second_cb));

        assert_eq!(first.await, TimerOutcome::Cancelled);
        assert_eq!(second.await, TimerOutcome::Completed);
        assert_eq!(first_fired.load(Ordering::SeqCst), 0);
        assert_eq!(second_fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_when_idle_is_a_no_op() {
        let mut timer = CountdownTimer::new("test");
        let mut rx = timer.subscribe();

        timer.cancel();
        timer.cancel();

        assert!(!rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_seconds_completes_immediately() {
        let mut timer = CountdownTimer::new("test");
        let (fired, callback) = counter();

        assert_eq!(timer.start(0, Some(callback)).await, TimerOutcome::Completed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.state(), TimerState::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_its_run() {
        let mut timer = CountdownTimer::new("test");
        let (fired, callback) = counter();
        let handle = timer.start(2, Some(callback));

        drop(timer);
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(handle.await, TimerOutcome::Cancelled);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
