//! Countdown timer engine for focus sessions.
//!
//! A fixed-total countdown state machine: Idle → Running ⇄ Paused → Expired.
//! `tick()` is the only thing that moves time, which keeps the engine fully
//! deterministic under test; `spawn_ticker` drives it from a wall-clock
//! interval in production.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Completion callback slot. Read at fire time, not captured at start.
type CompletionCallback = Arc<dyn Fn() + Send + Sync>;

/// Timer states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not started yet, full time remaining.
    Idle,
    /// Counting down.
    Running,
    /// Frozen mid-count; `resume` continues from the same remaining time.
    Paused,
    /// Reached zero. Terminal until `start` or `reset`.
    Expired,
}

struct TimerInner {
    state: TimerState,
    remaining_seconds: u32,
}

/// Countdown over a fixed total duration.
///
/// Shared via `Arc` between the ticker task and whoever controls it; all
/// methods take `&self`.
pub struct FocusTimer {
    total_seconds: u32,
    inner: Mutex<TimerInner>,
    on_complete: Mutex<Option<CompletionCallback>>,
}

impl FocusTimer {
    /// Create an idle timer for the given duration.
    pub fn new(duration_minutes: u32) -> Self {
        let total_seconds = duration_minutes * 60;
        Self {
            total_seconds,
            inner: Mutex::new(TimerInner {
                state: TimerState::Idle,
                remaining_seconds: total_seconds,
            }),
            on_complete: Mutex::new(None),
        }
    }

    /// Replace the completion callback. The latest callback always wins,
    /// even if the countdown is already running.
    pub fn set_on_complete(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_complete.lock().expect("callback slot poisoned") = Some(Arc::new(callback));
    }

    /// (Re)start the countdown from the full duration. Valid in any state.
    ///
    /// A zero-length timer expires immediately and still fires the
    /// completion callback.
    pub fn start(&self) {
        let fire = {
            let mut inner = self.inner.lock().expect("timer state poisoned");
            inner.remaining_seconds = self.total_seconds;
            if self.total_seconds == 0 {
                inner.state = TimerState::Expired;
                true
            } else {
                inner.state = TimerState::Running;
                false
            }
        };
        if fire {
            self.fire_completion();
        }
    }

    /// Running → Paused. No-op in any other state.
    pub fn pause(&self) {
        let mut inner = self.inner.lock().expect("timer state poisoned");
        if inner.state == TimerState::Running {
            inner.state = TimerState::Paused;
        }
    }

    /// Paused → Running. No-op in any other state.
    pub fn resume(&self) {
        let mut inner = self.inner.lock().expect("timer state poisoned");
        if inner.state == TimerState::Paused {
            inner.state = TimerState::Running;
        }
    }

    /// Back to Idle with the full duration restored.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().expect("timer state poisoned");
        inner.state = TimerState::Idle;
        inner.remaining_seconds = self.total_seconds;
    }

    /// Advance the countdown by one second.
    ///
    /// Only moves time while Running. On reaching zero the timer flips to
    /// Expired and the completion callback fires exactly once. Returns the
    /// state after the tick.
    pub fn tick(&self) -> TimerState {
        {
            let mut inner = self.inner.lock().expect("timer state poisoned");
            if inner.state != TimerState::Running {
                return inner.state;
            }
            if inner.remaining_seconds > 1 {
                inner.remaining_seconds -= 1;
                return TimerState::Running;
            }
            inner.remaining_seconds = 0;
            inner.state = TimerState::Expired;
        }
        // The state lock is released before the callback runs, so a callback
        // is free to call back into the timer.
        self.fire_completion();
        TimerState::Expired
    }

    fn fire_completion(&self) {
        let callback = self
            .on_complete
            .lock()
            .expect("callback slot poisoned")
            .clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    pub fn state(&self) -> TimerState {
        self.inner.lock().expect("timer state poisoned").state
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.inner
            .lock()
            .expect("timer state poisoned")
            .remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// How far through the countdown we are, 0–100.
    pub fn percent_complete(&self) -> f64 {
        if self.total_seconds == 0 {
            return 100.0;
        }
        let remaining = self.remaining_seconds();
        f64::from(self.total_seconds - remaining) / f64::from(self.total_seconds) * 100.0
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn format_remaining(&self) -> String {
        format_seconds(self.remaining_seconds())
    }
}

/// Render a second count as zero-padded `MM:SS`.
pub fn format_seconds(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Spawn the wall-clock ticker driving a timer.
///
/// Ticks once per `tick_interval` and exits when the timer expires. Pause
/// and reset take effect at the next tick boundary; a tick against a paused
/// or idle timer is a no-op.
pub fn spawn_ticker(timer: Arc<FocusTimer>, tick_interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(tick_interval);
        // Consume the immediate first fire so the count starts a full
        // interval after spawn.
        tick.tick().await;

        loop {
            tick.tick().await;
            if timer.tick() == TimerState::Expired {
                debug!("Countdown expired, ticker exiting");
                break;
            }
        }
    })
}
