//! Repeating-timer abstraction
//!
//! The fade controller only needs "deliver a callback every `period` until
//! cancelled". Production uses a thread per active ramp with a
//! crossbeam-channel ticker; tests drive ticks by hand with `ManualTimer`
//! so fade numerics are checked without sleeping.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select, Sender};
use parking_lot::Mutex;

/// Callback delivered on every tick. Returning `ControlFlow::Break` ends
/// delivery from inside a tick.
pub type TickFn = Box<dyn FnMut() -> ControlFlow<()> + Send>;

/// Source of repeating callbacks at a fixed period.
pub trait TimerService: Send + Sync {
    /// Schedule `callback` every `period`. Delivery continues until the
    /// callback breaks or the returned handle is cancelled or dropped.
    fn schedule_repeating(&self, period: Duration, callback: TickFn) -> TimerHandle;
}

/// Handle to a scheduled repeating callback. Cancelling is idempotent;
/// dropping the handle also cancels.
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
    waker: Option<Sender<()>>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(waker) = &self.waker {
            let _ = waker.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Thread-backed timer: one thread per scheduled callback, ticking on a
/// crossbeam channel so cancellation interrupts a sleep immediately.
pub struct ThreadTimer;

impl ThreadTimer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for ThreadTimer {
    fn schedule_repeating(&self, period: Duration, mut callback: TickFn) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        let flag = Arc::clone(&cancelled);
        thread::spawn(move || {
            let ticker = crossbeam_channel::tick(period);
            loop {
                select! {
                    // Fires on explicit cancel and on handle drop (channel
                    // disconnects either way).
                    recv(cancel_rx) -> _ => break,
                    recv(ticker) -> tick => {
                        if tick.is_err() || flag.load(Ordering::SeqCst) {
                            break;
                        }
                        if callback().is_break() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!(period_ms = period.as_millis() as u64, "timer thread exited");
        });

        TimerHandle {
            cancelled,
            waker: Some(cancel_tx),
        }
    }
}

struct ManualEntry {
    period: Duration,
    callback: TickFn,
    cancelled: Arc<AtomicBool>,
    done: bool,
}

/// Hand-driven timer: collects scheduled callbacks and delivers ticks only
/// when `advance` is called. Deterministic driver for tests and offline
/// stepping.
pub struct ManualTimer {
    entries: Mutex<Vec<ManualEntry>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Deliver `ticks` ticks to every live callback, in scheduling order.
    pub fn advance(&self, ticks: usize) {
        for _ in 0..ticks {
            let mut entries = self.entries.lock();
            for entry in entries.iter_mut() {
                if entry.done || entry.cancelled.load(Ordering::SeqCst) {
                    continue;
                }
                if (entry.callback)().is_break() {
                    entry.done = true;
                }
            }
            entries.retain(|entry| !entry.done && !entry.cancelled.load(Ordering::SeqCst));
        }
    }

    /// Number of callbacks still receiving ticks.
    pub fn active_count(&self) -> usize {
        let entries = self.entries.lock();
        entries
            .iter()
            .filter(|entry| !entry.done && !entry.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Period of the most recently scheduled callback, if any.
    pub fn last_period(&self) -> Option<Duration> {
        self.entries.lock().last().map(|entry| entry.period)
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService for ManualTimer {
    fn schedule_repeating(&self, period: Duration, callback: TickFn) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().push(ManualEntry {
            period,
            callback,
            cancelled: Arc::clone(&cancelled),
            done: false,
        });
        TimerHandle {
            cancelled,
            waker: None,
        }
    }
}
