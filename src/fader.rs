//! Fade controller
//!
//! Ramps one voice's volume linearly to a target over wall-clock time in
//! fixed-size steps. The ramp runs on a repeating timer and never blocks
//! the caller; at most one ramp per fader is in flight, and starting a new
//! one cancels the previous timer first.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::FadeConfig;
use crate::timer::{TimerHandle, TimerService};
use crate::voice::{SharedVoice, Voice};

/// Tick period used when none is configured.
pub const DEFAULT_TIME_GRAIN: Duration = Duration::from_millis(50);

/// Fade-out duration used by [`Fader::fade_out`].
pub const DEFAULT_FADE_OUT: Duration = Duration::from_secs(1);

/// Drives one voice's volume toward a target in discrete steps.
///
/// The step size is `(target - start) / (duration / time_grain)` with the
/// start volume read when the fade is requested. The ramp self-terminates
/// after `round(duration / time_grain)` ticks, clamping the volume to the
/// exact target; a fade toward zero additionally aborts early as soon as
/// the volume is already at or below zero, so a fade-out can never push the
/// volume negative.
/// One scheduled ramp: its timer and its own completion flag. The flag is
/// per-ramp so a late tick of a replaced ramp can only clear its own
/// status, never the current ramp's.
struct ActiveRamp {
    handle: TimerHandle,
    in_flight: Arc<AtomicBool>,
}

pub struct Fader {
    voice: SharedVoice,
    timer: Arc<dyn TimerService>,
    time_grain: Duration,
    default_fade_out: Duration,
    active: Mutex<Option<ActiveRamp>>,
}

impl Fader {
    /// Create a fader over `voice` with the default 50 ms grain.
    pub fn new(voice: SharedVoice, timer: Arc<dyn TimerService>) -> Self {
        Self::with_time_grain(voice, timer, DEFAULT_TIME_GRAIN)
    }

    /// Create a fader with an explicit tick period. A zero grain falls back
    /// to the default.
    pub fn with_time_grain(
        voice: SharedVoice,
        timer: Arc<dyn TimerService>,
        time_grain: Duration,
    ) -> Self {
        let time_grain = if time_grain.is_zero() {
            tracing::debug!("Zero time grain requested, using default");
            DEFAULT_TIME_GRAIN
        } else {
            time_grain
        };

        Self {
            voice,
            timer,
            time_grain,
            default_fade_out: DEFAULT_FADE_OUT,
            active: Mutex::new(None),
        }
    }

    /// Create a fader from a config.
    pub fn from_config(voice: SharedVoice, timer: Arc<dyn TimerService>, config: &FadeConfig) -> Self {
        let mut fader =
            Self::with_time_grain(voice, timer, Duration::from_millis(config.time_grain_ms));
        fader.default_fade_out = Duration::from_millis(config.fade_out_ms);
        fader
    }

    /// Fade the voice to silence over the default fade-out duration.
    pub fn fade_out(&self) {
        self.fade_out_over(self.default_fade_out);
    }

    /// Fade the voice to silence over `duration`.
    pub fn fade_out_over(&self, duration: Duration) {
        self.fade(0.0, duration);
    }

    /// Ramp the voice's volume to `target` over `duration`.
    ///
    /// Returns immediately; the ramp proceeds on the timer. A ramp already
    /// in flight is cancelled before the new one is scheduled. A zero
    /// duration jumps straight to the target.
    pub fn fade(&self, target: f64, duration: Duration) {
        // One ramp in flight: replace, never stack.
        self.cancel();

        let start = self.voice.lock().volume();
        if duration.is_zero() {
            self.voice.lock().set_volume(target);
            return;
        }

        let step_count = duration.as_secs_f64() / self.time_grain.as_secs_f64();
        let step = (target - start) / step_count;
        let total_ticks = (step_count.round() as u64).max(1);
        let fading_down = target <= 0.0;

        tracing::debug!(
            start,
            target,
            duration_ms = duration.as_millis() as u64,
            step,
            total_ticks,
            "Starting fade"
        );

        let voice = Arc::clone(&self.voice);
        let in_flight = Arc::new(AtomicBool::new(true));
        let ramp_flag = Arc::clone(&in_flight);
        let mut ticks_done = 0u64;

        let handle = self.timer.schedule_repeating(
            self.time_grain,
            Box::new(move || {
                let Some(mut voice) = voice.try_lock() else {
                    // Voice busy elsewhere this tick; skip rather than block
                    // the timer context.
                    tracing::trace!("Fade tick skipped, voice lock unavailable");
                    return ControlFlow::Continue(());
                };

                // Fade-outs stop as soon as silence is reached, whether or
                // not the tick budget is spent.
                if fading_down && voice.volume() <= 0.0 {
                    if voice.volume() < target {
                        voice.set_volume(target);
                    }
                    in_flight.store(false, Ordering::SeqCst);
                    tracing::debug!("Fade-out reached silence");
                    return ControlFlow::Break(());
                }

                ticks_done += 1;
                if ticks_done >= total_ticks {
                    voice.set_volume(target);
                    in_flight.store(false, Ordering::SeqCst);
                    tracing::debug!(target, "Fade complete");
                    return ControlFlow::Break(());
                }

                let next = voice.volume() + step;
                voice.set_volume(next);
                ControlFlow::Continue(())
            }),
        );

        *self.active.lock() = Some(ActiveRamp {
            handle,
            in_flight: ramp_flag,
        });
    }

    /// Cancel any ramp in flight, leaving the volume where it is. No-op
    /// when idle.
    pub fn cancel(&self) {
        if let Some(ramp) = self.active.lock().take() {
            ramp.handle.cancel();
            ramp.in_flight.store(false, Ordering::SeqCst);
            tracing::debug!("Fade cancelled");
        }
    }

    /// Whether the current ramp is in flight.
    pub fn is_fading(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|ramp| ramp.in_flight.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// The configured tick period.
    pub fn time_grain(&self) -> Duration {
        self.time_grain
    }
}
