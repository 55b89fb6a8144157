//! Voice capability contract
//!
//! The narrow surface the pool and fader need from a playback unit. The
//! backing engine (see `engine`) implements this for real audio output;
//! tests implement it with in-memory fakes.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::EngineError;

/// A single controllable playback unit.
///
/// Volume is conceptually in `[0.0, 1.0]` but is not clamped here; the
/// backing engine decides how out-of-range gain behaves. Positions and
/// durations are in seconds.
pub trait Voice: Send {
    /// Current output gain.
    fn volume(&self) -> f64;

    /// Set the output gain.
    fn set_volume(&mut self, volume: f64);

    /// Whether the voice is currently producing audio.
    fn is_playing(&self) -> bool;

    /// Whether the voice has been explicitly stopped.
    fn is_stopped(&self) -> bool;

    /// Playback cursor in seconds since `start`.
    fn position(&self) -> f64;

    /// Duration of the configured source in seconds (0.0 if unknown or
    /// unconfigured).
    fn duration(&self) -> f64;

    /// Begin playback of the configured source.
    fn start(&mut self);

    /// Stop playback. The voice becomes reclaimable by the pool.
    fn stop(&mut self);

    /// Point the voice at a different source. Does not start playback.
    fn reconfigure(&mut self, source: &str, looped: bool) -> Result<(), EngineError>;

    /// Whether the voice can be reclaimed: playback has run past its
    /// duration, or it was explicitly stopped. A voice paused mid-source
    /// by external means is NOT available.
    fn is_available(&self) -> bool {
        self.is_stopped() || self.position() >= self.duration()
    }
}

/// Shared handle to a voice. The pool binding and an active fader may both
/// hold one; every access goes through the lock.
pub type SharedVoice = Arc<Mutex<dyn Voice>>;

/// Wrap a concrete voice into a shared handle.
pub fn shared<V: Voice + 'static>(voice: V) -> SharedVoice {
    Arc::new(Mutex::new(voice))
}
