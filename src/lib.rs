//! Polyphonic playback of short audio assets.
//!
//! A bounded pool of reusable playback voices addressed by logical name,
//! plus a non-blocking linear volume fade controller:
//!
//! ```text
//! VoicePool (capacity fixed at construction)
//!   ├── Voice 0 ── bound to "goal"      ─┐
//!   ├── Voice 1 ── bound to "ambiance"  ─┤ Simultaneous
//!   ├── Voice 2 ── free                 ─┤ Playback
//!   └── Voice 3 ── free                 ─┘
//!
//! Fader (one per ramp target)
//!   └── steps a voice's volume every time_grain until the target is hit
//! ```
//!
//! `prepare` claims the first reclaimable voice, points it at a source and
//! binds the name; `play`/`stop` then route by name. Fading is orthogonal:
//! any voice handle, pooled or standalone, can be wrapped by a [`Fader`].
//!
//! The audio backend and the timer are behind narrow traits
//! ([`engine::VoiceEngine`] and [`timer::TimerService`]), so everything is
//! testable with in-memory fakes; `RodioEngine` and `ThreadTimer` are the
//! production implementations.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use voicepool::{Fader, RodioEngine, ThreadTimer, VoicePool};
//!
//! let engine = RodioEngine::new()?;
//! let pool = VoicePool::new(&engine, 8)?;
//!
//! pool.prepare("goal", "assets/goal.mp3", 1.0, false)?;
//! pool.play("goal")?;
//!
//! let timer = Arc::new(ThreadTimer::new());
//! let fader = Fader::new(pool.lookup("goal").unwrap(), timer);
//! fader.fade_out();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fader;
pub mod pool;
pub mod timer;
pub mod voice;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export commonly used types
pub use config::{FadeConfig, PoolConfig};
pub use engine::{RodioEngine, RodioVoice, VoiceEngine};
pub use error::{AppResult, EngineError, PoolError};
pub use fader::{Fader, DEFAULT_FADE_OUT, DEFAULT_TIME_GRAIN};
pub use pool::VoicePool;
pub use timer::{ManualTimer, ThreadTimer, TimerHandle, TimerService};
pub use voice::{shared, SharedVoice, Voice};
