//! In-memory fakes for unit tests. No audio hardware, no real timers.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::VoiceEngine;
use crate::error::EngineError;
use crate::voice::{SharedVoice, Voice};

/// Scriptable in-memory voice. Playback position only moves when the test
/// advances it.
pub struct FakeVoice {
    volume: f64,
    playing: bool,
    stopped: bool,
    position: f64,
    duration: f64,
    source: Option<String>,
    looped: bool,
    pub fail_reconfigure: bool,
}

impl FakeVoice {
    /// Duration every fake source reports.
    pub const SOURCE_SECONDS: f64 = 3.0;

    pub fn new() -> Self {
        Self {
            volume: 1.0,
            playing: false,
            stopped: false,
            position: 0.0,
            duration: 0.0,
            source: None,
            looped: false,
            fail_reconfigure: false,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn looped(&self) -> bool {
        self.looped
    }

    /// Move the playback cursor forward, ending playback at the source end.
    pub fn advance_position(&mut self, seconds: f64) {
        self.position += seconds;
        if self.position >= self.duration {
            self.playing = false;
        }
    }

    /// Halt playback without marking the voice stopped.
    pub fn pause(&mut self) {
        self.playing = false;
    }
}

impl Voice for FakeVoice {
    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn start(&mut self) {
        self.playing = true;
        self.stopped = false;
    }

    fn stop(&mut self) {
        self.playing = false;
        self.stopped = true;
    }

    fn reconfigure(&mut self, source: &str, looped: bool) -> Result<(), EngineError> {
        if self.fail_reconfigure {
            return Err(EngineError::Other(format!("cannot decode {source}")));
        }
        self.source = Some(source.to_string());
        self.looped = looped;
        self.duration = Self::SOURCE_SECONDS;
        self.position = 0.0;
        self.playing = false;
        self.stopped = false;
        Ok(())
    }
}

/// Engine that hands out `FakeVoice`s and keeps typed handles to them so
/// tests can script voice state directly.
pub struct FakeEngine {
    refuse_allocation: bool,
    handles: Mutex<Vec<Arc<Mutex<FakeVoice>>>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            refuse_allocation: false,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Engine that fails every allocation request.
    pub fn refusing() -> Self {
        Self {
            refuse_allocation: true,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Typed handle to the voice created at `index`, in creation order.
    pub fn handle(&self, index: usize) -> Arc<Mutex<FakeVoice>> {
        Arc::clone(&self.handles.lock()[index])
    }
}

impl VoiceEngine for FakeEngine {
    fn create_voices(&self, count: usize) -> Result<Vec<SharedVoice>, EngineError> {
        if self.refuse_allocation {
            return Err(EngineError::Other(format!(
                "engine refused to allocate {count} voices"
            )));
        }

        let mut handles = self.handles.lock();
        let mut voices = Vec::with_capacity(count);
        for _ in 0..count {
            let voice = Arc::new(Mutex::new(FakeVoice::new()));
            handles.push(Arc::clone(&voice));
            let shared: SharedVoice = voice;
            voices.push(shared);
        }
        Ok(voices)
    }
}
