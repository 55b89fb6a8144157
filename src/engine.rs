//! Engine boundary
//!
//! `VoiceEngine` is the factory contract the pool builds its voice set
//! through. `RodioEngine`/`RodioVoice` are the production implementation:
//! sources are preloaded into memory and decode-verified on reconfigure,
//! and each playback decodes from the in-memory bytes so `start` never
//! touches the filesystem.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::error::EngineError;
use crate::voice::{shared, SharedVoice, Voice};

/// Factory side of the engine boundary: produce the pool's initial voice
/// set.
pub trait VoiceEngine {
    /// Create `count` default-configured voices. An error here is fatal to
    /// pool construction.
    fn create_voices(&self, count: usize) -> Result<Vec<SharedVoice>, EngineError>;
}

/// Playback voice backed by a rodio sink.
///
/// `reconfigure` reads the whole source file into memory and decodes it
/// once to verify it and learn its duration. `start` re-decodes from the
/// preloaded bytes on a fresh sink.
pub struct RodioVoice {
    stream_handle: OutputStreamHandle,
    sink: Sink,
    data: Option<Arc<Vec<u8>>>,
    source_path: Option<String>,
    duration_secs: f64,
    started_at: Option<Instant>,
    stopped: bool,
    volume: f64,
    looped: bool,
}

impl RodioVoice {
    pub fn new(stream_handle: OutputStreamHandle) -> Result<Self, EngineError> {
        let sink =
            Sink::try_new(&stream_handle).map_err(|err| EngineError::SinkCreate(Box::new(err)))?;

        Ok(Self {
            stream_handle,
            sink,
            data: None,
            source_path: None,
            duration_secs: 0.0,
            started_at: None,
            stopped: false,
            volume: 1.0,
            looped: false,
        })
    }

    /// Path of the configured source, if any.
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }
}

impl Voice for RodioVoice {
    fn volume(&self) -> f64 {
        self.volume
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        self.sink.set_volume(volume as f32);
    }

    fn is_playing(&self) -> bool {
        !self.sink.empty() && !self.sink.is_paused()
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }

    fn position(&self) -> f64 {
        match self.started_at {
            Some(started) => {
                let elapsed = started.elapsed().as_secs_f64();
                // A looping voice wraps its cursor, so it stays unavailable
                // while the loop runs.
                if self.looped && self.duration_secs > 0.0 {
                    elapsed % self.duration_secs
                } else {
                    elapsed
                }
            }
            None => 0.0,
        }
    }

    fn duration(&self) -> f64 {
        self.duration_secs
    }

    fn start(&mut self) {
        let Some(data) = self.data.clone() else {
            tracing::warn!("Start requested on an unconfigured voice");
            return;
        };

        // Fresh sink per start; the old one may hold a finished queue.
        match Sink::try_new(&self.stream_handle) {
            Ok(new_sink) => {
                self.sink.stop();
                self.sink = new_sink;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to allocate sink for playback");
                return;
            }
        }

        // rodio's Decoder needs owned data with a 'static lifetime.
        let cursor = Cursor::new((*data).clone());
        match Decoder::new(cursor) {
            Ok(decoder) => {
                self.sink.set_volume(self.volume as f32);
                if self.looped {
                    self.sink.append(decoder.repeat_infinite());
                } else {
                    self.sink.append(decoder);
                }
                self.sink.play();
                self.started_at = Some(Instant::now());
                self.stopped = false;
            }
            Err(err) => {
                // The source was decode-verified at reconfigure.
                tracing::error!(error = %err, "Preloaded source failed to decode");
            }
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.stopped = true;
        self.started_at = None;
    }

    fn reconfigure(&mut self, source: &str, looped: bool) -> Result<(), EngineError> {
        let data = std::fs::read(source).map_err(|err| EngineError::SourceRead {
            path: source.to_string(),
            source: err,
        })?;

        // Decode once up front: verifies the asset and warms the decoder.
        let cursor = Cursor::new(data.clone());
        let decoder = Decoder::new(cursor).map_err(|err| EngineError::Decode {
            path: source.to_string(),
            source: Box::new(err),
        })?;

        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        let duration_secs = match decoder.total_duration() {
            Some(duration) => duration.as_secs_f64(),
            None => {
                // Some formats (notably mp3) report no duration; count
                // decoded samples instead.
                let samples = decoder.count();
                samples as f64 / (sample_rate as f64 * channels as f64)
            }
        };

        tracing::info!(
            path = source,
            bytes = data.len(),
            duration_secs,
            looped,
            "Voice reconfigured"
        );

        self.sink.stop();
        self.data = Some(Arc::new(data));
        self.source_path = Some(source.to_string());
        self.duration_secs = duration_secs;
        self.looped = looped;
        self.started_at = None;
        self.stopped = false;
        Ok(())
    }
}

/// Production engine: one shared output stream, one sink per voice.
pub struct RodioEngine {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioEngine {
    /// Open the default output device.
    pub fn new() -> Result<Self, EngineError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|err| EngineError::StreamInit(Box::new(err)))?;
        tracing::info!("Audio output stream ready");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl VoiceEngine for RodioEngine {
    fn create_voices(&self, count: usize) -> Result<Vec<SharedVoice>, EngineError> {
        let mut voices = Vec::with_capacity(count);
        for _ in 0..count {
            let voice = RodioVoice::new(self.stream_handle.clone())?;
            voices.push(shared(voice));
        }
        tracing::debug!(count, "Created voices");
        Ok(voices)
    }
}
