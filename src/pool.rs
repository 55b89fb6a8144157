//! Voice pool
//!
//! Fixed-capacity set of playback voices with name-based routing. `prepare`
//! claims the first reclaimable voice in pool order, points it at a source
//! and binds the logical name; `play`/`stop` then address voices by name.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::engine::VoiceEngine;
use crate::error::PoolError;
use crate::voice::{SharedVoice, Voice};

/// Bounded pool of reusable playback voices.
///
/// The voice set is created once at construction and never resized. Methods
/// take `&self`; the binding map is behind a mutex held across the whole
/// scan-and-bind of `prepare`, so concurrent prepares cannot claim the same
/// voice twice.
pub struct VoicePool {
    voices: Vec<SharedVoice>,
    bindings: Mutex<HashMap<String, usize>>,
    capacity: usize,
}

impl VoicePool {
    /// Create a pool of `capacity` voices through the engine.
    ///
    /// Fails with `PoolError::Capacity` if the engine cannot allocate that
    /// many; nothing is partially constructed on failure.
    pub fn new<E: VoiceEngine>(engine: &E, capacity: usize) -> Result<Self, PoolError> {
        let voices = engine
            .create_voices(capacity)
            .map_err(|source| PoolError::Capacity {
                requested: capacity,
                source,
            })?;

        if voices.len() != capacity {
            return Err(PoolError::Capacity {
                requested: capacity,
                source: crate::error::EngineError::Other(format!(
                    "engine produced {} of {} voices",
                    voices.len(),
                    capacity
                )),
            });
        }

        tracing::info!(capacity, "Voice pool ready");
        Ok(Self {
            voices,
            bindings: Mutex::new(HashMap::new()),
            capacity,
        })
    }

    /// Create a pool from a config.
    pub fn from_config<E: VoiceEngine>(engine: &E, config: &PoolConfig) -> Result<Self, PoolError> {
        Self::new(engine, config.capacity)
    }

    /// Claim the first available voice, point it at `source` and bind it to
    /// `name`.
    ///
    /// Selection is a linear first-match scan, so reuse is biased toward
    /// low-index voices. Fails with `NoVoiceAvailable` when every voice is
    /// mid-playback, and with `Engine` when the source cannot be loaded; in
    /// both cases the binding map is left untouched. Rebinding an existing
    /// name stops the voice it previously pointed at before scanning, so
    /// the rebind can reclaim that voice even in a full pool.
    pub fn prepare(
        &self,
        name: &str,
        source: &str,
        volume: f64,
        looped: bool,
    ) -> Result<(), PoolError> {
        let mut bindings = self.bindings.lock();

        // Reclaim the voice this name already points at. If the engine
        // later fails, the name still maps to this (now stopped) voice.
        if let Some(&previous) = bindings.get(name) {
            let mut old = self.voices[previous].lock();
            if !old.is_available() {
                tracing::debug!(name, voice = previous, "Stopping displaced voice");
                old.stop();
            }
        }

        let index = self
            .voices
            .iter()
            .position(|voice| voice.lock().is_available())
            .ok_or(PoolError::NoVoiceAvailable {
                capacity: self.capacity,
            })?;

        {
            let mut voice = self.voices[index].lock();
            // Engine failure aborts before the name is bound.
            voice.reconfigure(source, looped)?;
            voice.set_volume(volume);
        }

        bindings.insert(name.to_string(), index);
        tracing::debug!(name, source, voice = index, volume, looped, "Prepared voice");
        Ok(())
    }

    /// `prepare` with full volume and no looping.
    pub fn prepare_default(&self, name: &str, source: &str) -> Result<(), PoolError> {
        self.prepare(name, source, 1.0, false)
    }

    /// Start playback on the voice bound to `name`.
    pub fn play(&self, name: &str) -> Result<(), PoolError> {
        let bindings = self.bindings.lock();
        let &index = bindings.get(name).ok_or_else(|| PoolError::NameNotFound {
            name: name.to_string(),
        })?;

        tracing::info!(name, voice = index, "Playing");
        self.voices[index].lock().start();
        Ok(())
    }

    /// Stop playback on the voice bound to `name`.
    pub fn stop(&self, name: &str) -> Result<(), PoolError> {
        let bindings = self.bindings.lock();
        let &index = bindings.get(name).ok_or_else(|| PoolError::NameNotFound {
            name: name.to_string(),
        })?;

        tracing::debug!(name, voice = index, "Stopping");
        self.voices[index].lock().stop();
        Ok(())
    }

    /// Stop every voice in the pool, bound or not.
    pub fn stop_all(&self) {
        for voice in &self.voices {
            voice.lock().stop();
        }
        tracing::debug!("Stopped all voices");
    }

    /// Voice currently bound to `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<SharedVoice> {
        let bindings = self.bindings.lock();
        bindings.get(name).map(|&index| Arc::clone(&self.voices[index]))
    }

    /// Voice at `index` in pool order, for inspection.
    pub fn voice(&self, index: usize) -> Option<SharedVoice> {
        self.voices.get(index).cloned()
    }

    /// Fixed pool capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of names currently bound.
    pub fn binding_count(&self) -> usize {
        self.bindings.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{FakeEngine, FakeVoice};

    fn pool(capacity: usize) -> VoicePool {
        VoicePool::new(&FakeEngine::new(), capacity).unwrap()
    }

    #[test]
    fn test_construction_failure_is_capacity_error() {
        let engine = FakeEngine::refusing();
        let err = VoicePool::new(&engine, 4).err().unwrap();
        assert!(matches!(err, PoolError::Capacity { requested: 4, .. }));
    }

    #[test]
    fn test_prepare_binds_first_available_voice() {
        let pool = pool(3);
        pool.prepare_default("goal", "goal.mp3").unwrap();

        let bound = pool.lookup("goal").unwrap();
        assert!(Arc::ptr_eq(&bound, &pool.voice(0).unwrap()));
    }

    #[test]
    fn test_prepare_skips_busy_voices() {
        let pool = pool(3);
        // Occupy voices 0 and 1, then stop 0 so it is reclaimable again.
        pool.prepare_default("a", "a.mp3").unwrap();
        pool.prepare_default("b", "b.mp3").unwrap();
        pool.play("a").unwrap();
        pool.play("b").unwrap();
        pool.stop("a").unwrap();

        // [0: available, 1: busy, 2: available] -> first match is 0.
        pool.prepare_default("c", "c.mp3").unwrap();
        let bound = pool.lookup("c").unwrap();
        assert!(Arc::ptr_eq(&bound, &pool.voice(0).unwrap()));
    }

    #[test]
    fn test_exhausted_pool_rejects_prepare() {
        let pool = pool(2);
        pool.prepare_default("a", "a.mp3").unwrap();
        pool.prepare_default("b", "b.mp3").unwrap();

        let err = pool.prepare_default("c", "c.mp3").unwrap_err();
        assert!(matches!(err, PoolError::NoVoiceAvailable { capacity: 2 }));
        // Failed prepare leaves the mapping untouched.
        assert_eq!(pool.binding_count(), 2);
        assert!(pool.lookup("c").is_none());
    }

    #[test]
    fn test_voice_reclaimed_after_duration_exhausted() {
        let engine = FakeEngine::new();
        let pool = VoicePool::new(&engine, 1).unwrap();
        pool.prepare_default("a", "a.mp3").unwrap();
        pool.play("a").unwrap();
        assert!(matches!(
            pool.prepare_default("b", "b.mp3"),
            Err(PoolError::NoVoiceAvailable { .. })
        ));

        // Run the voice past its source end.
        engine
            .handle(0)
            .lock()
            .advance_position(FakeVoice::SOURCE_SECONDS);

        pool.prepare_default("b", "b.mp3").unwrap();
        assert!(pool.lookup("b").is_some());
    }

    #[test]
    fn test_prepare_applies_volume_and_loop() {
        let engine = FakeEngine::new();
        let pool = VoicePool::new(&engine, 1).unwrap();
        pool.prepare("rain", "rain.mp3", 0.4, true).unwrap();

        let voice = engine.handle(0);
        let voice = voice.lock();
        assert_eq!(voice.volume(), 0.4);
        assert!(voice.looped());
        assert_eq!(voice.source(), Some("rain.mp3"));
    }

    #[test]
    fn test_play_unbound_name_fails() {
        let pool = pool(2);
        let err = pool.play("nothing").unwrap_err();
        assert!(matches!(err, PoolError::NameNotFound { .. }));
        let err = pool.stop("nothing").unwrap_err();
        assert!(matches!(err, PoolError::NameNotFound { .. }));
    }

    #[test]
    fn test_engine_failure_does_not_bind() {
        let engine = FakeEngine::new();
        let pool = VoicePool::new(&engine, 1).unwrap();
        engine.handle(0).lock().fail_reconfigure = true;

        let err = pool.prepare_default("a", "bad.mp3").unwrap_err();
        assert!(matches!(err, PoolError::Engine(_)));
        assert_eq!(pool.binding_count(), 0);
        assert!(pool.lookup("a").is_none());
    }

    #[test]
    fn test_rebinding_reclaims_previous_voice() {
        let engine = FakeEngine::new();
        let pool = VoicePool::new(&engine, 2).unwrap();
        pool.prepare_default("theme", "old.mp3").unwrap();
        pool.play("theme").unwrap();

        // Rebind while the old voice is mid-playback: it is stopped before
        // the scan, so the scan claims it again and voice 1 stays untouched.
        pool.prepare_default("theme", "new.mp3").unwrap();

        let bound = pool.lookup("theme").unwrap();
        assert!(Arc::ptr_eq(&bound, &pool.voice(0).unwrap()));
        assert_eq!(engine.handle(0).lock().source(), Some("new.mp3"));
        assert_eq!(engine.handle(1).lock().source(), None);
        assert_eq!(pool.binding_count(), 1);
    }

    #[test]
    fn test_rebind_in_full_pool_reclaims_own_voice() {
        let engine = FakeEngine::new();
        let pool = VoicePool::new(&engine, 1).unwrap();
        pool.prepare_default("theme", "old.mp3").unwrap();
        pool.play("theme").unwrap();

        // Every voice is busy, but the rebind frees this name's own voice.
        pool.prepare_default("theme", "new.mp3").unwrap();
        assert_eq!(engine.handle(0).lock().source(), Some("new.mp3"));
        assert!(!engine.handle(0).lock().is_playing());
        assert_eq!(pool.binding_count(), 1);

        // A distinct name still finds the pool full.
        let err = pool.prepare_default("other", "other.mp3").err().unwrap();
        assert!(matches!(err, PoolError::NoVoiceAvailable { capacity: 1 }));
    }

    #[test]
    fn test_stop_all_includes_unbound_voices() {
        let pool = pool(3);
        pool.prepare_default("a", "a.mp3").unwrap();
        pool.play("a").unwrap();

        pool.stop_all();
        for index in 0..3 {
            assert!(pool.voice(index).unwrap().lock().is_stopped());
        }
    }

    #[test]
    fn test_from_config() {
        let pool = VoicePool::from_config(&FakeEngine::new(), &PoolConfig::default()).unwrap();
        assert_eq!(pool.capacity(), PoolConfig::default().capacity);
    }
}
