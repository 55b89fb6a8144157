//! Settings for pool size and fade timing, serializable so a host
//! application can keep them in its own config file.

use serde::{Deserialize, Serialize};

fn default_capacity() -> usize {
    8
}

fn default_time_grain_ms() -> u64 {
    50
}

fn default_fade_out_ms() -> u64 {
    1000
}

/// Pool construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of voices the pool holds, fixed for its lifetime.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Fade timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FadeConfig {
    /// Tick period of the ramp in milliseconds.
    #[serde(default = "default_time_grain_ms")]
    pub time_grain_ms: u64,

    /// Default fade-out duration in milliseconds.
    #[serde(default = "default_fade_out_ms")]
    pub fade_out_ms: u64,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            time_grain_ms: default_time_grain_ms(),
            fade_out_ms: default_fade_out_ms(),
        }
    }
}
