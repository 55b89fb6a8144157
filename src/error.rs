use thiserror::Error;

/// Library-level errors using thiserror for structured error handling.
///
/// Pool errors are returned to the direct caller and never retried
/// internally. Engine errors are opaque backend failures passed through
/// unchanged.

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to read audio source: {path}")]
    SourceRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode audio source: {path}")]
    Decode {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to initialize audio output stream")]
    StreamInit(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Failed to allocate playback sink")]
    SinkCreate(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Engine error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Engine could not allocate {requested} voices")]
    Capacity {
        requested: usize,
        #[source]
        source: EngineError,
    },

    #[error("No voice available in pool of capacity {capacity}")]
    NoVoiceAvailable { capacity: usize },

    #[error("No voice bound to name: {name}")]
    NameNotFound { name: String },

    #[error("Engine failure during voice reconfiguration")]
    Engine(#[from] EngineError),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
