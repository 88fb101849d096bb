use thiserror::Error;

/// Library-level errors using thiserror for structured error handling.
///
/// The playback API itself never fails (rejected or stale requests are
/// absorbed and reported through `Option`), so these only cover the edges
/// that touch the outside world: clip files, output devices and settings I/O.

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio clip: {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode audio clip: {0}")]
    DecodeFailed(String),

    #[error("Failed to initialize audio output stream")]
    StreamInitFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Clip has no name: {0}")]
    UnnamedClip(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
