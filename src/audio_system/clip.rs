/// Audio clips
///
/// A clip is the immutable, shareable payload handed to a channel. The bytes
/// stay encoded; decoding is the backend's business.
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::AudioError;

/// Encoded audio plus the metadata the pool needs
#[derive(Clone)]
pub struct AudioClip {
    name: Arc<str>,
    data: Arc<Vec<u8>>,
    length: Duration,
}

impl AudioClip {
    /// Create a clip from preloaded bytes
    pub fn new(name: impl Into<Arc<str>>, data: Arc<Vec<u8>>, length: Duration) -> Self {
        Self {
            name: name.into(),
            data,
            length,
        }
    }

    /// Create a clip without audio data, for headless use
    pub fn silent(name: impl Into<Arc<str>>, length: Duration) -> Self {
        Self::new(name, Arc::new(Vec::new()), length)
    }

    /// Read a clip from disk, naming it after the file stem
    pub fn load(path: &Path) -> Result<Self, AudioError> {
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| AudioError::UnnamedClip(path.display().to_string()))?;
        Self::load_named(name, path)
    }

    /// Read a clip from disk under an explicit name
    pub fn load_named(name: impl Into<Arc<str>>, path: &Path) -> Result<Self, AudioError> {
        let data = std::fs::read(path).map_err(|source| AudioError::LoadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let data = Arc::new(data);
        let length = probe_length(&data);

        tracing::info!(
            "Loaded clip {} ({} bytes, {:.2}s)",
            path.display(),
            data.len(),
            length.as_secs_f32()
        );

        Ok(Self::new(name, data, length))
    }

    /// Override the clip length (e.g. when the decoder cannot report it)
    pub fn with_length(mut self, length: Duration) -> Self {
        self.length = length;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &Arc<Vec<u8>> {
        &self.data
    }

    pub fn length(&self) -> Duration {
        self.length
    }

    /// Clip length in seconds, the unit used by fades and delays
    pub fn length_secs(&self) -> f32 {
        self.length.as_secs_f32()
    }
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("name", &self.name)
            .field("bytes", &self.data.len())
            .field("length", &self.length)
            .finish()
    }
}

impl PartialEq for AudioClip {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.data, &other.data)
    }
}

#[cfg(feature = "playback")]
fn probe_length(data: &Arc<Vec<u8>>) -> Duration {
    use rodio::{Decoder, Source};

    let cursor = std::io::Cursor::new((**data).clone());
    Decoder::new(cursor)
        .ok()
        .and_then(|decoder| decoder.total_duration())
        .unwrap_or_default()
}

#[cfg(not(feature = "playback"))]
fn probe_length(_data: &Arc<Vec<u8>>) -> Duration {
    Duration::ZERO
}
