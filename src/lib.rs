//! Pooled audio playback for games: reusable channels, linear fades, SFX/BGM
//! master volumes, local/remote route gating and BGM crossfades.

pub mod audio_system;
pub mod config;
pub mod error;
pub mod scheduler;
pub mod settings;

pub use audio_system::{
    AudioBackend, AudioCategory, AudioClip, AudioHandle, AudioManager, AudioManagerBuilder,
    BgmFadeOutOptions, CastState, ChannelKey, CrossfadeOptions, FadeState, HeadlessBackend, Route,
};
pub use config::AudioConfig;
pub use error::{AppResult, AudioError, ConfigError};
pub use scheduler::{Clock, DelayExecutor, ManualClock, SystemClock};
pub use settings::{JsonSettingsStore, MemorySettingsStore, SettingsStore};
