pub mod backend;
pub mod bgm;
pub mod category;
pub mod channel;
pub mod clip;
pub mod effects;
pub mod levels;
pub mod manager;
pub mod pool;
/// Audio system module
///
/// Pooled playback for games:
/// - Reusable channels, allocated on demand and recycled when idle
/// - Linear fade envelopes advanced by a per-frame tick
/// - SFX and BGM master volumes, persisted and applied to live channels
/// - Local/remote route gating and BGM crossfades
///
/// ## Architecture
///
/// ```text
/// AudioManager
///   ├── RouteGate          (local / remote)
///   ├── CategoryVolumes    (SFX, BGM) ── SettingsStore
///   ├── BgmCatalog         (name → clip)
///   ├── DelayExecutor      (completion callbacks) ── Clock
///   └── ChannelPool ── AudioBackend
///         ├── Channel #0 ─┐
///         ├── Channel #1 ─┤ AudioHandle + FadeEnvelope
///         └── Channel #n ─┘
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// use sound_pool::audio_system::{AudioManager, CastState, CrossfadeOptions, HeadlessBackend};
///
/// let cast = CastState::new(true);
/// let mut manager = AudioManager::builder(HeadlessBackend::new())
///     .with_route(cast.clone())
///     .with_bgm_clips(clips)
///     .build();
///
/// manager.play_bgm("theme");
/// manager.crossfade_bgm("battle", CrossfadeOptions::default().with_duration(2.0));
///
/// // Once per frame
/// manager.tick(dt);
/// ```
pub mod route;

// Re-export commonly used types
#[cfg(feature = "playback")]
pub use backend::RodioBackend;
pub use backend::{AudioBackend, AudioHandle, HeadlessBackend};
pub use bgm::{BgmCatalog, BgmSource};
pub use category::AudioCategory;
pub use channel::{Channel, ChannelKey};
pub use clip::AudioClip;
pub use effects::{BgmFadeOutOptions, CrossfadeOptions, FadeEnvelope, FadeState};
pub use manager::{AudioManager, AudioManagerBuilder};
pub use pool::ChannelPool;
pub use route::{CastState, Platform, PlatformRoute, Route, RouteGate, RouteState};
