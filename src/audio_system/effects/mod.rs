/// Audio effects module
///
/// Fade envelopes, clamped volume levels and the option sets for the
/// fade-based entry points.

pub mod fade;
pub mod volume;

pub use fade::{FadeEnvelope, FadeState, FadeStep};
pub use volume::{clamp_volume, VolumeLevel};

/// Fade time used when a caller does not pick one
pub const DEFAULT_FADE_SECS: f32 = 1.0;

/// Options for crossfades
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossfadeOptions {
    /// Fade duration in seconds, shared by the outgoing and incoming channel
    pub duration: f32,

    /// Volume of the incoming channel; `None` picks the category default
    pub target_volume: Option<f32>,

    /// Whether the incoming clip loops
    pub looping: bool,
}

impl Default for CrossfadeOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_FADE_SECS,
            target_volume: None,
            looping: false,
        }
    }
}

impl CrossfadeOptions {
    /// Set fade duration
    pub fn with_duration(mut self, secs: f32) -> Self {
        self.duration = secs;
        self
    }

    /// Set target volume
    pub fn with_target_volume(mut self, volume: f32) -> Self {
        self.target_volume = Some(clamp_volume(volume));
        self
    }

    /// Set looping
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// Options for fading out every BGM channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BgmFadeOutOptions {
    /// Fade duration in seconds
    pub duration: f32,

    /// Logical volume to end at, scaled by the BGM master volume
    pub target_volume: f32,

    /// Recycle the channels once the fade completes
    pub idle_on_complete: bool,
}

impl Default for BgmFadeOutOptions {
    fn default() -> Self {
        Self {
            duration: DEFAULT_FADE_SECS,
            target_volume: 0.0,
            idle_on_complete: true,
        }
    }
}

impl BgmFadeOutOptions {
    /// Set fade duration
    pub fn with_duration(mut self, secs: f32) -> Self {
        self.duration = secs;
        self
    }

    /// Set the logical volume to end at
    pub fn with_target_volume(mut self, volume: f32) -> Self {
        self.target_volume = clamp_volume(volume);
        self
    }

    /// Keep the channels alive (holding the target) after the fade
    pub fn keep_alive(mut self) -> Self {
        self.idle_on_complete = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossfade_defaults() {
        let options = CrossfadeOptions::default();
        assert_eq!(options.duration, 1.0);
        assert_eq!(options.target_volume, None);
        assert!(!options.looping);
    }

    #[test]
    fn test_crossfade_builder() {
        let options = CrossfadeOptions::default()
            .with_duration(2.5)
            .with_target_volume(1.4)
            .with_looping(true);

        assert_eq!(options.duration, 2.5);
        assert_eq!(options.target_volume, Some(1.0)); // Clamped
        assert!(options.looping);
    }

    #[test]
    fn test_bgm_fade_out_defaults() {
        let options = BgmFadeOutOptions::default();
        assert_eq!(options.duration, 1.0);
        assert_eq!(options.target_volume, 0.0);
        assert!(options.idle_on_complete);
    }

    #[test]
    fn test_bgm_fade_out_builder() {
        let options = BgmFadeOutOptions::default()
            .with_duration(3.0)
            .with_target_volume(0.25)
            .keep_alive();

        assert_eq!(options.duration, 3.0);
        assert_eq!(options.target_volume, 0.25);
        assert!(!options.idle_on_complete);
    }
}
