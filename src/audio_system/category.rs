/// Audio categories
///
/// Every channel belongs to exactly one category, and each category has its
/// own master volume.
use std::fmt;

/// Volume category of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioCategory {
    /// Sound effects, one-shots and everything not tagged as music
    #[default]
    Sfx,

    /// Background music, scaled by a per-channel logical volume
    Bgm,
}

impl fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioCategory::Sfx => write!(f, "SFX"),
            AudioCategory::Bgm => write!(f, "BGM"),
        }
    }
}

impl AudioCategory {
    /// Key under which the master volume is persisted
    pub fn settings_key(&self) -> &'static str {
        match self {
            AudioCategory::Sfx => "SFXVolume",
            AudioCategory::Bgm => "BGMVolume",
        }
    }

    /// Whether channels of this category carry a logical play volume
    pub fn is_bgm(&self) -> bool {
        matches!(self, AudioCategory::Bgm)
    }
}
