/// Background music
///
/// Named clip catalog plus the BGM entry points of [`AudioManager`]. BGM
/// channels loop by default, carry a logical `play_volume` and always sound at
/// `play_volume * bgm`. Every BGM operation is remote-only.
use std::collections::HashMap;

use super::category::AudioCategory;
use super::channel::ChannelKey;
use super::clip::AudioClip;
use super::effects::{clamp_volume, BgmFadeOutOptions, CrossfadeOptions, DEFAULT_FADE_SECS};
use super::manager::AudioManager;
use super::route::Route;

/// BGM clips addressable by name
#[derive(Debug, Clone, Default)]
pub struct BgmCatalog {
    clips: HashMap<String, AudioClip>,
}

impl BgmCatalog {
    /// Build a catalog keyed by clip name; later duplicates replace earlier ones
    pub fn new(clips: impl IntoIterator<Item = AudioClip>) -> Self {
        let mut map = HashMap::new();
        for clip in clips {
            let name = clip.name().to_string();
            if map.insert(name.clone(), clip).is_some() {
                tracing::warn!("Duplicate BGM clip '{}', keeping the last one", name);
            }
        }
        if !map.is_empty() {
            tracing::info!("BGM catalog loaded with {} clips", map.len());
        }
        Self { clips: map }
    }

    pub fn get(&self, name: &str) -> Option<&AudioClip> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Clip names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// A BGM clip given directly or by catalog name
#[derive(Debug, Clone, Copy)]
pub enum BgmSource<'a> {
    Clip(&'a AudioClip),
    Name(&'a str),
}

impl<'a> From<&'a AudioClip> for BgmSource<'a> {
    fn from(clip: &'a AudioClip) -> Self {
        BgmSource::Clip(clip)
    }
}

impl<'a> From<&'a str> for BgmSource<'a> {
    fn from(name: &'a str) -> Self {
        BgmSource::Name(name)
    }
}

impl<'a> From<&'a String> for BgmSource<'a> {
    fn from(name: &'a String) -> Self {
        BgmSource::Name(name.as_str())
    }
}

impl AudioManager {
    /// Start a looping BGM channel at full logical volume
    pub fn play_bgm<'a>(&mut self, source: impl Into<BgmSource<'a>>) -> Option<ChannelKey> {
        if !self.gate.admits(Route::Remote) {
            return None;
        }
        let clip = self.resolve_bgm(source.into())?;
        let volume = self.volumes.output_for(AudioCategory::Bgm, 1.0);

        let (key, channel) = self.pool.acquire_idle();
        channel.prepare(AudioCategory::Bgm);
        channel.set_play_volume(1.0);
        channel.assign_clip(&clip);
        channel.set_looping(true);
        channel.set_volume(volume);
        channel.play();

        tracing::debug!("Playing BGM {} on channel {}", clip.name(), key);
        Some(key)
    }

    /// Fade every sounding BGM channel out and a new one in.
    ///
    /// Without an explicit target the logical volume of the new layer is the
    /// current BGM master volume, so it sounds at `bgm * bgm`.
    pub fn crossfade_bgm<'a>(
        &mut self,
        source: impl Into<BgmSource<'a>>,
        options: CrossfadeOptions,
    ) -> Option<ChannelKey> {
        if !self.gate.admits(Route::Remote) {
            return None;
        }
        let clip = self.resolve_bgm(source.into())?;
        let play_volume = options
            .target_volume
            .map(clamp_volume)
            .unwrap_or_else(|| self.bgm_volume());

        let mut faded = 0;
        for channel in self.pool.iter_mut().filter(|c| c.is_bgm() && !c.is_idle()) {
            channel.begin_fade_out(options.duration, 0.0, true);
            faded += 1;
        }

        let target = self.volumes.output_for(AudioCategory::Bgm, play_volume);
        let key = self.begin_fade_in(
            AudioCategory::Bgm,
            &clip,
            options.duration,
            target,
            options.looping,
        );
        if let Some(channel) = self.pool.get_mut(key) {
            channel.set_play_volume(play_volume);
        }

        tracing::debug!(
            "Crossfading BGM to {} on channel {} ({} layers fading out)",
            clip.name(),
            key,
            faded
        );
        Some(key)
    }

    /// Fade every BGM channel to `target_volume` (logical)
    pub fn fade_out_bgm(&mut self, options: BgmFadeOutOptions) {
        if !self.gate.admits(Route::Remote) {
            return;
        }
        let play_volume = clamp_volume(options.target_volume);
        let target = self.volumes.output_for(AudioCategory::Bgm, play_volume);
        for channel in self.pool.iter_mut().filter(|c| c.is_bgm()) {
            channel.begin_fade_out(options.duration, target, options.idle_on_complete);
            channel.set_play_volume(play_volume);
        }
    }

    /// Fade every BGM channel to `target_volume` (logical) over `duration`
    /// seconds, one second when `None`
    pub fn fade_in_bgm(&mut self, target_volume: f32, duration: Option<f32>) {
        if !self.gate.admits(Route::Remote) {
            return;
        }
        let duration = duration.unwrap_or(DEFAULT_FADE_SECS);
        let play_volume = clamp_volume(target_volume);
        let target = self.volumes.output_for(AudioCategory::Bgm, play_volume);
        for channel in self.pool.iter_mut().filter(|c| c.is_bgm()) {
            channel.begin_fade_in(target, duration);
            channel.set_play_volume(play_volume);
        }
    }

    fn resolve_bgm(&self, source: BgmSource<'_>) -> Option<AudioClip> {
        match source {
            BgmSource::Clip(clip) => Some(clip.clone()),
            BgmSource::Name(name) => {
                let clip = self.catalog.get(name).cloned();
                if clip.is_none() {
                    tracing::warn!("Unknown BGM clip '{}'", name);
                }
                clip
            }
        }
    }
}
