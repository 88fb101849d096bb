/// Pooled playback channels
///
/// A channel wraps one backend handle together with its category, the BGM
/// logical volume and the fade envelope driving it.
use std::fmt;

use super::backend::AudioHandle;
use super::category::AudioCategory;
use super::clip::AudioClip;
use super::effects::{FadeEnvelope, FadeState, FadeStep};

/// Stable identifier of a channel within its pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelKey(u32);

impl ChannelKey {
    /// Raw value returned to callers that expect the `-1` "no channel" sentinel
    pub const SENTINEL: i64 = -1;

    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    /// Flatten an optional key into the sentinel convention used by
    /// scripting bridges
    pub fn encode(key: Option<ChannelKey>) -> i64 {
        key.map(|k| i64::from(k.0)).unwrap_or(Self::SENTINEL)
    }

    /// Inverse of [`ChannelKey::encode`]; negative or oversized values are no key
    pub fn decode(raw: i64) -> Option<ChannelKey> {
        u32::try_from(raw).ok().map(ChannelKey)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One playback slot
pub struct Channel {
    id: ChannelKey,
    handle: Box<dyn AudioHandle>,
    category: AudioCategory,
    /// BGM logical volume before master scaling
    play_volume: f32,
    envelope: FadeEnvelope,
    clip: Option<AudioClip>,
}

impl Channel {
    pub(crate) fn new(id: ChannelKey, handle: Box<dyn AudioHandle>) -> Self {
        let envelope = FadeEnvelope::steady(handle.volume());
        Self {
            id,
            handle,
            category: AudioCategory::Sfx,
            play_volume: 1.0,
            envelope,
            clip: None,
        }
    }

    pub fn id(&self) -> ChannelKey {
        self.id
    }

    pub fn category(&self) -> AudioCategory {
        self.category
    }

    pub fn is_bgm(&self) -> bool {
        self.category.is_bgm()
    }

    /// Logical BGM volume; meaningless for SFX channels
    pub fn play_volume(&self) -> f32 {
        self.play_volume
    }

    pub fn fade_state(&self) -> FadeState {
        self.envelope.state()
    }

    pub fn envelope(&self) -> &FadeEnvelope {
        &self.envelope
    }

    /// Current output volume
    pub fn volume(&self) -> f32 {
        self.handle.volume()
    }

    pub fn is_looping(&self) -> bool {
        self.handle.is_looping()
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    /// Idle channels are not producing sound and may be reused
    pub fn is_idle(&self) -> bool {
        !self.handle.is_playing()
    }

    /// Clip most recently assigned for managed playback
    pub fn clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Reconfigure a freshly acquired channel: cancel any leftover fade and
    /// take on `category`
    pub(crate) fn prepare(&mut self, category: AudioCategory) {
        self.category = category;
        self.play_volume = 1.0;
        self.envelope.settle(self.handle.volume());
    }

    pub(crate) fn set_play_volume(&mut self, play_volume: f32) {
        self.play_volume = play_volume;
    }

    pub(crate) fn assign_clip(&mut self, clip: &AudioClip) {
        self.handle.set_clip(clip);
        self.clip = Some(clip.clone());
    }

    /// Set the output volume; a steady channel keeps its envelope in sync
    pub(crate) fn set_volume(&mut self, volume: f32) {
        self.handle.set_volume(volume);
        if !self.envelope.is_fading() {
            self.envelope.settle(self.handle.volume());
        }
    }

    pub(crate) fn set_looping(&mut self, looping: bool) {
        self.handle.set_looping(looping);
    }

    pub(crate) fn play(&mut self) {
        self.handle.play();
    }

    pub(crate) fn play_delayed(&mut self, delay: f32) {
        self.handle.play_delayed(delay);
    }

    pub(crate) fn play_one_shot(&mut self, clip: &AudioClip, volume: f32) {
        self.handle.play_one_shot(clip, volume);
    }

    pub(crate) fn pause(&mut self) {
        self.handle.pause();
    }

    pub(crate) fn unpause(&mut self) {
        self.handle.unpause();
    }

    pub(crate) fn begin_fade_in(&mut self, target: f32, duration: f32) {
        self.envelope = FadeEnvelope::fade_in(self.handle.volume(), target, duration);
    }

    pub(crate) fn begin_fade_out(&mut self, duration: f32, target: f32, idle_on_complete: bool) {
        self.envelope =
            FadeEnvelope::fade_out(self.handle.volume(), target, duration, idle_on_complete);
    }

    /// Apply a master volume change without breaking the fade shape
    pub(crate) fn apply_master(&mut self, value: f32) {
        match self.envelope.state() {
            FadeState::FadingIn => self.envelope.set_target(value),
            FadeState::FadingOut => self.envelope.set_start(value),
            FadeState::None => self.set_volume(value),
        }
    }

    /// Advance the fade by `dt` and push the resulting volume to the handle
    pub(crate) fn advance_fade(&mut self, dt: f32) -> FadeStep {
        let step = self.envelope.advance(dt);
        match step {
            FadeStep::Ramp(volume) => self.handle.set_volume(volume),
            FadeStep::Finished(volume) => {
                self.handle.set_volume(volume);
                self.envelope.settle(self.handle.volume());
            }
            FadeStep::Steady | FadeStep::Recycle => {}
        }
        step
    }

    /// Stop playback and return to the idle defaults at `sfx_volume`
    pub(crate) fn make_idle(&mut self, sfx_volume: f32) {
        self.handle.stop();
        self.handle.set_looping(false);
        self.handle.set_volume(sfx_volume);
        self.category = AudioCategory::Sfx;
        self.play_volume = 1.0;
        self.envelope.settle(self.handle.volume());
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("play_volume", &self.play_volume)
            .field("volume", &self.volume())
            .field("playing", &self.is_playing())
            .field("envelope", &self.envelope)
            .field("clip", &self.clip.as_ref().map(|c| c.name()))
            .finish()
    }
}
