/// Audio manager
///
/// Single owner of the channel pool, the master volumes, the route gate, the
/// BGM catalog and the delay executor. Every public entry point is
/// best-effort: requests for the inactive route or for unknown keys are
/// absorbed and reported through `Option`, never as errors.
use std::collections::HashMap;
use std::sync::Arc;

use super::backend::AudioBackend;
use super::bgm::BgmCatalog;
use super::category::AudioCategory;
use super::channel::{Channel, ChannelKey};
use super::clip::AudioClip;
use super::effects::{clamp_volume, CrossfadeOptions};
use super::levels::CategoryVolumes;
use super::pool::ChannelPool;
use super::route::{CastState, Route, RouteGate, RouteState};
use crate::config::AudioConfig;
use crate::scheduler::{Clock, DelayExecutor, SystemClock, TaskId};
use crate::settings::{MemorySettingsStore, SettingsStore};

/// How a managed channel should start
#[derive(Debug, Clone, Copy, PartialEq)]
enum StartMode {
    Once,
    Delayed(f32),
    Looped,
}

/// Pooled playback with fades, BGM crossfades and category volumes
pub struct AudioManager {
    pub(super) pool: ChannelPool,
    pub(super) volumes: CategoryVolumes,
    pub(super) gate: RouteGate,
    pub(super) catalog: BgmCatalog,
    scheduler: DelayExecutor,
    /// Latest pending completion per channel
    completions: HashMap<ChannelKey, TaskId>,
}

impl AudioManager {
    /// Start building a manager on top of `backend`
    pub fn builder(backend: impl AudioBackend + 'static) -> AudioManagerBuilder {
        AudioManagerBuilder::new(Box::new(backend))
    }

    // ---- Volume ----

    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.set_volume(AudioCategory::Sfx, volume);
    }

    pub fn set_bgm_volume(&mut self, volume: f32) {
        self.set_volume(AudioCategory::Bgm, volume);
    }

    pub fn sfx_volume(&self) -> f32 {
        self.volumes.get(AudioCategory::Sfx)
    }

    pub fn bgm_volume(&self) -> f32 {
        self.volumes.get(AudioCategory::Bgm)
    }

    /// Clamp, persist and apply a master volume to every live channel of
    /// `category`
    pub fn set_volume(&mut self, category: AudioCategory, volume: f32) {
        let stored = self.volumes.set(category, volume);
        self.volumes.apply(category, &mut self.pool);
        tracing::info!("{} volume set to {:.2}", category, stored);
    }

    pub fn volume(&self, category: AudioCategory) -> f32 {
        self.volumes.get(category)
    }

    // ---- One-shots ----

    /// Play `clip` once on the local route; `volume` defaults to the SFX volume
    pub fn play_local_one_shot(&mut self, clip: &AudioClip, volume: Option<f32>) {
        self.one_shot(Route::Local, clip, volume);
    }

    /// Play `clip` once on the remote route; `volume` defaults to the SFX volume
    pub fn play_remote_one_shot(&mut self, clip: &AudioClip, volume: Option<f32>) {
        self.one_shot(Route::Remote, clip, volume);
    }

    fn one_shot(&mut self, route: Route, clip: &AudioClip, volume: Option<f32>) {
        if !self.gate.admits(route) {
            return;
        }
        let volume = volume.map(clamp_volume).unwrap_or_else(|| self.sfx_volume());
        let (key, channel) = self.pool.acquire_idle();
        channel.prepare(AudioCategory::Sfx);
        channel.play_one_shot(clip, volume);
        tracing::trace!("One-shot {} on channel {}", clip.name(), key);
    }

    // ---- Managed playback ----

    pub fn play_local(&mut self, clip: &AudioClip) -> Option<ChannelKey> {
        self.start(Route::Local, clip, StartMode::Once)
    }

    pub fn play_remote(&mut self, clip: &AudioClip) -> Option<ChannelKey> {
        self.start(Route::Remote, clip, StartMode::Once)
    }

    /// Play on the remote route and run `on_complete` once the clip length
    /// has elapsed. The callback does not observe the channel; it still fires
    /// when the channel has been recycled and reused in the meantime.
    pub fn play_remote_then<F>(&mut self, clip: &AudioClip, on_complete: F) -> Option<ChannelKey>
    where
        F: FnOnce() + Send + 'static,
    {
        let key = self.start(Route::Remote, clip, StartMode::Once)?;
        let task = self.scheduler.schedule(clip.length_secs(), on_complete);
        self.completions.insert(key, task);
        Some(key)
    }

    pub fn play_local_delayed(&mut self, clip: &AudioClip, delay: f32) -> Option<ChannelKey> {
        self.start(Route::Local, clip, StartMode::Delayed(delay))
    }

    pub fn play_remote_delayed(&mut self, clip: &AudioClip, delay: f32) -> Option<ChannelKey> {
        self.start(Route::Remote, clip, StartMode::Delayed(delay))
    }

    pub fn play_local_looped(&mut self, clip: &AudioClip) -> Option<ChannelKey> {
        self.start(Route::Local, clip, StartMode::Looped)
    }

    pub fn play_remote_looped(&mut self, clip: &AudioClip) -> Option<ChannelKey> {
        self.start(Route::Remote, clip, StartMode::Looped)
    }

    fn start(&mut self, route: Route, clip: &AudioClip, mode: StartMode) -> Option<ChannelKey> {
        if !self.gate.admits(route) {
            return None;
        }
        let sfx = self.sfx_volume();
        let (key, channel) = self.pool.acquire_idle();
        channel.prepare(AudioCategory::Sfx);
        channel.assign_clip(clip);
        channel.set_looping(mode == StartMode::Looped);
        channel.set_volume(sfx);
        match mode {
            StartMode::Once | StartMode::Looped => channel.play(),
            StartMode::Delayed(delay) => channel.play_delayed(delay),
        }

        tracing::debug!("Playing {} on channel {} ({:?}, {})", clip.name(), key, mode, route);
        Some(key)
    }

    // ---- Transport ----

    /// Stop a playing channel and return it to the pool
    pub fn stop(&mut self, key: ChannelKey) {
        let sfx = self.sfx_volume();
        if self.pool.get(key).is_some_and(Channel::is_playing) {
            self.pool.release(key, sfx);
        }
    }

    pub fn pause(&mut self, key: ChannelKey) {
        if let Some(channel) = self.pool.get_mut(key) {
            if channel.is_playing() {
                channel.pause();
            }
        }
    }

    /// Resume a paused channel. Paused channels count as idle, so the key may
    /// have been handed out again in the meantime.
    pub fn unpause(&mut self, key: ChannelKey) {
        if let Some(channel) = self.pool.get_mut(key) {
            channel.unpause();
        }
    }

    pub fn stop_all(&mut self) {
        let sfx = self.sfx_volume();
        self.pool.release_all(sfx);
        tracing::debug!("Stopped all channels");
    }

    // ---- Fades ----

    /// Start `clip` silent on a new channel and fade it in to `target_volume`.
    /// Remote route.
    pub fn fade_in(
        &mut self,
        clip: &AudioClip,
        duration: f32,
        target_volume: f32,
        looping: bool,
    ) -> Option<ChannelKey> {
        self.fade_in_on(Route::Remote, clip, duration, target_volume, looping)
    }

    /// Local-route variant of [`AudioManager::fade_in`]
    pub fn local_fade_in(
        &mut self,
        clip: &AudioClip,
        duration: f32,
        target_volume: f32,
        looping: bool,
    ) -> Option<ChannelKey> {
        self.fade_in_on(Route::Local, clip, duration, target_volume, looping)
    }

    /// Fade a channel to silence and recycle it. Remote route.
    pub fn fade_out(&mut self, key: ChannelKey, duration: f32) {
        self.fade_out_on(Route::Remote, key, duration);
    }

    /// Local-route variant of [`AudioManager::fade_out`]
    pub fn local_fade_out(&mut self, key: ChannelKey, duration: f32) {
        self.fade_out_on(Route::Local, key, duration);
    }

    /// Fade out `key` (if it is playing) while fading `clip` in on a new
    /// channel. The target volume defaults to the SFX volume. Remote route.
    pub fn cross_fade(
        &mut self,
        key: ChannelKey,
        clip: &AudioClip,
        options: CrossfadeOptions,
    ) -> Option<ChannelKey> {
        self.cross_fade_on(Route::Remote, key, clip, options)
    }

    /// Local-route variant of [`AudioManager::cross_fade`]
    pub fn local_cross_fade(
        &mut self,
        key: ChannelKey,
        clip: &AudioClip,
        options: CrossfadeOptions,
    ) -> Option<ChannelKey> {
        self.cross_fade_on(Route::Local, key, clip, options)
    }

    fn fade_in_on(
        &mut self,
        route: Route,
        clip: &AudioClip,
        duration: f32,
        target_volume: f32,
        looping: bool,
    ) -> Option<ChannelKey> {
        if !self.gate.admits(route) {
            return None;
        }
        let key = self.begin_fade_in(
            AudioCategory::Sfx,
            clip,
            duration,
            clamp_volume(target_volume),
            looping,
        );
        Some(key)
    }

    fn fade_out_on(&mut self, route: Route, key: ChannelKey, duration: f32) {
        if !self.gate.admits(route) {
            return;
        }
        if let Some(channel) = self.pool.get_mut(key) {
            channel.begin_fade_out(duration, 0.0, true);
        }
    }

    fn cross_fade_on(
        &mut self,
        route: Route,
        key: ChannelKey,
        clip: &AudioClip,
        options: CrossfadeOptions,
    ) -> Option<ChannelKey> {
        if !self.gate.admits(route) {
            return None;
        }
        let target = options
            .target_volume
            .map(clamp_volume)
            .unwrap_or_else(|| self.sfx_volume());

        if let Some(channel) = self.pool.get_mut(key) {
            if channel.is_playing() {
                channel.begin_fade_out(options.duration, 0.0, true);
            }
        }
        let new_key =
            self.begin_fade_in(AudioCategory::Sfx, clip, options.duration, target, options.looping);
        tracing::debug!("Crossfading {} -> {} over {:.2}s", key, new_key, options.duration);
        Some(new_key)
    }

    /// Acquire a channel, start `clip` at volume zero and fade it in
    pub(super) fn begin_fade_in(
        &mut self,
        category: AudioCategory,
        clip: &AudioClip,
        duration: f32,
        target: f32,
        looping: bool,
    ) -> ChannelKey {
        let (key, channel) = self.pool.acquire_idle();
        channel.prepare(category);
        channel.assign_clip(clip);
        channel.set_looping(looping);
        channel.set_volume(0.0);
        channel.play();
        channel.begin_fade_in(target, duration);
        key
    }

    // ---- Frame update ----

    /// Advance every fade by `dt` seconds and run due completion callbacks
    pub fn tick(&mut self, dt: f32) {
        let dt = if dt.is_nan() { 0.0 } else { dt.max(0.0) };
        let sfx = self.sfx_volume();
        let report = self.pool.advance_fades(dt, sfx);
        let fired = self.scheduler.run_due();
        if fired > 0 {
            let scheduler = &self.scheduler;
            self.completions
                .retain(|_, task| scheduler.is_task_scheduled(*task));
        }

        if report.finished + report.recycled + fired > 0 {
            tracing::trace!(
                "Tick {:.4}s: {} ramping, {} finished, {} recycled, {} callbacks",
                dt,
                report.ramping,
                report.finished,
                report.recycled,
                fired
            );
        }
    }

    // ---- Maintenance ----

    /// Destroy every channel and start over with a single idle one
    pub fn reset(&mut self) {
        // Ids restart at zero; pending callbacks still fire but are no
        // longer reachable through `cancel_completion`
        self.completions.clear();
        self.pool.reset();
    }

    /// Destroy idle channels to bound pool growth
    pub fn remove_idle_channels(&mut self) -> usize {
        self.pool.remove_idle()
    }

    /// Cancel the pending completion callback of the latest
    /// `play_remote_then` that returned `key`. Callbacks of earlier plays on
    /// the same channel are left alone.
    pub fn cancel_completion(&mut self, key: ChannelKey) -> bool {
        match self.completions.remove(&key) {
            Some(task) => self.scheduler.cancel_task(task),
            None => false,
        }
    }

    /// Delay executor used for completion callbacks, open for other delayed
    /// actions
    pub fn scheduler_mut(&mut self) -> &mut DelayExecutor {
        &mut self.scheduler
    }

    // ---- Inspection ----

    pub fn channel(&self, key: ChannelKey) -> Option<&Channel> {
        self.pool.get(key)
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.pool.iter()
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn idle_count(&self) -> usize {
        self.pool.idle_count()
    }

    pub fn active_route(&self) -> Route {
        self.gate.active_route()
    }

    pub fn is_remote_route_active(&self) -> bool {
        self.active_route() == Route::Remote
    }

    pub fn bgm_catalog(&self) -> &BgmCatalog {
        &self.catalog
    }
}

/// Builder for [`AudioManager`]
pub struct AudioManagerBuilder {
    backend: Box<dyn AudioBackend>,
    settings: Option<Box<dyn SettingsStore>>,
    route: Option<Box<dyn RouteState>>,
    clock: Option<Arc<dyn Clock>>,
    bgm_clips: Vec<AudioClip>,
    default_sfx_volume: f32,
    default_bgm_volume: f32,
}

impl AudioManagerBuilder {
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            backend,
            settings: None,
            route: None,
            clock: None,
            bgm_clips: Vec::new(),
            default_sfx_volume: 1.0,
            default_bgm_volume: 1.0,
        }
    }

    /// Store used to load and persist the master volumes
    pub fn with_settings(mut self, settings: impl SettingsStore + 'static) -> Self {
        self.settings = Some(Box::new(settings));
        self
    }

    /// Source of the active output route
    pub fn with_route(mut self, route: impl RouteState + 'static) -> Self {
        self.route = Some(Box::new(route));
        self
    }

    /// Clock driving completion callbacks
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Clips available to the BGM helpers by name
    pub fn with_bgm_clips(mut self, clips: impl IntoIterator<Item = AudioClip>) -> Self {
        self.bgm_clips.extend(clips);
        self
    }

    /// Volumes used when the settings store has no value yet
    pub fn with_default_volumes(mut self, sfx: f32, bgm: f32) -> Self {
        self.default_sfx_volume = sfx;
        self.default_bgm_volume = bgm;
        self
    }

    /// Take the default volumes from a loaded configuration
    pub fn with_config(self, config: &AudioConfig) -> Self {
        self.with_default_volumes(config.default_sfx_volume, config.default_bgm_volume)
    }

    pub fn build(self) -> AudioManager {
        let mut pool = ChannelPool::new(self.backend);
        pool.reset();

        let settings = self
            .settings
            .unwrap_or_else(|| Box::new(MemorySettingsStore::new()));
        let volumes =
            CategoryVolumes::load(settings, self.default_sfx_volume, self.default_bgm_volume);
        volumes.apply(AudioCategory::Sfx, &mut pool);
        volumes.apply(AudioCategory::Bgm, &mut pool);

        let route = self
            .route
            .unwrap_or_else(|| Box::new(CastState::default()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let catalog = BgmCatalog::new(self.bgm_clips);

        AudioManager {
            pool,
            volumes,
            gate: RouteGate::new(route),
            catalog,
            scheduler: DelayExecutor::new(clock),
            completions: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::backend::HeadlessBackend;
    use crate::audio_system::effects::FadeState;
    use crate::scheduler::ManualClock;
    use approx::assert_relative_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct Fixture {
        manager: AudioManager,
        backend: HeadlessBackend,
        cast: CastState,
        clock: ManualClock,
    }

    fn fixture(remote: bool) -> Fixture {
        let backend = HeadlessBackend::new();
        let cast = CastState::new(remote);
        let clock = ManualClock::new();
        let manager = AudioManager::builder(backend.clone())
            .with_route(cast.clone())
            .with_clock(clock.clone())
            .build();
        Fixture {
            manager,
            backend,
            cast,
            clock,
        }
    }

    fn clip(name: &str, secs: f32) -> AudioClip {
        AudioClip::silent(name.to_string(), Duration::from_secs_f32(secs))
    }

    #[test]
    fn test_manager_starts_with_one_channel() {
        let f = fixture(false);
        assert_eq!(f.manager.pool_len(), 1);
        assert_eq!(f.manager.idle_count(), 1);
        assert_eq!(f.backend.live_handles(), 1);
    }

    #[test]
    fn test_play_local_uses_sfx_volume() {
        let mut f = fixture(false);
        f.manager.set_sfx_volume(0.6);
        let key = f.manager.play_local(&clip("step", 1.0)).unwrap();

        let channel = f.manager.channel(key).unwrap();
        assert!(channel.is_playing());
        assert!(!channel.is_looping());
        assert_eq!(channel.volume(), 0.6);
        assert_eq!(channel.category(), AudioCategory::Sfx);
    }

    #[test]
    fn test_route_rejection_leaves_pool_untouched() {
        let mut f = fixture(false);
        let before = f.manager.pool_len();
        assert_eq!(f.manager.play_remote(&clip("ping", 1.0)), None);
        assert_eq!(f.manager.play_remote_looped(&clip("ping", 1.0)), None);
        assert_eq!(f.manager.fade_in(&clip("ping", 1.0), 1.0, 1.0, false), None);
        assert_eq!(f.manager.pool_len(), before);
        assert_eq!(f.backend.playing_handles(), 0);

        f.cast.set_casting(true);
        assert_eq!(f.manager.play_local(&clip("ping", 1.0)), None);
        assert!(f.manager.play_remote(&clip("ping", 1.0)).is_some());
    }

    #[test]
    fn test_one_shot_defaults_to_sfx_volume() {
        let mut f = fixture(true);
        f.manager.set_sfx_volume(0.3);
        f.manager.play_remote_one_shot(&clip("coin", 0.2), None);
        f.manager.play_remote_one_shot(&clip("coin", 0.2), Some(0.9));
        f.manager.play_local_one_shot(&clip("coin", 0.2), None);

        let volumes: Vec<f32> = f.backend.one_shots().iter().map(|s| s.volume).collect();
        assert_eq!(volumes, vec![0.3, 0.9]);
    }

    #[test]
    fn test_looped_and_delayed_playback() {
        let mut f = fixture(false);
        let looped = f.manager.play_local_looped(&clip("rain", 1.0)).unwrap();
        let delayed = f.manager.play_local_delayed(&clip("bell", 1.0), 0.5).unwrap();
        assert_ne!(looped, delayed);
        assert!(f.manager.channel(looped).unwrap().is_looping());

        f.backend.advance(3.0);
        assert!(f.manager.channel(looped).unwrap().is_playing());
        assert!(f.manager.channel(delayed).unwrap().is_idle());
    }

    #[test]
    fn test_stop_pause_unpause() {
        let mut f = fixture(false);
        let key = f.manager.play_local(&clip("engine", 10.0)).unwrap();

        f.manager.pause(key);
        assert!(!f.manager.channel(key).unwrap().is_playing());
        f.manager.unpause(key);
        assert!(f.manager.channel(key).unwrap().is_playing());

        f.manager.stop(key);
        assert!(f.manager.channel(key).unwrap().is_idle());

        // Unknown keys are ignored
        let stale = ChannelKey::new(99);
        f.manager.stop(stale);
        f.manager.pause(stale);
        f.manager.unpause(stale);
        f.manager.fade_out(stale, 1.0);
        assert_eq!(f.manager.pool_len(), 1);
    }

    #[test]
    fn test_stop_all_releases_everything() {
        let mut f = fixture(false);
        f.manager.play_local_looped(&clip("a", 1.0));
        f.manager.play_local_looped(&clip("b", 1.0));
        f.manager.stop_all();
        assert_eq!(f.manager.idle_count(), 2);
        assert!(f.manager.channels().all(|c| !c.is_looping()));
    }

    #[test]
    fn test_fade_in_scenario() {
        let mut f = fixture(true);
        let key = f.manager.fade_in(&clip("x", 10.0), 2.0, 0.8, false).unwrap();
        assert_eq!(f.manager.channel(key).unwrap().volume(), 0.0);

        f.manager.tick(1.0);
        assert_relative_eq!(f.manager.channel(key).unwrap().volume(), 0.4);

        f.manager.tick(1.5);
        let channel = f.manager.channel(key).unwrap();
        assert_relative_eq!(channel.volume(), 0.8);
        assert_eq!(channel.fade_state(), FadeState::None);
    }

    #[test]
    fn test_local_fade_variants() {
        let mut f = fixture(false);
        let key = f
            .manager
            .local_fade_in(&clip("x", 10.0), 1.0, 1.0, true)
            .unwrap();
        f.manager.tick(1.0);

        // The remote variant is rejected while local is active
        f.manager.fade_out(key, 1.0);
        assert_eq!(f.manager.channel(key).unwrap().fade_state(), FadeState::None);

        f.manager.local_fade_out(key, 1.0);
        assert_eq!(
            f.manager.channel(key).unwrap().fade_state(),
            FadeState::FadingOut
        );
        f.manager.tick(1.0);
        assert!(f.manager.channel(key).unwrap().is_idle());
    }

    #[test]
    fn test_cross_fade_swaps_channels() {
        let mut f = fixture(true);
        f.manager.set_sfx_volume(0.5);
        let old = f.manager.play_remote_looped(&clip("a", 10.0)).unwrap();
        let new = f
            .manager
            .cross_fade(old, &clip("b", 10.0), CrossfadeOptions::default().with_duration(2.0))
            .unwrap();
        assert_ne!(old, new);
        assert_eq!(f.manager.channel(old).unwrap().fade_state(), FadeState::FadingOut);
        assert_eq!(f.manager.channel(new).unwrap().fade_state(), FadeState::FadingIn);
        assert_eq!(f.manager.channel(new).unwrap().envelope().target(), 0.5);

        f.manager.tick(1.0);
        assert_relative_eq!(f.manager.channel(old).unwrap().volume(), 0.25);
        assert_relative_eq!(f.manager.channel(new).unwrap().volume(), 0.25);

        f.manager.tick(1.0);
        assert!(f.manager.channel(old).unwrap().is_idle());
        assert_relative_eq!(f.manager.channel(new).unwrap().volume(), 0.5);
    }

    #[test]
    fn test_completion_callback_fires_after_clip_length() {
        let mut f = fixture(true);
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        f.manager
            .play_remote_then(&clip("fanfare", 2.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();

        f.clock.advance_secs(1.0);
        f.manager.tick(1.0);
        assert!(!done.load(Ordering::SeqCst));

        f.clock.advance_secs(1.5);
        f.manager.tick(1.5);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_completion_callback_can_be_canceled() {
        let mut f = fixture(true);
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);
        let key = f
            .manager
            .play_remote_then(&clip("fanfare", 1.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();

        assert!(f.manager.cancel_completion(key));
        f.clock.advance_secs(5.0);
        f.manager.tick(5.0);
        assert!(!done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_completion_callbacks_survive_channel_reuse() {
        let mut f = fixture(true);
        let first_done = Arc::new(AtomicBool::new(false));
        let second_done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&first_done);
        let first = f
            .manager
            .play_remote_then(&clip("a", 1.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();
        f.backend.advance(1.0);

        let flag = Arc::clone(&second_done);
        let second = f
            .manager
            .play_remote_then(&clip("b", 1.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();
        assert_eq!(first, second);

        for _ in 0..4 {
            f.clock.advance_secs(1.0);
            f.manager.tick(1.0);
        }
        assert!(first_done.load(Ordering::SeqCst));
        assert!(second_done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_completion_only_drops_latest_play() {
        let mut f = fixture(true);
        let first_done = Arc::new(AtomicBool::new(false));
        let second_done = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&first_done);
        f.manager
            .play_remote_then(&clip("a", 1.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();
        f.backend.advance(1.0);

        let flag = Arc::clone(&second_done);
        let key = f
            .manager
            .play_remote_then(&clip("b", 2.0), move || flag.store(true, Ordering::SeqCst))
            .unwrap();
        assert!(f.manager.cancel_completion(key));
        assert!(!f.manager.cancel_completion(key));

        f.clock.advance_secs(3.0);
        f.manager.tick(3.0);
        assert!(first_done.load(Ordering::SeqCst));
        assert!(!second_done.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_completion_after_it_fired() {
        let mut f = fixture(true);
        let key = f.manager.play_remote_then(&clip("a", 0.5), || {}).unwrap();
        f.clock.advance_secs(1.0);
        f.manager.tick(1.0);
        assert!(!f.manager.cancel_completion(key));
    }

    #[test]
    fn test_one_shot_retags_finished_bgm_channel() {
        let mut f = fixture(true);
        let jingle = clip("jingle", 1.0);
        let bgm = f
            .manager
            .crossfade_bgm(&jingle, CrossfadeOptions::default())
            .unwrap();
        f.backend.advance(1.5);
        f.manager.tick(1.5);
        assert!(f.manager.channel(bgm).unwrap().is_idle());
        assert!(f.manager.channel(bgm).unwrap().is_bgm());

        f.manager.play_remote_one_shot(&clip("coin", 5.0), None);
        let channel = f.manager.channel(bgm).unwrap();
        assert!(channel.is_playing());
        assert_eq!(channel.category(), AudioCategory::Sfx);
        let volume = channel.volume();

        f.manager.set_bgm_volume(0.2);
        assert_eq!(f.manager.channel(bgm).unwrap().volume(), volume);

        let theme = f
            .manager
            .crossfade_bgm(&clip("theme", 30.0), CrossfadeOptions::default())
            .unwrap();
        assert_ne!(theme, bgm);
        assert_eq!(f.manager.channel(bgm).unwrap().fade_state(), FadeState::None);
    }

    #[test]
    fn test_remove_idle_channels() {
        let mut f = fixture(false);
        f.manager.play_local(&clip("a", 0.1));
        f.manager.play_local(&clip("b", 0.1));
        f.manager.play_local_looped(&clip("c", 1.0));
        f.backend.advance(0.5);

        assert_eq!(f.manager.remove_idle_channels(), 2);
        assert_eq!(f.manager.pool_len(), 1);
        assert_eq!(f.backend.live_handles(), 1);
    }

    #[test]
    fn test_reset_restarts_ids() {
        let mut f = fixture(false);
        f.manager.play_local_looped(&clip("a", 1.0));
        f.manager.play_local_looped(&clip("b", 1.0));
        f.manager.reset();

        assert_eq!(f.manager.pool_len(), 1);
        let key = f.manager.play_local(&clip("c", 1.0)).unwrap();
        assert_eq!(key.raw(), 0);
    }

    #[test]
    fn test_negative_tick_is_ignored() {
        let mut f = fixture(true);
        let key = f.manager.fade_in(&clip("x", 10.0), 1.0, 1.0, false).unwrap();
        f.manager.tick(-5.0);
        f.manager.tick(f32::NAN);
        assert_eq!(f.manager.channel(key).unwrap().envelope().elapsed(), 0.0);
    }
}
