/// Category master volumes
///
/// Holds the SFX and BGM master volumes, persists them on every change and
/// pushes them into live channels.
use super::category::AudioCategory;
use super::effects::VolumeLevel;
use super::pool::ChannelPool;
use crate::settings::SettingsStore;

/// SFX and BGM master volumes backed by a settings store
pub struct CategoryVolumes {
    sfx: VolumeLevel,
    bgm: VolumeLevel,
    store: Box<dyn SettingsStore>,
}

impl CategoryVolumes {
    /// Read both volumes from `store`, falling back to the given defaults
    pub fn load(store: Box<dyn SettingsStore>, default_sfx: f32, default_bgm: f32) -> Self {
        let sfx = store
            .get_float(AudioCategory::Sfx.settings_key())
            .unwrap_or(default_sfx);
        let bgm = store
            .get_float(AudioCategory::Bgm.settings_key())
            .unwrap_or(default_bgm);

        let volumes = Self {
            sfx: VolumeLevel::new(sfx),
            bgm: VolumeLevel::new(bgm),
            store,
        };
        tracing::info!(
            "Volume settings loaded: sfx={:.2}, bgm={:.2}",
            volumes.sfx.level(),
            volumes.bgm.level()
        );
        volumes
    }

    pub fn get(&self, category: AudioCategory) -> f32 {
        self.level(category).level()
    }

    fn level(&self, category: AudioCategory) -> &VolumeLevel {
        match category {
            AudioCategory::Sfx => &self.sfx,
            AudioCategory::Bgm => &self.bgm,
        }
    }

    /// Clamp, store and persist a master volume; returns the stored value.
    /// Persistence failures are logged, never surfaced.
    pub fn set(&mut self, category: AudioCategory, value: f32) -> f32 {
        let level = match category {
            AudioCategory::Sfx => &mut self.sfx,
            AudioCategory::Bgm => &mut self.bgm,
        };
        let stored = level.set_level(value);

        self.store.set_float(category.settings_key(), stored);
        if let Err(e) = self.store.save() {
            tracing::warn!("Failed to persist {} volume: {}", category, e);
        }
        stored
    }

    /// Output volume a channel of `category` should have at logical
    /// volume `play_volume`
    pub fn output_for(&self, category: AudioCategory, play_volume: f32) -> f32 {
        match category {
            AudioCategory::Sfx => self.sfx.level(),
            AudioCategory::Bgm => self.bgm.scale(play_volume),
        }
    }

    /// Push the current master volume of `category` into every channel of
    /// that category
    pub fn apply(&self, category: AudioCategory, pool: &mut ChannelPool) {
        let mut touched = 0;
        for channel in pool.iter_mut().filter(|c| c.category() == category) {
            let value = self.output_for(category, channel.play_volume());
            channel.apply_master(value);
            touched += 1;
        }
        tracing::debug!(
            "Applied {} volume {:.2} to {} channels",
            category,
            self.get(category),
            touched
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::backend::HeadlessBackend;
    use crate::audio_system::clip::AudioClip;
    use crate::audio_system::effects::FadeState;
    use crate::error::ConfigError;
    use crate::settings::MemorySettingsStore;
    use std::time::Duration;

    struct FailingStore;

    impl SettingsStore for FailingStore {
        fn get_float(&self, _key: &str) -> Option<f32> {
            None
        }

        fn set_float(&mut self, _key: &str, _value: f32) {}

        fn save(&mut self) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid("read-only".to_string()))
        }
    }

    fn pool() -> ChannelPool {
        let mut pool = ChannelPool::new(Box::new(HeadlessBackend::new()));
        pool.reset();
        pool
    }

    #[test]
    fn test_load_uses_stored_values_and_defaults() {
        let store = MemorySettingsStore::new().with_value("SFXVolume", 0.3);
        let volumes = CategoryVolumes::load(Box::new(store), 1.0, 0.8);
        assert_eq!(volumes.get(AudioCategory::Sfx), 0.3);
        assert_eq!(volumes.get(AudioCategory::Bgm), 0.8);
    }

    #[test]
    fn test_load_clamps_stored_values() {
        let store = MemorySettingsStore::new().with_value("BGMVolume", 4.0);
        let volumes = CategoryVolumes::load(Box::new(store), 1.0, 1.0);
        assert_eq!(volumes.get(AudioCategory::Bgm), 1.0);
    }

    #[test]
    fn test_set_clamps_and_persists() {
        let store = MemorySettingsStore::new();
        let mut volumes = CategoryVolumes::load(Box::new(store.clone()), 1.0, 1.0);

        assert_eq!(volumes.set(AudioCategory::Sfx, -3.0), 0.0);
        assert_eq!(volumes.set(AudioCategory::Bgm, 0.6), 0.6);

        assert_eq!(store.get_float("SFXVolume"), Some(0.0));
        assert_eq!(store.get_float("BGMVolume"), Some(0.6));
        assert_eq!(store.saves(), 2);
    }

    #[test]
    fn test_failed_save_still_updates_volume() {
        let mut volumes = CategoryVolumes::load(Box::new(FailingStore), 1.0, 1.0);
        assert_eq!(volumes.set(AudioCategory::Sfx, 0.5), 0.5);
        assert_eq!(volumes.get(AudioCategory::Sfx), 0.5);
    }

    #[test]
    fn test_apply_scales_bgm_by_play_volume() {
        let mut pool = pool();
        let mut volumes =
            CategoryVolumes::load(Box::new(MemorySettingsStore::new()), 1.0, 1.0);
        let clip = AudioClip::silent("theme", Duration::from_secs(60));

        let (key, channel) = pool.acquire_idle();
        channel.prepare(AudioCategory::Bgm);
        channel.set_play_volume(0.5);
        channel.assign_clip(&clip);
        channel.play();

        volumes.set(AudioCategory::Bgm, 0.8);
        volumes.apply(AudioCategory::Bgm, &mut pool);
        assert_eq!(pool.get(key).unwrap().volume(), 0.4);
    }

    #[test]
    fn test_apply_leaves_other_category_alone() {
        let mut pool = pool();
        let mut volumes =
            CategoryVolumes::load(Box::new(MemorySettingsStore::new()), 1.0, 1.0);
        let (key, channel) = pool.acquire_idle();
        channel.set_volume(0.9);

        volumes.set(AudioCategory::Bgm, 0.2);
        volumes.apply(AudioCategory::Bgm, &mut pool);
        assert_eq!(pool.get(key).unwrap().volume(), 0.9);
    }

    #[test]
    fn test_apply_during_fade_in_moves_target() {
        let mut pool = pool();
        let mut volumes =
            CategoryVolumes::load(Box::new(MemorySettingsStore::new()), 1.0, 1.0);
        let (key, channel) = pool.acquire_idle();
        channel.set_volume(0.0);
        channel.begin_fade_in(1.0, 2.0);

        volumes.set(AudioCategory::Sfx, 0.6);
        volumes.apply(AudioCategory::Sfx, &mut pool);

        let channel = pool.get(key).unwrap();
        assert_eq!(channel.fade_state(), FadeState::FadingIn);
        assert_eq!(channel.envelope().target(), 0.6);
        assert_eq!(channel.volume(), 0.0);
    }
}
