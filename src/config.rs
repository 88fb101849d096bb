use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio_system::clip::AudioClip;
use crate::error::ConfigError;
use crate::scheduler::duration_from_secs;
use crate::settings::JsonSettingsStore;

const APP_DIR: &str = "SoundPool";

fn default_volume() -> f32 {
    1.0
}

fn default_crossfade_secs() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgmClipEntry {
    /// Catalog name used by `play_bgm`/`crossfade_bgm`
    pub name: String,

    /// File path, relative paths resolve against the config directory
    pub path: String,

    /// Length override for formats the decoder cannot measure
    #[serde(default)]
    pub length_secs: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Clips loaded into the BGM catalog
    #[serde(default)]
    pub bgm_clips: Vec<BgmClipEntry>,

    /// SFX volume used until the settings store has one
    #[serde(default = "default_volume")]
    pub default_sfx_volume: f32,

    /// BGM volume used until the settings store has one
    #[serde(default = "default_volume")]
    pub default_bgm_volume: f32,

    /// Fade time for BGM transitions
    #[serde(default = "default_crossfade_secs")]
    pub crossfade_secs: f32,

    /// Where volume settings are persisted; the user config dir when unset
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bgm_clips: Vec::new(),
            default_sfx_volume: default_volume(),
            default_bgm_volume: default_volume(),
            crossfade_secs: default_crossfade_secs(),
            settings_path: None,
        }
    }
}

impl AudioConfig {
    /// Load configuration from `path`.
    /// Creates default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
            let config: AudioConfig =
                serde_json::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?;
            config.validate()?;

            tracing::info!("Loaded config from: {}", path.display());
            Ok(config)
        } else {
            let config = AudioConfig::default();
            config.save(path)?;
            tracing::info!("Created default config at: {}", path.display());
            Ok(config)
        }
    }

    /// Save configuration to `path`
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::DirectoryCreationFailed {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let save_failed = |source: Box<dyn std::error::Error + Send + Sync>| {
            ConfigError::SaveFailed {
                path: path.display().to_string(),
                source,
            }
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| save_failed(Box::new(e)))?;
        fs::write(path, json).map_err(|e| save_failed(Box::new(e)))?;

        Ok(())
    }

    /// Default config file in the user config directory
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, volume) in [
            ("default_sfx_volume", self.default_sfx_volume),
            ("default_bgm_volume", self.default_bgm_volume),
        ] {
            if !(0.0..=1.0).contains(&volume) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 0.0..=1.0, got {}",
                    label, volume
                )));
            }
        }

        if self.crossfade_secs.is_nan() || self.crossfade_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "crossfade_secs must not be negative, got {}",
                self.crossfade_secs
            )));
        }

        for entry in &self.bgm_clips {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "bgm clip {} has no name",
                    entry.path
                )));
            }
        }
        Ok(())
    }

    /// Load every configured BGM clip, resolving relative paths against
    /// `base_dir`. Unreadable clips are logged and skipped.
    pub fn load_bgm_clips(&self, base_dir: &Path) -> Vec<AudioClip> {
        self.bgm_clips
            .iter()
            .filter_map(|entry| {
                let path = base_dir.join(&entry.path);
                match AudioClip::load_named(entry.name.as_str(), &path) {
                    Ok(clip) => Some(match entry.length_secs {
                        Some(secs) => clip.with_length(duration_from_secs(secs)),
                        None => clip,
                    }),
                    Err(e) => {
                        tracing::warn!("Skipping BGM clip '{}': {}", entry.name, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Settings file: the configured override or the default location
    pub fn settings_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.settings_path {
            Some(path) => Ok(path.clone()),
            None => JsonSettingsStore::default_path(),
        }
    }
}
