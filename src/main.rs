use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use sound_pool::audio_system::{AudioBackend, AudioClip, AudioManager, HeadlessBackend};
use sound_pool::error::AppResult;
use sound_pool::{AudioConfig, BgmFadeOutOptions, CastState, CrossfadeOptions, JsonSettingsStore, ManualClock};

const TICKS_PER_SECOND: u32 = 60;
const SESSION_SECS: f32 = 10.0;

const LOG_FILE: &str = "sound-pool.log";

/// Session logs live next to the config, under `SoundPool/logs`
fn log_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("SoundPool").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn initialize_tracing(verbose: bool) {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let dir = log_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("Warning: cannot create {}: {}", dir.display(), e);
    }

    // RUST_LOG wins over --verbose
    let default_level = if verbose { "sound_pool=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(rolling::daily(&dir, LOG_FILE))
        .with_ansi(false)
        .with_line_number(true);

    // Console output in debug builds or when asked for
    let console_layer = (cfg!(debug_assertions) || verbose).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::info!("Writing logs to {}", dir.join(LOG_FILE).display());
}

struct Args {
    config_path: Option<PathBuf>,
    device: bool,
    verbose: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        config_path: None,
        device: false,
        verbose: false,
    };
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--device" => args.device = true,
            "--verbose" | "-v" => args.verbose = true,
            _ => args.config_path = Some(PathBuf::from(arg)),
        }
    }
    args
}

fn main() -> AppResult<()> {
    let args = parse_args();
    initialize_tracing(args.verbose);

    let config_path = match args.config_path {
        Some(path) => path,
        None => AudioConfig::default_path().context("Failed to resolve config path")?,
    };
    let config = AudioConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let mut clips = config.load_bgm_clips(base_dir);
    if clips.is_empty() {
        tracing::info!("No BGM clips configured, using silent placeholders");
        clips = vec![
            AudioClip::silent("theme", Duration::from_secs(30)),
            AudioClip::silent("battle", Duration::from_secs(30)),
        ];
    }

    if args.device {
        run_on_device(config, clips)
    } else {
        let backend = HeadlessBackend::new();
        let headless = backend.clone();
        run_session(backend, config, clips, false, move |dt| headless.advance(dt))
    }
}

#[cfg(feature = "playback")]
fn run_on_device(config: AudioConfig, clips: Vec<AudioClip>) -> AppResult<()> {
    let backend = sound_pool::audio_system::RodioBackend::new()
        .context("Failed to open the default audio device")?;
    run_session(backend, config, clips, true, |_| {})
}

#[cfg(not(feature = "playback"))]
fn run_on_device(_config: AudioConfig, _clips: Vec<AudioClip>) -> AppResult<()> {
    anyhow::bail!("--device needs a build with the `playback` feature")
}

/// Scripted BGM session driven at a fixed tick rate
fn run_session(
    backend: impl AudioBackend + 'static,
    config: AudioConfig,
    clips: Vec<AudioClip>,
    realtime: bool,
    mut advance_backend: impl FnMut(f32),
) -> AppResult<()> {
    let settings_path = config.settings_file().context("Failed to resolve settings path")?;
    let settings = JsonSettingsStore::open(&settings_path)
        .with_context(|| format!("Failed to open settings at {}", settings_path.display()))?;

    let names: Vec<String> = clips.iter().map(|c| c.name().to_string()).collect();
    let clock = ManualClock::new();
    let mut manager = AudioManager::builder(backend)
        .with_config(&config)
        .with_settings(settings)
        .with_route(CastState::new(true))
        .with_clock(clock.clone())
        .with_bgm_clips(clips)
        .build();

    let first = names.first().context("BGM catalog is empty")?;
    let second = names.get(1).unwrap_or(first);
    let sting = AudioClip::silent("sting", Duration::from_millis(1500));
    let fade = config.crossfade_secs;

    let dt = 1.0 / TICKS_PER_SECOND as f32;
    let frame = Duration::from_secs_f32(dt);
    let total_ticks = (SESSION_SECS * TICKS_PER_SECOND as f32) as u32;

    for tick in 0..total_ticks {
        let now = tick as f32 * dt;
        match tick {
            0 => {
                manager.play_bgm(first);
                log_channels(&manager, now);
            }
            t if t == TICKS_PER_SECOND * 2 => {
                manager.set_bgm_volume(0.5);
                log_channels(&manager, now);
            }
            t if t == TICKS_PER_SECOND * 4 => {
                manager.crossfade_bgm(second, CrossfadeOptions::default().with_duration(fade));
                manager.play_remote_then(&sting, || tracing::info!("Sting finished"));
                log_channels(&manager, now);
            }
            t if t == TICKS_PER_SECOND * 8 => {
                manager.fade_out_bgm(BgmFadeOutOptions::default().with_duration(fade));
                log_channels(&manager, now);
            }
            _ => {}
        }

        advance_backend(dt);
        clock.advance(frame);
        manager.tick(dt);
        if realtime {
            thread::sleep(frame);
        }
    }

    let removed = manager.remove_idle_channels();
    tracing::info!("Session finished, removed {} idle channels", removed);
    log_channels(&manager, SESSION_SECS);
    Ok(())
}

fn log_channels(manager: &AudioManager, now: f32) {
    tracing::info!(
        "t={:.2}s route={} sfx={:.2} bgm={:.2} channels={}",
        now,
        manager.active_route(),
        manager.sfx_volume(),
        manager.bgm_volume(),
        manager.pool_len()
    );
    for channel in manager.channels() {
        tracing::info!(
            "  {} {} {:?} clip={} volume={:.2} playing={}",
            channel.id(),
            channel.category(),
            channel.fade_state(),
            channel.clip().map(|c| c.name()).unwrap_or("-"),
            channel.volume(),
            channel.is_playing()
        );
    }
}
