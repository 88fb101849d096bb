/// Headless backend
///
/// Renders nothing, but keeps the full transport state of every handle so
/// tests and tools can drive the pool without an audio device. Time only
/// moves when [`HeadlessBackend::advance`] is called.
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{AudioBackend, AudioHandle};
use crate::audio_system::clip::AudioClip;

/// A one-shot that was started on some handle
#[derive(Debug, Clone, PartialEq)]
pub struct OneShotRecord {
    pub clip: String,
    pub volume: f32,
}

#[derive(Debug)]
struct HandleState {
    clip: Option<AudioClip>,
    playing: bool,
    paused: bool,
    pending_start: bool,
    delay_remaining: f32,
    position: f32,
    volume: f32,
    looping: bool,
    /// Remaining seconds of each one-shot still sounding
    one_shots: Vec<f32>,
    history: Vec<OneShotRecord>,
}

impl HandleState {
    fn new() -> Self {
        Self {
            clip: None,
            playing: false,
            paused: false,
            pending_start: false,
            delay_remaining: 0.0,
            position: 0.0,
            volume: 1.0,
            looping: false,
            one_shots: Vec::new(),
            history: Vec::new(),
        }
    }

    fn clip_length(&self) -> f32 {
        self.clip.as_ref().map(|c| c.length_secs()).unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        if self.paused {
            return false;
        }
        self.playing || self.pending_start || !self.one_shots.is_empty()
    }

    fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }

        self.one_shots.retain_mut(|remaining| {
            *remaining -= dt;
            *remaining > 0.0
        });

        if self.pending_start {
            self.delay_remaining -= dt;
            if self.delay_remaining > 0.0 {
                return;
            }
            // Carry the overshoot into the clip
            self.position = -self.delay_remaining;
            self.delay_remaining = 0.0;
            self.pending_start = false;
            self.playing = true;
        } else if self.playing {
            self.position += dt;
        } else {
            return;
        }

        // Zero-length clips have unknown length and play until stopped
        let length = self.clip_length();
        if length > 0.0 && self.position >= length {
            if self.looping {
                self.position %= length;
            } else {
                self.playing = false;
                self.position = 0.0;
            }
        }
    }
}

/// Backend whose handles only record what they were asked to do
#[derive(Clone, Default)]
pub struct HeadlessBackend {
    handles: Arc<Mutex<Vec<Weak<Mutex<HandleState>>>>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every live handle forward by `dt` seconds
    pub fn advance(&self, dt: f32) {
        for state in self.live_states() {
            state.lock().advance(dt);
        }
    }

    /// Number of handles that have been created and not yet dropped
    pub fn live_handles(&self) -> usize {
        self.live_states().len()
    }

    /// Number of live handles currently playing
    pub fn playing_handles(&self) -> usize {
        self.live_states()
            .iter()
            .filter(|s| s.lock().is_playing())
            .count()
    }

    /// Every one-shot started on a live handle, oldest first per handle
    pub fn one_shots(&self) -> Vec<OneShotRecord> {
        self.live_states()
            .iter()
            .flat_map(|s| s.lock().history.clone())
            .collect()
    }

    fn live_states(&self) -> Vec<Arc<Mutex<HandleState>>> {
        let mut handles = self.handles.lock();
        handles.retain(|weak| weak.strong_count() > 0);
        handles.iter().filter_map(Weak::upgrade).collect()
    }
}

impl AudioBackend for HeadlessBackend {
    fn create_handle(&mut self) -> Box<dyn AudioHandle> {
        let state = Arc::new(Mutex::new(HandleState::new()));
        self.handles.lock().push(Arc::downgrade(&state));
        Box::new(HeadlessHandle { state })
    }

    fn name(&self) -> &'static str {
        "headless"
    }
}

/// Handle created by [`HeadlessBackend`]
pub struct HeadlessHandle {
    state: Arc<Mutex<HandleState>>,
}

impl AudioHandle for HeadlessHandle {
    fn set_clip(&mut self, clip: &AudioClip) {
        self.state.lock().clip = Some(clip.clone());
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        state.playing = state.clip.is_some();
        state.paused = false;
        state.pending_start = false;
        state.position = 0.0;
    }

    fn play_delayed(&mut self, delay: f32) {
        let mut state = self.state.lock();
        if state.clip.is_none() {
            return;
        }
        state.playing = false;
        state.paused = false;
        state.pending_start = true;
        state.delay_remaining = delay.max(0.0);
        state.position = 0.0;
    }

    fn play_one_shot(&mut self, clip: &AudioClip, volume: f32) {
        let mut state = self.state.lock();
        state.one_shots.push(clip.length_secs());
        state.history.push(OneShotRecord {
            clip: clip.name().to_string(),
            volume,
        });
    }

    fn pause(&mut self) {
        self.state.lock().paused = true;
    }

    fn unpause(&mut self) {
        self.state.lock().paused = false;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.playing = false;
        state.paused = false;
        state.pending_start = false;
        state.position = 0.0;
        state.one_shots.clear();
    }

    fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.lock().volume = volume.clamp(0.0, 1.0);
    }

    fn is_looping(&self) -> bool {
        self.state.lock().looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.state.lock().looping = looping;
    }

    fn is_playing(&self) -> bool {
        self.state.lock().is_playing()
    }
}
