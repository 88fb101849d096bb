/// Rendering backends
///
/// The pool never renders audio itself. Each channel owns one handle created
/// by an [`AudioBackend`]; dropping the handle releases the underlying
/// resource.
pub mod headless;
#[cfg(feature = "playback")]
pub mod rodio_output;

pub use headless::{HeadlessBackend, HeadlessHandle, OneShotRecord};
#[cfg(feature = "playback")]
pub use rodio_output::{RodioBackend, RodioHandle};

use super::clip::AudioClip;

/// One playback resource, exclusively owned by a channel
pub trait AudioHandle: Send {
    /// Assign the clip used by `play`/`play_delayed`
    fn set_clip(&mut self, clip: &AudioClip);

    /// Start the assigned clip from the beginning
    fn play(&mut self);

    /// Start the assigned clip after `delay` seconds
    fn play_delayed(&mut self, delay: f32);

    /// Play `clip` once on top of whatever this handle is doing
    fn play_one_shot(&mut self, clip: &AudioClip, volume: f32);

    fn pause(&mut self);

    fn unpause(&mut self);

    fn stop(&mut self);

    fn volume(&self) -> f32;

    /// Set the output volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    fn is_looping(&self) -> bool;

    fn set_looping(&mut self, looping: bool);

    /// Whether the handle is producing (or about to produce) sound
    fn is_playing(&self) -> bool;
}

/// Factory for playback resources
pub trait AudioBackend {
    /// Create a stopped handle at full volume
    fn create_handle(&mut self) -> Box<dyn AudioHandle>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
