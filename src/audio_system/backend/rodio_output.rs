/// Rodio backend
///
/// One output stream shared by every handle, one `Sink` per handle. One-shots
/// get their own short-lived sinks so they overlay the main clip instead of
/// queueing behind it.
use std::io::Cursor;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioBackend, AudioHandle};
use crate::audio_system::clip::AudioClip;
use crate::error::AudioError;
use crate::scheduler::duration_from_secs;

type BoxedSource = Box<dyn Source<Item = i16> + Send>;

/// Backend rendering through the default output device
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
}

impl RodioBackend {
    /// Open the default output device
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;
        tracing::info!("Opened default audio output stream");

        Ok(Self {
            _stream: stream,
            stream_handle,
        })
    }
}

impl AudioBackend for RodioBackend {
    fn create_handle(&mut self) -> Box<dyn AudioHandle> {
        Box::new(RodioHandle::new(self.stream_handle.clone()))
    }

    fn name(&self) -> &'static str {
        "rodio"
    }
}

/// Handle created by [`RodioBackend`]
pub struct RodioHandle {
    stream_handle: OutputStreamHandle,
    sink: Sink,
    /// Set when the sink could not be attached to the output stream
    detached: bool,
    one_shots: Vec<Sink>,
    clip: Option<AudioClip>,
    volume: f32,
    looping: bool,
}

impl RodioHandle {
    fn new(stream_handle: OutputStreamHandle) -> Self {
        let (sink, detached) = open_sink(&stream_handle);
        Self {
            stream_handle,
            sink,
            detached,
            one_shots: Vec::new(),
            clip: None,
            volume: 1.0,
            looping: false,
        }
    }

    /// Drop whatever is queued and start over with a fresh sink
    fn restart_sink(&mut self) {
        self.sink.stop();
        let (sink, detached) = open_sink(&self.stream_handle);
        self.sink = sink;
        self.detached = detached;
    }

    fn start(&mut self, delay: Option<Duration>) {
        self.restart_sink();

        let Some(clip) = &self.clip else {
            return;
        };
        let decoder = match decode(clip) {
            Ok(decoder) => decoder,
            Err(err) => {
                tracing::warn!("Cannot play {}: {}", clip.name(), err);
                return;
            }
        };

        let mut source: BoxedSource = if self.looping {
            Box::new(decoder.buffered().repeat_infinite())
        } else {
            Box::new(decoder)
        };
        if let Some(delay) = delay {
            source = Box::new(source.delay(delay));
        }

        self.sink.append(source);
        self.sink.set_volume(self.volume);
        self.sink.play();
    }
}

impl AudioHandle for RodioHandle {
    fn set_clip(&mut self, clip: &AudioClip) {
        self.clip = Some(clip.clone());
    }

    fn play(&mut self) {
        self.start(None);
    }

    fn play_delayed(&mut self, delay: f32) {
        self.start(Some(duration_from_secs(delay)));
    }

    fn play_one_shot(&mut self, clip: &AudioClip, volume: f32) {
        self.one_shots.retain(|sink| !sink.empty());

        let decoder = match decode(clip) {
            Ok(decoder) => decoder,
            Err(err) => {
                tracing::warn!("Cannot play one-shot {}: {}", clip.name(), err);
                return;
            }
        };
        let (sink, detached) = open_sink(&self.stream_handle);
        if detached {
            return;
        }
        sink.set_volume(self.volume);
        sink.append(decoder.amplify(volume.max(0.0)));
        sink.play();
        self.one_shots.push(sink);
    }

    fn pause(&mut self) {
        self.sink.pause();
        for sink in &self.one_shots {
            sink.pause();
        }
    }

    fn unpause(&mut self) {
        self.sink.play();
        for sink in &self.one_shots {
            sink.play();
        }
    }

    fn stop(&mut self) {
        self.restart_sink();
        // Dropping a sink stops it
        self.one_shots.clear();
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    fn is_playing(&self) -> bool {
        if self.detached {
            return false;
        }
        let main = !self.sink.empty() && !self.sink.is_paused();
        main || self
            .one_shots
            .iter()
            .any(|sink| !sink.empty() && !sink.is_paused())
    }
}

fn open_sink(stream_handle: &OutputStreamHandle) -> (Sink, bool) {
    match Sink::try_new(stream_handle) {
        Ok(sink) => (sink, false),
        Err(err) => {
            tracing::warn!("Failed to attach sink to output stream: {}", err);
            let (sink, _queue) = Sink::new_idle();
            (sink, true)
        }
    }
}

fn decode(clip: &AudioClip) -> Result<Decoder<Cursor<Vec<u8>>>, AudioError> {
    // rodio's Decoder requires owned data with 'static lifetime
    let cursor = Cursor::new((**clip.data()).clone());
    Decoder::new(cursor).map_err(|e| AudioError::DecodeFailed(e.to_string()))
}
