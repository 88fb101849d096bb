/// Channel pool
///
/// Owns every channel and the backend that creates their handles. Channels
/// live in an arena in creation order and are addressed by a stable
/// [`ChannelKey`]; idle slots are reused before new ones are allocated.
use super::backend::AudioBackend;
use super::channel::{Channel, ChannelKey};
use super::effects::{FadeState, FadeStep};

/// What one fade pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeReport {
    /// Channels still ramping
    pub ramping: usize,
    /// Fades that completed and now hold their target
    pub finished: usize,
    /// Channels recycled by a completed fade-out
    pub recycled: usize,
}

/// Pool of reusable playback channels
pub struct ChannelPool {
    channels: Vec<Channel>,
    next_id: u32,
    backend: Box<dyn AudioBackend>,
}

impl ChannelPool {
    /// Create an empty pool; call [`ChannelPool::reset`] before use
    pub fn new(backend: Box<dyn AudioBackend>) -> Self {
        Self {
            channels: Vec::new(),
            next_id: 0,
            backend,
        }
    }

    /// Return the first idle channel, allocating a new one if none is idle
    pub fn acquire_idle(&mut self) -> (ChannelKey, &mut Channel) {
        let index = match self.channels.iter().position(Channel::is_idle) {
            Some(index) => index,
            None => self.allocate(),
        };
        let channel = &mut self.channels[index];
        (channel.id(), channel)
    }

    fn allocate(&mut self) -> usize {
        let key = ChannelKey::new(self.next_id);
        self.next_id += 1;

        let handle = self.backend.create_handle();
        self.channels.push(Channel::new(key, handle));
        tracing::debug!(
            "Allocated channel {} on {} backend ({} total)",
            key,
            self.backend.name(),
            self.channels.len()
        );
        self.channels.len() - 1
    }

    /// Stop the channel and return it to the idle defaults
    pub fn release(&mut self, key: ChannelKey, sfx_volume: f32) {
        if let Some(channel) = self.get_mut(key) {
            channel.make_idle(sfx_volume);
        }
    }

    /// Release every channel
    pub fn release_all(&mut self, sfx_volume: f32) {
        for channel in &mut self.channels {
            channel.make_idle(sfx_volume);
        }
    }

    /// Destroy every channel, restart ids at zero and allocate one idle channel
    pub fn reset(&mut self) {
        let dropped = self.channels.len();
        self.channels.clear();
        self.next_id = 0;
        self.allocate();
        tracing::debug!("Channel pool reset ({} channels destroyed)", dropped);
    }

    /// Destroy idle, non-fading channels, always keeping at least one channel
    pub fn remove_idle(&mut self) -> usize {
        let before = self.channels.len();
        let mut kept_spare = false;
        let mut busy = self
            .channels
            .iter()
            .filter(|c| !Self::is_removable(c))
            .count();

        self.channels.retain(|channel| {
            if !Self::is_removable(channel) {
                return true;
            }
            if busy == 0 && !kept_spare {
                kept_spare = true;
                busy += 1;
                return true;
            }
            false
        });

        let removed = before - self.channels.len();
        if removed > 0 {
            tracing::debug!(
                "Removed {} idle channels ({} remaining)",
                removed,
                self.channels.len()
            );
        }
        removed
    }

    fn is_removable(channel: &Channel) -> bool {
        channel.is_idle() && channel.fade_state() == FadeState::None
    }

    /// Advance every fading channel by `dt`, recycling finished fade-outs
    pub fn advance_fades(&mut self, dt: f32, sfx_volume: f32) -> FadeReport {
        let mut report = FadeReport::default();
        for channel in &mut self.channels {
            match channel.advance_fade(dt) {
                FadeStep::Steady => {}
                FadeStep::Ramp(_) => report.ramping += 1,
                FadeStep::Finished(volume) => {
                    report.finished += 1;
                    tracing::debug!("Fade on channel {} finished at {:.2}", channel.id(), volume);
                }
                FadeStep::Recycle => {
                    report.recycled += 1;
                    channel.make_idle(sfx_volume);
                    tracing::debug!("Channel {} faded out and went idle", channel.id());
                }
            }
        }
        report
    }

    pub fn get(&self, key: ChannelKey) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id() == key)
    }

    pub fn get_mut(&mut self, key: ChannelKey) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id() == key)
    }

    pub fn contains(&self, key: ChannelKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Channel> {
        self.channels.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of channels currently idle
    pub fn idle_count(&self) -> usize {
        self.channels.iter().filter(|c| c.is_idle()).count()
    }

    /// Id the next allocated channel will receive
    pub fn next_id(&self) -> u32 {
        self.next_id
    }
}
