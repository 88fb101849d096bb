/// Fade envelopes
///
/// A linear volume ramp between a start and a target value, advanced by the
/// frame delta. Fades are not stackable: starting one replaces whatever
/// envelope the channel had.

/// Direction of an active fade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeState {
    /// Volume is steady
    #[default]
    None,

    /// Ramping towards the target, then holding it
    FadingIn,

    /// Ramping towards the target, then holding it or going idle
    FadingOut,
}

/// Result of advancing an envelope by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadeStep {
    /// No fade in progress, volume untouched
    Steady,

    /// Fade still running, apply this volume
    Ramp(f32),

    /// Fade completed this tick, volume pinned at the target
    Finished(f32),

    /// Fade-out completed and the channel should be recycled
    Recycle,
}

/// Fade timer and interpolation endpoints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEnvelope {
    state: FadeState,
    elapsed: f32,
    duration: f32,
    start: f32,
    target: f32,
    idle_on_complete: bool,
}

impl FadeEnvelope {
    /// Envelope holding `volume` with no fade in progress
    pub fn steady(volume: f32) -> Self {
        Self {
            state: FadeState::None,
            elapsed: 0.0,
            duration: 0.0,
            start: volume,
            target: volume,
            idle_on_complete: false,
        }
    }

    /// Fade from `current` up (or down) to `target` and hold it
    pub fn fade_in(current: f32, target: f32, duration: f32) -> Self {
        Self {
            state: FadeState::FadingIn,
            elapsed: 0.0,
            duration,
            start: current,
            target,
            idle_on_complete: false,
        }
    }

    /// Fade from `current` to `target`; on completion either recycle the
    /// channel or hold the target
    pub fn fade_out(current: f32, target: f32, duration: f32, idle_on_complete: bool) -> Self {
        Self {
            state: FadeState::FadingOut,
            elapsed: 0.0,
            duration,
            start: current,
            target,
            idle_on_complete,
        }
    }

    pub fn state(&self) -> FadeState {
        self.state
    }

    pub fn is_fading(&self) -> bool {
        self.state != FadeState::None
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn idle_on_complete(&self) -> bool {
        self.idle_on_complete
    }

    /// Move the endpoint a fade-in is approaching
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Move the endpoint a fade-out is leaving from
    pub fn set_start(&mut self, start: f32) {
        self.start = start;
    }

    /// Stop fading and hold `volume`
    pub fn settle(&mut self, volume: f32) {
        *self = Self::steady(volume);
    }

    /// Interpolated volume at `t` seconds into the fade
    pub fn volume_at(&self, t: f32) -> f32 {
        let ratio = if self.duration > 0.0 {
            (t / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        ratio * self.target + (1.0 - ratio) * self.start
    }

    /// Accumulate `dt`, then either complete or interpolate
    pub fn advance(&mut self, dt: f32) -> FadeStep {
        if self.state == FadeState::None {
            return FadeStep::Steady;
        }

        self.elapsed += dt;
        if self.elapsed < self.duration {
            return FadeStep::Ramp(self.volume_at(self.elapsed));
        }

        let target = self.target;
        let recycle = self.state == FadeState::FadingOut && self.idle_on_complete;
        self.settle(target);

        if recycle {
            FadeStep::Recycle
        } else {
            FadeStep::Finished(target)
        }
    }
}

impl Default for FadeEnvelope {
    fn default() -> Self {
        Self::steady(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_steady_envelope_does_nothing() {
        let mut envelope = FadeEnvelope::steady(0.6);
        assert_eq!(envelope.advance(1.0), FadeStep::Steady);
        assert_eq!(envelope.start(), 0.6);
        assert_eq!(envelope.target(), 0.6);
        assert_eq!(envelope.elapsed(), 0.0);
    }

    #[test]
    fn test_fade_in_is_linear() {
        let mut envelope = FadeEnvelope::fade_in(0.0, 0.8, 2.0);
        match envelope.advance(1.0) {
            FadeStep::Ramp(volume) => assert_relative_eq!(volume, 0.4),
            other => panic!("expected a ramp, got {:?}", other),
        }
        assert_eq!(envelope.state(), FadeState::FadingIn);

        assert_eq!(envelope.advance(1.5), FadeStep::Finished(0.8));
        assert_eq!(envelope.state(), FadeState::None);
        assert_eq!(envelope.start(), 0.8);
        assert_eq!(envelope.target(), 0.8);
    }

    #[test]
    fn test_fade_completes_on_exact_duration() {
        let mut envelope = FadeEnvelope::fade_in(0.2, 1.0, 0.5);
        match envelope.advance(0.25) {
            FadeStep::Ramp(volume) => assert_relative_eq!(volume, 0.6),
            other => panic!("expected a ramp, got {:?}", other),
        }
        assert_eq!(envelope.advance(0.25), FadeStep::Finished(1.0));
    }

    #[test]
    fn test_fade_reaches_target_with_fine_ticks() {
        let mut envelope = FadeEnvelope::fade_in(0.1, 0.9, 1.0);
        let mut last = FadeStep::Steady;
        for _ in 0..70 {
            last = envelope.advance(1.0 / 60.0);
        }
        assert_eq!(last, FadeStep::Steady);
        assert!(!envelope.is_fading());
        assert_eq!(envelope.target(), 0.9);
    }

    #[test]
    fn test_fade_out_recycles_when_requested() {
        let mut envelope = FadeEnvelope::fade_out(1.0, 0.0, 1.0, true);
        assert_eq!(envelope.advance(0.5), FadeStep::Ramp(0.5));
        assert_eq!(envelope.advance(0.6), FadeStep::Recycle);
        assert!(!envelope.is_fading());
    }

    #[test]
    fn test_fade_out_holds_target_when_not_recycling() {
        let mut envelope = FadeEnvelope::fade_out(1.0, 0.3, 1.0, false);
        assert_eq!(envelope.advance(2.0), FadeStep::Finished(0.3));
        assert_eq!(envelope.state(), FadeState::None);
    }

    #[test]
    fn test_zero_duration_completes_on_first_tick() {
        let mut envelope = FadeEnvelope::fade_in(0.0, 0.7, 0.0);
        assert_eq!(envelope.advance(0.0), FadeStep::Finished(0.7));
    }

    #[test]
    fn test_interpolation_ratio_is_clamped() {
        let envelope = FadeEnvelope::fade_in(0.0, 0.5, 1.0);
        assert_eq!(envelope.volume_at(3.0), 0.5);
        assert_eq!(envelope.volume_at(-1.0), 0.0);
    }

    #[test]
    fn test_moving_endpoints_mid_fade() {
        let mut envelope = FadeEnvelope::fade_in(0.0, 1.0, 2.0);
        envelope.advance(1.0);
        envelope.set_target(0.5);
        match envelope.advance(0.5) {
            FadeStep::Ramp(volume) => assert_relative_eq!(volume, 0.375),
            other => panic!("expected a ramp, got {:?}", other),
        }
    }
}
