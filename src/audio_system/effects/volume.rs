/// Volume levels
///
/// A volume clamped to 0.0-1.0 on every write.

/// Clamped volume level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeLevel {
    level: f32,
}

impl VolumeLevel {
    /// Create a new level, clamping out-of-range values
    pub fn new(level: f32) -> Self {
        Self {
            level: clamp_volume(level),
        }
    }

    /// Get the volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Set the volume level, returning the clamped value
    pub fn set_level(&mut self, level: f32) -> f32 {
        self.level = clamp_volume(level);
        self.level
    }

    /// Scale a logical volume by this level
    pub fn scale(&self, logical: f32) -> f32 {
        logical * self.level
    }
}

impl Default for VolumeLevel {
    fn default() -> Self {
        Self { level: 1.0 }
    }
}

/// Clamp to 0.0-1.0; NaN counts as silence
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
