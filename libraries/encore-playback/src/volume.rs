//! Volume control
//!
//! Level is 0-100 as shown on the slider. Mute is a separate flag so the
//! stored level survives mute/unmute cycles.

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0-100, clamped)
    pub fn new(level: u8) -> Self {
        let level = level.min(100);
        Self {
            level,
            muted: level == 0,
        }
    }

    /// Slider level from an untyped number
    ///
    /// Rounds and clamps to 0-100; NaN maps to 0.
    pub fn clamp_level(raw: f64) -> u8 {
        if raw.is_nan() {
            return 0;
        }
        raw.round().clamp(0.0, 100.0) as u8
    }

    /// Set volume level (0-100)
    ///
    /// Zero mutes. Any audible level while muted unmutes.
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
        self.muted = self.level == 0;
    }

    /// Get stored volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    /// Unmute audio (restores previous volume)
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level the backend should output
    ///
    /// Returns 0 if muted, otherwise the stored level
    pub fn effective_level(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(50)
    }
}
