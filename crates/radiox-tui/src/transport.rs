//! Per-station volume and mute.

/// Volume change per key press.
pub const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transport {
    volume: f32,
    muted: bool,
}

impl Transport {
    pub fn new(volume: f32) -> Self {
        let volume = volume.clamp(0.0, 1.0);
        Self {
            volume,
            muted: volume == 0.0,
        }
    }

    /// The volume the user set, kept across mute/unmute.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// What the player should actually output.
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Set the volume.  Dragging it to zero counts as muting; any audible
    /// level unmutes.
    pub fn set_volume(&mut self, volume: f32) {
        // Snap to the step grid so repeated steps don't accumulate float error.
        let snapped = (volume.clamp(0.0, 1.0) / VOLUME_STEP).round() * VOLUME_STEP;
        self.volume = snapped.clamp(0.0, 1.0);
        self.muted = self.volume == 0.0;
    }

    pub fn step_up(&mut self) {
        let base = if self.muted { 0.0 } else { self.volume };
        self.set_volume(base + VOLUME_STEP);
    }

    pub fn step_down(&mut self) {
        let base = if self.muted { 0.0 } else { self.volume };
        self.set_volume(base - VOLUME_STEP);
    }

    /// Flip mute.  Unmuting restores the volume that was set before.
    pub fn toggle_mute(&mut self) {
        if self.muted && self.volume == 0.0 {
            // Nothing to restore to; come back at one step.
            self.volume = VOLUME_STEP;
        }
        self.muted = !self.muted;
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(1.0)
    }
}
