//! Volume control
//!
//! Volume is owned by the controller, not by the backends: the level survives
//! track and backend switches and is pushed to each backend when it loads.

/// Percent level plus a mute flag that leaves the level untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Volume {
    level: u8,
    muted: bool,
}

impl Volume {
    /// Unmuted at `level`, clamped to 100
    pub fn new(level: u8) -> Self {
        Self {
            level: level.min(100),
            muted: false,
        }
    }

    /// Clamped to 100; does not unmute
    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(100);
    }

    /// Level as shown to the user, even while muted
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level actually sent to a backend (0 while muted)
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
        Self::new(80)
    }
}
