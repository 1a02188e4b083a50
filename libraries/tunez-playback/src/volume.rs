//! Volume and mute state
//!
//! Levels are linear in `[0.0, 1.0]`. Zero means muted; the last non-zero
//! level is remembered so unmuting can bring it back.

use crate::types::VolumeState;

/// Engine volumes at or below this count as silent
const SILENT: f32 = 1e-3;

/// Level used when no usable level is remembered
pub const DEFAULT_LEVEL: f32 = 0.75;

/// Volume controller with mute memory
#[derive(Debug, Clone)]
pub struct VolumeControl {
    state: VolumeState,
}

impl VolumeControl {
    /// Create from the persisted last non-zero level
    ///
    /// Starts unmuted; mute is never carried across sessions.
    pub fn new(last_non_zero: f32) -> Self {
        let level = clamp_level(last_non_zero);
        let level = if level > 0.0 { level } else { DEFAULT_LEVEL };

        Self {
            state: VolumeState {
                level,
                muted: false,
                last_non_zero: level,
            },
        }
    }

    /// Set the level (clamped to `[0, 1]`)
    ///
    /// Zero mutes. Any positive level unmutes and becomes the new
    /// last non-zero level. Returns the clamped level.
    pub fn set_level(&mut self, level: f32) -> f32 {
        let level = clamp_level(level);
        self.state.level = level;

        if level > 0.0 {
            self.state.muted = false;
            self.state.last_non_zero = level;
        } else {
            self.state.muted = true;
        }

        level
    }

    /// Flip mute; returns the new mute flag
    ///
    /// `engine_volume` is what the engine currently reports. When unmuting
    /// into silence the last non-zero level is restored.
    pub fn toggle_mute(&mut self, engine_volume: Option<f32>) -> bool {
        self.state.muted = !self.state.muted;
        if !self.state.muted {
            self.restore_if_silent(engine_volume);
        }
        self.state.muted
    }

    /// Restore the last non-zero level if the level or the engine is silent
    ///
    /// Returns whether the level changed.
    pub fn restore_if_silent(&mut self, engine_volume: Option<f32>) -> bool {
        let engine_silent = engine_volume.is_some_and(|v| v <= SILENT);
        if self.state.level <= SILENT || engine_silent {
            self.state.level = self.state.last_non_zero;
            true
        } else {
            false
        }
    }

    /// Level a UI should show (0 while muted)
    pub fn displayed(&self) -> f32 {
        if self.state.muted {
            0.0
        } else {
            self.state.level
        }
    }

    /// Level the engine should be at
    pub fn level(&self) -> f32 {
        self.state.level
    }

    pub fn is_muted(&self) -> bool {
        self.state.muted
    }

    pub fn last_non_zero(&self) -> f32 {
        self.state.last_non_zero
    }

    pub fn state(&self) -> VolumeState {
        self.state
    }
}

impl Default for VolumeControl {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL)
    }
}

fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_volume() {
        let vol = VolumeControl::new(0.4);
        assert_eq!(vol.level(), 0.4);
        assert_eq!(vol.last_non_zero(), 0.4);
        assert!(!vol.is_muted());
    }

    #[test]
    fn levels_are_clamped() {
        let mut vol = VolumeControl::default();
        assert_eq!(vol.set_level(1.7), 1.0);
        assert_eq!(vol.set_level(-0.3), 0.0);
        assert_eq!(vol.set_level(f32::NAN), 0.0);
    }

    #[test]
    fn zero_mutes_and_keeps_memory() {
        let mut vol = VolumeControl::new(0.6);
        vol.set_level(0.0);
        assert!(vol.is_muted());
        assert_eq!(vol.displayed(), 0.0);
        assert_eq!(vol.last_non_zero(), 0.6);

        // Unmute into silence restores the remembered level
        assert!(!vol.toggle_mute(Some(0.0)));
        assert_eq!(vol.level(), 0.6);
        assert_eq!(vol.displayed(), 0.6);
    }

    #[test]
    fn positive_level_unmutes() {
        let mut vol = VolumeControl::new(0.5);
        vol.toggle_mute(Some(0.5));
        assert!(vol.is_muted());

        vol.set_level(0.3);
        assert!(!vol.is_muted());
        assert_eq!(vol.last_non_zero(), 0.3);
    }

    #[test]
    fn mute_then_unmute_keeps_level() {
        let mut vol = VolumeControl::new(0.75);
        vol.set_level(0.4);

        assert!(vol.toggle_mute(Some(0.4)));
        assert_eq!(vol.displayed(), 0.0);
        assert!(!vol.toggle_mute(Some(0.4)));
        assert_eq!(vol.displayed(), 0.4);
    }

    #[test]
    fn silent_engine_triggers_restore() {
        let mut vol = VolumeControl::new(0.8);
        vol.toggle_mute(None);
        // Engine reset its volume behind our back
        vol.toggle_mute(Some(0.0));
        assert_eq!(vol.level(), 0.8);

        assert!(!vol.restore_if_silent(Some(0.8)));
    }

    #[test]
    fn zero_start_falls_back_to_default_memory() {
        let vol = VolumeControl::new(0.0);
        assert_eq!(vol.level(), DEFAULT_LEVEL);
        assert_eq!(vol.last_non_zero(), DEFAULT_LEVEL);
        assert!(!vol.is_muted());
    }
}
