//! Seek bar state and position polling
//!
//! Position is polled from the engine once per display frame, but only
//! while at least one mounted surface shows it live. A surface that is
//! being dragged shows the drag value instead and commits it as a seek on
//! release.

use std::collections::BTreeMap;

use crate::types::Surface;

/// Per-surface seek bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeekBar {
    drag: Option<f64>,
}

impl SeekBar {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn begin_drag(&mut self, position: f64) {
        self.drag = Some(position);
    }

    /// Move the handle; ignored when no drag is in progress
    pub fn update_drag(&mut self, position: f64) {
        if let Some(drag) = self.drag.as_mut() {
            *drag = position;
        }
    }

    /// Release the handle, yielding the position to seek to
    pub fn end_drag(&mut self) -> Option<f64> {
        self.drag.take()
    }

    /// Position to display given the last polled one
    pub fn display(&self, polled: f64) -> f64 {
        self.drag.unwrap_or(polled)
    }
}

/// Tracks mounted surfaces and the last polled position
#[derive(Debug, Clone, Default)]
pub struct PositionTracker {
    surfaces: BTreeMap<Surface, SeekBar>,
    last_polled: f64,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the surface was already mounted
    pub fn mount(&mut self, surface: Surface) -> bool {
        if self.surfaces.contains_key(&surface) {
            return false;
        }
        self.surfaces.insert(surface, SeekBar::default());
        true
    }

    /// Drops the surface with any in-progress drag
    pub fn unmount(&mut self, surface: Surface) -> bool {
        self.surfaces.remove(&surface).is_some()
    }

    pub fn is_mounted(&self, surface: Surface) -> bool {
        self.surfaces.contains_key(&surface)
    }

    pub fn mounted(&self) -> impl Iterator<Item = Surface> + '_ {
        self.surfaces.keys().copied()
    }

    /// Polling runs while some mounted surface is not being dragged
    pub fn polling_active(&self) -> bool {
        self.surfaces.values().any(|bar| !bar.is_dragging())
    }

    /// Start dragging; returns false if the surface is not mounted
    pub fn begin_drag(&mut self, surface: Surface, position: f64) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(bar) => {
                bar.begin_drag(position);
                true
            }
            None => false,
        }
    }

    pub fn update_drag(&mut self, surface: Surface, position: f64) {
        if let Some(bar) = self.surfaces.get_mut(&surface) {
            bar.update_drag(position);
        }
    }

    pub fn end_drag(&mut self, surface: Surface) -> Option<f64> {
        self.surfaces.get_mut(&surface).and_then(SeekBar::end_drag)
    }

    /// Record a polled (or committed) position
    pub fn record(&mut self, position: f64) {
        self.last_polled = position;
    }

    pub fn last_polled(&self) -> f64 {
        self.last_polled
    }

    /// Position a surface should show; `None` if it is not mounted
    pub fn surface_position(&self, surface: Surface) -> Option<f64> {
        self.surfaces
            .get(&surface)
            .map(|bar| bar.display(self.last_polled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_needs_a_mounted_surface() {
        let mut tracker = PositionTracker::new();
        assert!(!tracker.polling_active());

        assert!(tracker.mount(Surface::PlayerBar));
        assert!(!tracker.mount(Surface::PlayerBar));
        assert!(tracker.polling_active());

        assert!(tracker.unmount(Surface::PlayerBar));
        assert!(!tracker.polling_active());
    }

    #[test]
    fn dragging_suspends_polling_for_that_surface() {
        let mut tracker = PositionTracker::new();
        tracker.mount(Surface::PlayerBar);
        tracker.record(12.0);

        assert!(tracker.begin_drag(Surface::PlayerBar, 30.0));
        assert!(!tracker.polling_active());

        tracker.update_drag(Surface::PlayerBar, 45.0);
        assert_eq!(tracker.surface_position(Surface::PlayerBar), Some(45.0));

        // Another live surface keeps polling going
        tracker.mount(Surface::NowPlayingOverlay);
        assert!(tracker.polling_active());
        assert_eq!(tracker.surface_position(Surface::NowPlayingOverlay), Some(12.0));

        assert_eq!(tracker.end_drag(Surface::PlayerBar), Some(45.0));
        assert_eq!(tracker.end_drag(Surface::PlayerBar), None);
        assert_eq!(tracker.surface_position(Surface::PlayerBar), Some(12.0));
    }

    #[test]
    fn drag_on_unmounted_surface_is_rejected() {
        let mut tracker = PositionTracker::new();
        assert!(!tracker.begin_drag(Surface::MiniPlayer, 3.0));
        assert_eq!(tracker.end_drag(Surface::MiniPlayer), None);
        assert_eq!(tracker.surface_position(Surface::MiniPlayer), None);
    }
}
