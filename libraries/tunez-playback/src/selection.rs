//! Next/previous index selection under shuffle and loop rules

use crate::shuffle::ShufflePicker;
use crate::types::PlaybackMode;

/// Outcome of an index selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChoice {
    /// Switch to another index
    Move(usize),
    /// Keep the index and start the current track over
    Restart,
    /// Keep the index; nothing to do
    Stay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Computes the index to move to for skip and end-of-track
#[derive(Debug, Clone, Default)]
pub struct IndexSelector {
    picker: ShufflePicker,
}

impl IndexSelector {
    pub fn new(picker: ShufflePicker) -> Self {
        Self { picker }
    }

    /// Index for an explicit skip forward
    pub fn next(&mut self, current: usize, len: usize, mode: PlaybackMode) -> IndexChoice {
        self.step(current, len, mode, Direction::Forward)
    }

    /// Index for an explicit skip back
    pub fn previous(&mut self, current: usize, len: usize, mode: PlaybackMode) -> IndexChoice {
        self.step(current, len, mode, Direction::Backward)
    }

    /// Index after the current track finished on its own
    ///
    /// With track looping the same track plays again. Otherwise this is a
    /// forward step, except that a single-track queue without playlist
    /// looping simply stops.
    pub fn after_track_end(
        &mut self,
        current: usize,
        len: usize,
        mode: PlaybackMode,
    ) -> IndexChoice {
        if len == 0 {
            return IndexChoice::Stay;
        }
        if mode.loop_track {
            return IndexChoice::Restart;
        }
        if len == 1 {
            return if mode.loop_playlist {
                IndexChoice::Restart
            } else {
                IndexChoice::Stay
            };
        }
        self.step(current, len, mode, Direction::Forward)
    }

    fn step(
        &mut self,
        current: usize,
        len: usize,
        mode: PlaybackMode,
        direction: Direction,
    ) -> IndexChoice {
        if len == 0 {
            return IndexChoice::Stay;
        }
        if len == 1 {
            return IndexChoice::Restart;
        }

        if mode.shuffle {
            return self
                .picker
                .pick(current, len)
                .map_or(IndexChoice::Stay, IndexChoice::Move);
        }

        let last = len - 1;
        match direction {
            Direction::Forward if current < last => IndexChoice::Move(current + 1),
            Direction::Backward if current > 0 && current <= last => IndexChoice::Move(current - 1),
            Direction::Forward if mode.loop_playlist => IndexChoice::Move(0),
            Direction::Backward if mode.loop_playlist => IndexChoice::Move(last),
            _ => IndexChoice::Stay,
        }
    }
}
