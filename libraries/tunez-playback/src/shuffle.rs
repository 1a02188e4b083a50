//! Random track selection for shuffle mode

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Picks a random queue index different from the current one
///
/// Uses rejection sampling: draw uniformly from `[0, len)` and retry while
/// the draw equals the current index. Every other index is equally likely.
#[derive(Debug, Clone)]
pub struct ShufflePicker {
    rng: StdRng,
}

impl ShufflePicker {
    /// Picker seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic picker, for reproducible sessions and tests
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }

    /// Random index in `[0, len)` other than `current`
    ///
    /// Returns `None` when there is no other index to pick (`len <= 1`).
    pub fn pick(&mut self, current: usize, len: usize) -> Option<usize> {
        if len <= 1 {
            return None;
        }

        loop {
            let candidate = self.rng.gen_range(0..len);
            if candidate != current {
                return Some(candidate);
            }
        }
    }
}

impl Default for ShufflePicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_returns_current() {
        let mut picker = ShufflePicker::seeded(42);
        for current in 0..5 {
            for _ in 0..200 {
                let picked = picker.pick(current, 5).unwrap();
                assert_ne!(picked, current);
                assert!(picked < 5);
            }
        }
    }

    #[test]
    fn two_tracks_always_alternate() {
        let mut picker = ShufflePicker::seeded(1);
        assert_eq!(picker.pick(0, 2), Some(1));
        assert_eq!(picker.pick(1, 2), Some(0));
    }

    #[test]
    fn nothing_to_pick_from_single_track() {
        let mut picker = ShufflePicker::new();
        assert_eq!(picker.pick(0, 1), None);
        assert_eq!(picker.pick(0, 0), None);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ShufflePicker::seeded(7);
        let mut b = ShufflePicker::seeded(7);
        let seq_a: Vec<_> = (0..20).map(|_| a.pick(3, 10)).collect();
        let seq_b: Vec<_> = (0..20).map(|_| b.pick(3, 10)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn picks_are_roughly_uniform() {
        let mut picker = ShufflePicker::seeded(2024);
        let mut counts = [0u32; 5];
        for _ in 0..5000 {
            counts[picker.pick(0, 5).unwrap()] += 1;
        }

        assert_eq!(counts[0], 0);
        // Each of the other four should get about 1250
        for &count in &counts[1..] {
            assert!((1000..1500).contains(&count), "skewed counts: {counts:?}");
        }
    }
}
