//! Property-based tests for index selection, queue edits and volume
//!
//! Uses proptest to check the controller invariants across random inputs.

mod common;

use common::{complete_load, controller, tracks, SharedEngine};
use proptest::prelude::*;
use tunez_playback::{
    index_after_move, index_after_removal, IndexChoice, IndexSelector, LoopMode, PlaybackMode,
    ShufflePicker,
};

// ===== Helpers =====

#[derive(Debug, Clone)]
enum QueueOp {
    Next,
    Previous,
    Remove(usize),
    Move(usize, usize),
    Truncate(usize),
    Append(usize),
    Jump(usize),
    TrackEnd,
}

fn queue_op() -> impl Strategy<Value = QueueOp> {
    prop_oneof![
        Just(QueueOp::Next),
        Just(QueueOp::Previous),
        (0usize..12).prop_map(QueueOp::Remove),
        (0usize..12, 0usize..12).prop_map(|(from, to)| QueueOp::Move(from, to)),
        (0usize..12).prop_map(QueueOp::Truncate),
        (1usize..4).prop_map(QueueOp::Append),
        (0usize..12).prop_map(QueueOp::Jump),
        Just(QueueOp::TrackEnd),
    ]
}

fn loop_mode() -> impl Strategy<Value = LoopMode> {
    prop_oneof![
        Just(LoopMode::Off),
        Just(LoopMode::Playlist),
        Just(LoopMode::Track),
    ]
}

fn ids(n: usize, offset: usize) -> Vec<String> {
    (offset..offset + n).map(|i| format!("t{i}")).collect()
}

// ===== Property Tests =====

proptest! {
    /// Property: without shuffle, previous undoes next away from the ends
    #[test]
    fn previous_undoes_next(len in 3usize..40, seed in any::<u64>(), looping in any::<bool>()) {
        let mut selector = IndexSelector::new(ShufflePicker::seeded(seed));
        let mode = PlaybackMode::default().with_loop(if looping { LoopMode::Playlist } else { LoopMode::Off });

        for current in 0..len - 1 {
            let IndexChoice::Move(next) = selector.next(current, len, mode) else {
                return Err(TestCaseError::fail("next did not move"));
            };
            prop_assert_eq!(next, current + 1);
            prop_assert_eq!(selector.previous(next, len, mode), IndexChoice::Move(current));
        }
    }

    /// Property: shuffle always moves to a different, valid index
    #[test]
    fn shuffle_moves_elsewhere(
        len in 2usize..60,
        current in 0usize..60,
        seed in any::<u64>(),
        loop_mode in loop_mode(),
    ) {
        let current = current % len;
        let mut selector = IndexSelector::new(ShufflePicker::seeded(seed));
        let mode = PlaybackMode { shuffle: true, ..PlaybackMode::default() }.with_loop(loop_mode);

        match selector.next(current, len, mode) {
            IndexChoice::Move(next) => {
                prop_assert_ne!(next, current);
                prop_assert!(next < len);
            }
            other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
        }
    }

    /// Property: moving an item never changes which track is current
    #[test]
    fn move_keeps_current_track(len in 1usize..30, current in 0usize..30, from in 0usize..30, to in 0usize..30) {
        let (current, from, to) = (current % len, from % len, to % len);
        let mut queue = ids(len, 0);
        let playing = queue[current].clone();

        let item = queue.remove(from);
        queue.insert(to, item);

        let index = index_after_move(current, from, to);
        prop_assert_eq!(&queue[index], &playing);
    }

    /// Property: removal keeps the current track when another one goes
    #[test]
    fn removal_keeps_index_valid(len in 1usize..30, current in 0usize..30, removed in 0usize..30) {
        let (current, removed) = (current % len, removed % len);
        let mut queue = ids(len, 0);
        let playing = queue[current].clone();
        queue.remove(removed);

        let index = index_after_removal(current, removed, queue.len());
        if queue.is_empty() {
            prop_assert_eq!(index, 0);
        } else {
            prop_assert!(index < queue.len());
            if removed != current {
                prop_assert_eq!(&queue[index], &playing);
            }
        }
    }

    /// Property: after any edit sequence the index is in bounds and the
    /// engine plays the current track
    #[test]
    fn queue_edits_keep_index_in_bounds(
        initial in 1usize..10,
        start in 0usize..10,
        shuffle in any::<bool>(),
        loop_mode in loop_mode(),
        ops in prop::collection::vec(queue_op(), 1..40),
    ) {
        let engine = SharedEngine::new();
        let mut player = controller(&engine);
        let names = ids(initial, 0);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        player.replace_queue(tracks(&names), start);

        if shuffle {
            player.toggle_shuffle();
        }
        match loop_mode {
            LoopMode::Off => {}
            LoopMode::Playlist => player.toggle_loop_playlist(),
            LoopMode::Track => player.toggle_loop_track(),
        }

        let mut appended = 100;
        for op in ops {
            match op {
                QueueOp::Next => player.skip_next(),
                QueueOp::Previous => player.skip_prev(),
                QueueOp::Remove(index) => { let _ = player.remove_from_queue(index); }
                QueueOp::Move(from, to) => { let _ = player.move_in_queue(from, to); }
                QueueOp::Truncate(len) => player.truncate_queue(len),
                QueueOp::Append(n) => {
                    let names = ids(n, appended);
                    appended += n;
                    let names: Vec<&str> = names.iter().map(String::as_str).collect();
                    player.append_to_queue(tracks(&names));
                }
                QueueOp::Jump(index) => { let _ = player.play_index(index); }
                QueueOp::TrackEnd => {
                    if player.loaded_generation().is_some() {
                        complete_load(&mut player, &engine);
                        player.on_track_end();
                    }
                }
            }

            let len = player.queue_len();
            let index = player.current_index();
            if len == 0 {
                prop_assert_eq!(index, 0);
                prop_assert!(player.loaded_generation().is_none());
            } else {
                prop_assert!(index < len);
                let current = player.current_track().unwrap();
                let url = engine.last_url().unwrap();
                prop_assert!(url.contains(&format!("/{}_", current.id)), "{} not playing {}", url, current.id);
            }
        }
    }

    /// Property: volume stays in range and mute never loses the level
    #[test]
    fn volume_stays_in_range(ops in prop::collection::vec(prop_oneof![
        (-1.0f32..2.0).prop_map(Some),
        Just(None),
    ], 1..50)) {
        let engine = SharedEngine::new();
        let mut player = controller(&engine);
        player.replace_queue(tracks(&["a"]), 0);

        for op in ops {
            match op {
                Some(level) => player.set_volume(level),
                None => player.toggle_mute(),
            }

            let state = player.volume_state();
            prop_assert!((0.0..=1.0).contains(&state.level));
            prop_assert!(state.last_non_zero > 0.0 && state.last_non_zero <= 1.0);
            prop_assert!((0.0..=1.0).contains(&player.displayed_volume()));
            if state.muted {
                prop_assert_eq!(player.displayed_volume(), 0.0);
            } else {
                prop_assert!(player.displayed_volume() > 0.0);
            }
        }
    }
}
