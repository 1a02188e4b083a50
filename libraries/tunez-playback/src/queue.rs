//! Queue editing helpers
//!
//! The queue itself is a plain `Vec<Track>` held in the preference store.
//! These functions compute where the current index lands after an edit so
//! that `index < len` holds whenever the queue is non-empty.

/// Clamp `index` into a queue of `len` items (0 for an empty queue)
pub fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

/// Current index after removing the item at `removed`
///
/// `new_len` is the queue length after the removal. Removing an earlier
/// item shifts the current one down; removing the current item keeps the
/// index so the following track slides into place.
pub fn index_after_removal(current: usize, removed: usize, new_len: usize) -> usize {
    let index = if removed < current {
        current - 1
    } else {
        current
    };
    clamp_index(index, new_len)
}

/// Current index after moving an item from `from` to `to`
///
/// The current track keeps playing; only its position may change.
pub fn index_after_move(current: usize, from: usize, to: usize) -> usize {
    if from == current {
        to
    } else if from < current && to >= current {
        current - 1
    } else if from > current && to <= current {
        current + 1
    } else {
        current
    }
}

/// Move the item at `from` so it ends up at `to`
///
/// Both indices must be in bounds.
pub(crate) fn move_item<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}
