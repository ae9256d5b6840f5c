//! Sparse position keys for ordering sibling rows.
//!
//! Siblings are spaced `POSITION_GAP` apart, so an insertion between two
//! rows takes the arithmetic midpoint instead of shifting every later key.
//! Repeated insertion into the same slot halves the gap each time; after
//! roughly 20 insertions the midpoint lands on an existing key. The store
//! detects that collision through its UNIQUE index, renormalizes the
//! siblings with [`normalized_positions`] and retries.

/// Distance between freshly assigned keys
pub const POSITION_GAP: i64 = 1_000_000;

/// Virtual key before the first sibling. Stored keys are never negative.
pub const LOWER_BOUND: i64 = 0;

/// Key for an item appended after `current_max`, or `None` if it would overflow.
pub fn position_for_new_item(current_max: Option<i64>) -> Option<i64> {
    match current_max {
        Some(max) => max.checked_add(POSITION_GAP),
        None => Some(POSITION_GAP),
    }
}

/// Midpoint between two neighbouring keys.
///
/// When `next - previous < 2` the result equals `previous`, which collides
/// with the existing row and signals that the siblings need renormalizing.
pub fn position_between(previous: i64, next: i64) -> i64 {
    debug_assert!(previous <= next, "previous ({previous}) must not exceed next ({next})");
    previous + (next - previous) / 2
}

/// Key that places a new row at `index` among `siblings` (ascending keys).
/// An index past the end appends. `None` means the keys are exhausted.
pub fn position_for_index(siblings: &[i64], index: usize) -> Option<i64> {
    let index = index.min(siblings.len());
    if index == siblings.len() {
        return position_for_new_item(siblings.last().copied());
    }

    let next = siblings[index];
    let previous = if index == 0 {
        LOWER_BOUND.min(next)
    } else {
        siblings[index - 1]
    };
    Some(position_between(previous, next))
}

/// Fresh evenly spaced keys: `GAP, 2*GAP, ...`. Leaves a full gap in front
/// of the first row so insertions at the head have room too.
pub fn normalized_positions(count: usize) -> Vec<i64> {
    (1..=count as i64).map(|i| i * POSITION_GAP).collect()
}
