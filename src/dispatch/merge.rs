//! Linear merge of priority-sorted listener sequences.

use crate::types::Priority;

/// Merge two sequences, each sorted by descending priority, into `dest`.
///
/// Single pass, no re-sorting. On equal priority the element from `left` is
/// taken first, so callers pass the pool that should win ties as `left`.
/// `dest` is appended to, not cleared.
pub fn merge_descending<T, L, R, F>(left: L, right: R, dest: &mut Vec<T>, priority: F)
where
    L: IntoIterator<Item = T>,
    R: IntoIterator<Item = T>,
    F: Fn(&T) -> Priority,
{
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => priority(l) >= priority(r),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let next = if take_left { left.next() } else { right.next() };
        if let Some(item) = next {
            dest.push(item);
        }
    }
}

/// Stable sort by descending priority. Used when more than two sources are
/// combined; equal priorities keep their concatenation order.
pub fn sort_descending<T, F>(items: &mut [T], priority: F)
where
    F: Fn(&T) -> Priority,
{
    items.sort_by(|a, b| priority(b).cmp(&priority(a)));
}
