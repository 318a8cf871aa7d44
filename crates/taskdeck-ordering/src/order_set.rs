//! Order set validation
//!
//! Pure checks on proposed sequences; nothing here touches the store.

use crate::error::OrderViolation;
use std::collections::BTreeSet;
use taskdeck_model::TaskId;

/// Check `proposed` is exactly a permutation of `current`
///
/// # Errors
/// The first duplicate, foreign or missing id.
pub fn validate_full_order(current: &[TaskId], proposed: &[TaskId]) -> Result<(), OrderViolation> {
    let members: BTreeSet<TaskId> = current.iter().copied().collect();
    let mut seen = BTreeSet::new();
    for id in proposed {
        if !seen.insert(*id) {
            return Err(OrderViolation::Duplicate(*id));
        }
        if !members.contains(id) {
            return Err(OrderViolation::Foreign(*id));
        }
    }
    match current.iter().find(|id| !seen.contains(id)) {
        Some(missing) => Err(OrderViolation::Missing(*missing)),
        None => Ok(()),
    }
}

/// Check a move's destination sequence and return the moved ids in order
///
/// `proposed` must contain every current destination task, and otherwise
/// only tasks from the source group. Source tasks left out stay behind.
///
/// # Errors
/// The first duplicate, foreign or missing id, or `NothingMoved`.
pub fn validate_destination(
    destination: &[TaskId],
    source: &[TaskId],
    proposed: &[TaskId],
) -> Result<Vec<TaskId>, OrderViolation> {
    let dest: BTreeSet<TaskId> = destination.iter().copied().collect();
    let src: BTreeSet<TaskId> = source.iter().copied().collect();
    let mut seen = BTreeSet::new();
    let mut moved = Vec::new();
    for id in proposed {
        if !seen.insert(*id) {
            return Err(OrderViolation::Duplicate(*id));
        }
        if src.contains(id) {
            moved.push(*id);
        } else if !dest.contains(id) {
            return Err(OrderViolation::Foreign(*id));
        }
    }
    if let Some(missing) = destination.iter().find(|id| !seen.contains(id)) {
        return Err(OrderViolation::Missing(*missing));
    }
    if moved.is_empty() {
        return Err(OrderViolation::NothingMoved);
    }
    Ok(moved)
}

/// Positions (from, to) of the element a drag displaced
///
/// Compares the first and last positions where the sequences differ. For a
/// single drag this names exactly the dragged task; for anything else it
/// still gives a stable, in-bounds pair. Equal sequences give `(0, 0)`.
#[must_use]
pub fn displacement(old: &[TaskId], new: &[TaskId]) -> (usize, usize) {
    let len = old.len().min(new.len());
    let Some(first) = (0..len).find(|&i| old[i] != new[i]) else {
        return (0, 0);
    };
    let last = (0..len).rev().find(|&i| old[i] != new[i]).unwrap_or(first);
    if old[first] == new[last] {
        (first, last)
    } else {
        (last, first)
    }
}

/// `current` without the `hidden` ids
#[must_use]
pub fn without_hidden(current: &[TaskId], hidden: &BTreeSet<TaskId>) -> Vec<TaskId> {
    current.iter().copied().filter(|id| !hidden.contains(id)).collect()
}

/// Lay `proposed` over the visible slots of `current`
///
/// Hidden ids keep their index; visible slots take `proposed` in order and
/// any surplus goes at the end.
#[must_use]
pub fn with_hidden(current: &[TaskId], hidden: &BTreeSet<TaskId>, proposed: &[TaskId]) -> Vec<TaskId> {
    let mut shown = proposed.iter().copied();
    let mut out = Vec::with_capacity(current.len().max(proposed.len()));
    for id in current {
        if hidden.contains(id) {
            out.push(*id);
        } else if let Some(next) = shown.next() {
            out.push(next);
        }
    }
    out.extend(shown);
    out
}

/// `order` with `task` removed and reinserted at `index` (clamped)
#[must_use]
pub fn insert_at(order: &[TaskId], task: TaskId, index: usize) -> Vec<TaskId> {
    let mut out: Vec<TaskId> = order.iter().copied().filter(|id| *id != task).collect();
    let index = index.min(out.len());
    out.insert(index, task);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[u64]) -> Vec<TaskId> {
        raw.iter().map(|r| TaskId(*r)).collect()
    }

    #[test]
    fn full_order_violations() {
        let current = ids(&[1, 2, 3]);
        assert!(validate_full_order(&current, &ids(&[3, 1, 2])).is_ok());
        assert_eq!(
            validate_full_order(&current, &ids(&[1, 1, 2, 3])),
            Err(OrderViolation::Duplicate(TaskId(1)))
        );
        assert_eq!(
            validate_full_order(&current, &ids(&[1, 2, 3, 9])),
            Err(OrderViolation::Foreign(TaskId(9)))
        );
        assert_eq!(
            validate_full_order(&current, &ids(&[1, 3])),
            Err(OrderViolation::Missing(TaskId(2)))
        );
        assert!(validate_full_order(&[], &[]).is_ok());
    }

    #[test]
    fn destination_rules() {
        let dest = ids(&[10, 11]);
        let src = ids(&[1, 2, 3]);
        assert_eq!(validate_destination(&dest, &src, &ids(&[10, 2, 11])), Ok(ids(&[2])));
        assert_eq!(
            validate_destination(&dest, &src, &ids(&[3, 10, 1, 11])),
            Ok(ids(&[3, 1]))
        );
        assert_eq!(
            validate_destination(&dest, &src, &ids(&[10, 2])),
            Err(OrderViolation::Missing(TaskId(11)))
        );
        assert_eq!(
            validate_destination(&dest, &src, &ids(&[10, 11, 7])),
            Err(OrderViolation::Foreign(TaskId(7)))
        );
        assert_eq!(
            validate_destination(&dest, &src, &ids(&[11, 10])),
            Err(OrderViolation::NothingMoved)
        );
    }

    #[test]
    fn displacement_names_dragged_task() {
        let old = ids(&[1, 2, 3, 4]);
        assert_eq!(displacement(&old, &ids(&[1, 3, 4, 2])), (1, 3));
        assert_eq!(displacement(&old, &ids(&[1, 4, 2, 3])), (3, 1));
        // adjacent swap: either task can be read as the dragged one
        assert_eq!(displacement(&old, &ids(&[2, 1, 3, 4])), (0, 1));
        assert_eq!(displacement(&old, &old), (0, 0));
    }

    #[test]
    fn insert_clamps() {
        assert_eq!(insert_at(&ids(&[1, 2]), TaskId(9), 99), ids(&[1, 2, 9]));
        assert_eq!(insert_at(&ids(&[1, 2, 3]), TaskId(3), 0), ids(&[3, 1, 2]));
    }

    #[test]
    fn hidden_ids_keep_their_slots() {
        let current = ids(&[1, 2, 3, 4]);
        let hidden: BTreeSet<TaskId> = ids(&[2]).into_iter().collect();
        assert_eq!(without_hidden(&current, &hidden), ids(&[1, 3, 4]));
        assert_eq!(with_hidden(&current, &hidden, &ids(&[4, 1, 3])), ids(&[4, 2, 1, 3]));
        // a move adds one id to the destination
        assert_eq!(with_hidden(&current, &hidden, &ids(&[9, 1, 3, 4])), ids(&[9, 2, 1, 3, 4]));
        assert_eq!(with_hidden(&current, &BTreeSet::new(), &ids(&[4, 3, 2, 1])), ids(&[4, 3, 2, 1]));
    }

    proptest! {
        #[test]
        fn prop_single_drag_round_trips(len in 1usize..12, from in 0usize..12, to in 0usize..12) {
            let from = from % len;
            let to = to % len;
            let old: Vec<TaskId> = (0..len as u64).map(TaskId).collect();
            let new = insert_at(&old, old[from], to);
            let (f, t) = displacement(&old, &new);
            if from == to {
                prop_assert_eq!((f, t), (0, 0));
            } else {
                prop_assert_eq!(old[f], new[t]);
                if from.abs_diff(to) > 1 {
                    prop_assert_eq!((f, t), (from, to));
                }
            }
        }

        #[test]
        fn prop_shuffle_is_valid_full_order(seq in Just((0u64..8).collect::<Vec<_>>()).prop_shuffle()) {
            let current: Vec<TaskId> = (0u64..8).map(TaskId).collect();
            let proposed: Vec<TaskId> = seq.into_iter().map(TaskId).collect();
            prop_assert!(validate_full_order(&current, &proposed).is_ok());
        }
    }
}
