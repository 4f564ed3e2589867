//! Order-key allocation for drag-and-drop moves.
//!
//! # Responsibility
//! - Compute the new `order` key of a moved card or list from the requested
//!   slot and the destination container's current keys.
//! - Never renumber siblings: only the moved item's key changes.
//!
//! # Invariants
//! - `allocate` is pure: same inputs, same output.
//! - A returned key is strictly between its intended neighbors, or strictly
//!   above the tail / below the head it replaces.
//! - Sibling keys must be finite and ascending; anything else is rejected as
//!   an invalid ordering state instead of being papered over with a sentinel.
//!
//! For same-container moves the sibling keys still contain the moving item's
//! own key, so the slot index is off by one depending on the move direction.
//! The direction is recovered by comparing the item's current key with the key
//! currently occupying the target slot.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Headroom added when appending past the last key or into an empty container.
pub const ORDER_GAP: f64 = 65536.0;

/// Reasons a key cannot be allocated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AllocationError {
    /// A key is NaN or infinite. `index` is `None` for the moving item itself.
    NonFiniteKey { index: Option<usize> },
    /// Sibling keys are not sorted ascending at `index`.
    NotAscending {
        index: usize,
        previous: f64,
        current: f64,
    },
    /// No representable key lies strictly between the two neighbors.
    NoRoom { lower: f64, upper: f64 },
    /// No allocation rule matched the requested slot.
    Unresolved {
        move_index: usize,
        sibling_count: usize,
    },
}

impl Display for AllocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteKey { index: None } => write!(f, "moving item has a non-finite order key"),
            Self::NonFiniteKey { index: Some(index) } => {
                write!(f, "sibling order key at index {index} is not finite")
            }
            Self::NotAscending {
                index,
                previous,
                current,
            } => write!(
                f,
                "sibling order keys are not ascending at index {index}: {previous} > {current}"
            ),
            Self::NoRoom { lower, upper } => {
                write!(f, "no order key fits strictly between {lower} and {upper}")
            }
            Self::Unresolved {
                move_index,
                sibling_count,
            } => write!(
                f,
                "no allocation rule for slot {move_index} among {sibling_count} siblings"
            ),
        }
    }
}

impl Error for AllocationError {}

/// Computes the order key for an item dropped at `position`.
///
/// - `position` is the 1-based target slot; values below 1 mean the head.
///   Slots past the end are clamped to the tail.
/// - `current_order` is the moving item's key before the move.
/// - `same_container` is true when origin and destination container match.
/// - `siblings` are the destination container's keys, ascending, as read
///   before the move (they include the moving item when `same_container`).
///
/// # Errors
/// - `NonFiniteKey` / `NotAscending` when the inputs are malformed.
/// - `NoRoom` when float precision leaves no key between two neighbors.
/// - `Unresolved` when no rule applies to the slot.
pub fn allocate(
    position: i64,
    current_order: f64,
    same_container: bool,
    siblings: &[f64],
) -> Result<f64, AllocationError> {
    validate_keys(current_order, siblings)?;

    let count = siblings.len();
    let last_index = count.saturating_sub(1);
    // A cross-container move can land one past the last sibling; within the
    // same container the item already occupies a slot, so the tail is `last_index`.
    let max_index = if same_container { last_index } else { count };
    let move_index = usize::try_from(position.saturating_sub(1).max(0))
        .unwrap_or(usize::MAX)
        .min(max_index);

    if count == 0 {
        return after(current_order);
    }

    if same_container && count == 1 {
        return after(siblings[0]);
    }

    if move_index == 0 {
        return between(0.0, siblings[0]);
    }

    if !same_container {
        if move_index < count {
            return between(siblings[move_index - 1], siblings[move_index]);
        }
        return after(siblings[last_index]);
    }

    if move_index == last_index {
        return after(siblings[last_index]);
    }

    if move_index + 1 < count {
        let target = siblings[move_index];
        if current_order < target {
            return between(target, siblings[move_index + 1]);
        }
        if current_order > target {
            return between(siblings[move_index - 1], target);
        }
        // Dropped onto its own slot.
        return Ok(current_order);
    }

    Err(AllocationError::Unresolved {
        move_index,
        sibling_count: count,
    })
}

fn validate_keys(current_order: f64, siblings: &[f64]) -> Result<(), AllocationError> {
    if !current_order.is_finite() {
        return Err(AllocationError::NonFiniteKey { index: None });
    }
    for (index, key) in siblings.iter().enumerate() {
        if !key.is_finite() {
            return Err(AllocationError::NonFiniteKey { index: Some(index) });
        }
        if index > 0 && siblings[index - 1] > *key {
            return Err(AllocationError::NotAscending {
                index,
                previous: siblings[index - 1],
                current: *key,
            });
        }
    }
    Ok(())
}

fn between(lower: f64, upper: f64) -> Result<f64, AllocationError> {
    let mid = (lower + upper) / 2.0;
    if lower < mid && mid < upper {
        Ok(mid)
    } else {
        Err(AllocationError::NoRoom { lower, upper })
    }
}

fn after(key: f64) -> Result<f64, AllocationError> {
    let next = key + ORDER_GAP;
    if next.is_finite() {
        Ok(next)
    } else {
        Err(AllocationError::NoRoom {
            lower: key,
            upper: f64::INFINITY,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{allocate, AllocationError, ORDER_GAP};

    #[test]
    fn empty_container_appends_gap_above_current_key() {
        assert_eq!(allocate(1, 1000.0, false, &[]).unwrap(), 1000.0 + ORDER_GAP);
        assert_eq!(allocate(1, 1000.0, true, &[]).unwrap(), 1000.0 + ORDER_GAP);
    }

    #[test]
    fn head_of_non_empty_container_halves_first_key() {
        assert_eq!(allocate(1, 999.0, false, &[100.0, 200.0, 300.0]).unwrap(), 50.0);
    }

    #[test]
    fn position_below_one_is_treated_as_head() {
        let siblings = [100.0, 200.0];
        assert_eq!(allocate(0, 7.0, false, &siblings).unwrap(), 50.0);
        assert_eq!(allocate(-4, 7.0, false, &siblings).unwrap(), 50.0);
    }

    #[test]
    fn cross_container_interior_takes_midpoint_of_neighbors() {
        assert_eq!(allocate(2, 10.0, false, &[50.0, 150.0]).unwrap(), 100.0);
        assert_eq!(
            allocate(3, 10.0, false, &[100.0, 200.0, 300.0]).unwrap(),
            250.0
        );
    }

    #[test]
    fn cross_container_tail_goes_past_last_key() {
        let siblings = [100.0, 200.0, 300.0];
        assert_eq!(allocate(4, 10.0, false, &siblings).unwrap(), 300.0 + ORDER_GAP);
        assert_eq!(allocate(99, 10.0, false, &siblings).unwrap(), 300.0 + ORDER_GAP);
    }

    #[test]
    fn single_sibling_tail_goes_past_it() {
        assert_eq!(allocate(1, 100.0, true, &[100.0]).unwrap(), 100.0 + ORDER_GAP);
        assert_eq!(allocate(2, 5.0, false, &[100.0]).unwrap(), 100.0 + ORDER_GAP);
    }

    #[test]
    fn same_container_last_slot_goes_past_last_key() {
        let siblings = [100.0, 200.0, 300.0];
        assert_eq!(allocate(3, 100.0, true, &siblings).unwrap(), 300.0 + ORDER_GAP);
        assert_eq!(allocate(50, 100.0, true, &siblings).unwrap(), 300.0 + ORDER_GAP);
    }

    #[test]
    fn same_container_moving_down_lands_after_target() {
        let siblings = [100.0, 200.0, 300.0];
        assert_eq!(allocate(2, 150.0, true, &siblings).unwrap(), 250.0);

        let siblings = [100.0, 200.0, 300.0, 400.0];
        assert_eq!(allocate(3, 100.0, true, &siblings).unwrap(), 350.0);
    }

    #[test]
    fn same_container_moving_up_lands_before_target() {
        let siblings = [100.0, 200.0, 300.0, 400.0];
        assert_eq!(allocate(2, 400.0, true, &siblings).unwrap(), 150.0);
    }

    #[test]
    fn same_container_drop_on_own_slot_keeps_key() {
        let siblings = [100.0, 200.0, 300.0];
        assert_eq!(allocate(2, 200.0, true, &siblings).unwrap(), 200.0);
    }

    #[test]
    fn cross_container_keys_are_strictly_between_neighbors() {
        let sequences: [&[f64]; 3] = [
            &[1.0, 2.0],
            &[0.5, 65536.0, 131072.0, 131072.5],
            &[10.0, 10.25, 11.0, 4096.0, 8192.0],
        ];
        for siblings in sequences {
            for move_index in 1..siblings.len() {
                let position = move_index as i64 + 1;
                let key = allocate(position, -1.0, false, siblings).unwrap();
                assert!(siblings[move_index - 1] < key, "{siblings:?} @ {position}");
                assert!(key < siblings[move_index], "{siblings:?} @ {position}");
            }
        }
    }

    #[test]
    fn allocation_is_deterministic() {
        let siblings = [3.0, 9.0, 27.0, 81.0];
        let first = allocate(3, 81.0, true, &siblings).unwrap();
        let second = allocate(3, 81.0, true, &siblings).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unsorted_siblings_are_rejected() {
        let err = allocate(2, 1.0, false, &[100.0, 50.0]).unwrap_err();
        assert!(matches!(err, AllocationError::NotAscending { index: 1, .. }));
    }

    #[test]
    fn non_finite_keys_are_rejected() {
        let err = allocate(1, f64::NAN, false, &[]).unwrap_err();
        assert_eq!(err, AllocationError::NonFiniteKey { index: None });

        let err = allocate(1, 1.0, false, &[1.0, f64::INFINITY]).unwrap_err();
        assert_eq!(err, AllocationError::NonFiniteKey { index: Some(1) });
    }

    #[test]
    fn equal_neighbors_leave_no_room() {
        let err = allocate(2, 1.0, false, &[100.0, 100.0]).unwrap_err();
        assert_eq!(
            err,
            AllocationError::NoRoom {
                lower: 100.0,
                upper: 100.0
            }
        );
    }

    #[test]
    fn head_key_at_zero_leaves_no_room() {
        let err = allocate(1, 5.0, false, &[0.0, 10.0]).unwrap_err();
        assert!(matches!(err, AllocationError::NoRoom { .. }));
    }
}
