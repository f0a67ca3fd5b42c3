#![forbid(unsafe_code)]

//! Ordered-list splicing shared by the draft preview and the commit path.

use gridboard_core::payload::EntityId;

use crate::classifier::Insertion;

/// Produce the order `current` would take if `moved` landed at `insertion`.
///
/// The moved id is removed from the list first (it may or may not be
/// present, depending on whether the drag crosses containers), then
/// re-inserted. Insertion indices refer to the ORIGINAL slot positions, so
/// the removal shift is compensated when the moved item started above the
/// insertion point.
#[must_use]
pub fn splice_order(current: &[EntityId], moved: &EntityId, insertion: Insertion) -> Vec<EntityId> {
    let original_position = current.iter().position(|id| id == moved);
    let mut order: Vec<EntityId> = current.iter().filter(|id| *id != moved).cloned().collect();

    let index = match insertion.resolved_index() {
        Some(index) => {
            let shift = match original_position {
                Some(original) if original < index => 1,
                _ => 0,
            };
            index.saturating_sub(shift).min(order.len())
        }
        None => order.len(),
    };
    order.insert(index, moved.clone());
    order
}
