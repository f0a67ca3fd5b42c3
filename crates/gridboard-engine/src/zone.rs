#![forbid(unsafe_code)]

//! Drop zones and their registry.
//!
//! The render layer registers one [`DropZone`] per droppable element it
//! mounts (grid surface, panel body, container list, individual slots) and
//! keeps the bounds current as layout changes. The registry is plain data:
//! the classifier reads it, nothing in it reaches back into the DOM.

use std::num::NonZeroU64;

use gridboard_core::geometry::{Point, Rect};
use gridboard_core::payload::{Ancestry, EntityId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Category of droppable surface a zone accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRole {
    /// The grid surface itself, addressed by cell.
    GridCell,
    /// Empty panel space (drop appends into the panel).
    PanelSurface,
    /// A container's list area (drop appends to the end of the list).
    ContainerList,
    /// A container's own slot among its siblings (drop beside it).
    ContainerSlot,
    /// An instance's slot within a container (drop beside it).
    InstanceSlot,
}

/// Identity of a registered drop zone. Non-zero so `Option<ZoneId>` is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(NonZeroU64);

impl ZoneId {
    /// Create a zone id; zero is reserved.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

/// One registered droppable region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropZone {
    pub id: ZoneId,
    pub role: ZoneRole,
    /// The entity this zone belongs to (panel, container, or instance).
    pub entity: EntityId,
    /// Enclosing panel/container identifiers.
    pub ancestry: Ancestry,
    /// Current bounds in viewport pixels.
    pub bounds: Rect,
    /// Position of the entity within its parent list, for slot zones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_index: Option<usize>,
}

/// The set of currently-mounted drop zones.
///
/// Iteration follows registration order so classifier tie-breaks are
/// deterministic across runs. Re-registering an id updates the zone in
/// place without changing its position in that order.
#[derive(Debug, Clone, Default)]
pub struct ZoneRegistry {
    zones: FxHashMap<u64, DropZone>,
    order: Vec<u64>,
}

impl ZoneRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no zones are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Register a zone, replacing any previous zone with the same id.
    pub fn register(&mut self, zone: DropZone) {
        let key = zone.id.get();
        if self.zones.insert(key, zone).is_none() {
            self.order.push(key);
        }
    }

    /// Remove a zone by id, returning it if it was registered.
    pub fn unregister(&mut self, id: ZoneId) -> Option<DropZone> {
        let removed = self.zones.remove(&id.get());
        if removed.is_some() {
            self.order.retain(|&key| key != id.get());
        }
        removed
    }

    /// Look up a zone by id.
    #[must_use]
    pub fn get(&self, id: ZoneId) -> Option<&DropZone> {
        self.zones.get(&id.get())
    }

    /// Update only the bounds of a registered zone (layout shifts).
    ///
    /// Returns `false` if the id is unknown.
    pub fn update_bounds(&mut self, id: ZoneId, bounds: Rect) -> bool {
        match self.zones.get_mut(&id.get()) {
            Some(zone) => {
                zone.bounds = bounds;
                true
            }
            None => false,
        }
    }

    /// Iterate zones in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &DropZone> {
        self.order.iter().filter_map(|key| self.zones.get(key))
    }

    /// Iterate zones whose bounds contain `point`, in registration order.
    pub fn zones_at(&self, point: Point) -> impl Iterator<Item = &DropZone> {
        self.iter().filter(move |zone| zone.bounds.contains(point))
    }

    /// Drop every registered zone.
    pub fn clear(&mut self) {
        self.zones.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(id: u64, role: ZoneRole, bounds: Rect) -> DropZone {
        DropZone {
            id: ZoneId::new(id).expect("non-zero id"),
            role,
            entity: EntityId::new(format!("entity-{id}")),
            ancestry: Ancestry::root(),
            bounds,
            slot_index: None,
        }
    }

    #[test]
    fn zone_id_rejects_zero() {
        assert!(ZoneId::new(0).is_none());
        assert_eq!(ZoneId::new(5).map(ZoneId::get), Some(5));
    }

    #[test]
    fn register_preserves_order_and_replaces_by_id() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone(1, ZoneRole::PanelSurface, Rect::new(0.0, 0.0, 10.0, 10.0)));
        registry.register(zone(2, ZoneRole::ContainerList, Rect::new(0.0, 0.0, 10.0, 10.0)));
        registry.register(zone(1, ZoneRole::PanelSurface, Rect::new(5.0, 5.0, 10.0, 10.0)));

        assert_eq!(registry.len(), 2);
        let ids: Vec<u64> = registry.iter().map(|z| z.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);
        let updated = registry.get(ZoneId::new(1).expect("id")).expect("zone 1");
        assert_eq!(updated.bounds.x, 5.0);
    }

    #[test]
    fn zones_at_filters_by_containment() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone(1, ZoneRole::PanelSurface, Rect::new(0.0, 0.0, 100.0, 100.0)));
        registry.register(zone(2, ZoneRole::ContainerList, Rect::new(10.0, 10.0, 40.0, 40.0)));
        registry.register(zone(3, ZoneRole::InstanceSlot, Rect::new(200.0, 0.0, 50.0, 20.0)));

        let hits: Vec<u64> = registry
            .zones_at(Point::new(20.0, 20.0))
            .map(|z| z.id.get())
            .collect();
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn unregister_removes_from_order() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone(1, ZoneRole::PanelSurface, Rect::new(0.0, 0.0, 10.0, 10.0)));
        registry.register(zone(2, ZoneRole::ContainerList, Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(registry.unregister(ZoneId::new(1).expect("id")).is_some());
        assert!(registry.unregister(ZoneId::new(1).expect("id")).is_none());
        let ids: Vec<u64> = registry.iter().map(|z| z.id.get()).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn update_bounds_only_touches_known_ids() {
        let mut registry = ZoneRegistry::new();
        registry.register(zone(4, ZoneRole::InstanceSlot, Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(registry.update_bounds(ZoneId::new(4).expect("id"), Rect::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!registry.update_bounds(ZoneId::new(9).expect("id"), Rect::default()));
    }
}
