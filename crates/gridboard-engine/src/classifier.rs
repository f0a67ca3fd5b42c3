#![forbid(unsafe_code)]

//! Hit classification: choosing THE drop target among overlapping zones.
//!
//! [`resolve`] is a pure selection function over externally supplied
//! geometry; it runs once per animation frame during a drag and must stay
//! cheap. The expensive topmost-element DOM query is NOT made here — the
//! host refreshes an [`ElementProbe`] behind its own ~80 ms gate and the
//! classifier only consumes the cached value.
//!
//! # Selection rules
//!
//! 1. Panel payloads resolve by grid geometry alone: the target is whatever
//!    cell the live pointer maps to, and overlapping droppables are ignored.
//! 2. Instance payloads prefer instance slots over container lists over
//!    panel surfaces, and panel surfaces are excluded entirely while the
//!    pointer is inside any container's bounds (otherwise the item
//!    "escapes" to the wrong scope through inter-item gaps).
//! 3. Container payloads prefer container slots over container lists over
//!    panel surfaces.
//! 4. When the element probe names a panel, candidates are narrowed to that
//!    panel before priority selection; this untangles transparent overlays
//!    and scrollable regions stacking several valid zones on one point.
//! 5. A frame with no geometric candidate returns the sticky target from
//!    the previous frame instead of clearing the highlight: single-frame
//!    gaps between elements must not blank the highlight.
//! 6. With no candidates and no sticky memory, the nearest acceptable zone
//!    by center distance wins.
//!
//! Ties inside one priority rank break by center distance, then zone id.

use gridboard_core::geometry::{GridCell, Point, Rect};
use gridboard_core::payload::{Ancestry, DragRole, EntityId};
use gridboard_core::track::{SizeTrack, cell_from_point};
use serde::{Deserialize, Serialize};

use crate::zone::{DropZone, ZoneId, ZoneRegistry, ZoneRole};

/// Live grid geometry supplied by the host on every classification.
#[derive(Debug, Clone, Copy)]
pub struct GridSnapshot<'a> {
    pub bounds: Rect,
    pub cols: &'a SizeTrack,
    pub rows: &'a SizeTrack,
}

/// Cached result of the host's topmost-element-at-point DOM query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementProbe {
    /// Panel the topmost element at the pointer belongs to.
    pub panel_id: EntityId,
}

/// Everything the classifier reads besides the pointer itself.
#[derive(Debug, Clone, Copy)]
pub struct ClassifierCtx<'a> {
    pub registry: &'a ZoneRegistry,
    pub grid: GridSnapshot<'a>,
    pub probe: Option<&'a ElementProbe>,
}

/// Where, within an ordered list, a drop would land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insertion {
    Before(usize),
    After(usize),
    Append,
}

impl Insertion {
    /// The list index the moved item would occupy, `None` for append.
    #[must_use]
    pub const fn resolved_index(self) -> Option<usize> {
        match self {
            Self::Before(index) => Some(index),
            Self::After(index) => Some(index + 1),
            Self::Append => None,
        }
    }
}

/// The classifier's choice for one pointer position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ResolvedTarget {
    /// A grid cell (panel payloads only; not tied to a registered zone).
    Cell { cell: GridCell },
    /// A registered drop zone.
    Zone {
        zone: ZoneId,
        role: ZoneRole,
        entity: EntityId,
        ancestry: Ancestry,
        #[serde(skip_serializing_if = "Option::is_none")]
        insertion: Option<Insertion>,
    },
}

impl ResolvedTarget {
    /// The ordered-list parent this target lands in for a payload role: a
    /// container for instance payloads, a panel for container payloads.
    ///
    /// `None` for grid cells, for an instance over bare panel surface (the
    /// reducer materializes a container there), and for role/zone pairs the
    /// classifier never produces.
    #[must_use]
    pub fn list_parent(&self, role: DragRole) -> Option<&EntityId> {
        let ResolvedTarget::Zone {
            role: zone_role,
            entity,
            ancestry,
            ..
        } = self
        else {
            return None;
        };
        match role {
            DragRole::Instance => match zone_role {
                ZoneRole::InstanceSlot => ancestry.container_id.as_ref(),
                ZoneRole::ContainerList => Some(entity),
                _ => None,
            },
            DragRole::Container => match zone_role {
                ZoneRole::ContainerSlot | ZoneRole::ContainerList => ancestry.panel_id.as_ref(),
                ZoneRole::PanelSurface => Some(entity),
                _ => None,
            },
            _ => None,
        }
    }

    fn from_zone(zone: &DropZone, pointer: Point) -> Self {
        let insertion = match zone.role {
            ZoneRole::InstanceSlot | ZoneRole::ContainerSlot => {
                Some(slot_insertion(zone, pointer))
            }
            ZoneRole::ContainerList => Some(Insertion::Append),
            ZoneRole::PanelSurface | ZoneRole::GridCell => None,
        };
        Self::Zone {
            zone: zone.id,
            role: zone.role,
            entity: zone.entity.clone(),
            ancestry: zone.ancestry.clone(),
            insertion,
        }
    }
}

/// Insertion position within a vertical list slot: upper half lands before
/// the slot's entity, lower half after it.
fn slot_insertion(zone: &DropZone, pointer: Point) -> Insertion {
    let Some(index) = zone.slot_index else {
        debug_assert!(false, "slot zone {} registered without slot_index", zone.id.get());
        return Insertion::Append;
    };
    if pointer.y < zone.bounds.center().y {
        Insertion::Before(index)
    } else {
        Insertion::After(index)
    }
}

/// Priority rank of a zone role for a payload role; `None` means the zone
/// cannot accept the payload at all. Lower ranks win.
fn acceptance_rank(payload: DragRole, zone: ZoneRole) -> Option<u8> {
    match payload {
        // Panel payloads never consult zones (grid geometry only).
        DragRole::Panel => None,
        DragRole::Instance => match zone {
            ZoneRole::InstanceSlot => Some(0),
            ZoneRole::ContainerList => Some(1),
            ZoneRole::PanelSurface => Some(2),
            ZoneRole::ContainerSlot | ZoneRole::GridCell => None,
        },
        DragRole::Container => match zone {
            ZoneRole::ContainerSlot => Some(0),
            ZoneRole::ContainerList => Some(1),
            ZoneRole::PanelSurface => Some(2),
            ZoneRole::InstanceSlot | ZoneRole::GridCell => None,
        },
        DragRole::File | DragRole::Text | DragRole::Url => match zone {
            ZoneRole::ContainerList => Some(0),
            ZoneRole::PanelSurface => Some(1),
            ZoneRole::ContainerSlot | ZoneRole::InstanceSlot | ZoneRole::GridCell => None,
        },
    }
}

/// Resolve the drop target for one pointer position.
///
/// `sticky` is the previous frame's resolved target for the same gesture;
/// the session owns it and clears it between gestures.
#[must_use]
pub fn resolve(
    role: DragRole,
    pointer: Point,
    ctx: &ClassifierCtx<'_>,
    sticky: Option<&ResolvedTarget>,
) -> Option<ResolvedTarget> {
    if role == DragRole::Panel {
        return cell_from_point(pointer, ctx.grid.bounds, ctx.grid.cols, ctx.grid.rows)
            .map(|cell| ResolvedTarget::Cell { cell });
    }

    let mut candidates: Vec<&DropZone> = ctx
        .registry
        .zones_at(pointer)
        .filter(|zone| acceptance_rank(role, zone.role).is_some())
        .collect();

    // Inside a container, a panel surface underneath must not swallow the
    // drop through inter-item gaps.
    let inside_container = candidates
        .iter()
        .any(|zone| zone.role == ZoneRole::ContainerList);
    if inside_container {
        candidates.retain(|zone| zone.role != ZoneRole::PanelSurface);
    }

    // Element-probe arbitration: narrow to the panel the DOM names, but only
    // when geometry agrees that the panel holds at least one candidate.
    if let Some(probe) = ctx.probe {
        let in_probed_panel = |zone: &DropZone| {
            zone.ancestry.panel_id.as_ref() == Some(&probe.panel_id)
                || (zone.role == ZoneRole::PanelSurface && zone.entity == probe.panel_id)
        };
        if candidates.iter().any(|zone| in_probed_panel(zone)) {
            candidates.retain(|zone| in_probed_panel(zone));
        }
    }

    if let Some(best) = select_best(role, pointer, &candidates) {
        return Some(ResolvedTarget::from_zone(best, pointer));
    }

    if let Some(previous) = sticky {
        #[cfg(feature = "tracing")]
        tracing::trace!("classifier gap: retaining sticky target");
        return Some(previous.clone());
    }

    nearest_acceptable(role, pointer, ctx.registry)
        .map(|zone| ResolvedTarget::from_zone(zone, pointer))
}

fn select_best<'a>(
    role: DragRole,
    pointer: Point,
    candidates: &[&'a DropZone],
) -> Option<&'a DropZone> {
    candidates
        .iter()
        .min_by(|a, b| {
            let rank_a = acceptance_rank(role, a.role).expect("candidates are pre-filtered");
            let rank_b = acceptance_rank(role, b.role).expect("candidates are pre-filtered");
            rank_a
                .cmp(&rank_b)
                .then_with(|| {
                    let da = a.bounds.center().distance_to(pointer);
                    let db = b.bounds.center().distance_to(pointer);
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        })
        .copied()
}

fn nearest_acceptable<'a>(
    role: DragRole,
    pointer: Point,
    registry: &'a ZoneRegistry,
) -> Option<&'a DropZone> {
    registry
        .iter()
        .filter(|zone| acceptance_rank(role, zone.role).is_some())
        .min_by(|a, b| {
            let da = a.bounds.center().distance_to(pointer);
            let db = b.bounds.center().distance_to(pointer);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        })
}
