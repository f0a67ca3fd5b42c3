#![forbid(unsafe_code)]

//! Commit protocol: exactly one mutation, exactly one broadcast per drop.
//!
//! Side-effect order is fixed: (a) the local optimistic mutation is applied
//! synchronously so the render layer reflects the change immediately, then
//! (b) one network event describing the same mutation is emitted
//! fire-and-forget. The engine never awaits, retries, or rolls back — a
//! failed emit is the transport layer's problem and full-state refresh is
//! the recovery path.
//!
//! Idempotence under retry holds because entity identity is fixed when the
//! payload is constructed at pointer-down, never minted here: replaying the
//! same commit names the same entity.

use std::fmt;

use gridboard_core::geometry::{GridCell, TrackAxis};
use gridboard_core::payload::{DragPayload, DragRole, EntityId, SessionId};
use serde::{Deserialize, Serialize};

use crate::classifier::{Insertion, ResolvedTarget};
use crate::ordering::splice_order;
use crate::zone::ZoneRole;

/// Read access to the board's current ordering, supplied by the state store.
pub trait BoardView {
    /// Ordered children of a parent: instances of a container, or
    /// containers of a panel. `None` when the parent is unknown.
    fn child_order(&self, parent: &EntityId) -> Option<Vec<EntityId>>;
}

/// A mutation's destination parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentRef {
    /// The grid surface, addressed by cell (panels only).
    GridCell { cell: GridCell },
    Panel { id: EntityId },
    Container { id: EntityId },
    /// The board root (where panels originate).
    Root,
}

/// Origin category of an externally-created entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    File,
    Text,
    Url,
    /// Cross-window transfer of an existing board entity.
    Transfer,
}

/// The state mutations this engine can commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mutation", rename_all = "snake_case")]
pub enum Mutation {
    MoveEntity {
        entity: EntityId,
        from: ParentRef,
        to: ParentRef,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },
    Reorder {
        parent: EntityId,
        ordered: Vec<EntityId>,
    },
    CreateFromExternal {
        /// Identity fixed at payload construction; reducers deduplicate on
        /// it so a retried commit cannot create a second entity.
        entity: EntityId,
        parent: ParentRef,
        source_kind: SourceKind,
        source_data: String,
    },
    ResizeTrack {
        axis: TrackAxis,
        sizes: Vec<f64>,
    },
}

/// One outbound broadcast message, named analogously to its mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEvent {
    pub name: &'static str,
    pub mutation: Mutation,
}

/// Local reducer entry point. Must apply synchronously.
pub trait StateSink {
    fn apply(&mut self, mutation: &Mutation);
}

/// Fire-and-forget broadcast channel. Implementations must not block; a
/// failed emit is swallowed (or surfaced through their own telemetry).
pub trait BroadcastChannel {
    fn emit(&self, event: &OutboundEvent);
}

/// The two collaborators every commit touches, in order.
pub struct CommitSinks<'a> {
    pub state: &'a mut dyn StateSink,
    pub broadcast: &'a dyn BroadcastChannel,
}

impl fmt::Debug for CommitSinks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitSinks").finish_non_exhaustive()
    }
}

/// Why a drop produced no mutation. The session treats every skip as a
/// cancellation: no partial commit is ever visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSkipReason {
    /// The payload role cannot land on the resolved target kind.
    IncompatibleTarget,
    /// The board view no longer knows the parent involved.
    UnknownParent,
}

/// Outcome of one commit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The mutation was applied locally and one event was emitted.
    Applied { event: &'static str },
    Skipped { reason: CommitSkipReason },
}

impl CommitOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Commit a drop: build the single mutation, apply it locally, emit once.
pub fn commit(
    payload: &DragPayload,
    target: &ResolvedTarget,
    local_session: &SessionId,
    board: &dyn BoardView,
    sinks: &mut CommitSinks<'_>,
) -> CommitOutcome {
    let mutation = match build_mutation(payload, target, local_session, board) {
        Ok(mutation) => mutation,
        Err(reason) => return CommitOutcome::Skipped { reason },
    };
    let event = event_name(payload.role, &mutation);
    dispatch(mutation, event, sinks);
    CommitOutcome::Applied { event }
}

/// Commit a finished track resize. Same two-step contract as drops.
pub fn commit_resize(axis: TrackAxis, sizes: Vec<f64>, sinks: &mut CommitSinks<'_>) -> CommitOutcome {
    dispatch(Mutation::ResizeTrack { axis, sizes }, "update_grid", sinks);
    CommitOutcome::Applied {
        event: "update_grid",
    }
}

fn dispatch(mutation: Mutation, event: &'static str, sinks: &mut CommitSinks<'_>) {
    // Local mutation strictly before the broadcast: the render layer must
    // reflect the change before the round-trip confirms it.
    sinks.state.apply(&mutation);
    #[cfg(feature = "tracing")]
    tracing::debug!(event, "drag commit applied; broadcasting");
    sinks.broadcast.emit(&OutboundEvent { name: event, mutation });
}

fn build_mutation(
    payload: &DragPayload,
    target: &ResolvedTarget,
    local_session: &SessionId,
    board: &dyn BoardView,
) -> Result<Mutation, CommitSkipReason> {
    let cross_window = payload.source_session != *local_session;
    if cross_window || payload.role.is_external() {
        // The origin window retains no reference we could reparent, so a
        // cross-window drop always materializes a new entity here.
        return Ok(Mutation::CreateFromExternal {
            entity: payload.id.clone(),
            parent: target_parent(target)?,
            source_kind: source_kind(payload.role),
            source_data: payload.snapshot.label.clone(),
        });
    }

    match (payload.role, target) {
        (DragRole::Panel, ResolvedTarget::Cell { cell }) => Ok(Mutation::MoveEntity {
            entity: payload.id.clone(),
            from: ParentRef::Root,
            to: ParentRef::GridCell { cell: *cell },
            position: None,
        }),
        (DragRole::Panel, ResolvedTarget::Zone { .. }) => Err(CommitSkipReason::IncompatibleTarget),
        (DragRole::Instance, ResolvedTarget::Zone { role, entity, insertion, .. }) => {
            match target.list_parent(DragRole::Instance) {
                Some(container) => move_or_reorder(
                    payload,
                    container.clone(),
                    payload.origin.container_id.as_ref(),
                    *insertion,
                    board,
                ),
                // Empty panel space: the reducer materializes a container.
                None if *role == ZoneRole::PanelSurface => Ok(Mutation::MoveEntity {
                    entity: payload.id.clone(),
                    from: origin_parent(payload),
                    to: ParentRef::Panel { id: entity.clone() },
                    position: None,
                }),
                None => Err(CommitSkipReason::IncompatibleTarget),
            }
        }
        (DragRole::Container, ResolvedTarget::Zone { insertion, .. }) => {
            match target.list_parent(DragRole::Container) {
                Some(panel) => move_or_reorder(
                    payload,
                    panel.clone(),
                    payload.origin.panel_id.as_ref(),
                    *insertion,
                    board,
                ),
                None => Err(CommitSkipReason::IncompatibleTarget),
            }
        }
        (DragRole::Instance | DragRole::Container, ResolvedTarget::Cell { .. }) => {
            Err(CommitSkipReason::IncompatibleTarget)
        }
        // External payloads already took the create path above.
        (DragRole::File | DragRole::Text | DragRole::Url, _) => {
            Err(CommitSkipReason::IncompatibleTarget)
        }
    }
}

/// Same parent ⇒ one `Reorder`; different parent ⇒ one `MoveEntity`.
/// Never both — scenario "remove from C1 and add to C2" is a single
/// mutation.
fn move_or_reorder(
    payload: &DragPayload,
    destination: EntityId,
    origin: Option<&EntityId>,
    insertion: Option<Insertion>,
    board: &dyn BoardView,
) -> Result<Mutation, CommitSkipReason> {
    let insertion = insertion.unwrap_or(Insertion::Append);
    if origin == Some(&destination) {
        let current = board
            .child_order(&destination)
            .ok_or(CommitSkipReason::UnknownParent)?;
        Ok(Mutation::Reorder {
            parent: destination,
            ordered: splice_order(&current, &payload.id, insertion),
        })
    } else {
        let to = match payload.role {
            DragRole::Instance => ParentRef::Container { id: destination },
            _ => ParentRef::Panel { id: destination },
        };
        Ok(Mutation::MoveEntity {
            entity: payload.id.clone(),
            from: origin_parent(payload),
            to,
            position: insertion.resolved_index(),
        })
    }
}

fn origin_parent(payload: &DragPayload) -> ParentRef {
    match payload.role {
        DragRole::Instance => match &payload.origin.container_id {
            Some(id) => ParentRef::Container { id: id.clone() },
            None => ParentRef::Root,
        },
        DragRole::Container => match &payload.origin.panel_id {
            Some(id) => ParentRef::Panel { id: id.clone() },
            None => ParentRef::Root,
        },
        _ => ParentRef::Root,
    }
}

fn target_parent(target: &ResolvedTarget) -> Result<ParentRef, CommitSkipReason> {
    match target {
        ResolvedTarget::Cell { cell } => Ok(ParentRef::GridCell { cell: *cell }),
        ResolvedTarget::Zone { role, entity, ancestry, .. } => match role {
            ZoneRole::PanelSurface => Ok(ParentRef::Panel { id: entity.clone() }),
            ZoneRole::ContainerList => Ok(ParentRef::Container { id: entity.clone() }),
            ZoneRole::InstanceSlot => ancestry
                .container_id
                .clone()
                .map(|id| ParentRef::Container { id })
                .ok_or(CommitSkipReason::IncompatibleTarget),
            ZoneRole::ContainerSlot => ancestry
                .panel_id
                .clone()
                .map(|id| ParentRef::Panel { id })
                .ok_or(CommitSkipReason::IncompatibleTarget),
            ZoneRole::GridCell => Err(CommitSkipReason::IncompatibleTarget),
        },
    }
}

fn source_kind(role: DragRole) -> SourceKind {
    match role {
        DragRole::File => SourceKind::File,
        DragRole::Text => SourceKind::Text,
        DragRole::Url => SourceKind::Url,
        DragRole::Panel | DragRole::Container | DragRole::Instance => SourceKind::Transfer,
    }
}

fn event_name(role: DragRole, mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::CreateFromExternal { .. } => "create_instance",
        Mutation::ResizeTrack { .. } => "update_grid",
        Mutation::MoveEntity { .. } | Mutation::Reorder { .. } => match role {
            DragRole::Panel => "update_panel",
            DragRole::Container => "update_container",
            _ => "update_instance",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::payload::{Ancestry, PayloadSnapshot};
    use rustc_hash::FxHashMap;
    use std::cell::RefCell;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub applied: Vec<Mutation>,
    }

    impl StateSink for RecordingSink {
        fn apply(&mut self, mutation: &Mutation) {
            self.applied.push(mutation.clone());
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingChannel {
        pub emitted: RefCell<Vec<OutboundEvent>>,
    }

    impl BroadcastChannel for RecordingChannel {
        fn emit(&self, event: &OutboundEvent) {
            self.emitted.borrow_mut().push(event.clone());
        }
    }

    pub(crate) struct FakeBoard {
        pub orders: FxHashMap<EntityId, Vec<EntityId>>,
    }

    impl BoardView for FakeBoard {
        fn child_order(&self, parent: &EntityId) -> Option<Vec<EntityId>> {
            self.orders.get(parent).cloned()
        }
    }

    fn instance_payload(session: &str) -> DragPayload {
        DragPayload::instance(
            EntityId::from("inst-1"),
            EntityId::from("panel-1"),
            EntityId::from("c1"),
            PayloadSnapshot::labeled("Revenue"),
            SessionId::new(session),
        )
    }

    fn board_with_c1() -> FakeBoard {
        let mut orders = FxHashMap::default();
        orders.insert(
            EntityId::from("c1"),
            vec![
                EntityId::from("inst-0"),
                EntityId::from("inst-1"),
                EntityId::from("inst-2"),
            ],
        );
        FakeBoard { orders }
    }

    fn slot_target(container: &str, insertion: Insertion) -> ResolvedTarget {
        ResolvedTarget::Zone {
            zone: crate::zone::ZoneId::new(7).expect("id"),
            role: ZoneRole::InstanceSlot,
            entity: EntityId::from("inst-9"),
            ancestry: Ancestry::in_container(EntityId::from("panel-1"), EntityId::from(container)),
            insertion: Some(insertion),
        }
    }

    #[test]
    fn same_container_drop_is_a_single_reorder() {
        let payload = instance_payload("tab-a");
        let board = board_with_c1();
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit(
            &payload,
            &slot_target("c1", Insertion::After(2)),
            &SessionId::new("tab-a"),
            &board,
            &mut sinks,
        );

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                event: "update_instance"
            }
        );
        assert_eq!(state.applied.len(), 1);
        assert_eq!(channel.emitted.borrow().len(), 1);
        let Mutation::Reorder { parent, ordered } = &state.applied[0] else {
            panic!("expected reorder, got {:?}", state.applied[0]);
        };
        assert_eq!(parent, &EntityId::from("c1"));
        assert_eq!(
            ordered,
            &vec![
                EntityId::from("inst-0"),
                EntityId::from("inst-2"),
                EntityId::from("inst-1"),
            ]
        );
    }

    #[test]
    fn cross_container_drop_is_a_single_move() {
        let payload = instance_payload("tab-a");
        let board = board_with_c1();
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit(
            &payload,
            &slot_target("c2", Insertion::Before(0)),
            &SessionId::new("tab-a"),
            &board,
            &mut sinks,
        );

        assert!(outcome.is_applied());
        assert_eq!(state.applied.len(), 1);
        let Mutation::MoveEntity { from, to, position, .. } = &state.applied[0] else {
            panic!("expected move, got {:?}", state.applied[0]);
        };
        assert_eq!(from, &ParentRef::Container { id: EntityId::from("c1") });
        assert_eq!(to, &ParentRef::Container { id: EntityId::from("c2") });
        assert_eq!(*position, Some(0));
    }

    #[test]
    fn cross_window_drop_creates_instead_of_moving() {
        let payload = instance_payload("tab-other");
        let board = board_with_c1();
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit(
            &payload,
            &slot_target("c1", Insertion::Append),
            &SessionId::new("tab-a"),
            &board,
            &mut sinks,
        );

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                event: "create_instance"
            }
        );
        let Mutation::CreateFromExternal { entity, source_kind, .. } = &state.applied[0] else {
            panic!("expected create, got {:?}", state.applied[0]);
        };
        assert_eq!(entity, &EntityId::from("inst-1"));
        assert_eq!(*source_kind, SourceKind::Transfer);
    }

    #[test]
    fn panel_drop_targets_grid_cell() {
        let payload = DragPayload::panel(
            EntityId::from("panel-3"),
            PayloadSnapshot::labeled("Stats"),
            SessionId::new("tab-a"),
        );
        let board = FakeBoard {
            orders: FxHashMap::default(),
        };
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit(
            &payload,
            &ResolvedTarget::Cell {
                cell: GridCell::new(1, 2),
            },
            &SessionId::new("tab-a"),
            &board,
            &mut sinks,
        );

        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                event: "update_panel"
            }
        );
        let Mutation::MoveEntity { to, .. } = &state.applied[0] else {
            panic!("expected move, got {:?}", state.applied[0]);
        };
        assert_eq!(
            to,
            &ParentRef::GridCell {
                cell: GridCell::new(1, 2)
            }
        );
    }

    #[test]
    fn unknown_parent_skips_without_side_effects() {
        let payload = instance_payload("tab-a");
        let board = FakeBoard {
            orders: FxHashMap::default(),
        };
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit(
            &payload,
            &slot_target("c1", Insertion::Append),
            &SessionId::new("tab-a"),
            &board,
            &mut sinks,
        );

        assert_eq!(
            outcome,
            CommitOutcome::Skipped {
                reason: CommitSkipReason::UnknownParent
            }
        );
        assert!(state.applied.is_empty());
        assert!(channel.emitted.borrow().is_empty());
    }

    #[test]
    fn mutation_wire_shape_is_snake_case_tagged() {
        let mutation = Mutation::ResizeTrack {
            axis: TrackAxis::Columns,
            sizes: vec![1.5, 0.5, 1.0],
        };
        let json = serde_json::to_value(&mutation).expect("serializes");
        assert_eq!(json["mutation"], "resize_track");
        assert_eq!(json["axis"], "columns");

        let mutation = Mutation::MoveEntity {
            entity: EntityId::from("i1"),
            from: ParentRef::Container {
                id: EntityId::from("c1"),
            },
            to: ParentRef::GridCell {
                cell: GridCell::new(1, 2),
            },
            position: None,
        };
        let json = serde_json::to_value(&mutation).expect("serializes");
        assert_eq!(json["mutation"], "move_entity");
        assert_eq!(json["from"]["kind"], "container");
        assert_eq!(json["to"]["cell"]["row"], 1);
        assert!(json.get("position").is_none(), "skipped when absent");
    }

    #[test]
    fn resize_commit_emits_update_grid() {
        let mut state = RecordingSink::default();
        let channel = RecordingChannel::default();
        let mut sinks = CommitSinks {
            state: &mut state,
            broadcast: &channel,
        };

        let outcome = commit_resize(TrackAxis::Columns, vec![1.5, 0.5, 1.0], &mut sinks);
        assert_eq!(
            outcome,
            CommitOutcome::Applied {
                event: "update_grid"
            }
        );
        assert_eq!(channel.emitted.borrow()[0].name, "update_grid");
    }
}
