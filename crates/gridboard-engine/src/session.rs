#![forbid(unsafe_code)]

//! The drag session: one gesture's lifecycle, draft state, and projection.
//!
//! Exactly one [`DragSession`] exists per browser tab and at most one drag
//! gesture is active at a time. The render layer never mutates it; it reads
//! [`DragSession::projection`] and repaints.
//!
//! ```text
//! Idle -> Dragging -> Committing -> Idle
//!             \---------> Idle (cancel)
//! ```
//!
//! # Invariants
//!
//! 1. `begin` while a gesture is active is a programming error: it asserts
//!    in debug builds and is an explicit no-op in release, never silently
//!    replacing the in-flight gesture.
//! 2. `cancel` clears draft overrides and the hovered target synchronously,
//!    before the next frame can render, so a cancelled preview is never
//!    painted.
//! 3. A drop with no resolvable target behaves exactly like a cancel: no
//!    partial commit exists anywhere in the state space.
//! 4. The payload is immutable between `begin` and the gesture's end.

use gridboard_core::geometry::{Point, Rect};
use gridboard_core::payload::{DragPayload, DragRole, EntityId, SessionId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::classifier::{ClassifierCtx, Insertion, ResolvedTarget, resolve};
use crate::commit::{BoardView, CommitOutcome, CommitSinks, commit};
use crate::ordering::splice_order;

/// Lifecycle phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Dragging,
    Committing,
}

/// Why a drag was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    EscapeKey,
    PointerCancel,
    /// The pointer left the browser viewport during a native drag.
    ViewportLeft,
    Blur,
    VisibilityHidden,
    Programmatic,
}

/// Explicit no-op diagnostics for calls arriving in the wrong phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionNoopReason {
    AlreadyDragging,
    NotDragging,
}

/// Effect of one session operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    Began {
        target: Option<ResolvedTarget>,
    },
    Moved {
        target: Option<ResolvedTarget>,
    },
    Committed {
        outcome: CommitOutcome,
    },
    /// `drop` arrived with nothing under the pointer; treated as a cancel.
    DroppedWithoutTarget,
    Cancelled {
        reason: CancelReason,
    },
    Noop {
        reason: SessionNoopReason,
    },
}

/// One state transition with its effect, for telemetry and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionTransition {
    pub from: SessionPhase,
    pub to: SessionPhase,
    pub effect: SessionEffect,
}

/// Ghost-overlay placement tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GhostConfig {
    /// Offset from the pointer in pixels.
    pub offset_x: f64,
    pub offset_y: f64,
    /// Dimensions used when the payload snapshot carries none.
    pub fallback_width: f64,
    pub fallback_height: f64,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            offset_x: 12.0,
            offset_y: 12.0,
            fallback_width: 160.0,
            fallback_height: 48.0,
        }
    }
}

/// Read-only view the render layer paints from.
#[derive(Debug, Clone, PartialEq)]
pub struct DragProjection<'a> {
    pub phase: SessionPhase,
    pub pointer: Point,
    pub hovered: Option<&'a ResolvedTarget>,
    /// Ghost overlay rect, clamped into the viewport.
    pub ghost: Option<Rect>,
    /// Tentative per-container orders while the preview is live.
    pub draft: &'a FxHashMap<EntityId, Vec<EntityId>>,
}

/// The one-per-tab drag gesture owner.
#[derive(Debug)]
pub struct DragSession {
    local_session: SessionId,
    ghost: GhostConfig,
    phase: SessionPhase,
    payload: Option<DragPayload>,
    pointer: Point,
    hovered: Option<ResolvedTarget>,
    draft: FxHashMap<EntityId, Vec<EntityId>>,
}

impl DragSession {
    /// Create an idle session for this tab.
    #[must_use]
    pub fn new(local_session: SessionId) -> Self {
        Self::with_ghost_config(local_session, GhostConfig::default())
    }

    /// Create an idle session with explicit ghost tuning.
    #[must_use]
    pub fn with_ghost_config(local_session: SessionId, ghost: GhostConfig) -> Self {
        Self {
            local_session,
            ghost,
            phase: SessionPhase::Idle,
            payload: None,
            pointer: Point::default(),
            hovered: None,
            draft: FxHashMap::default(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether a gesture is in flight.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self.phase, SessionPhase::Idle)
    }

    /// The active payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&DragPayload> {
        self.payload.as_ref()
    }

    /// The last resolved drop target.
    #[must_use]
    pub fn hovered(&self) -> Option<&ResolvedTarget> {
        self.hovered.as_ref()
    }

    /// Tentative order for a container while its preview is live.
    #[must_use]
    pub fn draft_order(&self, container: &EntityId) -> Option<&[EntityId]> {
        self.draft.get(container).map(Vec::as_slice)
    }

    /// Start a gesture. Valid only from Idle.
    ///
    /// The hovered target is seeded synchronously so a highlight appears
    /// before the first move event arrives.
    pub fn begin(
        &mut self,
        payload: DragPayload,
        pointer: Point,
        ctx: &ClassifierCtx<'_>,
    ) -> SessionTransition {
        let from = self.phase;
        if self.is_active() {
            debug_assert!(false, "begin() while a drag is already active");
            return self.noop(SessionNoopReason::AlreadyDragging);
        }

        self.pointer = pointer;
        self.hovered = resolve(payload.role, pointer, ctx, None);
        self.payload = Some(payload);
        self.phase = SessionPhase::Dragging;
        #[cfg(feature = "tracing")]
        tracing::debug!(hovered = ?self.hovered, "drag session began");
        SessionTransition {
            from,
            to: self.phase,
            effect: SessionEffect::Began {
                target: self.hovered.clone(),
            },
        }
    }

    /// Feed a (frame-gated) pointer sample. Valid only while Dragging.
    pub fn update(
        &mut self,
        pointer: Point,
        ctx: &ClassifierCtx<'_>,
        board: &dyn BoardView,
    ) -> SessionTransition {
        let from = self.phase;
        if self.phase != SessionPhase::Dragging {
            debug_assert!(false, "update() outside an active drag");
            return self.noop(SessionNoopReason::NotDragging);
        }
        let role = self
            .payload
            .as_ref()
            .expect("dragging phase holds a payload")
            .role;

        self.pointer = pointer;
        self.hovered = resolve(role, pointer, ctx, self.hovered.as_ref());
        self.rebuild_draft(board);
        SessionTransition {
            from,
            to: self.phase,
            effect: SessionEffect::Moved {
                target: self.hovered.clone(),
            },
        }
    }

    /// Finish the gesture over the current target. Valid only while
    /// Dragging; with no resolvable target this cancels instead.
    pub fn commit_drop(
        &mut self,
        board: &dyn BoardView,
        sinks: &mut CommitSinks<'_>,
    ) -> SessionTransition {
        let from = self.phase;
        if self.phase != SessionPhase::Dragging {
            debug_assert!(false, "commit_drop() outside an active drag");
            return self.noop(SessionNoopReason::NotDragging);
        }

        let Some(target) = self.hovered.take() else {
            self.reset();
            return SessionTransition {
                from,
                to: SessionPhase::Idle,
                effect: SessionEffect::DroppedWithoutTarget,
            };
        };
        let payload = self.payload.take().expect("dragging phase holds a payload");

        self.phase = SessionPhase::Committing;
        let outcome = commit(&payload, &target, &self.local_session, board, sinks);
        #[cfg(feature = "tracing")]
        tracing::debug!(?outcome, "drag session committed");
        self.reset();
        SessionTransition {
            from,
            to: SessionPhase::Idle,
            effect: SessionEffect::Committed { outcome },
        }
    }

    /// Abort the gesture. Valid from Dragging or Committing; a stray cancel
    /// while Idle is a harmless no-op (Escape presses arrive at any time).
    pub fn cancel(&mut self, reason: CancelReason) -> SessionTransition {
        let from = self.phase;
        if !self.is_active() {
            return self.noop(SessionNoopReason::NotDragging);
        }
        self.reset();
        #[cfg(feature = "tracing")]
        tracing::debug!(?reason, "drag session cancelled");
        SessionTransition {
            from,
            to: SessionPhase::Idle,
            effect: SessionEffect::Cancelled { reason },
        }
    }

    /// Unconditionally reset to Idle, returning a transition if a gesture
    /// was active. Safety valve for RAII cleanup paths where a proper
    /// cancel signal cannot be constructed.
    pub fn force_cancel(&mut self) -> Option<SessionTransition> {
        if !self.is_active() {
            return None;
        }
        Some(self.cancel(CancelReason::Programmatic))
    }

    /// Read-only view for the render layer.
    #[must_use]
    pub fn projection(&self, viewport: Rect) -> DragProjection<'_> {
        DragProjection {
            phase: self.phase,
            pointer: self.pointer,
            hovered: self.hovered.as_ref(),
            ghost: self.ghost_rect(viewport),
            draft: &self.draft,
        }
    }

    /// Ghost overlay rect at the pointer, clamped into `viewport`.
    ///
    /// `None` while idle or when the overlay would fall fully outside the
    /// viewport.
    #[must_use]
    pub fn ghost_rect(&self, viewport: Rect) -> Option<Rect> {
        if self.phase != SessionPhase::Dragging {
            return None;
        }
        let payload = self.payload.as_ref()?;
        let width = payload.snapshot.width.unwrap_or(self.ghost.fallback_width);
        let height = payload.snapshot.height.unwrap_or(self.ghost.fallback_height);

        let x = (self.pointer.x + self.ghost.offset_x)
            .min(viewport.right() - width)
            .max(viewport.x);
        let y = (self.pointer.y + self.ghost.offset_y)
            .min(viewport.bottom() - height)
            .max(viewport.y);

        let rect = Rect::new(x, y, width.min(viewport.width), height.min(viewport.height));
        if rect.is_empty() { None } else { Some(rect) }
    }

    fn noop(&self, reason: SessionNoopReason) -> SessionTransition {
        SessionTransition {
            from: self.phase,
            to: self.phase,
            effect: SessionEffect::Noop { reason },
        }
    }

    fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.payload = None;
        self.hovered = None;
        self.draft.clear();
    }

    /// Rebuild the tentative-order preview for the hovered container (and
    /// the origin container it would vacate). Instance and Container roles
    /// only; the map is rebuilt from scratch each move so stale entries
    /// cannot outlive their frame.
    fn rebuild_draft(&mut self, board: &dyn BoardView) {
        self.draft.clear();
        let Some(payload) = &self.payload else {
            return;
        };
        if !matches!(payload.role, DragRole::Instance | DragRole::Container) {
            return;
        }
        let Some(target) = &self.hovered else {
            return;
        };
        let Some(destination) = target.list_parent(payload.role) else {
            return;
        };
        let insertion = match target {
            ResolvedTarget::Zone { insertion, .. } => insertion.unwrap_or(Insertion::Append),
            ResolvedTarget::Cell { .. } => return,
        };

        if let Some(current) = board.child_order(destination) {
            self.draft.insert(
                destination.clone(),
                splice_order(&current, &payload.id, insertion),
            );
        }

        let origin = match payload.role {
            DragRole::Instance => payload.origin.container_id.as_ref(),
            DragRole::Container => payload.origin.panel_id.as_ref(),
            _ => None,
        };
        if let Some(origin) = origin
            && origin != destination
            && let Some(current) = board.child_order(origin)
        {
            self.draft.insert(
                origin.clone(),
                current.into_iter().filter(|id| id != &payload.id).collect(),
            );
        }
    }
}
