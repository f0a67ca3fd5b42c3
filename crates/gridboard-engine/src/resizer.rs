#![forbid(unsafe_code)]

//! Grid track resizer: pointer-captured column/row resizing.
//!
//! A narrower sibling of the drag session with only two phases:
//!
//! ```text
//! Idle -> Resizing -> Idle
//! ```
//!
//! Every pointer move applies an INCREMENTAL delta (since the last move,
//! not since the gesture start) to a live copy of the track and stays
//! local-only. Exactly one `ResizeTrack` commit happens per gesture, on
//! release — the two-step apply-then-emit contract shared with drops.
//! Cancelling discards the live track; the render layer falls back to the
//! authoritative sizes.

use gridboard_core::geometry::TrackAxis;
use gridboard_core::track::SizeTrack;
use serde::{Deserialize, Serialize};

use crate::commit::{CommitOutcome, CommitSinks, commit_resize};

/// Lifecycle phase of the resizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizerPhase {
    Idle,
    Resizing,
}

/// Direction for discrete (keyboard) resize steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeDirection {
    /// Grow the track before the split.
    Increase,
    /// Shrink the track before the split.
    Decrease,
}

/// Explicit no-op diagnostics for inputs arriving in the wrong phase or
/// naming an impossible split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizerNoopReason {
    AlreadyResizing,
    NotResizing,
    SplitOutOfRange,
    EmptyContainer,
}

/// Effect of one resizer operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizerEffect {
    Began {
        axis: TrackAxis,
        split_index: usize,
    },
    /// Live track updated locally; nothing was committed.
    Updated,
    Committed {
        outcome: CommitOutcome,
    },
    Cancelled,
    Noop {
        reason: ResizerNoopReason,
    },
}

/// One resizer transition record.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizerTransition {
    pub from: ResizerPhase,
    pub to: ResizerPhase,
    pub effect: ResizerEffect,
}

/// Pointer-captured resize machine for one track axis at a time.
///
/// Resize handles are mutually exclusive pointer captures, so no two
/// gestures can contend for the same instance.
#[derive(Debug, Clone)]
pub struct TrackResizer {
    phase: ResizerPhase,
    axis: TrackAxis,
    split_index: usize,
    container_px: f64,
    live: Option<SizeTrack>,
    last_coord: f64,
}

impl Default for TrackResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackResizer {
    /// Create an idle resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: ResizerPhase::Idle,
            axis: TrackAxis::Columns,
            split_index: 0,
            container_px: 0.0,
            live: None,
            last_coord: 0.0,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ResizerPhase {
        self.phase
    }

    /// Whether a gesture is in flight.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.phase, ResizerPhase::Resizing)
    }

    /// The live (uncommitted) track while resizing.
    #[must_use]
    pub fn live(&self) -> Option<&SizeTrack> {
        self.live.as_ref()
    }

    /// Start a resize gesture on the split between `split_index` and
    /// `split_index + 1`. `pointer_coord` is the pointer coordinate along
    /// the resized axis; `container_px` is the grid's extent on that axis.
    pub fn begin(
        &mut self,
        axis: TrackAxis,
        split_index: usize,
        track: SizeTrack,
        container_px: f64,
        pointer_coord: f64,
    ) -> ResizerTransition {
        let from = self.phase;
        if self.is_active() {
            debug_assert!(false, "begin() while a resize is already active");
            return self.noop(ResizerNoopReason::AlreadyResizing);
        }
        if split_index + 1 >= track.len() {
            debug_assert!(false, "resize split {split_index} out of range");
            return self.noop(ResizerNoopReason::SplitOutOfRange);
        }
        if container_px <= 0.0 {
            return self.noop(ResizerNoopReason::EmptyContainer);
        }

        self.phase = ResizerPhase::Resizing;
        self.axis = axis;
        self.split_index = split_index;
        self.container_px = container_px;
        self.live = Some(track);
        self.last_coord = pointer_coord;
        ResizerTransition {
            from,
            to: self.phase,
            effect: ResizerEffect::Began { axis, split_index },
        }
    }

    /// Apply the pointer's movement since the last update to the live
    /// track. Local-only; no commit happens here.
    pub fn update(&mut self, pointer_coord: f64) -> ResizerTransition {
        let from = self.phase;
        if !self.is_active() {
            debug_assert!(false, "update() outside an active resize");
            return self.noop(ResizerNoopReason::NotResizing);
        }
        let live = self.live.take().expect("resizing phase holds a track");

        let delta = pointer_coord - self.last_coord;
        self.last_coord = pointer_coord;
        self.live = Some(live.apply_resize_delta(self.split_index, delta, self.container_px));
        ResizerTransition {
            from,
            to: self.phase,
            effect: ResizerEffect::Updated,
        }
    }

    /// Release: commit the final track once and return to Idle.
    pub fn end(&mut self, sinks: &mut CommitSinks<'_>) -> ResizerTransition {
        let from = self.phase;
        if !self.is_active() {
            debug_assert!(false, "end() outside an active resize");
            return self.noop(ResizerNoopReason::NotResizing);
        }
        let live = self.live.take().expect("resizing phase holds a track");

        let outcome = commit_resize(self.axis, live.weights().to_vec(), sinks);
        #[cfg(feature = "tracing")]
        tracing::debug!(axis = ?self.axis, "track resize committed");
        self.reset();
        ResizerTransition {
            from,
            to: ResizerPhase::Idle,
            effect: ResizerEffect::Committed { outcome },
        }
    }

    /// Abort: discard the live track with no commit.
    pub fn cancel(&mut self) -> ResizerTransition {
        let from = self.phase;
        if !self.is_active() {
            return self.noop(ResizerNoopReason::NotResizing);
        }
        self.reset();
        ResizerTransition {
            from,
            to: ResizerPhase::Idle,
            effect: ResizerEffect::Cancelled,
        }
    }

    /// Discrete keyboard resize: one step, committed immediately.
    ///
    /// Rejected while a pointer gesture is active, mirroring how discrete
    /// input is disallowed mid-drag.
    pub fn nudge(
        &mut self,
        axis: TrackAxis,
        split_index: usize,
        track: &SizeTrack,
        container_px: f64,
        direction: ResizeDirection,
        step_px: f64,
        sinks: &mut CommitSinks<'_>,
    ) -> ResizerTransition {
        let from = self.phase;
        if self.is_active() {
            return self.noop(ResizerNoopReason::AlreadyResizing);
        }
        if split_index + 1 >= track.len() {
            return self.noop(ResizerNoopReason::SplitOutOfRange);
        }
        if container_px <= 0.0 {
            return self.noop(ResizerNoopReason::EmptyContainer);
        }

        let delta = match direction {
            ResizeDirection::Increase => step_px,
            ResizeDirection::Decrease => -step_px,
        };
        let resized = track.apply_resize_delta(split_index, delta, container_px);
        let outcome = commit_resize(axis, resized.weights().to_vec(), sinks);
        ResizerTransition {
            from,
            to: ResizerPhase::Idle,
            effect: ResizerEffect::Committed { outcome },
        }
    }

    fn reset(&mut self) {
        self.phase = ResizerPhase::Idle;
        self.live = None;
        self.container_px = 0.0;
        self.last_coord = 0.0;
    }

    fn noop(&self, reason: ResizerNoopReason) -> ResizerTransition {
        ResizerTransition {
            from: self.phase,
            to: self.phase,
            effect: ResizerEffect::Noop { reason },
        }
    }
}
