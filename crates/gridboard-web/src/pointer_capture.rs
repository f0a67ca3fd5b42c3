#![forbid(unsafe_code)]

//! Deterministic browser pointer-capture adapter for drag and resize.
//!
//! This module bridges browser pointer lifecycle signals into
//! [`DragSession`] / [`TrackResizer`] calls while enforcing:
//! - one active pointer at a time,
//! - explicit capture and window-listener commands for the JS host, and
//! - cancellation on every interruption path (escape, blur,
//!   visibility-hidden, pointer-cancel, viewport leave).
//!
//! Raw pointer moves are only STORED here ([`FrameGate`], latest wins); the
//! classifier runs once per animation frame from [`frame_tick`]. The
//! costlier topmost-element DOM probe refreshes behind its own ~80 ms gate
//! ([`probe_refresh_due`]).
//!
//! Listener handling is scoped acquisition: the dispatch for a successful
//! pointer-down carries [`HostCommand::AttachWindowListeners`], and every
//! exit path funnels through one internal helper that always emits the
//! matching [`HostCommand::DetachWindowListeners`] — cleanup cannot be
//! skipped by any individual code path.
//!
//! [`frame_tick`]: PointerCaptureAdapter::frame_tick
//! [`probe_refresh_due`]: PointerCaptureAdapter::probe_refresh_due

use gridboard_core::gate::{FrameGate, MinIntervalGate};
use gridboard_core::geometry::{Point, TrackAxis};
use gridboard_core::payload::{DragPayload, SessionId};
use gridboard_core::track::SizeTrack;
use gridboard_engine::classifier::{ClassifierCtx, ElementProbe, GridSnapshot};
use gridboard_engine::commit::{BoardView, CommitSinks};
use gridboard_engine::resizer::{ResizerEffect, ResizerTransition, TrackResizer};
use gridboard_engine::session::{CancelReason, DragSession, SessionEffect, SessionTransition};
use gridboard_engine::zone::ZoneRegistry;
use std::time::Duration;
use web_time::Instant;

/// Browser pointer button, normalized from `PointerEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
}

/// Adapter configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerCaptureConfig {
    /// Button required to begin a gesture.
    pub activation_button: PointerButton,
    /// Whether leaving the viewport cancels an in-flight drag.
    pub cancel_on_viewport_leave: bool,
    /// Floor between element-probe refreshes.
    pub probe_interval: Duration,
}

impl Default for PointerCaptureConfig {
    fn default() -> Self {
        Self {
            activation_button: PointerButton::Primary,
            cancel_on_viewport_leave: true,
            probe_interval: gridboard_core::gate::DEFAULT_PROBE_INTERVAL,
        }
    }
}

/// Command the host must execute against the DOM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    /// Call `setPointerCapture(pointer_id)` on the gesture's element.
    AcquireCapture { pointer_id: u32 },
    /// Call `releasePointerCapture(pointer_id)`.
    ReleaseCapture { pointer_id: u32 },
    /// Attach the window-level move/up/cancel/blur/key listeners.
    AttachWindowListeners,
    /// Detach them. Paired with every attach, on every exit path.
    DetachWindowListeners,
}

/// Lifecycle phase recorded for one adapter dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    PointerDown,
    PointerMove,
    FrameTick,
    PointerUp,
    PointerCancel,
    ViewportLeave,
    Blur,
    VisibilityHidden,
    EscapeKey,
    CaptureAcquired,
}

/// Why an incoming lifecycle signal was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    ButtonNotAllowed,
    ActivePointerAlreadyInProgress,
    NoActivePointer,
    PointerMismatch,
    LeaveCancellationDisabled,
}

/// Outcome category for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutcome {
    Forwarded,
    CaptureStateUpdated,
    Ignored(IgnoredReason),
}

/// Structured lifecycle record for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerLogEntry {
    pub phase: LifecyclePhase,
    pub sequence: u64,
    pub pointer_id: Option<u32>,
    pub outcome: LogOutcome,
}

/// Result of one lifecycle dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerDispatch {
    pub session: Option<SessionTransition>,
    pub resizer: Option<ResizerTransition>,
    pub commands: Vec<HostCommand>,
    pub log: PointerLogEntry,
}

impl PointerDispatch {
    fn ignored(log: PointerLogEntry) -> Self {
        Self {
            session: None,
            resizer: None,
            commands: Vec::new(),
            log,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Requested,
    Acquired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureMode {
    Drag,
    Resize { axis: TrackAxis },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActivePointer {
    pointer_id: u32,
    mode: GestureMode,
    capture: CaptureState,
}

/// Host-driven pointer-capture adapter owning the tab's drag session and
/// track resizer.
#[derive(Debug)]
pub struct PointerCaptureAdapter {
    config: PointerCaptureConfig,
    session: DragSession,
    resizer: TrackResizer,
    active: Option<ActivePointer>,
    move_gate: FrameGate<Point>,
    probe_gate: MinIntervalGate,
    probe: Option<ElementProbe>,
    next_sequence: u64,
}

impl PointerCaptureAdapter {
    /// Create an adapter for this tab.
    #[must_use]
    pub fn new(local_session: SessionId, config: PointerCaptureConfig) -> Self {
        Self {
            config,
            session: DragSession::new(local_session),
            resizer: TrackResizer::new(),
            active: None,
            move_gate: FrameGate::new(),
            probe_gate: MinIntervalGate::new(config.probe_interval),
            probe: None,
            next_sequence: 1,
        }
    }

    /// The tab's drag session, for projection reads.
    #[must_use]
    pub fn session(&self) -> &DragSession {
        &self.session
    }

    /// The tab's track resizer, for live-track reads.
    #[must_use]
    pub fn resizer(&self) -> &TrackResizer {
        &self.resizer
    }

    /// Active pointer id, if a gesture is in flight.
    #[must_use]
    pub fn active_pointer_id(&self) -> Option<u32> {
        self.active.map(|active| active.pointer_id)
    }

    /// Begin a drag gesture from pointer-down on a draggable element.
    ///
    /// The payload must be constructed by the host at this moment; it stays
    /// immutable for the whole gesture.
    pub fn drag_pointer_down(
        &mut self,
        pointer_id: u32,
        button: PointerButton,
        payload: DragPayload,
        position: Point,
        registry: &ZoneRegistry,
        grid: GridSnapshot<'_>,
    ) -> PointerDispatch {
        let Some(log) = self.admit_pointer_down(pointer_id, button) else {
            return self.rejected_pointer_down(pointer_id, button);
        };

        let ctx = ClassifierCtx {
            registry,
            grid,
            probe: self.probe.as_ref(),
        };
        let transition = self.session.begin(payload, position, &ctx);
        let commands = if matches!(transition.effect, SessionEffect::Began { .. }) {
            self.arm(pointer_id, GestureMode::Drag);
            vec![
                HostCommand::AcquireCapture { pointer_id },
                HostCommand::AttachWindowListeners,
            ]
        } else {
            Vec::new()
        };
        PointerDispatch {
            session: Some(transition),
            resizer: None,
            commands,
            log,
        }
    }

    /// Begin a track-resize gesture from pointer-down on a resize handle.
    pub fn resize_pointer_down(
        &mut self,
        pointer_id: u32,
        button: PointerButton,
        axis: TrackAxis,
        split_index: usize,
        track: SizeTrack,
        container_px: f64,
        position: Point,
    ) -> PointerDispatch {
        let Some(log) = self.admit_pointer_down(pointer_id, button) else {
            return self.rejected_pointer_down(pointer_id, button);
        };

        let coord = axis_coord(axis, position);
        let transition = self
            .resizer
            .begin(axis, split_index, track, container_px, coord);
        let commands = if matches!(transition.effect, ResizerEffect::Began { .. }) {
            self.arm(pointer_id, GestureMode::Resize { axis });
            vec![
                HostCommand::AcquireCapture { pointer_id },
                HostCommand::AttachWindowListeners,
            ]
        } else {
            Vec::new()
        };
        PointerDispatch {
            session: None,
            resizer: Some(transition),
            commands,
            log,
        }
    }

    /// Mark browser pointer capture as acquired.
    pub fn capture_acquired(&mut self, pointer_id: u32) -> PointerDispatch {
        let sequence = self.next_sequence();
        let Some(mut active) = self.active else {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::CaptureAcquired,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::NoActivePointer),
            });
        };
        if active.pointer_id != pointer_id {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::CaptureAcquired,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::PointerMismatch),
            });
        }
        active.capture = CaptureState::Acquired;
        self.active = Some(active);
        PointerDispatch {
            session: None,
            resizer: None,
            commands: Vec::new(),
            log: PointerLogEntry {
                phase: LifecyclePhase::CaptureAcquired,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::CaptureStateUpdated,
            },
        }
    }

    /// Store a raw pointer move. Latest wins; classification is deferred to
    /// [`frame_tick`](Self::frame_tick).
    pub fn pointer_move(&mut self, pointer_id: u32, position: Point) -> PointerDispatch {
        let sequence = self.next_sequence();
        let Some(active) = self.active else {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::PointerMove,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::NoActivePointer),
            });
        };
        if active.pointer_id != pointer_id {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::PointerMove,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::PointerMismatch),
            });
        }

        self.move_gate.submit(position);
        PointerDispatch {
            session: None,
            resizer: None,
            commands: Vec::new(),
            log: PointerLogEntry {
                phase: LifecyclePhase::PointerMove,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Forwarded,
            },
        }
    }

    /// Run the gated pointer sample for this animation frame, if any.
    ///
    /// Call once from the host's `requestAnimationFrame` callback with a
    /// monotonically increasing frame id.
    pub fn frame_tick(
        &mut self,
        frame_id: u64,
        registry: &ZoneRegistry,
        grid: GridSnapshot<'_>,
        board: &dyn BoardView,
    ) -> Option<PointerDispatch> {
        let position = self.move_gate.take(frame_id)?;
        let active = self.active?;
        let sequence = self.next_sequence();

        let (session, resizer) = match active.mode {
            GestureMode::Drag => {
                let ctx = ClassifierCtx {
                    registry,
                    grid,
                    probe: self.probe.as_ref(),
                };
                (Some(self.session.update(position, &ctx, board)), None)
            }
            GestureMode::Resize { axis } => (
                None,
                Some(self.resizer.update(axis_coord(axis, position))),
            ),
        };
        Some(PointerDispatch {
            session,
            resizer,
            commands: Vec::new(),
            log: PointerLogEntry {
                phase: LifecyclePhase::FrameTick,
                sequence,
                pointer_id: Some(active.pointer_id),
                outcome: LogOutcome::Forwarded,
            },
        })
    }

    /// Whether the host should re-run the topmost-element DOM query now.
    pub fn probe_refresh_due(&mut self, now: Instant) -> bool {
        self.session.is_active() && self.probe_gate.try_pass(now)
    }

    /// Install the latest element-probe result (or clear it).
    pub fn set_probe(&mut self, probe: Option<ElementProbe>) {
        self.probe = probe;
    }

    /// Finish the gesture on pointer-up: drop-commit or resize-commit.
    pub fn pointer_up(
        &mut self,
        pointer_id: u32,
        board: &dyn BoardView,
        sinks: &mut CommitSinks<'_>,
    ) -> PointerDispatch {
        let sequence = self.next_sequence();
        let Some(active) = self.active else {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::PointerUp,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::NoActivePointer),
            });
        };
        if active.pointer_id != pointer_id {
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::PointerUp,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Ignored(IgnoredReason::PointerMismatch),
            });
        }

        let (session, resizer) = match active.mode {
            GestureMode::Drag => (Some(self.session.commit_drop(board, sinks)), None),
            GestureMode::Resize { .. } => (None, Some(self.resizer.end(sinks))),
        };
        let commands = self.end_gesture(active);
        PointerDispatch {
            session,
            resizer,
            commands,
            log: PointerLogEntry {
                phase: LifecyclePhase::PointerUp,
                sequence,
                pointer_id: Some(pointer_id),
                outcome: LogOutcome::Forwarded,
            },
        }
    }

    /// Browser `pointercancel`.
    pub fn pointer_cancel(&mut self, pointer_id: u32) -> PointerDispatch {
        self.cancel_active(
            LifecyclePhase::PointerCancel,
            Some(pointer_id),
            CancelReason::PointerCancel,
        )
    }

    /// The pointer left the browser viewport during a native drag.
    pub fn viewport_leave(&mut self) -> PointerDispatch {
        if !self.config.cancel_on_viewport_leave {
            let sequence = self.next_sequence();
            return PointerDispatch::ignored(PointerLogEntry {
                phase: LifecyclePhase::ViewportLeave,
                sequence,
                pointer_id: self.active_pointer_id(),
                outcome: LogOutcome::Ignored(IgnoredReason::LeaveCancellationDisabled),
            });
        }
        self.cancel_active(LifecyclePhase::ViewportLeave, None, CancelReason::ViewportLeft)
    }

    /// Window blur.
    pub fn blur(&mut self) -> PointerDispatch {
        self.cancel_active(LifecyclePhase::Blur, None, CancelReason::Blur)
    }

    /// `document.visibilityState === "hidden"`.
    pub fn visibility_hidden(&mut self) -> PointerDispatch {
        self.cancel_active(
            LifecyclePhase::VisibilityHidden,
            None,
            CancelReason::VisibilityHidden,
        )
    }

    /// Escape key pressed.
    pub fn escape_key(&mut self) -> PointerDispatch {
        self.cancel_active(LifecyclePhase::EscapeKey, None, CancelReason::EscapeKey)
    }

    /// Unconditional cleanup for teardown paths. Always returns the
    /// listener-detach (and capture-release) commands when a gesture was
    /// active.
    pub fn force_cancel(&mut self) -> Option<PointerDispatch> {
        self.active?;
        Some(self.cancel_active(
            LifecyclePhase::PointerCancel,
            None,
            CancelReason::Programmatic,
        ))
    }

    fn cancel_active(
        &mut self,
        phase: LifecyclePhase,
        pointer_id: Option<u32>,
        reason: CancelReason,
    ) -> PointerDispatch {
        let sequence = self.next_sequence();
        let Some(active) = self.active else {
            return PointerDispatch::ignored(PointerLogEntry {
                phase,
                sequence,
                pointer_id,
                outcome: LogOutcome::Ignored(IgnoredReason::NoActivePointer),
            });
        };
        if let Some(id) = pointer_id
            && id != active.pointer_id
        {
            return PointerDispatch::ignored(PointerLogEntry {
                phase,
                sequence,
                pointer_id: Some(id),
                outcome: LogOutcome::Ignored(IgnoredReason::PointerMismatch),
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(?phase, ?reason, "pointer gesture interrupted");
        let (session, resizer) = match active.mode {
            GestureMode::Drag => (Some(self.session.cancel(reason)), None),
            GestureMode::Resize { .. } => (None, Some(self.resizer.cancel())),
        };
        let commands = self.end_gesture(active);
        PointerDispatch {
            session,
            resizer,
            commands,
            log: PointerLogEntry {
                phase,
                sequence,
                pointer_id: Some(active.pointer_id),
                outcome: LogOutcome::Forwarded,
            },
        }
    }

    /// The single funnel every gesture exit takes: clears pointer state,
    /// discards gated input, and emits the paired teardown commands.
    fn end_gesture(&mut self, active: ActivePointer) -> Vec<HostCommand> {
        self.active = None;
        self.move_gate.clear();
        self.probe = None;
        self.probe_gate.reset();

        let mut commands = Vec::with_capacity(2);
        if active.capture == CaptureState::Acquired {
            commands.push(HostCommand::ReleaseCapture {
                pointer_id: active.pointer_id,
            });
        }
        commands.push(HostCommand::DetachWindowListeners);
        commands
    }

    fn admit_pointer_down(
        &mut self,
        pointer_id: u32,
        button: PointerButton,
    ) -> Option<PointerLogEntry> {
        if button != self.config.activation_button || self.active.is_some() {
            return None;
        }
        Some(PointerLogEntry {
            phase: LifecyclePhase::PointerDown,
            sequence: self.next_sequence(),
            pointer_id: Some(pointer_id),
            outcome: LogOutcome::Forwarded,
        })
    }

    fn rejected_pointer_down(&mut self, pointer_id: u32, button: PointerButton) -> PointerDispatch {
        let reason = if button != self.config.activation_button {
            IgnoredReason::ButtonNotAllowed
        } else {
            IgnoredReason::ActivePointerAlreadyInProgress
        };
        let sequence = self.next_sequence();
        PointerDispatch::ignored(PointerLogEntry {
            phase: LifecyclePhase::PointerDown,
            sequence,
            pointer_id: Some(pointer_id),
            outcome: LogOutcome::Ignored(reason),
        })
    }

    fn arm(&mut self, pointer_id: u32, mode: GestureMode) {
        self.active = Some(ActivePointer {
            pointer_id,
            mode,
            capture: CaptureState::Requested,
        });
    }

    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        sequence
    }
}

fn axis_coord(axis: TrackAxis, position: Point) -> f64 {
    match axis {
        TrackAxis::Columns => position.x,
        TrackAxis::Rows => position.y,
    }
}
