#![forbid(unsafe_code)]

//! Engine: drop-target classification, drag session, and commit protocol.
//!
//! # Role in Gridboard
//! `gridboard-engine` owns everything between a classified pointer and a
//! committed mutation: the registry of mounted drop zones, the pure hit
//! classifier with its anti-flicker rules, the one-per-tab drag session
//! state machine with draft previews, the apply-then-emit commit protocol,
//! and the grid track resizer.
//!
//! # How it fits in the system
//! The web adapter (`gridboard-web`) drives [`DragSession`] and
//! [`TrackResizer`] from browser pointer lifecycle signals. The state store
//! and socket transport sit behind the [`StateSink`] and
//! [`BroadcastChannel`] traits; remote-origin mutations go straight to the
//! reducer and never re-enter the session.

pub mod classifier;
pub mod commit;
pub mod ordering;
pub mod resizer;
pub mod session;
pub mod zone;

pub use classifier::{
    ClassifierCtx, ElementProbe, GridSnapshot, Insertion, ResolvedTarget, resolve,
};
pub use commit::{
    BoardView, BroadcastChannel, CommitOutcome, CommitSinks, CommitSkipReason, Mutation,
    OutboundEvent, ParentRef, SourceKind, StateSink, commit, commit_resize,
};
pub use resizer::{
    ResizeDirection, ResizerEffect, ResizerNoopReason, ResizerPhase, ResizerTransition,
    TrackResizer,
};
pub use session::{
    CancelReason, DragProjection, DragSession, GhostConfig, SessionEffect, SessionNoopReason,
    SessionPhase, SessionTransition,
};
pub use zone::{DropZone, ZoneId, ZoneRegistry, ZoneRole};
