#![forbid(unsafe_code)]

//! Core: geometry, size tracks, payloads, transfer codec, and input gating.
//!
//! # Role in Gridboard
//! `gridboard-core` is the data layer of the drag-and-drop coordination
//! engine. It owns the pure geometry used to map pointers onto grid cells,
//! the weighted size tracks behind resizable columns/rows, the immutable
//! drag payload model, the versioned cross-window transfer codec, and the
//! gating primitives that keep pointer-move handling at frame cadence.
//!
//! # How it fits in the system
//! The engine crate (`gridboard-engine`) consumes these types to classify
//! drop targets and run the drag/resize state machines. The web adapter
//! (`gridboard-web`) feeds browser pointer lifecycle data through the gates
//! and the transfer codec. Nothing in this crate touches the DOM or blocks.

pub mod gate;
pub mod geometry;
pub mod payload;
pub mod track;
pub mod transfer;

pub use gate::{DEFAULT_PROBE_INTERVAL, FrameGate, MinIntervalGate};
pub use geometry::{GridCell, Point, Rect, TrackAxis};
pub use payload::{Ancestry, DragPayload, DragRole, EntityId, PayloadSnapshot, SessionId};
pub use track::{MIN_TRACK_WEIGHT, SizeTrack, TrackError, cell_from_point};
pub use transfer::{
    FileStub, NativeTransfer, TRANSFER_SCHEMA_VERSION, TRANSFER_SLOT, TransferDecode,
    TransferEnvelope, TransferEnvelopeError, TransferSlots,
};
