#![forbid(unsafe_code)]

//! Browser host adapter for the Gridboard engine (host-driven,
//! deterministic).
//!
//! # Role in Gridboard
//! `gridboard-web` is the seam between browser pointer/drag events and the
//! pure engine. The JS host forwards lifecycle signals (pointer down/move/
//! up/cancel, blur, visibility, Escape) and frame ticks; the adapter
//! answers with state transitions, DOM commands (pointer capture,
//! window-listener scope), and structured log records. No DOM access
//! happens on this side of the boundary, which is what keeps the whole
//! engine testable without a browser.

pub mod pointer_capture;
pub mod transfer_intake;

pub use pointer_capture::{
    HostCommand, IgnoredReason, LifecyclePhase, LogOutcome, PointerButton, PointerCaptureAdapter,
    PointerCaptureConfig, PointerDispatch, PointerLogEntry,
};
pub use transfer_intake::{encode_payload, payload_from_transfer, transfer_slot_name};
