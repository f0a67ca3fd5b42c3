#![forbid(unsafe_code)]

//! Input gating for high-frequency pointer handling.
//!
//! Browsers deliver pointer moves far faster than frames are painted.
//! Without gating, every move would run the hit classifier and re-render
//! the highlight, causing lag under rapid movement.
//!
//! Two primitives:
//! - [`FrameGate`]: latest-wins sample storage that admits at most one
//!   sample per animation frame. Hosts `submit` every raw move and `take`
//!   once from their frame callback.
//! - [`MinIntervalGate`]: a wall-clock floor for disproportionately costly
//!   queries (the topmost-element DOM probe), independent of the frame
//!   gate. Uses `web_time::Instant` so it works on wasm targets.

use std::time::Duration;

use web_time::Instant;

/// Floor between element-stack probes. The probe is far costlier than
/// geometric hit testing, so it refreshes at most ~12 times per second.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(80);

/// Latest-wins sample gate keyed by frame id.
///
/// All operations are O(1); the gate holds at most one pending sample.
#[derive(Debug, Clone, Default)]
pub struct FrameGate<T> {
    pending: Option<T>,
    last_served_frame: Option<u64>,
}

impl<T> FrameGate<T> {
    /// Create an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: None,
            last_served_frame: None,
        }
    }

    /// Store a sample, replacing any pending one (latest wins).
    pub fn submit(&mut self, sample: T) {
        self.pending = Some(sample);
    }

    /// Take the pending sample for `frame_id`.
    ///
    /// Returns `None` if nothing is pending or if a sample was already
    /// served for this frame id; calling it again within the same frame is
    /// safe and yields nothing.
    pub fn take(&mut self, frame_id: u64) -> Option<T> {
        if self.last_served_frame == Some(frame_id) {
            return None;
        }
        let sample = self.pending.take()?;
        self.last_served_frame = Some(frame_id);
        Some(sample)
    }

    /// Whether a sample is waiting.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Discard pending input, e.g. on cancellation or focus loss.
    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Wall-clock gate enforcing a minimum interval between passes.
#[derive(Debug, Clone)]
pub struct MinIntervalGate {
    min_interval: Duration,
    last_pass: Option<Instant>,
}

impl MinIntervalGate {
    /// Create a gate with an explicit interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_pass: None,
        }
    }

    /// Gate at [`DEFAULT_PROBE_INTERVAL`].
    #[must_use]
    pub fn probe_default() -> Self {
        Self::new(DEFAULT_PROBE_INTERVAL)
    }

    /// Whether enough time has elapsed since the last pass.
    #[must_use]
    pub fn ready(&self, now: Instant) -> bool {
        match self.last_pass {
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
            None => true,
        }
    }

    /// Record a pass and return `true` if it was admitted.
    pub fn try_pass(&mut self, now: Instant) -> bool {
        if self.ready(now) {
            self.last_pass = Some(now);
            true
        } else {
            false
        }
    }

    /// Forget the last pass so the next check is admitted immediately.
    pub fn reset(&mut self) {
        self.last_pass = None;
    }
}

impl Default for MinIntervalGate {
    fn default() -> Self {
        Self::probe_default()
    }
}
