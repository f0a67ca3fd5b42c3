#![forbid(unsafe_code)]

//! Grid size tracks: weighted column/row sequences and the geometry resolver.
//!
//! A [`SizeTrack`] is the ordered sequence of positive weights (flex-fraction
//! units) defining one axis of a resizable grid. Weights are never required
//! to sum to a fixed total; the sum only ever appears as a denominator.
//!
//! # Invariants
//!
//! 1. A track is non-empty and every weight is finite and ≥ [`MIN_TRACK_WEIGHT`].
//! 2. [`SizeTrack::apply_resize_delta`] conserves the weight total: it moves
//!    weight between the two tracks adjacent to a split, saturating at the
//!    minimum, so repeated partial deltas converge to the same track as one
//!    combined delta (the resizer calls it on every pointer move).
//! 3. [`cell_from_point`] never returns an out-of-range index for a point
//!    inside the grid bounds, including the exact right/bottom edge.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{GridCell, Point, Rect};

/// Minimum weight any track element may hold after a resize.
pub const MIN_TRACK_WEIGHT: f64 = 0.3;

/// Validation failures for size tracks.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    Empty,
    NonFiniteWeight { index: usize, weight: f64 },
    BelowMinimum { index: usize, weight: f64 },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "size track must contain at least one weight"),
            Self::NonFiniteWeight { index, weight } => {
                write!(f, "size track weight {weight} at index {index} is not finite")
            }
            Self::BelowMinimum { index, weight } => write!(
                f,
                "size track weight {weight} at index {index} is below the {MIN_TRACK_WEIGHT} minimum"
            ),
        }
    }
}

impl std::error::Error for TrackError {}

/// An ordered sequence of positive track weights with cached prefix sums.
///
/// Tracks are replaced wholesale on each resize step rather than mutated in
/// place, so the prefix cache is built once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SizeTrack {
    weights: Vec<f64>,
    prefix: Vec<f64>,
}

impl SizeTrack {
    /// Build a track from explicit weights, validating every element.
    pub fn new(weights: Vec<f64>) -> Result<Self, TrackError> {
        if weights.is_empty() {
            return Err(TrackError::Empty);
        }
        for (index, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() {
                return Err(TrackError::NonFiniteWeight { index, weight });
            }
            if weight < MIN_TRACK_WEIGHT {
                return Err(TrackError::BelowMinimum { index, weight });
            }
        }
        Ok(Self::from_validated(weights))
    }

    /// Build a track of `count` equal weights of 1.0.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    #[must_use]
    pub fn uniform(count: usize) -> Self {
        assert!(count > 0, "uniform track requires at least one element");
        Self::from_validated(vec![1.0; count])
    }

    fn from_validated(weights: Vec<f64>) -> Self {
        let mut prefix = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for &weight in &weights {
            acc += weight;
            prefix.push(acc);
        }
        Self { weights, prefix }
    }

    /// Number of tracks (columns or rows).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Always `false`: construction rejects empty tracks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// The raw weight sequence.
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of all weights.
    #[inline]
    #[must_use]
    pub fn total(&self) -> f64 {
        *self.prefix.last().expect("track is non-empty")
    }

    /// Index of the track containing `offset`, where `offset` is a distance
    /// from the track start in the same pixel space as `extent_px`.
    ///
    /// Offsets past the end (floating-point remainder at the far edge) clamp
    /// to the last index.
    #[must_use]
    pub fn index_at_offset(&self, offset: f64, extent_px: f64) -> usize {
        let last = self.len() - 1;
        if extent_px <= 0.0 || offset <= 0.0 {
            return 0;
        }
        let scale = extent_px / self.total();
        for (index, &boundary) in self.prefix.iter().enumerate() {
            if offset < boundary * scale {
                return index;
            }
        }
        last
    }

    /// Cumulative position of the boundary after `index`, as a percentage of
    /// the total extent in `[0, 100]`. Used to place resize handles.
    ///
    /// Out-of-range indices clamp to the final boundary (100.0).
    #[must_use]
    pub fn position_percent(&self, index: usize) -> f64 {
        let boundary = self.prefix.get(index).copied().unwrap_or_else(|| self.total());
        (boundary / self.total() * 100.0).clamp(0.0, 100.0)
    }

    /// Apply a resize step at the split between `split_index` and
    /// `split_index + 1`, returning the new track.
    ///
    /// `pixel_delta` is converted into weight units proportionally to the
    /// current weight total over `container_px`, then transferred across the
    /// split. The transfer saturates so neither side drops below
    /// [`MIN_TRACK_WEIGHT`]; the weight total is conserved exactly, which
    /// keeps repeated partial applications equivalent to one combined
    /// application.
    #[must_use]
    pub fn apply_resize_delta(
        &self,
        split_index: usize,
        pixel_delta: f64,
        container_px: f64,
    ) -> SizeTrack {
        debug_assert!(
            split_index + 1 < self.len(),
            "resize split {split_index} out of range for {} tracks",
            self.len()
        );
        if split_index + 1 >= self.len() || container_px <= 0.0 || !pixel_delta.is_finite() {
            return self.clone();
        }

        let weight_delta = pixel_delta / container_px * self.total();
        let mut weights = self.weights.clone();

        // Positive delta grows the left side at the right side's expense;
        // negative delta is the mirror image. Saturate at the donor's floor.
        let transfer = if weight_delta >= 0.0 {
            weight_delta.min(weights[split_index + 1] - MIN_TRACK_WEIGHT)
        } else {
            weight_delta.max(-(weights[split_index] - MIN_TRACK_WEIGHT))
        };

        weights[split_index] += transfer;
        weights[split_index + 1] -= transfer;

        Self::from_validated(weights)
    }
}

impl TryFrom<Vec<f64>> for SizeTrack {
    type Error = TrackError;

    fn try_from(weights: Vec<f64>) -> Result<Self, TrackError> {
        Self::new(weights)
    }
}

impl From<SizeTrack> for Vec<f64> {
    fn from(track: SizeTrack) -> Self {
        track.weights
    }
}

/// Map a viewport point to the grid cell under it.
///
/// Returns `None` when `point` lies outside `grid_bounds`. Inside the bounds
/// the row/col indices come from the cumulative-weight prefix sums of the
/// two tracks scaled to the bounds, clamped to the last index when rounding
/// leaves a remainder at the far edge.
#[must_use]
pub fn cell_from_point(
    point: Point,
    grid_bounds: Rect,
    col_track: &SizeTrack,
    row_track: &SizeTrack,
) -> Option<GridCell> {
    if !grid_bounds.contains(point) {
        return None;
    }
    let col = col_track.index_at_offset(point.x - grid_bounds.x, grid_bounds.width);
    let row = row_track.index_at_offset(point.y - grid_bounds.y, grid_bounds.height);
    Some(GridCell::new(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(weights: &[f64]) -> SizeTrack {
        SizeTrack::new(weights.to_vec()).expect("valid test track")
    }

    #[test]
    fn new_rejects_empty_and_tiny_weights() {
        assert_eq!(SizeTrack::new(vec![]), Err(TrackError::Empty));
        assert_eq!(
            SizeTrack::new(vec![1.0, 0.1]),
            Err(TrackError::BelowMinimum {
                index: 1,
                weight: 0.1
            })
        );
    }

    #[test]
    fn uniform_track_splits_extent_evenly() {
        let cols = SizeTrack::uniform(4);
        assert_eq!(cols.index_at_offset(0.0, 400.0), 0);
        assert_eq!(cols.index_at_offset(99.0, 400.0), 0);
        assert_eq!(cols.index_at_offset(100.0, 400.0), 1);
        assert_eq!(cols.index_at_offset(399.0, 400.0), 3);
    }

    #[test]
    fn index_at_offset_clamps_far_edge() {
        let cols = track(&[1.0, 2.0, 1.0]);
        // Exactly at (and past) the extent: still the last index.
        assert_eq!(cols.index_at_offset(300.0, 300.0), 2);
        assert_eq!(cols.index_at_offset(301.0, 300.0), 2);
    }

    #[test]
    fn position_percent_matches_cumulative_weights() {
        let cols = track(&[1.0, 1.0, 2.0]);
        assert!((cols.position_percent(0) - 25.0).abs() < 1e-9);
        assert!((cols.position_percent(1) - 50.0).abs() < 1e-9);
        assert!((cols.position_percent(2) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn cell_from_point_outside_bounds_is_none() {
        let bounds = Rect::new(10.0, 10.0, 400.0, 200.0);
        let cols = SizeTrack::uniform(4);
        let rows = SizeTrack::uniform(2);
        assert_eq!(cell_from_point(Point::new(5.0, 50.0), bounds, &cols, &rows), None);
        assert_eq!(
            cell_from_point(Point::new(410.0, 210.0), bounds, &cols, &rows),
            None
        );
    }

    #[test]
    fn cell_from_point_maps_weighted_tracks() {
        let bounds = Rect::new(0.0, 0.0, 400.0, 200.0);
        let cols = track(&[1.0, 3.0]); // boundary at x=100
        let rows = SizeTrack::uniform(2); // boundary at y=100
        assert_eq!(
            cell_from_point(Point::new(50.0, 50.0), bounds, &cols, &rows),
            Some(GridCell::new(0, 0))
        );
        assert_eq!(
            cell_from_point(Point::new(150.0, 150.0), bounds, &cols, &rows),
            Some(GridCell::new(1, 1))
        );
    }

    #[test]
    fn resize_delta_transfers_weight_and_conserves_total() {
        let cols = SizeTrack::uniform(3);
        let resized = cols.apply_resize_delta(0, 50.0, 300.0);
        assert!((resized.weights()[0] - 1.5).abs() < 1e-9);
        assert!((resized.weights()[1] - 0.5).abs() < 1e-9);
        assert!((resized.total() - cols.total()).abs() < 1e-9);
    }

    #[test]
    fn resize_delta_saturates_at_minimum() {
        let cols = SizeTrack::uniform(2);
        let resized = cols.apply_resize_delta(0, 10_000.0, 300.0);
        assert!((resized.weights()[1] - MIN_TRACK_WEIGHT).abs() < 1e-9);
        assert!((resized.total() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn resize_delta_split_applications_match_one_combined() {
        let cols = track(&[1.0, 1.0, 1.0]);
        let combined = cols.apply_resize_delta(1, 15.0, 300.0);
        let stepped = cols
            .apply_resize_delta(1, 5.0, 300.0)
            .apply_resize_delta(1, 5.0, 300.0)
            .apply_resize_delta(1, 5.0, 300.0);
        for (a, b) in combined.weights().iter().zip(stepped.weights()) {
            assert!((a - b).abs() < 1e-9, "combined {a} != stepped {b}");
        }
    }

    #[test]
    fn resize_delta_out_of_range_split_is_noop_in_release() {
        let cols = SizeTrack::uniform(2);
        // Index 1 names the split between elements 1 and 2, which don't exist.
        let result = std::panic::catch_unwind(|| cols.apply_resize_delta(1, 5.0, 300.0));
        if cfg!(debug_assertions) {
            assert!(result.is_err());
        } else {
            assert_eq!(result.expect("no panic in release"), cols);
        }
    }
}
