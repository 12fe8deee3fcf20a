//! Track graph: an ordered cycle of segments
//!
//! The graph is built once (see [`crate::config`]) and read-only during
//! simulation; every vehicle shares it without locking.

use super::segment::{Segment, SegmentId};

/// Traversal failure over a malformed graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// The graph has no segments
    Empty,
    /// A segment's exit slot has no resolvable link
    BrokenLink { segment: SegmentId },
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::Empty => write!(f, "track has no segments"),
            TrackError::BrokenLink { segment } => {
                write!(f, "{segment} has no linked exit slot")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// A closed loop of track segments
#[derive(Debug, Clone)]
pub struct TrackGraph {
    segments: Vec<Segment>,
}

impl TrackGraph {
    /// Wrap an ordered segment list. Only emptiness is checked here; full
    /// connectivity validation belongs to the config layer.
    pub fn new(segments: Vec<Segment>) -> Result<Self, TrackError> {
        if segments.is_empty() {
            return Err(TrackError::Empty);
        }
        Ok(Self { segments })
    }

    /// The designated first segment (cycle anchor, vehicle start)
    pub fn first(&self) -> SegmentId {
        SegmentId(0)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.0]
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    /// The segment reached by following `id`'s exit link.
    ///
    /// Fails only on a malformed graph; the caller logs and skips the
    /// affected vehicle rather than crashing the simulation.
    pub fn next(&self, id: SegmentId) -> Result<SegmentId, TrackError> {
        let link = self
            .segment(id)
            .exit_slot()
            .link
            .ok_or(TrackError::BrokenLink { segment: id })?;
        if link.segment.0 >= self.segments.len() {
            return Err(TrackError::BrokenLink { segment: id });
        }
        Ok(link.segment)
    }

    /// Total loop length for a lane offset: sum of per-segment lengths.
    /// Pure in the graph and the offset; O(segment count).
    pub fn total_length(&self, lane_offset: f32) -> f32 {
        self.segments.iter().map(|s| s.length(lane_offset)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::demo_loop;

    #[test]
    fn test_empty_track_rejected() {
        assert_eq!(TrackGraph::new(Vec::new()).unwrap_err(), TrackError::Empty);
    }

    #[test]
    fn test_cycle_closes() {
        let track = demo_loop().build().unwrap();
        let first = track.first();
        let mut current = first;
        for _ in 0..track.len() {
            current = track.next(current).unwrap();
        }
        assert_eq!(current, first);
    }

    #[test]
    fn test_cycle_visits_every_segment_once() {
        let track = demo_loop().build().unwrap();
        let mut seen = vec![false; track.len()];
        let mut current = track.first();
        for _ in 0..track.len() {
            assert!(!seen[current.0]);
            seen[current.0] = true;
            current = track.next(current).unwrap();
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_total_length_sums_segments() {
        let track = demo_loop().build().unwrap();
        let sum: f32 = track.segments().map(|s| s.length(0.0)).sum();
        assert_eq!(track.total_length(0.0), sum);
        // Demo loop: four quarter curves of radius 7.5 plus two 15-long straights
        let expected = 4.0 * std::f32::consts::FRAC_PI_2 * 7.5 + 2.0 * 15.0;
        assert!((sum - expected).abs() < 1e-4);
    }

    #[test]
    fn test_total_length_differs_by_lane() {
        let track = demo_loop().build().unwrap();
        let reference = track.total_length(0.0);
        // All four demo curves turn the same way, so one side is uniformly
        // shorter and the other uniformly longer
        assert!(track.total_length(2.0) < reference);
        assert!(track.total_length(-2.0) > reference);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn total_length_is_stable(offset in -6.0_f32..6.0) {
                let track = demo_loop().build().unwrap();
                prop_assert_eq!(track.total_length(offset), track.total_length(offset));
            }

            #[test]
            fn total_length_positive_for_supported_lanes(offset in -6.0_f32..6.0) {
                let track = demo_loop().build().unwrap();
                prop_assert!(track.total_length(offset) > 0.0);
            }
        }
    }
}
