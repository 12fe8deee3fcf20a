//! Per-vehicle simulation state
//!
//! One [`VehicleState`] per registered vehicle, created at registration and
//! mutated only by the tick routine. External code reads published results
//! through [`super::RaceSim`] queries and feeds input through the two
//! accelerate edges; it never touches this state directly.

use glam::{Quat, Vec3};

use super::bounce::BounceState;
use super::segment::SegmentId;

/// World-space pose emitted to a vehicle's sink once per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    /// Unit tangent of the track under the vehicle
    pub heading: Vec3,
}

impl Pose {
    /// Orientation taking +Z to the heading
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_arc(Vec3::Z, self.heading)
    }
}

/// Consumer of per-tick vehicle poses (the renderer boundary)
pub trait PoseSink {
    fn publish(&mut self, pose: &Pose);
}

impl<F: FnMut(&Pose)> PoseSink for F {
    fn publish(&mut self, pose: &Pose) {
        self(pose)
    }
}

/// The arc-length interval `[start, end)` covered by the current segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentWindow {
    pub start: f32,
    pub end: f32,
}

impl SegmentWindow {
    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    /// Normalized progress of `position` within the window. A degenerate
    /// window (zero-length segment) reports 0 instead of dividing by zero.
    pub fn progress(&self, position: f32) -> f32 {
        let span = self.span();
        if span > 0.0 {
            (position - self.start) / span
        } else {
            0.0
        }
    }
}

/// Simulation state for one registered vehicle
pub struct VehicleState {
    pub id: u32,
    /// Constant lateral displacement from the track centerline
    pub lane_offset: f32,
    /// Acceleration intent, set by the external input edges
    pub accelerating: bool,
    pub segment: SegmentId,
    pub window: SegmentWindow,
    /// Cumulative arc length, wraps modulo `total_length`
    pub track_position: f32,
    pub speed: f32,
    /// This lane's loop length over the reference lane's loop length
    pub speed_multiplier: f32,
    /// Loop length for this vehicle's lane
    pub total_length: f32,
    /// Simulation time of the last turbo activation
    pub last_turbo_time: f64,
    /// Simulation time of the last accelerate edge (double-tap detection)
    pub last_input_time: f64,
    pub bounce: BounceState,
    pub(crate) sink: Box<dyn PoseSink>,
}

impl std::fmt::Debug for VehicleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VehicleState")
            .field("id", &self.id)
            .field("lane_offset", &self.lane_offset)
            .field("accelerating", &self.accelerating)
            .field("segment", &self.segment)
            .field("track_position", &self.track_position)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_progress() {
        let window = SegmentWindow {
            start: 10.0,
            end: 20.0,
        };
        assert_eq!(window.progress(10.0), 0.0);
        assert_eq!(window.progress(15.0), 0.5);
        assert_eq!(window.progress(20.0), 1.0);
    }

    #[test]
    fn test_degenerate_window_is_traversable() {
        let window = SegmentWindow {
            start: 5.0,
            end: 5.0,
        };
        assert_eq!(window.progress(5.0), 0.0);
    }

    #[test]
    fn test_pose_rotation_faces_heading() {
        let pose = Pose {
            position: Vec3::ZERO,
            heading: Vec3::X,
        };
        let forward = pose.rotation() * Vec3::Z;
        assert!((forward - Vec3::X).length() < 1e-6);
    }
}
