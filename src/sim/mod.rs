//! Deterministic racing simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, clock owned by the caller
//! - Stable vehicle iteration order (by id)
//! - No rendering, I/O, or platform dependencies

pub mod bounce;
pub mod race;
pub mod segment;
pub mod track;
pub mod vehicle;

pub use bounce::BounceState;
pub use race::{RaceSim, SimError};
pub use segment::{
    CURVE_STRENGTH, DIR_BACK, DIR_FORWARD, DIR_LEFT, DIR_RIGHT, PathEnds, Segment, SegmentId,
    SegmentKind, Slot, SlotLink,
};
pub use track::{TrackError, TrackGraph};
pub use vehicle::{Pose, PoseSink, SegmentWindow, VehicleState};
