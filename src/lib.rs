//! Trackloop - fixed-timestep racing on a closed modular track
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track geometry, vehicle ticks, turbo, bounce)
//! - `config`: Track file format and validation
//! - `tuning`: Data-driven gameplay balance
//!
//! The simulation is single-threaded and synchronous: the caller owns the
//! clock and drives every registered vehicle once per fixed tick through
//! [`sim::RaceSim::advance_all`]. Nothing in `sim` touches platform time,
//! I/O, or global state.

pub mod config;
pub mod sim;
pub mod tuning;

pub use config::TrackFile;
pub use sim::{Pose, RaceSim, SimError, TrackGraph};
pub use tuning::Tuning;

/// Shared constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
#[inline]
pub fn move_toward(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_toward_clamps() {
        assert_eq!(move_toward(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_toward(10.0, 0.0, 3.0), 7.0);
    }

    #[test]
    fn test_move_toward_reaches_target() {
        assert_eq!(move_toward(9.5, 10.0, 3.0), 10.0);
        assert_eq!(move_toward(10.0, 10.0, 3.0), 10.0);
    }
}
