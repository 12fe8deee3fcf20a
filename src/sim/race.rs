//! The race simulation context
//!
//! [`RaceSim`] owns the track graph, the tuning, the simulation clock, and
//! every registered vehicle. The caller drives it: once per fixed tick it
//! calls [`RaceSim::advance_all`], and between ticks it may feed input
//! edges and read queries. There is no global registry and no implicit
//! per-frame callback; whoever owns the `RaceSim` owns the loop.
//!
//! Update order between vehicles is stable (ascending id) but carries no
//! gameplay meaning: no vehicle's update reads another vehicle's state.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use super::bounce::BounceState;
use super::track::TrackGraph;
use super::vehicle::{Pose, PoseSink, SegmentWindow, VehicleState};
use crate::move_toward;
use crate::tuning::Tuning;

/// Registration, input, or query failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Query or input edge for an id that was never registered
    UnknownVehicle(u32),
    /// Registration with an id that is already taken
    DuplicateVehicle(u32),
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::UnknownVehicle(id) => write!(f, "vehicle {id} is not registered"),
            SimError::DuplicateVehicle(id) => write!(f, "vehicle {id} is already registered"),
        }
    }
}

impl std::error::Error for SimError {}

/// Fixed-tick racing simulation over a closed track
pub struct RaceSim {
    track: TrackGraph,
    tuning: Tuning,
    /// Monotonic simulation time in seconds, advanced by `advance_all`
    clock: f64,
    /// Keyed by vehicle id; BTreeMap keeps iteration order stable
    vehicles: BTreeMap<u32, VehicleState>,
}

impl RaceSim {
    pub fn new(track: TrackGraph, tuning: Tuning) -> Self {
        Self {
            track,
            tuning,
            clock: 0.0,
            vehicles: BTreeMap::new(),
        }
    }

    /// Current simulation time in seconds
    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn track(&self) -> &TrackGraph {
        &self.track
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Register a vehicle on its lane. The vehicle starts half a segment
    /// into the first segment (off the seam), at rest, with turbo ready.
    pub fn register_vehicle(
        &mut self,
        id: u32,
        lane_offset: f32,
        sink: Box<dyn PoseSink>,
    ) -> Result<(), SimError> {
        if self.vehicles.contains_key(&id) {
            return Err(SimError::DuplicateVehicle(id));
        }

        let first = self.track.first();
        let first_segment = self.track.segment(first);
        let window = SegmentWindow {
            start: 0.0,
            end: first_segment.length(lane_offset),
        };
        let track_position = first_segment.length(0.0) * 0.5;

        let reference_length = self.track.total_length(0.0);
        // The correction factor compensates for a measured discrepancy
        // between nominal and actual per-lane arc length on curves. It is
        // applied to the offset for length accounting only, never for
        // point sampling.
        let total_length = self
            .track
            .total_length(lane_offset * self.tuning.lane_length_correction);
        let speed_multiplier = total_length / reference_length;

        // Far enough in the past that the turbo starts ready
        let last_turbo_time =
            self.clock - (self.tuning.turbo_duration + self.tuning.turbo_cooldown) as f64;

        self.vehicles.insert(
            id,
            VehicleState {
                id,
                lane_offset,
                accelerating: false,
                segment: first,
                window,
                track_position,
                speed: 0.0,
                speed_multiplier,
                total_length,
                last_turbo_time,
                last_input_time: f64::NEG_INFINITY,
                bounce: BounceState::default(),
                sink,
            },
        );

        info!(
            "registered vehicle {id}: lane {lane_offset:+.2}, lap {total_length:.2}, \
             speed multiplier {speed_multiplier:.3}"
        );
        Ok(())
    }

    /// Begin-accelerating input edge. Also evaluates turbo double-tap: a
    /// second tap within the double-tap window while the turbo is ready
    /// starts a turbo burst.
    pub fn begin_accelerating(&mut self, id: u32) -> Result<(), SimError> {
        let now = self.clock;
        let tuning = &self.tuning;
        let vehicle = self
            .vehicles
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id))?;

        vehicle.accelerating = true;

        let ready = turbo_ready(tuning, vehicle, now);
        let active = turbo_active(tuning, vehicle, now);
        let tap_gap = now - vehicle.last_input_time;
        let fast_double_tap = tap_gap < tuning.double_tap_window as f64;
        vehicle.last_input_time = now;

        if ready && !active && fast_double_tap {
            vehicle.last_turbo_time = now;
            debug!("vehicle {id}: turbo activated (tap gap {tap_gap:.3}s)");
        }
        Ok(())
    }

    /// Stop-accelerating input edge
    pub fn stop_accelerating(&mut self, id: u32) -> Result<(), SimError> {
        self.vehicles
            .get_mut(&id)
            .ok_or(SimError::UnknownVehicle(id))?
            .accelerating = false;
        Ok(())
    }

    /// Advance every vehicle by one fixed tick of `dt` seconds
    pub fn advance_all(&mut self, dt: f32) {
        self.clock += dt as f64;
        let now = self.clock;
        for vehicle in self.vehicles.values_mut() {
            update_vehicle(&self.track, &self.tuning, vehicle, now, dt);
        }
    }

    // --- read-only queries ---

    /// Current speed in track units per second
    pub fn speed(&self, id: u32) -> Result<f32, SimError> {
        Ok(self.vehicle(id)?.speed)
    }

    /// Cumulative arc-length position along the loop
    pub fn position(&self, id: u32) -> Result<f32, SimError> {
        Ok(self.vehicle(id)?.track_position)
    }

    /// Loop length for this vehicle's lane
    pub fn total_length(&self, id: u32) -> Result<f32, SimError> {
        Ok(self.vehicle(id)?.total_length)
    }

    pub fn is_turbo_active(&self, id: u32) -> Result<bool, SimError> {
        Ok(turbo_active(&self.tuning, self.vehicle(id)?, self.clock))
    }

    pub fn is_turbo_ready(&self, id: u32) -> Result<bool, SimError> {
        Ok(turbo_ready(&self.tuning, self.vehicle(id)?, self.clock))
    }

    /// Remaining cooldown in seconds, 0 when ready
    pub fn turbo_cooldown(&self, id: u32) -> Result<f32, SimError> {
        Ok(turbo_cooldown_remaining(
            &self.tuning,
            self.vehicle(id)?,
            self.clock,
        ))
    }

    /// Remaining cooldown as a fraction of the full cooldown, in [0, 1]
    pub fn turbo_cooldown_normalized(&self, id: u32) -> Result<f32, SimError> {
        let remaining = self.turbo_cooldown(id)?;
        Ok((remaining / self.tuning.turbo_cooldown).clamp(0.0, 1.0))
    }

    pub fn vehicle(&self, id: u32) -> Result<&VehicleState, SimError> {
        self.vehicles.get(&id).ok_or(SimError::UnknownVehicle(id))
    }

    #[cfg(test)]
    pub(crate) fn vehicle_mut(&mut self, id: u32) -> &mut VehicleState {
        self.vehicles.get_mut(&id).expect("test vehicle")
    }
}

/// Whether a turbo burst is currently running
fn turbo_active(tuning: &Tuning, vehicle: &VehicleState, now: f64) -> bool {
    now - vehicle.last_turbo_time < tuning.turbo_duration as f64
}

/// Seconds of cooldown left after the current or last burst, 0 when elapsed
fn turbo_cooldown_remaining(tuning: &Tuning, vehicle: &VehicleState, now: f64) -> f32 {
    let since_burst_end = now - (vehicle.last_turbo_time + tuning.turbo_duration as f64);
    (tuning.turbo_cooldown - since_burst_end as f32).max(0.0)
}

/// Ready = not active and cooldown fully elapsed
fn turbo_ready(tuning: &Tuning, vehicle: &VehicleState, now: f64) -> bool {
    !turbo_active(tuning, vehicle, now) && turbo_cooldown_remaining(tuning, vehicle, now) <= 0.0
}

/// One fixed tick for one vehicle: ramp speed toward the target, advance
/// along the track, sample the pose, run the bounce, publish.
fn update_vehicle(
    track: &TrackGraph,
    tuning: &Tuning,
    vehicle: &mut VehicleState,
    now: f64,
    dt: f32,
) {
    let normal_speed = tuning.base_speed * vehicle.speed_multiplier;
    let turbo = turbo_active(tuning, vehicle, now);

    let target_speed = if !vehicle.accelerating {
        0.0
    } else if turbo {
        normal_speed * tuning.turbo_speed_multiplier
    } else {
        normal_speed
    };

    // Deceleration always ramps with the normal time constant, even out of
    // a turbo burst; only ramp-up gets the turbo constant.
    let acceleration = if !vehicle.accelerating {
        normal_speed / tuning.reach_max_speed_duration
    } else if turbo {
        target_speed / tuning.turbo_reach_max_speed_duration
    } else {
        target_speed / tuning.reach_max_speed_duration
    };

    vehicle.speed = move_toward(vehicle.speed, target_speed, acceleration * dt);

    if vehicle.speed > 0.0 {
        advance_along_track(track, tuning, vehicle, dt);
    }
}

fn advance_along_track(track: &TrackGraph, tuning: &Tuning, vehicle: &mut VehicleState, dt: f32) {
    let step = vehicle.speed * dt;

    if vehicle.track_position + step > vehicle.window.end {
        // Crossing into the next segment; a broken link means the graph is
        // malformed (an authoring error), so skip this vehicle's tick
        // instead of tearing the simulation down.
        let next = match track.next(vehicle.segment) {
            Ok(next) => next,
            Err(err) => {
                warn!("vehicle {}: {err}; skipping update", vehicle.id);
                return;
            }
        };

        vehicle.segment = next;
        vehicle.track_position += step;

        // Floating point drift near the seam: wrap the previous interval
        // bound and the position together, before forming the new interval
        if vehicle.window.end > vehicle.total_length {
            vehicle.window.end %= vehicle.total_length;
            vehicle.track_position %= vehicle.total_length;
        }

        let start = vehicle.window.end;
        vehicle.window = SegmentWindow {
            start,
            end: start + track.segment(next).length(vehicle.lane_offset),
        };
    } else {
        vehicle.track_position += step;
    }

    if vehicle.window.span() <= 0.0 {
        warn!(
            "vehicle {}: zero-length window on {} (degenerate curve?)",
            vehicle.id, vehicle.segment
        );
    }
    let progress = vehicle.window.progress(vehicle.track_position);

    let (mut position, heading) = track
        .segment(vehicle.segment)
        .sample(progress, vehicle.lane_offset);
    position.y = vehicle
        .bounce
        .step(position.y, tuning.gravity, tuning.bounciness, dt);

    let pose = Pose { position, heading };
    vehicle.sink.publish(&pose);
}
