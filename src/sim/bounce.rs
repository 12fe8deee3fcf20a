//! Vertical bounce integrator
//!
//! A secondary physics layer independent of forward motion: each vehicle
//! carries a vertical particle under gravity that bounces off the track
//! floor with restitution. The floor height comes from the sampled track
//! point each tick, so its rate of change couples into the bounce - a
//! rising section of track kicks the vehicle upward.

/// Vertical sub-state of one vehicle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BounceState {
    pub position_y: f32,
    pub velocity_y: f32,
    pub last_floor: f32,
}

impl BounceState {
    /// State at rest on the given floor height
    pub fn resting(floor: f32) -> Self {
        Self {
            position_y: floor,
            velocity_y: 0.0,
            last_floor: floor,
        }
    }

    /// Advance one tick against the current floor height and return the
    /// resulting vertical position.
    ///
    /// On floor contact the velocity reflects scaled by `bounciness`, and
    /// the floor's change since the previous tick is added as an impulse.
    pub fn step(&mut self, floor: f32, gravity: f32, bounciness: f32, dt: f32) -> f32 {
        self.velocity_y -= gravity * dt;
        self.position_y += self.velocity_y;

        if self.position_y <= floor {
            self.position_y = floor;
            self.velocity_y *= -bounciness;
            self.velocity_y += floor - self.last_floor;
        }

        self.last_floor = floor;
        self.position_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 50.0;
    const GRAVITY: f32 = 9.8;

    #[test]
    fn test_drop_converges_to_floor() {
        let mut bounce = BounceState {
            position_y: 5.0,
            velocity_y: 0.0,
            last_floor: 0.0,
        };
        for _ in 0..5000 {
            bounce.step(0.0, GRAVITY, 0.5, DT);
        }
        assert!((bounce.position_y - 0.0).abs() < 1e-2);
    }

    #[test]
    fn test_bounce_amplitude_decays() {
        let mut bounce = BounceState {
            position_y: 5.0,
            velocity_y: 0.0,
            last_floor: 0.0,
        };
        // Track the peak height of successive bounces
        let mut peaks = Vec::new();
        let mut prev_y = bounce.position_y;
        let mut rising = false;
        for _ in 0..5000 {
            let y = bounce.step(0.0, GRAVITY, 0.5, DT);
            if y < prev_y && rising {
                peaks.push(prev_y);
            }
            rising = y > prev_y;
            prev_y = y;
        }
        assert!(peaks.len() >= 2);
        for pair in peaks.windows(2) {
            assert!(pair[1] < pair[0] + 1e-3);
        }
    }

    #[test]
    fn test_resting_state_stays_on_flat_floor() {
        let mut bounce = BounceState::resting(2.0);
        for _ in 0..100 {
            bounce.step(2.0, GRAVITY, 0.5, DT);
        }
        assert_eq!(bounce.position_y, 2.0);
    }

    #[test]
    fn test_rising_floor_imparts_impulse() {
        let mut bounce = BounceState::resting(0.0);
        // Floor jumps up between ticks while the vehicle sits on it
        bounce.step(0.0, GRAVITY, 0.5, DT);
        let y = bounce.step(0.5, GRAVITY, 0.5, DT);
        assert_eq!(y, 0.5);
        // The 0.5 floor delta became upward velocity
        assert!(bounce.velocity_y > 0.0);
    }
}
