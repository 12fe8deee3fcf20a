//! Data-driven gameplay balance
//!
//! Every per-race tunable in one serializable struct, so a race host can
//! ship balance changes as data. Defaults match the values the handling
//! was originally tuned against.

use serde::{Deserialize, Serialize};

/// Gameplay tunables for one race
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Full-throttle speed on the reference lane, track units per second
    pub base_speed: f32,
    /// Seconds to ramp from rest to full speed (and back down)
    pub reach_max_speed_duration: f32,

    // === Turbo ===
    /// Speed multiplier while a turbo burst is active
    pub turbo_speed_multiplier: f32,
    /// Burst length in seconds
    pub turbo_duration: f32,
    /// Seconds to ramp up to turbo speed
    pub turbo_reach_max_speed_duration: f32,
    /// Seconds after a burst before the turbo re-arms
    pub turbo_cooldown: f32,
    /// Maximum gap between two accelerate taps to count as a double tap
    pub double_tap_window: f32,

    // === Vertical bounce ===
    pub gravity: f32,
    /// Coefficient of restitution against the track floor
    pub bounciness: f32,

    // === Length accounting ===
    /// Empirical factor applied to the lane offset when computing a lane's
    /// loop length (not when sampling points). Measured per-lane arc
    /// length on curves runs about 10% past nominal; nobody has derived
    /// why, so it stays a tunable.
    pub lane_length_correction: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: 5.0,
            reach_max_speed_duration: 1.0,

            turbo_speed_multiplier: 2.0,
            turbo_duration: 2.0,
            turbo_reach_max_speed_duration: 0.3,
            turbo_cooldown: 10.0,
            double_tap_window: 0.5,

            gravity: 9.8,
            bounciness: 0.5,

            lane_length_correction: 1.1,
        }
    }
}

impl Tuning {
    /// Load tunables from a JSON file; missing fields keep their defaults
    pub fn load(path: &std::path::Path) -> Result<Self, crate::config::ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let tuning = Tuning::default();
        let json = serde_json::to_string(&tuning).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.base_speed, tuning.base_speed);
        assert_eq!(back.lane_length_correction, tuning.lane_length_correction);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("trackloop-tuning-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"base_speed": 7.5, "turbo_duration": 3.0}"#).unwrap();
        let tuning = Tuning::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(tuning.base_speed, 7.5);
        assert_eq!(tuning.turbo_duration, 3.0);
        // Unlisted fields keep their defaults
        assert_eq!(tuning.lane_length_correction, 1.1);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let path = std::env::temp_dir().join("trackloop-tuning-does-not-exist.json");
        assert!(Tuning::load(&path).is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tuning: Tuning = serde_json::from_str(r#"{"base_speed": 8.0}"#).unwrap();
        assert_eq!(tuning.base_speed, 8.0);
        assert_eq!(tuning.turbo_cooldown, 10.0);
        assert_eq!(tuning.double_tap_window, 0.5);
    }
}
