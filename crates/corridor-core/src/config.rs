//! Engine configuration.
//!
//! Constructed once per process and passed by reference to each planning
//! call; the engine holds no other process-wide state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Regulatory altitude ceiling above ground level (FAA Part 107 ~400ft).
    pub faa_limit_agl: f64,
    /// Vertical clearance required above obstacles/terrain.
    pub safety_buffer_m: f64,
    pub climb_speed_mps: f64,
    pub cruise_speed_mps: f64,
    pub descent_speed_mps: f64,
    pub cost_time_weight: f64,
    /// Cost per meter of climb charged when an edge forces altitude up.
    pub cost_climb_penalty: f64,
    /// Fixed cost per lane shifted; discourages zig-zag.
    pub cost_lane_change: f64,
    /// Fixed cost per adjacent lane requiring more clearance than the
    /// candidate cruise altitude; discourages flying beside tall walls.
    pub cost_proximity_penalty: f64,
    /// Ground-distance interval for sampling edges against geofences.
    pub geofence_sample_step_m: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            faa_limit_agl: 121.0,
            safety_buffer_m: 20.0,
            climb_speed_mps: 2.0,
            cruise_speed_mps: 15.0,
            descent_speed_mps: 3.0,
            cost_time_weight: 1.0,
            cost_climb_penalty: 15.0,
            cost_lane_change: 50.0,
            cost_proximity_penalty: 100.0,
            geofence_sample_step_m: 25.0,
        }
    }
}

impl EngineConfig {
    /// Apply a flat key→value override map. Unknown keys are logged and
    /// ignored rather than rejected.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, f64>) {
        for (key, value) in overrides {
            match key.as_str() {
                "faa_limit_agl" => self.faa_limit_agl = *value,
                "safety_buffer_m" => self.safety_buffer_m = *value,
                "climb_speed_mps" => self.climb_speed_mps = *value,
                "cruise_speed_mps" => self.cruise_speed_mps = *value,
                "descent_speed_mps" => self.descent_speed_mps = *value,
                "cost_time_weight" => self.cost_time_weight = *value,
                "cost_climb_penalty" => self.cost_climb_penalty = *value,
                "cost_lane_change" => self.cost_lane_change = *value,
                "cost_proximity_penalty" => self.cost_proximity_penalty = *value,
                "geofence_sample_step_m" => self.geofence_sample_step_m = *value,
                other => {
                    tracing::warn!("ignoring unknown engine config key: {}", other);
                }
            }
        }
    }
}
