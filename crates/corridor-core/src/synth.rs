//! Waypoint synthesis: turns the smoothed node path plus the original user
//! waypoints into a ground→ascent→cruise→descent→ground sequence with corner
//! and intermediate points.

use crate::config::EngineConfig;
use crate::grid::CorridorGrid;
use crate::models::{FlightPhase, FlightWaypoint, PlanStats};
use crate::search::PathNode;
use crate::spatial::haversine_distance;

/// Minimum spacing between emitted points on a straight cruise run.
const CRUISE_WAYPOINT_SPACING_M: f64 = 15.0;

/// Build the final waypoint sequence and its altitude statistics.
pub fn synthesize_waypoints(
    smoothed: &[PathNode],
    grid: &CorridorGrid,
    config: &EngineConfig,
) -> (Vec<FlightWaypoint>, PlanStats) {
    let center_lane = grid.center_lane();
    let num_steps = grid.num_steps();
    let waypoint_indices = if grid.waypoint_indices.is_empty() {
        vec![0, num_steps - 1]
    } else {
        grid.waypoint_indices.clone()
    };

    let mut waypoints = Vec::new();
    let mut agl_sum = 0.0;
    let mut agl_count = 0usize;
    let mut max_agl: f64 = 0.0;
    let mut max_altitude: f64 = 0.0;
    let mut track_agl = |altitude_m: f64, terrain_m: f64| {
        let agl = (altitude_m - terrain_m).max(0.0);
        agl_sum += agl;
        agl_count += 1;
        if agl > max_agl {
            max_agl = agl;
        }
        if altitude_m > max_altitude {
            max_altitude = altitude_m;
        }
    };

    for (idx, &step_idx) in waypoint_indices.iter().enumerate() {
        let point = grid.point(step_idx, center_lane);
        let is_first = idx == 0;
        let is_last = idx + 1 == waypoint_indices.len();

        let ground_phase = if is_first {
            FlightPhase::GroundStart
        } else if is_last {
            FlightPhase::GroundEnd
        } else {
            FlightPhase::GroundWaypoint
        };
        waypoints.push(FlightWaypoint::new(
            point.lat,
            point.lon,
            point.terrain_height_m,
            ground_phase,
        ));

        if is_last {
            continue;
        }
        let next_step_idx = waypoint_indices[idx + 1];

        // Cruise altitude for this leg: what the smoothed path committed to,
        // or the obstacle floor when no node lands strictly inside the span
        // (degenerate adjacent-waypoint case).
        let mut segment_cruise_alt: Option<f64> = None;
        for node in smoothed {
            if node.step > step_idx && node.step < next_step_idx {
                segment_cruise_alt =
                    Some(segment_cruise_alt.unwrap_or(f64::NEG_INFINITY).max(node.altitude_m));
            }
        }
        let segment_cruise_alt = segment_cruise_alt.unwrap_or_else(|| {
            let mut floor: f64 = 0.0;
            for step in step_idx..=next_step_idx {
                floor = floor.max(
                    grid.point(step, center_lane)
                        .min_safe_altitude(config.safety_buffer_m),
                );
            }
            floor
        });

        waypoints.push(FlightWaypoint::new(
            point.lat,
            point.lon,
            segment_cruise_alt,
            FlightPhase::VerticalAscent,
        ));
        track_agl(segment_cruise_alt, point.terrain_height_m);

        let mut last_output_lane = center_lane;
        let mut last_output_node: Option<PathNode> = None;
        let mut last_node_before_lane_change: Option<PathNode> = None;

        for node in smoothed {
            if node.step <= step_idx || node.step >= next_step_idx {
                continue;
            }
            let node_point = grid.point(node.step, node.lane);

            if node.lane != last_output_lane {
                // Elbow: close out the previous lane before turning.
                if let Some(prev) = last_node_before_lane_change {
                    let prev_point = grid.point(prev.step, prev.lane);
                    waypoints.push(FlightWaypoint::new(
                        prev_point.lat,
                        prev_point.lon,
                        segment_cruise_alt,
                        FlightPhase::CruiseCorner,
                    ));
                    track_agl(segment_cruise_alt, prev_point.terrain_height_m);
                }
                waypoints.push(FlightWaypoint::new(
                    node_point.lat,
                    node_point.lon,
                    segment_cruise_alt,
                    FlightPhase::Cruise,
                ));
                track_agl(segment_cruise_alt, node_point.terrain_height_m);
                last_output_lane = node.lane;
                last_output_node = Some(*node);
            } else if let Some(last_node) = last_output_node {
                let last_point = grid.point(last_node.step, last_node.lane);
                let dist = haversine_distance(
                    last_point.lat,
                    last_point.lon,
                    node_point.lat,
                    node_point.lon,
                );
                if dist > CRUISE_WAYPOINT_SPACING_M {
                    waypoints.push(FlightWaypoint::new(
                        node_point.lat,
                        node_point.lon,
                        segment_cruise_alt,
                        FlightPhase::CruiseIntermediate,
                    ));
                    track_agl(segment_cruise_alt, node_point.terrain_height_m);
                    last_output_node = Some(*node);
                }
            }

            last_node_before_lane_change = Some(*node);
        }

        let next_point = grid.point(next_step_idx, center_lane);
        waypoints.push(FlightWaypoint::new(
            next_point.lat,
            next_point.lon,
            segment_cruise_alt,
            FlightPhase::VerticalDescent,
        ));
        track_agl(segment_cruise_alt, next_point.terrain_height_m);
    }

    let stats = PlanStats {
        avg_agl: if agl_count > 0 {
            agl_sum / agl_count as f64
        } else {
            0.0
        },
        max_agl,
        max_altitude,
    };

    (waypoints, stats)
}
