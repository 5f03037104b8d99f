//! Top-level planning entry point: geofence index → A* → string pulling →
//! waypoint synthesis.

use crate::config::EngineConfig;
use crate::error::PlanError;
use crate::geofence::GeofenceIndex;
use crate::grid::CorridorGrid;
use crate::models::{PlanResult, RawGeofence, Waypoint};
use crate::search::search_corridor;
use crate::smooth::smooth_path;
use crate::synth::synthesize_waypoints;

/// Compute the minimum-cost collision-free flight path through a corridor
/// grid.
///
/// Pure function of its inputs plus configuration: no shared mutable state,
/// safe to call concurrently from independent tasks. An exhausted search is
/// reported as `success: false`, not an error; the only hard failures are
/// input-contract violations.
pub fn optimize_flight_path(
    waypoints: &[Waypoint],
    grid: &CorridorGrid,
    geofences: &[RawGeofence],
    config: &EngineConfig,
) -> Result<PlanResult, PlanError> {
    if waypoints.len() < 2 {
        return Err(PlanError::InsufficientWaypoints);
    }
    if grid.is_empty() {
        return Err(PlanError::EmptyGrid);
    }

    let index = GeofenceIndex::build(geofences);
    let outcome = search_corridor(grid, &index, config);
    let Some(path) = outcome.path else {
        tracing::debug!(
            nodes_visited = outcome.nodes_visited,
            "search exhausted open set without reaching goal"
        );
        return Ok(PlanResult::no_path(waypoints.len(), outcome.nodes_visited));
    };

    let smoothed = smooth_path(&path, grid, &index, config);
    let (flight_waypoints, stats) = synthesize_waypoints(&smoothed, grid, config);

    Ok(PlanResult {
        success: true,
        optimized_points: flight_waypoints.len(),
        waypoints: flight_waypoints,
        nodes_visited: outcome.nodes_visited,
        stats: Some(stats),
        impossible_segments: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{build_corridor_grid, build_lane_offsets};
    use crate::spatial::offset_by_bearing;

    fn waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint {
            lat,
            lon,
            altitude_m: 0.0,
        }
    }

    fn straight_route(length_m: f64) -> (Vec<Waypoint>, CorridorGrid) {
        let (end_lat, end_lon) =
            offset_by_bearing(33.0, -117.0, length_m, std::f64::consts::FRAC_PI_2);
        let waypoints = vec![waypoint(33.0, -117.0), waypoint(end_lat, end_lon)];
        let grid =
            build_corridor_grid(&waypoints, &build_lane_offsets(3, 15.0), 10.0).unwrap();
        (waypoints, grid)
    }

    #[test]
    fn too_few_waypoints_is_a_hard_error() {
        let (_, grid) = straight_route(200.0);
        let result = optimize_flight_path(
            &[waypoint(33.0, -117.0)],
            &grid,
            &[],
            &EngineConfig::default(),
        );
        assert_eq!(result.unwrap_err(), PlanError::InsufficientWaypoints);
    }

    #[test]
    fn empty_grid_is_a_hard_error() {
        let (waypoints, _) = straight_route(200.0);
        let empty = CorridorGrid {
            lanes: Vec::new(),
            waypoint_indices: Vec::new(),
        };
        let result =
            optimize_flight_path(&waypoints, &empty, &[], &EngineConfig::default());
        assert_eq!(result.unwrap_err(), PlanError::EmptyGrid);
    }

    #[test]
    fn flat_route_plans_successfully() {
        let (waypoints, grid) = straight_route(300.0);
        let result =
            optimize_flight_path(&waypoints, &grid, &[], &EngineConfig::default()).unwrap();
        assert!(result.success);
        assert!(result.nodes_visited > 0);
        assert_eq!(result.optimized_points, result.waypoints.len());
        assert!(result.impossible_segments.is_empty());
        assert!(result.stats.is_some());
    }
}
