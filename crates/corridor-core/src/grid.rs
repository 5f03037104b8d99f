//! Corridor grid construction: lane offsets, geodesic step sampling, and
//! height population.

use crate::error::PlanError;
use crate::models::Waypoint;
use crate::sampler::{HeightSampler, SamplePoint};
use crate::spatial::{
    bearing, haversine_distance, meters_per_deg_lat, meters_per_deg_lon, offset_by_bearing,
    route_distance_m,
};

/// Target number of steps along the whole route; bounds grid node count.
pub const DEFAULT_TARGET_STEPS: usize = 300;
const MIN_STEP_SPACING_M: f64 = 5.0;
const MAX_STEP_SPACING_M: f64 = 75.0;

/// One sampled cell of the corridor.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
    /// Planned altitude, linearly interpolated between user waypoints.
    pub altitude_m: f64,
    pub terrain_height_m: f64,
    pub obstacle_height_m: f64,
}

impl GridPoint {
    /// Lowest altitude safely clearing this cell.
    pub fn min_safe_altitude(&self, safety_buffer_m: f64) -> f64 {
        self.obstacle_height_m.max(self.terrain_height_m) + safety_buffer_m
    }

    /// Regulatory ceiling above this cell.
    pub fn faa_ceiling(&self, faa_limit_agl: f64) -> f64 {
        self.terrain_height_m + faa_limit_agl
    }
}

/// The lane×step sampled volume considered by the search for one request.
/// Read-only during search; built once per planning call.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CorridorGrid {
    /// `lanes[lane][step]`; lane count is odd, the middle lane follows the
    /// route centerline.
    pub lanes: Vec<Vec<GridPoint>>,
    /// Step index of every original user waypoint, in order.
    pub waypoint_indices: Vec<usize>,
}

impl CorridorGrid {
    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn num_steps(&self) -> usize {
        self.lanes.first().map(|lane| lane.len()).unwrap_or(0)
    }

    pub fn center_lane(&self) -> usize {
        self.lanes.len() / 2
    }

    pub fn point(&self, step: usize, lane: usize) -> &GridPoint {
        &self.lanes[lane][step]
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty() || self.lanes[0].is_empty()
    }
}

/// Symmetric lateral offsets around the centerline. An even `lane_count` is
/// widened by one so the fan always has a center lane.
pub fn build_lane_offsets(lane_count: usize, lane_spacing_m: f64) -> Vec<f64> {
    let spacing = lane_spacing_m.max(1.0);
    let count = lane_count.max(1) | 1;
    let half = (count / 2) as i64;
    (-half..=half).map(|i| i as f64 * spacing).collect()
}

/// Step spacing so the whole route samples to roughly `target_steps` steps,
/// clamped to a sane meter range.
pub fn resolve_step_spacing(waypoints: &[Waypoint], target_steps: usize) -> f64 {
    let total_m = route_distance_m(waypoints);
    let target = target_steps.max(1) as f64;
    (total_m / target).clamp(MIN_STEP_SPACING_M, MAX_STEP_SPACING_M)
}

/// Build the corridor grid for an ordered waypoint list.
///
/// Each consecutive pair is sampled along its geodesic at `step_spacing_m`
/// intervals; lanes are projected perpendicular to the leg bearing. Heights
/// are left at zero for the external sampler to fill.
pub fn build_corridor_grid(
    waypoints: &[Waypoint],
    lane_offsets: &[f64],
    step_spacing_m: f64,
) -> Result<CorridorGrid, PlanError> {
    if waypoints.len() < 2 {
        return Err(PlanError::InsufficientWaypoints);
    }
    if lane_offsets.is_empty() {
        return Err(PlanError::EmptyGrid);
    }
    let spacing = step_spacing_m.max(1.0);
    let mut lanes: Vec<Vec<GridPoint>> = lane_offsets.iter().map(|_| Vec::new()).collect();

    let mut waypoint_indices = Vec::with_capacity(waypoints.len());
    waypoint_indices.push(0);

    for i in 0..waypoints.len() - 1 {
        let start = &waypoints[i];
        let end = &waypoints[i + 1];
        let distance_m = haversine_distance(start.lat, start.lon, end.lat, end.lon);
        let heading = bearing(start.lat, start.lon, end.lat, end.lon);
        let num_steps = (distance_m / spacing).ceil().max(1.0) as usize;

        for step_idx in 0..=num_steps {
            // The leg start coincides with the previous leg's end step.
            if i > 0 && step_idx == 0 {
                continue;
            }
            let fraction = step_idx as f64 / num_steps as f64;
            let (center_lat, center_lon) =
                offset_by_bearing(start.lat, start.lon, distance_m * fraction, heading);
            let altitude_m = start.altitude_m + fraction * (end.altitude_m - start.altitude_m);

            for (lane_idx, offset) in lane_offsets.iter().enumerate() {
                let (lat, lon) = if offset.abs() < f64::EPSILON {
                    (center_lat, center_lon)
                } else {
                    let lateral_bearing = heading
                        + if *offset >= 0.0 {
                            std::f64::consts::FRAC_PI_2
                        } else {
                            -std::f64::consts::FRAC_PI_2
                        };
                    offset_by_bearing(center_lat, center_lon, offset.abs(), lateral_bearing)
                };
                lanes[lane_idx].push(GridPoint {
                    lat,
                    lon,
                    altitude_m,
                    terrain_height_m: 0.0,
                    obstacle_height_m: 0.0,
                });
            }
        }

        waypoint_indices.push(lanes[0].len() - 1);
    }

    Ok(CorridorGrid {
        lanes,
        waypoint_indices,
    })
}

/// A synthetic cylindrical obstacle for scenario files and tests.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Obstacle {
    pub lat: f64,
    pub lon: f64,
    pub radius_m: f64,
    pub height_m: f64,
}

/// Fill terrain heights from a local sampling function; obstacle height is
/// floored to the terrain.
pub fn apply_terrain<F>(grid: &mut CorridorGrid, terrain_height: F)
where
    F: Fn(f64, f64) -> f64,
{
    for lane in &mut grid.lanes {
        for point in lane {
            let terrain = terrain_height(point.lat, point.lon).max(0.0);
            point.terrain_height_m = terrain;
            point.obstacle_height_m = point.obstacle_height_m.max(terrain);
        }
    }
}

/// Raise obstacle heights of cells covered by the given footprints.
pub fn apply_obstacles(grid: &mut CorridorGrid, obstacles: &[Obstacle]) {
    for lane in &mut grid.lanes {
        for point in lane {
            let meters_lat = meters_per_deg_lat(point.lat);
            let meters_lon = meters_per_deg_lon(point.lat).max(1.0);
            for obstacle in obstacles {
                let radius = obstacle.radius_m.max(0.0);
                if radius <= 0.0 || obstacle.height_m <= 0.0 {
                    continue;
                }
                let dx = (obstacle.lon - point.lon) * meters_lon;
                let dy = (obstacle.lat - point.lat) * meters_lat;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let obstacle_alt = point.terrain_height_m + obstacle.height_m;
                if obstacle_alt > point.obstacle_height_m {
                    point.obstacle_height_m = obstacle_alt;
                }
            }
        }
    }
}

/// Fill obstacle heights from the external sampler in one batched call.
///
/// A sampler failure leaves the grid untouched (height 0 fallback) and logs
/// a warning; planning proceeds.
pub async fn apply_sampled_heights(grid: &mut CorridorGrid, sampler: &impl HeightSampler) {
    let mut points = Vec::with_capacity(grid.num_lanes() * grid.num_steps());
    for lane in &grid.lanes {
        for point in lane {
            points.push(SamplePoint::with_probe(
                point.lat,
                point.lon,
                point.altitude_m,
            ));
        }
    }

    let heights = match sampler.sample_heights(&points).await {
        Ok(heights) if heights.len() == points.len() => heights,
        Ok(heights) => {
            tracing::warn!(
                want = points.len(),
                got = heights.len(),
                "height sampler returned wrong count, keeping zero heights"
            );
            return;
        }
        Err(err) => {
            tracing::warn!("height sampling failed, keeping zero heights: {}", err);
            return;
        }
    };

    let mut idx = 0;
    for lane in &mut grid.lanes {
        for point in lane {
            let height = heights[idx];
            idx += 1;
            if !height.is_finite() {
                continue;
            }
            point.obstacle_height_m = point
                .obstacle_height_m
                .max(point.terrain_height_m)
                .max(height);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HeightSampleError;

    fn waypoint(lat: f64, lon: f64, altitude_m: f64) -> Waypoint {
        Waypoint {
            lat,
            lon,
            altitude_m,
        }
    }

    #[test]
    fn lane_offsets_are_symmetric_and_odd() {
        let offsets = build_lane_offsets(5, 15.0);
        assert_eq!(offsets, vec![-30.0, -15.0, 0.0, 15.0, 30.0]);

        // Even requests widen by one
        let offsets = build_lane_offsets(4, 10.0);
        assert_eq!(offsets.len(), 5);
        assert_eq!(offsets[2], 0.0);
    }

    #[test]
    fn step_spacing_targets_step_count() {
        // ~1.1km route, target 300 steps -> clamped at the 5m floor
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.01, -117.0, 0.0)];
        assert_eq!(resolve_step_spacing(&waypoints, 300), 5.0);

        // ~111km route -> 111_194/300 ≈ 371m, clamped at the 75m ceiling
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(34.0, -117.0, 0.0)];
        assert_eq!(resolve_step_spacing(&waypoints, 300), 75.0);
    }

    #[test]
    fn grid_requires_two_waypoints() {
        let err = build_corridor_grid(&[waypoint(33.0, -117.0, 0.0)], &[0.0], 10.0);
        assert_eq!(err.unwrap_err(), PlanError::InsufficientWaypoints);
    }

    #[test]
    fn empty_lane_offsets_are_rejected() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.001, -117.0, 0.0)];
        let err = build_corridor_grid(&waypoints, &[], 10.0);
        assert_eq!(err.unwrap_err(), PlanError::EmptyGrid);
    }

    #[test]
    fn grid_marks_waypoint_steps_and_dedups_leg_joins() {
        let waypoints = vec![
            waypoint(33.0, -117.0, 0.0),
            waypoint(33.002, -117.0, 10.0),
            waypoint(33.004, -117.0, 0.0),
        ];
        let offsets = build_lane_offsets(3, 15.0);
        let grid = build_corridor_grid(&waypoints, &offsets, 25.0).unwrap();

        assert_eq!(grid.num_lanes(), 3);
        assert_eq!(grid.waypoint_indices.len(), 3);
        assert_eq!(grid.waypoint_indices[0], 0);
        assert_eq!(*grid.waypoint_indices.last().unwrap(), grid.num_steps() - 1);

        // The middle waypoint lands exactly on its marked step.
        let mid = grid.point(grid.waypoint_indices[1], grid.center_lane());
        assert!((mid.lat - 33.002).abs() < 1e-6);
        assert!((mid.altitude_m - 10.0).abs() < 1e-9);

        // Every lane has the same step count.
        for lane in &grid.lanes {
            assert_eq!(lane.len(), grid.num_steps());
        }
    }

    #[test]
    fn lanes_sit_at_the_requested_lateral_offset() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.01, -117.0, 0.0)];
        let offsets = build_lane_offsets(3, 20.0);
        let grid = build_corridor_grid(&waypoints, &offsets, 50.0).unwrap();

        let step = grid.num_steps() / 2;
        let center = grid.point(step, 1);
        let left = grid.point(step, 0);
        let right = grid.point(step, 2);
        let left_dist = haversine_distance(center.lat, center.lon, left.lat, left.lon);
        let right_dist = haversine_distance(center.lat, center.lon, right.lat, right.lon);
        assert!((left_dist - 20.0).abs() < 0.5, "left {left_dist}");
        assert!((right_dist - 20.0).abs() < 0.5, "right {right_dist}");
    }

    #[test]
    fn altitude_interpolates_linearly_along_leg() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.01, -117.0, 100.0)];
        let grid = build_corridor_grid(&waypoints, &[0.0], 50.0).unwrap();
        let steps = grid.num_steps();
        let first = grid.point(0, 0).altitude_m;
        let last = grid.point(steps - 1, 0).altitude_m;
        assert_eq!(first, 0.0);
        assert_eq!(last, 100.0);
        let mid = grid.point(steps / 2, 0).altitude_m;
        assert!(mid > 30.0 && mid < 70.0, "mid {mid}");
    }

    #[test]
    fn obstacles_raise_covered_cells_only() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.01, -117.0, 0.0)];
        let grid = &mut build_corridor_grid(&waypoints, &[0.0], 50.0).unwrap();
        apply_terrain(grid, |_, _| 5.0);

        let step = grid.num_steps() / 2;
        let target = grid.point(step, 0).clone();
        apply_obstacles(
            grid,
            &[Obstacle {
                lat: target.lat,
                lon: target.lon,
                radius_m: 10.0,
                height_m: 40.0,
            }],
        );

        assert_eq!(grid.point(step, 0).obstacle_height_m, 45.0);
        assert_eq!(grid.point(0, 0).obstacle_height_m, 5.0);
        assert_eq!(grid.point(0, 0).terrain_height_m, 5.0);
    }

    struct FixedSampler(Vec<f64>);

    impl HeightSampler for FixedSampler {
        async fn sample_heights(
            &self,
            _points: &[SamplePoint],
        ) -> Result<Vec<f64>, HeightSampleError> {
            Ok(self.0.clone())
        }
    }

    struct FailingSampler;

    impl HeightSampler for FailingSampler {
        async fn sample_heights(
            &self,
            _points: &[SamplePoint],
        ) -> Result<Vec<f64>, HeightSampleError> {
            Err(HeightSampleError::Provider("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn sampled_heights_fill_obstacles() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.001, -117.0, 0.0)];
        let mut grid = build_corridor_grid(&waypoints, &[0.0], 60.0).unwrap();
        let total = grid.num_steps();
        let heights: Vec<f64> = (0..total).map(|i| i as f64 * 2.0).collect();
        apply_sampled_heights(&mut grid, &FixedSampler(heights)).await;

        assert_eq!(grid.point(0, 0).obstacle_height_m, 0.0);
        assert_eq!(grid.point(total - 1, 0).obstacle_height_m, (total - 1) as f64 * 2.0);
    }

    #[tokio::test]
    async fn sampler_failure_falls_back_to_zero_heights() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.001, -117.0, 0.0)];
        let mut grid = build_corridor_grid(&waypoints, &[0.0], 60.0).unwrap();
        apply_sampled_heights(&mut grid, &FailingSampler).await;
        assert!(grid.lanes[0].iter().all(|p| p.obstacle_height_m == 0.0));
    }

    #[tokio::test]
    async fn count_mismatch_is_ignored() {
        let waypoints = vec![waypoint(33.0, -117.0, 0.0), waypoint(33.001, -117.0, 0.0)];
        let mut grid = build_corridor_grid(&waypoints, &[0.0], 60.0).unwrap();
        apply_sampled_heights(&mut grid, &FixedSampler(vec![99.0])).await;
        assert!(grid.lanes[0].iter().all(|p| p.obstacle_height_m == 0.0));
    }
}
