pub mod config;
pub mod error;
pub mod geofence;
pub mod grid;
pub mod models;
pub mod planner;
pub mod sampler;
pub mod search;
pub mod smooth;
pub mod spatial;
pub mod synth;
pub mod validate;

pub use config::EngineConfig;
pub use error::{HeightSampleError, PlanError};
pub use geofence::GeofenceIndex;
pub use grid::{
    apply_obstacles, apply_sampled_heights, apply_terrain, build_corridor_grid,
    build_lane_offsets, resolve_step_spacing, CorridorGrid, GridPoint, Obstacle,
};
pub use models::{
    FlightPhase, FlightWaypoint, GeofenceKind, PlanResult, PlanStats, RawGeofence, Waypoint,
};
pub use planner::optimize_flight_path;
pub use sampler::{ConstantSampler, HeightSampler, SamplePoint};
pub use search::{search_corridor, PathNode, SearchOutcome};
pub use smooth::smooth_path;
pub use spatial::haversine_distance;
pub use synth::synthesize_waypoints;
pub use validate::validate_and_fix_segments;
