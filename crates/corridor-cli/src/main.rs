//! plan-route - run the corridor planner against a JSON scenario file.
//!
//! Usage:
//!   cargo run -p corridor-cli --bin plan-route -- --scenario demo.json --validate

use anyhow::{Context, Result};
use clap::Parser;
use corridor_core::{
    apply_obstacles, apply_terrain, build_corridor_grid, build_lane_offsets, optimize_flight_path,
    resolve_step_spacing, validate_and_fix_segments, EngineConfig, HeightSampler,
    HeightSampleError, Obstacle, RawGeofence, SamplePoint, Waypoint,
};
use corridor_core::grid::DEFAULT_TARGET_STEPS;
use corridor_core::spatial::{meters_per_deg_lat, meters_per_deg_lon};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Plan a flight path through a corridor scenario
#[derive(Parser, Debug)]
#[command(author, version, about = "Corridor route planner")]
struct Args {
    /// Path to the scenario JSON file
    #[arg(long)]
    scenario: PathBuf,

    /// Number of parallel lanes (even counts are widened by one)
    #[arg(long, default_value_t = 5)]
    lanes: usize,

    /// Lateral spacing between lanes in meters
    #[arg(long, default_value_t = 15.0)]
    lane_spacing: f64,

    /// Re-check cruise segments against the scenario heights after planning
    #[arg(long, default_value_t = false)]
    validate: bool,

    /// Pretty-print the result JSON
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

/// On-disk scenario: route, airspace, and synthetic world.
#[derive(Debug, Deserialize)]
struct Scenario {
    waypoints: Vec<Waypoint>,
    #[serde(default)]
    geofences: Vec<RawGeofence>,
    #[serde(default)]
    obstacles: Vec<Obstacle>,
    /// Flat terrain height applied to every grid cell.
    #[serde(default)]
    terrain_height_m: f64,
    /// Engine config overrides, keyed by field name.
    #[serde(default)]
    config: HashMap<String, f64>,
}

/// Height sampler backed by the scenario's own terrain and obstacles, used
/// for the post-plan validation pass.
struct ScenarioSampler {
    terrain_height_m: f64,
    obstacles: Vec<Obstacle>,
}

impl HeightSampler for ScenarioSampler {
    async fn sample_heights(
        &self,
        points: &[SamplePoint],
    ) -> Result<Vec<f64>, HeightSampleError> {
        Ok(points
            .iter()
            .map(|point| {
                let mut height = self.terrain_height_m;
                for obstacle in &self.obstacles {
                    let dx =
                        (obstacle.lon - point.lon) * meters_per_deg_lon(point.lat).max(1.0);
                    let dy = (obstacle.lat - point.lat) * meters_per_deg_lat(point.lat);
                    if dx * dx + dy * dy <= obstacle.radius_m * obstacle.radius_m {
                        height = height.max(self.terrain_height_m + obstacle.height_m);
                    }
                }
                height
            })
            .collect())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("corridor_core=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    let raw = std::fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).context("parsing scenario JSON")?;

    let mut config = EngineConfig::default();
    config.apply_overrides(&scenario.config);

    let lane_offsets = build_lane_offsets(args.lanes, args.lane_spacing);
    let step_spacing = resolve_step_spacing(&scenario.waypoints, DEFAULT_TARGET_STEPS);
    tracing::info!(
        lanes = lane_offsets.len(),
        step_spacing_m = step_spacing,
        "building corridor grid"
    );

    let mut grid =
        build_corridor_grid(&scenario.waypoints, &lane_offsets, step_spacing)?;
    apply_terrain(&mut grid, |_, _| scenario.terrain_height_m);
    apply_obstacles(&mut grid, &scenario.obstacles);

    let mut result =
        optimize_flight_path(&scenario.waypoints, &grid, &scenario.geofences, &config)?;
    tracing::info!(
        success = result.success,
        waypoints = result.waypoints.len(),
        nodes_visited = result.nodes_visited,
        "planning finished"
    );

    if args.validate && result.success {
        let sampler = ScenarioSampler {
            terrain_height_m: scenario.terrain_height_m,
            obstacles: scenario.obstacles.clone(),
        };
        result.waypoints =
            validate_and_fix_segments(&result.waypoints, &sampler, &config).await;
        result.optimized_points = result.waypoints.len();
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{json}");

    Ok(())
}
