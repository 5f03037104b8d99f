//! A* search over the implicit (step, lane) DAG of a corridor grid.
//!
//! The search tracks "cruise-carried" altitude: the altitude a candidate path
//! is already flying at when it reaches a cell. Climb cost is charged only
//! for the portion above the carried altitude, so an obstacle cleared once is
//! never paid for twice, and the carried altitude never decreases along a
//! path.

use crate::config::EngineConfig;
use crate::geofence::GeofenceIndex;
use crate::grid::CorridorGrid;
use crate::spatial::haversine_distance;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A node of the reconstructed path.
#[derive(Debug, Clone, Copy)]
pub struct PathNode {
    pub step: usize,
    pub lane: usize,
    pub altitude_m: f64,
}

/// Search output; `path` is `None` when the open set drained without
/// reaching the goal.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub path: Option<Vec<PathNode>>,
    pub nodes_visited: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    step: usize,
    lane: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    key: NodeKey,
    g_score: FloatOrd,
    f_score: FloatOrd,
    /// Monotone insertion counter; breaks f-score ties deterministically so
    /// equal-cost paths reproduce across runs.
    seq: u64,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.seq == other.seq
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Run A* from `(0, center)` to `(last, center)`.
pub fn search_corridor(
    grid: &CorridorGrid,
    geofences: &GeofenceIndex,
    config: &EngineConfig,
) -> SearchOutcome {
    let num_lanes = grid.num_lanes();
    let num_steps = grid.num_steps();
    let center_lane = grid.center_lane();
    let cruise_speed = config.cruise_speed_mps.max(1.0);

    let start_key = NodeKey {
        step: 0,
        lane: center_lane,
    };
    let start_point = grid.point(0, center_lane);
    let goal_point = grid.point(num_steps - 1, center_lane);

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut closed_set: HashSet<NodeKey> = HashSet::new();
    let mut g_score: HashMap<NodeKey, f64> = HashMap::new();
    let mut carried_alt: HashMap<NodeKey, f64> = HashMap::new();
    let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();
    let mut seq = 0u64;

    let start_h = haversine_distance(
        start_point.lat,
        start_point.lon,
        goal_point.lat,
        goal_point.lon,
    ) / cruise_speed;

    g_score.insert(start_key, 0.0);
    // Takeoff: the path starts on the ground.
    carried_alt.insert(start_key, start_point.terrain_height_m);
    open_set.push(Reverse(OpenNode {
        key: start_key,
        g_score: FloatOrd(0.0),
        f_score: FloatOrd(start_h),
        seq,
    }));

    let mut goal: Option<NodeKey> = None;
    let mut nodes_visited = 0usize;

    while let Some(Reverse(current)) = open_set.pop() {
        let current_key = current.key;
        if closed_set.contains(&current_key) {
            continue;
        }
        let best_g = g_score.get(&current_key).copied().unwrap_or(f64::INFINITY);
        if current.g_score.0 > best_g + 1e-9 {
            continue;
        }

        nodes_visited += 1;

        if current_key.step == num_steps - 1 && current_key.lane == center_lane {
            goal = Some(current_key);
            break;
        }

        closed_set.insert(current_key);
        let next_step = current_key.step + 1;
        if next_step >= num_steps {
            continue;
        }

        let curr_point = grid.point(current_key.step, current_key.lane);
        let current_alt = carried_alt.get(&current_key).copied().unwrap_or(0.0);

        for lane_delta in [-1i64, 0, 1] {
            let next_lane = current_key.lane as i64 + lane_delta;
            if next_lane < 0 || next_lane as usize >= num_lanes {
                continue;
            }
            let next_lane = next_lane as usize;
            let next_key = NodeKey {
                step: next_step,
                lane: next_lane,
            };
            if closed_set.contains(&next_key) {
                continue;
            }

            let next_point = grid.point(next_step, next_lane);
            let target_alt = next_point.min_safe_altitude(config.safety_buffer_m);
            // Building too tall relative to the regulatory ceiling.
            if target_alt > next_point.faa_ceiling(config.faa_limit_agl) {
                continue;
            }

            let cruise_alt = current_alt.max(target_alt);
            if !geofences.is_empty()
                && geofences.blocks_segment(
                    curr_point.lat,
                    curr_point.lon,
                    current_alt,
                    next_point.lat,
                    next_point.lon,
                    cruise_alt,
                    config.geofence_sample_step_m,
                )
            {
                continue;
            }

            let dist = haversine_distance(
                curr_point.lat,
                curr_point.lon,
                next_point.lat,
                next_point.lon,
            );
            let time_cost = dist / cruise_speed * config.cost_time_weight;
            let climb_cost = (target_alt - current_alt).max(0.0) * config.cost_climb_penalty;
            let lane_change_cost = lane_delta.unsigned_abs() as f64 * config.cost_lane_change;

            let mut proximity_cost = 0.0;
            if next_lane > 0 {
                let left = grid.point(next_step, next_lane - 1);
                if left.min_safe_altitude(config.safety_buffer_m) > cruise_alt {
                    proximity_cost += config.cost_proximity_penalty;
                }
            }
            if next_lane + 1 < num_lanes {
                let right = grid.point(next_step, next_lane + 1);
                if right.min_safe_altitude(config.safety_buffer_m) > cruise_alt {
                    proximity_cost += config.cost_proximity_penalty;
                }
            }

            let tentative_g = best_g + time_cost + climb_cost + lane_change_cost + proximity_cost;
            if tentative_g < g_score.get(&next_key).copied().unwrap_or(f64::INFINITY) {
                came_from.insert(next_key, current_key);
                g_score.insert(next_key, tentative_g);
                // Paths converging on one node keep the highest cleared
                // floor: never descend below an altitude already committed.
                let entry = carried_alt.entry(next_key).or_insert(cruise_alt);
                *entry = entry.max(cruise_alt);

                let h_score = haversine_distance(
                    next_point.lat,
                    next_point.lon,
                    goal_point.lat,
                    goal_point.lon,
                ) / cruise_speed;

                seq += 1;
                open_set.push(Reverse(OpenNode {
                    key: next_key,
                    g_score: FloatOrd(tentative_g),
                    f_score: FloatOrd(tentative_g + h_score),
                    seq,
                }));
            }
        }
    }

    let Some(goal_key) = goal else {
        return SearchOutcome {
            path: None,
            nodes_visited,
        };
    };

    let mut path = Vec::new();
    let mut cursor = Some(goal_key);
    while let Some(key) = cursor {
        path.push(PathNode {
            step: key.step,
            lane: key.lane,
            altitude_m: carried_alt.get(&key).copied().unwrap_or(0.0),
        });
        cursor = came_from.get(&key).copied();
    }
    path.reverse();

    SearchOutcome {
        path: Some(path),
        nodes_visited,
    }
}
