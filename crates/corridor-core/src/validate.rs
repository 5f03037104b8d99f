//! Post-pass segment validation: re-checks cruise segments against freshly
//! sampled heights and inserts detour waypoints where a collision is found.
//!
//! Best-effort fixup, not a re-search: only the first and last collision on
//! a segment are corrected, so overlapping collisions may remain. Callers
//! wanting a hard guarantee should re-plan with the detours as waypoints.

use crate::config::EngineConfig;
use crate::models::{FlightPhase, FlightWaypoint};
use crate::sampler::{HeightSampler, SamplePoint};

/// Interior samples taken per validated segment.
const SAMPLES_PER_SEGMENT: usize = 5;
/// Extra clearance applied to an inserted detour point.
const DETOUR_MARGIN_M: f64 = 10.0;

/// Re-check every cruise segment of a synthesized path against the height
/// sampler, inserting `CRUISE_DETOUR` waypoints at detected collisions.
///
/// Sampler failures leave the affected segment unchanged (logged). The
/// returned sequence preserves the input order.
pub async fn validate_and_fix_segments(
    waypoints: &[FlightWaypoint],
    sampler: &impl HeightSampler,
    config: &EngineConfig,
) -> Vec<FlightWaypoint> {
    let mut output: Vec<FlightWaypoint> = Vec::with_capacity(waypoints.len());

    for (idx, waypoint) in waypoints.iter().enumerate() {
        output.push(waypoint.clone());
        let Some(next) = waypoints.get(idx + 1) else {
            continue;
        };
        if !is_cruise_segment(waypoint, next) {
            continue;
        }

        let mut points = Vec::with_capacity(SAMPLES_PER_SEGMENT);
        let mut altitudes = Vec::with_capacity(SAMPLES_PER_SEGMENT);
        for i in 1..=SAMPLES_PER_SEGMENT {
            let t = i as f64 / (SAMPLES_PER_SEGMENT + 1) as f64;
            let lat = waypoint.lat + t * (next.lat - waypoint.lat);
            let lon = waypoint.lon + t * (next.lon - waypoint.lon);
            let alt = waypoint.altitude_m + t * (next.altitude_m - waypoint.altitude_m);
            points.push(SamplePoint::with_probe(lat, lon, alt));
            altitudes.push(alt);
        }

        let heights = match sampler.sample_heights(&points).await {
            Ok(heights) if heights.len() == points.len() => heights,
            Ok(heights) => {
                tracing::warn!(
                    want = points.len(),
                    got = heights.len(),
                    "segment validation sampler returned wrong count, skipping segment"
                );
                continue;
            }
            Err(err) => {
                tracing::warn!("segment validation sampling failed, skipping segment: {}", err);
                continue;
            }
        };

        let mut collisions: Vec<FlightWaypoint> = Vec::new();
        for (i, height) in heights.iter().enumerate() {
            let height = if height.is_finite() { *height } else { 0.0 };
            if height + config.safety_buffer_m > altitudes[i] {
                let point = &points[i];
                let detour_alt = (height + DETOUR_MARGIN_M).max(altitudes[i]);
                collisions.push(FlightWaypoint::new(
                    point.lat,
                    point.lon,
                    detour_alt,
                    FlightPhase::CruiseDetour,
                ));
            }
        }

        // First and last detected collision only; known partial fix.
        match collisions.len() {
            0 => {}
            1 => output.push(collisions.remove(0)),
            n => {
                let last = collisions.remove(n - 1);
                let first = collisions.remove(0);
                tracing::debug!(
                    collisions = n,
                    "multiple collisions on one segment, correcting first and last only"
                );
                output.push(first);
                output.push(last);
            }
        }
    }

    output
}

/// A segment is validated only when it is flown level. The vertical climb
/// and drop legs are exactly those touching a ground waypoint (the vertical
/// markers are co-located with their ground points), so excluding ground
/// endpoints excludes them.
fn is_cruise_segment(start: &FlightWaypoint, end: &FlightWaypoint) -> bool {
    !start.phase.is_ground() && !end.phase.is_ground()
}
