//! Core data model for corridor planning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-supplied route waypoint (ground stop).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
}

/// Flight phase of an emitted waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightPhase {
    GroundStart,
    GroundWaypoint,
    GroundEnd,
    VerticalAscent,
    VerticalDescent,
    Cruise,
    CruiseCorner,
    CruiseIntermediate,
    CruiseDetour,
}

impl FlightPhase {
    /// Priority hint for downstream consumers: 1 marks waypoints that must
    /// survive any further simplification, 0 marks regular cruise points.
    pub fn default_priority(self) -> u8 {
        match self {
            FlightPhase::Cruise | FlightPhase::CruiseIntermediate => 0,
            _ => 1,
        }
    }

    /// True for the on-ground phases.
    pub fn is_ground(self) -> bool {
        matches!(
            self,
            FlightPhase::GroundStart | FlightPhase::GroundWaypoint | FlightPhase::GroundEnd
        )
    }

    /// True for the vertical climb/descent phases.
    pub fn is_vertical(self) -> bool {
        matches!(
            self,
            FlightPhase::VerticalAscent | FlightPhase::VerticalDescent
        )
    }
}

/// A waypoint in the final executable flight path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightWaypoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    pub phase: FlightPhase,
    pub priority: u8,
}

impl FlightWaypoint {
    pub fn new(lat: f64, lon: f64, altitude_m: f64, phase: FlightPhase) -> Self {
        Self {
            lat,
            lon,
            altitude_m,
            phase,
            priority: phase.default_priority(),
        }
    }
}

/// Type of geofence/restricted area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceKind {
    /// No flights allowed
    NoFlyZone,
    /// Flights allowed with authorization
    RestrictedArea,
    /// Temporary flight restriction (TFR)
    TemporaryRestriction,
    /// Advisory only (not enforced)
    Advisory,
}

/// A raw geofence record as received from the airspace service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGeofence {
    pub id: String,
    pub name: String,
    pub kind: GeofenceKind,
    /// Polygon vertices as [lat, lon] pairs (closed ring - first == last)
    pub polygon: Vec<[f64; 2]>,
    /// Lower altitude limit in meters (floor); defaults at index build
    #[serde(default)]
    pub lower_altitude_m: Option<f64>,
    /// Upper altitude limit in meters (ceiling); defaults at index build
    #[serde(default)]
    pub upper_altitude_m: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Aggregate altitude statistics for a planned path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStats {
    pub avg_agl: f64,
    pub max_agl: f64,
    pub max_altitude: f64,
}

/// Outcome of a planning call.
///
/// "No path" is a reportable outcome, not an error: `success` is false and
/// `impossible_segments` lists the user-leg index pairs that could not be
/// connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResult {
    pub success: bool,
    pub waypoints: Vec<FlightWaypoint>,
    pub optimized_points: usize,
    pub nodes_visited: usize,
    pub stats: Option<PlanStats>,
    pub impossible_segments: Vec<(usize, usize)>,
}

impl PlanResult {
    /// A failed plan covering every leg of the given waypoint list.
    pub(crate) fn no_path(waypoint_count: usize, nodes_visited: usize) -> Self {
        let impossible_segments = (0..waypoint_count.saturating_sub(1))
            .map(|i| (i, i + 1))
            .collect();
        Self {
            success: false,
            waypoints: Vec::new(),
            optimized_points: 0,
            nodes_visited,
            stats: None,
            impossible_segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_screaming_snake() {
        let json = serde_json::to_string(&FlightPhase::CruiseCorner).unwrap();
        assert_eq!(json, "\"CRUISE_CORNER\"");
        let back: FlightPhase = serde_json::from_str("\"VERTICAL_ASCENT\"").unwrap();
        assert_eq!(back, FlightPhase::VerticalAscent);
    }

    #[test]
    fn must_keep_phases_have_priority_one() {
        assert_eq!(FlightPhase::GroundStart.default_priority(), 1);
        assert_eq!(FlightPhase::CruiseCorner.default_priority(), 1);
        assert_eq!(FlightPhase::CruiseDetour.default_priority(), 1);
        assert_eq!(FlightPhase::Cruise.default_priority(), 0);
        assert_eq!(FlightPhase::CruiseIntermediate.default_priority(), 0);
    }
}
