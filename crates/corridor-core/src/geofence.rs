//! Geofence indexing: normalizes raw geofence records into a fast-reject
//! spatial/altitude index consulted by the search and the smoother.

use crate::models::{GeofenceKind, RawGeofence};
use crate::spatial::haversine_distance;

/// Default altitude band applied when a record carries no bounds.
const DEFAULT_LOWER_ALTITUDE_M: f64 = 0.0;
const DEFAULT_UPPER_ALTITUDE_M: f64 = 120.0;

/// Cap on per-segment geofence samples: a degenerate spacing must not turn
/// one edge check into millions of tests.
const MAX_SEGMENT_SAMPLES: usize = 1000;

/// Axis-aligned lat/lon bounding box.
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    fn of_polygon(polygon: &[[f64; 2]]) -> Self {
        let mut bbox = Self {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for vertex in polygon {
            bbox.min_lat = bbox.min_lat.min(vertex[0]);
            bbox.max_lat = bbox.max_lat.max(vertex[0]);
            bbox.min_lon = bbox.min_lon.min(vertex[1]);
            bbox.max_lon = bbox.max_lon.max(vertex[1]);
        }
        bbox
    }

    fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// An enforced geofence, normalized for fast containment queries.
#[derive(Debug, Clone)]
pub struct GeofenceIndexEntry {
    pub id: String,
    pub polygon: Vec<[f64; 2]>,
    pub bbox: BoundingBox,
    pub lower_altitude_m: f64,
    pub upper_altitude_m: f64,
}

impl GeofenceIndexEntry {
    /// Point-in-band-and-polygon test: bbox reject, altitude band, then
    /// even-odd ray casting.
    pub fn contains(&self, lat: f64, lon: f64, altitude_m: f64) -> bool {
        if altitude_m < self.lower_altitude_m || altitude_m > self.upper_altitude_m {
            return false;
        }
        if !self.bbox.contains(lat, lon) {
            return false;
        }

        let mut inside = false;
        let n = self.polygon.len();
        let mut j = n - 1;
        for i in 0..n {
            let yi = self.polygon[i][0];
            let xi = self.polygon[i][1];
            let yj = self.polygon[j][0];
            let xj = self.polygon[j][1];

            if ((yi > lat) != (yj > lat)) && (lon < (xj - xi) * (lat - yi) / (yj - yi) + xi) {
                inside = !inside;
            }
            j = i;
        }

        inside
    }
}

/// Index over all enforced geofences for one planning request.
#[derive(Debug, Clone, Default)]
pub struct GeofenceIndex {
    entries: Vec<GeofenceIndexEntry>,
}

impl GeofenceIndex {
    /// Build the index, silently skipping records that are inactive,
    /// advisory-only, or have a degenerate polygon. Skips are logged.
    pub fn build(raw: &[RawGeofence]) -> Self {
        let mut entries = Vec::new();
        for fence in raw {
            if !fence.active {
                tracing::debug!(id = %fence.id, "skipping inactive geofence");
                continue;
            }
            if fence.kind == GeofenceKind::Advisory {
                tracing::debug!(id = %fence.id, "skipping advisory geofence");
                continue;
            }
            if fence.polygon.len() < 3 {
                tracing::debug!(
                    id = %fence.id,
                    vertices = fence.polygon.len(),
                    "skipping malformed geofence polygon"
                );
                continue;
            }

            let lower = fence.lower_altitude_m.unwrap_or(DEFAULT_LOWER_ALTITUDE_M);
            let upper = fence.upper_altitude_m.unwrap_or(DEFAULT_UPPER_ALTITUDE_M);

            entries.push(GeofenceIndexEntry {
                id: fence.id.clone(),
                polygon: fence.polygon.clone(),
                bbox: BoundingBox::of_polygon(&fence.polygon),
                lower_altitude_m: lower.min(upper),
                upper_altitude_m: lower.max(upper),
            });
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[GeofenceIndexEntry] {
        &self.entries
    }

    /// True if any entry contains the point at the given altitude.
    pub fn blocks_point(&self, lat: f64, lon: f64, altitude_m: f64) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.contains(lat, lon, altitude_m))
    }

    /// True if the straight segment, sampled every `step_m` ground meters
    /// with linearly interpolated altitude, enters any entry.
    pub fn blocks_segment(
        &self,
        start_lat: f64,
        start_lon: f64,
        start_alt: f64,
        end_lat: f64,
        end_lon: f64,
        end_alt: f64,
        step_m: f64,
    ) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        let distance_m = haversine_distance(start_lat, start_lon, end_lat, end_lon);
        let step = step_m.max(1.0);
        let steps = ((distance_m / step).ceil() as usize).clamp(1, MAX_SEGMENT_SAMPLES);
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let lat = start_lat + t * (end_lat - start_lat);
            let lon = start_lon + t * (end_lon - start_lon);
            let alt = start_alt + t * (end_alt - start_alt);
            if self.blocks_point(lat, lon, alt) {
                return true;
            }
        }
        false
    }
}
