//! The external height-sampler boundary.
//!
//! The engine does not know how heights are produced (3D-tile clamping, DEM
//! lookup, a flat test fixture); it only requires batched, order-preserving
//! answers. Sampling failures are never fatal: callers fall back to height 0
//! for the affected points and log a warning.

use crate::error::HeightSampleError;

/// A single height query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub lat: f64,
    pub lon: f64,
    /// Optional altitude hint for providers that probe downward from a
    /// position (e.g. 3D-tile clamping); DEM-style providers ignore it.
    pub probe_altitude_m: Option<f64>,
}

impl SamplePoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            probe_altitude_m: None,
        }
    }

    pub fn with_probe(lat: f64, lon: f64, probe_altitude_m: f64) -> Self {
        Self {
            lat,
            lon,
            probe_altitude_m: Some(probe_altitude_m),
        }
    }
}

/// Best-available height lookup for a batch of points.
///
/// Implementations must return one height per request point, in request
/// order: building/obstacle height where present, else terrain height,
/// else 0.
#[allow(async_fn_in_trait)]
pub trait HeightSampler {
    async fn sample_heights(
        &self,
        points: &[SamplePoint],
    ) -> Result<Vec<f64>, HeightSampleError>;
}

/// Sampler returning the same height everywhere. Useful for flat-world tests
/// and scenario files.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSampler {
    pub height_m: f64,
}

impl HeightSampler for ConstantSampler {
    async fn sample_heights(
        &self,
        points: &[SamplePoint],
    ) -> Result<Vec<f64>, HeightSampleError> {
        Ok(vec![self.height_m; points.len()])
    }
}
