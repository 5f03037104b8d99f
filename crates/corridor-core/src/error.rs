//! Error taxonomy for the planning engine.
//!
//! Only input-contract violations are hard errors. An exhausted search is a
//! normal outcome (`PlanResult { success: false, .. }`), a failing height
//! sampler degrades to height 0, and malformed geofences are skipped at
//! index build time.

use thiserror::Error;

/// Hard failures of a planning call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    /// Fewer than 2 input waypoints; nothing to plan between.
    #[error("need at least 2 waypoints")]
    InsufficientWaypoints,
    /// The corridor grid has no lanes or no steps.
    #[error("corridor grid is empty")]
    EmptyGrid,
}

/// Failure reported by a [`HeightSampler`](crate::sampler::HeightSampler)
/// implementation. The engine logs it and falls back to height 0.
#[derive(Debug, Error)]
pub enum HeightSampleError {
    #[error("height provider error: {0}")]
    Provider(String),
    #[error("height provider returned {got} samples for {want} points")]
    CountMismatch { want: usize, got: usize },
}
