use crate::error::{ProcessingError, Result};
use crate::models::{EstimatedSegment, RoadSegment};
use crate::utils::constants::EMISSION_FACTOR;
use rayon::prelude::*;
use tracing::debug;

/// Length-based, road-class-weighted CO₂ estimator
#[derive(Debug, Clone)]
pub struct EmissionEstimator {
    emission_factor: f64,
}

impl EmissionEstimator {
    pub fn new() -> Self {
        Self {
            emission_factor: EMISSION_FACTOR,
        }
    }

    pub fn with_emission_factor(mut self, emission_factor: f64) -> Result<Self> {
        if !emission_factor.is_finite() || emission_factor < 0.0 {
            return Err(ProcessingError::InvalidEmissionFactor(emission_factor));
        }
        self.emission_factor = emission_factor;
        Ok(self)
    }

    pub fn emission_factor(&self) -> f64 {
        self.emission_factor
    }

    /// `length_km * emission_factor * traffic_multiplier`
    pub fn emission_for(&self, segment: &RoadSegment) -> f64 {
        segment.length_km() * self.emission_factor * segment.traffic_multiplier()
    }

    /// Annotate segments with their emission, preserving input order
    pub fn estimate(&self, segments: &[RoadSegment]) -> Vec<EstimatedSegment> {
        let estimated: Vec<EstimatedSegment> = segments
            .par_iter()
            .map(|segment| EstimatedSegment::new(segment.clone(), self.emission_for(segment)))
            .collect();

        debug!(
            segments = estimated.len(),
            emission_factor = self.emission_factor,
            "Estimated segment emissions"
        );

        estimated
    }
}

impl Default for EmissionEstimator {
    fn default() -> Self {
        Self::new()
    }
}
