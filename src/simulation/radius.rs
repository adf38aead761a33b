//! Density-dependent search radius.

use serde::{Deserialize, Serialize};

/// Population-density band of a closure area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityBand {
    /// Up to 100 people/km²
    Rural,
    /// Up to 1000 people/km²
    Suburban,
    /// Up to 5000 people/km²
    Urban,
    /// Above 5000 people/km²
    Dense,
}

impl DensityBand {
    /// Classify people/km²; band upper bounds are inclusive
    pub fn classify(density: f64) -> Self {
        if density <= 100.0 {
            DensityBand::Rural
        } else if density <= 1000.0 {
            DensityBand::Suburban
        } else if density <= 5000.0 {
            DensityBand::Urban
        } else {
            DensityBand::Dense
        }
    }

    /// Factor applied to the base radius
    pub fn multiplier(&self) -> f64 {
        match self {
            DensityBand::Rural => 3.0,
            DensityBand::Suburban => 2.0,
            DensityBand::Urban => 1.0,
            DensityBand::Dense => 0.7,
        }
    }
}

impl std::fmt::Display for DensityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DensityBand::Rural => write!(f, "rural"),
            DensityBand::Suburban => write!(f, "suburban"),
            DensityBand::Urban => write!(f, "urban"),
            DensityBand::Dense => write!(f, "dense"),
        }
    }
}

/// Search radius in metres for a closure in an area of the given density
pub fn search_radius_m(base_radius_m: f64, density: f64) -> f64 {
    base_radius_m * DensityBand::classify(density).multiplier()
}
