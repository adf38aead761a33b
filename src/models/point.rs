//! Service point records: post offices, retail points and competitor banks.

use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ServiceType;
use crate::error::{Result, SimulationError};

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates
    pub fn checked(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(SimulationError::invalid(format!(
                "coordinate ({}, {}) is not finite",
                lat, lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(SimulationError::invalid(format!(
                "coordinate ({}, {}) is out of range",
                lat, lon
            )));
        }
        Ok(Self { lat, lon })
    }

    /// geo point with x = lon, y = lat
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Anything that can be stored in a [`crate::spatial::PointIndex`]
pub trait Located {
    fn id(&self) -> &str;
    fn location(&self) -> GeoPoint;
}

/// Post office (UP) with its recorded transaction volumes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostOffice {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: GeoPoint,
    /// Transaction volume per service; services not recorded are absent
    pub volumes: BTreeMap<ServiceType, f64>,
}

impl PostOffice {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: None,
            location,
            volumes: BTreeMap::new(),
        }
    }

    pub fn with_volume(mut self, service: ServiceType, volume: f64) -> Self {
        self.volumes.insert(service, volume);
        self
    }

    pub fn volume(&self, service: ServiceType) -> Option<f64> {
        self.volumes.get(&service).copied()
    }
}

impl Located for PostOffice {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> GeoPoint {
        self.location
    }
}

/// Authorized retail point (LIS) with per-service enablement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativePoint {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: GeoPoint,
    pub enabled: BTreeMap<ServiceType, bool>,
}

impl AlternativePoint {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: None,
            location,
            enabled: BTreeMap::new(),
        }
    }

    pub fn with_enabled(mut self, service: ServiceType, enabled: bool) -> Self {
        self.enabled.insert(service, enabled);
        self
    }

    /// A service missing from the enablement table counts as disabled
    pub fn is_enabled(&self, service: ServiceType) -> bool {
        self.enabled.get(&service).copied().unwrap_or(false)
    }
}

impl Located for AlternativePoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> GeoPoint {
        self.location
    }
}

/// Competing bank branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorPoint {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub location: GeoPoint,
    pub competitive_weight: f64,
}

impl CompetitorPoint {
    pub fn new(id: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: None,
            group: None,
            location,
            competitive_weight: 1.0,
        }
    }
}

impl Located for CompetitorPoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> GeoPoint {
        self.location
    }
}
