//! Density lookup service for closure points.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CensusIndex;
use crate::models::{DensityClass, GeoPoint};

/// Where a resolved density came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum DensityLookup {
    /// Computed from the census area containing the point
    Census {
        area_id: String,
        density: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        density_class: Option<DensityClass>,
    },
    /// No usable census area; the configured default applies
    Default { density: f64 },
}

impl DensityLookup {
    pub fn density(&self) -> f64 {
        match self {
            DensityLookup::Census { density, .. } | DensityLookup::Default { density } => *density,
        }
    }

    /// Catchment class recorded on the census area, if any
    pub fn density_class(&self) -> Option<DensityClass> {
        match self {
            DensityLookup::Census { density_class, .. } => *density_class,
            DensityLookup::Default { .. } => None,
        }
    }
}

/// Population density lookup over census areas
pub struct DensityService {
    index: CensusIndex,
}

impl DensityService {
    /// Create a new density service from a census index
    pub fn new(index: CensusIndex) -> Self {
        Self { index }
    }

    /// Resolve people/km² at `point`, falling back to `default_density` when
    /// no area contains it or the containing area has zero extent
    pub fn lookup(&self, point: GeoPoint, default_density: f64) -> DensityLookup {
        let Some(area) = self.index.lookup(point.lon, point.lat) else {
            debug!(
                "No census area contains ({}, {}), using default density {}",
                point.lat, point.lon, default_density
            );
            return DensityLookup::Default {
                density: default_density,
            };
        };

        match area.density() {
            Some(density) => DensityLookup::Census {
                area_id: area.id.clone(),
                density,
                density_class: area.density_class,
            },
            None => {
                debug!(
                    "Census area {} has zero area, using default density {}",
                    area.id, default_density
                );
                DensityLookup::Default {
                    density: default_density,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CensusArea;
    use geo::{polygon, MultiPolygon};

    #[test]
    fn test_empty_index_falls_back() {
        let service = DensityService::new(CensusIndex::empty());
        let lookup = service.lookup(GeoPoint::new(45.0, 9.0), 1000.0);
        assert_eq!(lookup, DensityLookup::Default { density: 1000.0 });
        assert_eq!(lookup.density(), 1000.0);
        assert!(lookup.density_class().is_none());
    }

    #[test]
    fn test_census_lookup_carries_density_class() {
        let geometry = MultiPolygon::new(vec![polygon![
            (x: 9.0, y: 45.0),
            (x: 9.01, y: 45.0),
            (x: 9.01, y: 45.01),
            (x: 9.0, y: 45.01),
            (x: 9.0, y: 45.0),
        ]]);
        let mut area = CensusArea::new("SEZ_0", 1000.0, geometry);
        area.density_class = Some(DensityClass::Media);

        let service = DensityService::new(CensusIndex::build(vec![area]));
        let lookup = service.lookup(GeoPoint::new(45.005, 9.005), 1000.0);
        match &lookup {
            DensityLookup::Census { area_id, .. } => assert_eq!(area_id, "SEZ_0"),
            other => panic!("expected census density, got {:?}", other),
        }
        assert_eq!(lookup.density_class(), Some(DensityClass::Media));
        assert!(lookup.density() > 1000.0);
    }
}
