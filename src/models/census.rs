//! Census areas used for population density lookup.

use geo::{BoundingRect, ChamberlainDuquetteArea, MultiPolygon};
use serde::{Deserialize, Serialize};

/// Density classification carried by census data (`densita` property)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityClass {
    Alta,
    Media,
    Bassa,
}

impl std::fmt::Display for DensityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DensityClass::Alta => write!(f, "Alta"),
            DensityClass::Media => write!(f, "Media"),
            DensityClass::Bassa => write!(f, "Bassa"),
        }
    }
}

impl std::str::FromStr for DensityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alta" => Ok(DensityClass::Alta),
            "media" => Ok(DensityClass::Media),
            "bassa" => Ok(DensityClass::Bassa),
            other => Err(format!("unknown density class '{}'", other)),
        }
    }
}

/// A single census section polygon with its population
#[derive(Debug, Clone)]
pub struct CensusArea {
    pub id: String,
    pub population: f64,
    pub density_class: Option<DensityClass>,
    pub geometry: MultiPolygon<f64>,
}

impl CensusArea {
    pub fn new(id: impl Into<String>, population: f64, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            population,
            density_class: None,
            geometry,
        }
    }

    /// Get the bounding box of this area
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Spherical area of the lon/lat geometry in km²
    pub fn area_km2(&self) -> f64 {
        self.geometry.chamberlain_duquette_unsigned_area() / 1_000_000.0
    }

    /// People per km², or `None` for degenerate polygons
    pub fn density(&self) -> Option<f64> {
        let area = self.area_km2();
        if area > 0.0 {
            Some(self.population / area)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: min_x, y: min_y),
            (x: min_x + size, y: min_y),
            (x: min_x + size, y: min_y + size),
            (x: min_x, y: min_y + size),
            (x: min_x, y: min_y),
        ]])
    }

    #[test]
    fn test_density_from_area() {
        // ~0.01° square near the equator is about 1.24 km²
        let area = CensusArea::new("SEZ_0", 1236.0, square(0.0, 0.0, 0.01));
        let km2 = area.area_km2();
        assert!((km2 - 1.236).abs() < 0.02, "area was {}", km2);
        let density = area.density().unwrap();
        assert!((density - 1000.0).abs() < 20.0, "density was {}", density);
    }

    #[test]
    fn test_degenerate_area_has_no_density() {
        let area = CensusArea::new("SEZ_1", 500.0, MultiPolygon::new(vec![]));
        assert!(area.density().is_none());
    }

    #[test]
    fn test_parse_density_class() {
        assert_eq!("Alta".parse::<DensityClass>(), Ok(DensityClass::Alta));
        assert!("molto alta".parse::<DensityClass>().is_err());
    }
}
