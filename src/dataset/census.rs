//! GeoJSON loader for census sections.

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::error::SimulationError;
use crate::models::{CensusArea, DensityClass};

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<GeometryJson>,
    #[serde(default)]
    properties: Option<Map<String, Value>>,
}

type Ring = Vec<[f64; 2]>;

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryJson {
    Polygon { coordinates: Vec<Ring> },
    MultiPolygon { coordinates: Vec<Vec<Ring>> },
    #[serde(other)]
    Unsupported,
}

fn ring_to_line(ring: Ring) -> LineString<f64> {
    LineString::new(ring.into_iter().map(|[x, y]| Coord { x, y }).collect())
}

fn rings_to_polygon(mut rings: Vec<Ring>) -> Option<Polygon<f64>> {
    if rings.is_empty() {
        return None;
    }
    let exterior = ring_to_line(rings.remove(0));
    let interiors = rings.into_iter().map(ring_to_line).collect();
    Some(Polygon::new(exterior, interiors))
}

impl GeometryJson {
    fn into_multi_polygon(self) -> Option<MultiPolygon<f64>> {
        match self {
            GeometryJson::Polygon { coordinates } => {
                rings_to_polygon(coordinates).map(|p| MultiPolygon::new(vec![p]))
            }
            GeometryJson::MultiPolygon { coordinates } => {
                let polygons: Vec<Polygon<f64>> =
                    coordinates.into_iter().filter_map(rings_to_polygon).collect();
                (!polygons.is_empty()).then(|| MultiPolygon::new(polygons))
            }
            GeometryJson::Unsupported => None,
        }
    }
}

fn property_string(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn property_number(props: &Map<String, Value>, key: &str) -> Option<f64> {
    match props.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse census sections from a GeoJSON FeatureCollection.
///
/// Features need a Polygon or MultiPolygon geometry and a `popolazione`
/// (or `population`) property; others are skipped with a warning.
pub fn load_census(content: &str) -> Result<Vec<CensusArea>> {
    let collection: FeatureCollection =
        serde_json::from_str(content).context("Failed to parse census GeoJSON")?;

    let mut areas = Vec::with_capacity(collection.features.len());

    for (i, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.unwrap_or_default();
        let id = property_string(&props, "id").unwrap_or_else(|| format!("feature_{}", i));

        let Some(geometry) = feature.geometry.and_then(GeometryJson::into_multi_polygon) else {
            warn!("Census feature {} has no polygon geometry, skipping", id);
            continue;
        };

        let population = property_number(&props, "popolazione")
            .or_else(|| property_number(&props, "population"))
            .ok_or_else(|| {
                SimulationError::invalid(format!("census feature {} has no population", id))
            })?;
        if !population.is_finite() || population < 0.0 {
            return Err(SimulationError::invalid(format!(
                "census feature {} has invalid population {}",
                id, population
            ))
            .into());
        }

        let density_class = property_string(&props, "densita").and_then(|s| {
            s.parse::<DensityClass>()
                .map_err(|e| warn!("Census feature {}: {}", id, e))
                .ok()
        });

        let mut area = CensusArea::new(id, population, geometry);
        area.density_class = density_class;
        areas.push(area);
    }

    info!("Loaded {} census areas", areas.len());
    Ok(areas)
}

pub fn load_census_from_path(path: &Path) -> Result<Vec<CensusArea>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    load_census(&content).with_context(|| format!("Failed to load {}", path.display()))
}
