//! GeoJSON map of a closure: the closed office, its influence circle, every
//! recipient with the volume it takes over, and competitor banks in range.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Result;
use geo::{Destination, Haversine, Point};
use serde_json::{json, Value};

use postal_closure::simulation::{RecipientKind, SimulationResult};
use postal_closure::GeoPoint;

const CIRCLE_VERTICES: usize = 64;

fn point_geometry(location: GeoPoint) -> Value {
    json!({ "type": "Point", "coordinates": [location.lon, location.lat] })
}

/// Closed ring approximating the search radius around `center`
fn circle_geometry(center: GeoPoint, radius_m: f64) -> Value {
    let origin: Point<f64> = center.to_point();
    let mut ring: Vec<[f64; 2]> = (0..CIRCLE_VERTICES)
        .map(|i| {
            let bearing = 360.0 * i as f64 / CIRCLE_VERTICES as f64;
            let p = Haversine.destination(origin, bearing, radius_m);
            [p.x(), p.y()]
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    json!({ "type": "Polygon", "coordinates": [ring] })
}

fn feature(geometry: Value, properties: Value) -> Value {
    json!({ "type": "Feature", "geometry": geometry, "properties": properties })
}

pub fn build_map(result: &SimulationResult) -> Value {
    let closed = &result.closed;
    let mut features = Vec::with_capacity(2 + result.recipients.len() + result.nearby_competitors.len());

    features.push(feature(
        circle_geometry(closed.location, result.radius_m),
        json!({
            "kind": "influence_area",
            "radius_m": result.radius_m,
            "density": result.density_value(),
            "density_band": result.density_band,
        }),
    ));

    features.push(feature(
        point_geometry(closed.location),
        json!({
            "kind": "closed_office",
            "id": closed.id,
            "name": closed.name,
            "volumes": closed.volumes,
            "total": result.original_total(),
        }),
    ));

    for recipient in &result.recipients {
        let kind = match recipient.kind {
            RecipientKind::PostOffice => "post_office",
            RecipientKind::RetailPoint => "retail_point",
        };
        features.push(feature(
            point_geometry(recipient.location),
            json!({
                "kind": kind,
                "id": recipient.id,
                "name": recipient.name,
                "distance_km": recipient.distance_km,
                "received": recipient.total,
                "by_service": recipient.by_service,
            }),
        ));
    }

    for bank in &result.nearby_competitors {
        features.push(feature(
            point_geometry(bank.location),
            json!({
                "kind": "competitor",
                "id": bank.id,
                "name": bank.name,
                "group": bank.group,
                "distance_km": bank.distance_km,
                "competitive_weight": bank.competitive_weight,
            }),
        ));
    }

    json!({ "type": "FeatureCollection", "features": features })
}

pub fn write_map(result: &SimulationResult, path: &Path) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &build_map(result))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_closure::census::CensusIndex;
    use postal_closure::spatial::haversine_m;
    use postal_closure::{
        AlternativePoint, ClosureSimulator, CompetitorPoint, Network, PostOffice, ServiceType,
        SimulationParams,
    };

    fn sample_result() -> SimulationResult {
        let offices = vec![
            PostOffice::new("UP_0", GeoPoint::new(45.0, 9.0))
                .with_volume(ServiceType::Bollettini, 400.0),
            PostOffice::new("UP_1", GeoPoint::new(45.003, 9.0)),
        ];
        let retail = vec![AlternativePoint::new("LIS_1", GeoPoint::new(45.0, 9.003))
            .with_enabled(ServiceType::Bollettini, true)];
        let banks = vec![CompetitorPoint::new("BANCA_1", GeoPoint::new(45.001, 9.001))];
        let network = Network::new(offices, retail, banks, CensusIndex::empty());
        ClosureSimulator::new(network)
            .simulate("UP_0", &SimulationParams::default())
            .unwrap()
    }

    fn kinds(map: &Value) -> Vec<String> {
        map["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["kind"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_map_features() {
        let map = build_map(&sample_result());
        assert_eq!(
            kinds(&map),
            vec![
                "influence_area",
                "closed_office",
                "post_office",
                "retail_point",
                "competitor"
            ]
        );

        let closed = &map["features"][1];
        assert_eq!(closed["geometry"]["coordinates"][0], 9.0);
        assert_eq!(closed["geometry"]["coordinates"][1], 45.0);
    }

    #[test]
    fn test_circle_is_closed_at_radius() {
        let center = GeoPoint::new(45.0, 9.0);
        let circle = circle_geometry(center, 2000.0);
        let ring = circle["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), CIRCLE_VERTICES + 1);
        assert_eq!(ring.first(), ring.last());

        for vertex in ring {
            let lon = vertex[0].as_f64().unwrap();
            let lat = vertex[1].as_f64().unwrap();
            let d = haversine_m(center, GeoPoint::new(lat, lon));
            assert!((d - 2000.0).abs() < 1.0, "vertex at {} m", d);
        }
    }

    #[test]
    fn test_write_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closure_map.geojson");
        write_map(&sample_result(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");
        assert_eq!(kinds(&parsed).len(), 5);
    }
}
