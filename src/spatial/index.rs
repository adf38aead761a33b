//! R-tree index over one point set.

use rstar::{RTree, RTreeObject, AABB};
use std::collections::HashMap;
use tracing::{debug, warn};

use super::distance::{approx_km, haversine_m};
use crate::models::{GeoPoint, Located};

/// Metres per degree of latitude on the haversine sphere
const METERS_PER_DEGREE_LAT: f64 = 111_195.0;

/// Wrapper for R-tree indexing of a point by its position in the backing vec
#[derive(Debug, Clone)]
struct IndexedPoint {
    idx: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// A point found by a radius query, annotated with its distance to the query
#[derive(Debug)]
pub struct Nearby<'a, T> {
    pub point: &'a T,
    pub distance_km: f64,
}

// `T` need not be Clone
impl<T> Clone for Nearby<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Nearby<'_, T> {}

/// Spatial index for a set of service points
pub struct PointIndex<T> {
    points: Vec<T>,
    tree: RTree<IndexedPoint>,
    by_id: HashMap<String, usize>,
}

impl<T: Located> PointIndex<T> {
    /// Build spatial index from points
    pub fn build(points: Vec<T>) -> Self {
        let mut by_id = HashMap::with_capacity(points.len());
        let mut indexed = Vec::with_capacity(points.len());

        for (idx, point) in points.iter().enumerate() {
            if by_id.contains_key(point.id()) {
                warn!("Duplicate point id {}, keeping the first occurrence", point.id());
                continue;
            }
            by_id.insert(point.id().to_string(), idx);

            let loc = point.location();
            indexed.push(IndexedPoint {
                idx,
                envelope: AABB::from_point([loc.lon, loc.lat]),
            });
        }

        let tree = RTree::bulk_load(indexed);
        debug!("Point index built with {} entries", tree.size());

        Self {
            points,
            tree,
            by_id,
        }
    }

    /// Look up a point by id
    pub fn get(&self, id: &str) -> Option<&T> {
        self.by_id.get(id).map(|&idx| &self.points[idx])
    }

    /// Find every point within `radius_m` metres (haversine) of `center`.
    ///
    /// `exclude_id` drops the query point itself when it belongs to this set.
    /// Results are sorted by distance, then id.
    pub fn within_radius(
        &self,
        center: GeoPoint,
        radius_m: f64,
        exclude_id: Option<&str>,
    ) -> Vec<Nearby<'_, T>> {
        if radius_m < 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let query_envelope = search_envelope(center, radius_m);

        let mut hits: Vec<Nearby<'_, T>> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ip| &self.points[ip.idx])
            .filter(|p| exclude_id.map_or(true, |ex| p.id() != ex))
            .filter(|p| haversine_m(center, p.location()) <= radius_m)
            .map(|p| Nearby {
                point: p,
                distance_km: approx_km(center, p.location()),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.point.id().cmp(b.point.id()))
        });

        hits
    }

    /// Get total number of indexed points
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Lon/lat box guaranteed to contain the haversine circle around `center`
fn search_envelope(center: GeoPoint, radius_m: f64) -> AABB<[f64; 2]> {
    // 1% slack covers the sphere-vs-degree approximation
    let dlat = radius_m / METERS_PER_DEGREE_LAT * 1.01;
    let min_lat = (center.lat - dlat).max(-90.0);
    let max_lat = (center.lat + dlat).min(90.0);

    let widest_lat = min_lat.abs().max(max_lat.abs()).to_radians();
    let cos = widest_lat.cos();

    let (min_lon, max_lon) = if cos <= 1e-9 {
        (-180.0, 180.0)
    } else {
        let dlon = dlat / cos;
        let (lo, hi) = (center.lon - dlon, center.lon + dlon);
        // No antimeridian wrapping: fall back to the full band
        if lo < -180.0 || hi > 180.0 {
            (-180.0, 180.0)
        } else {
            (lo, hi)
        }
    };

    AABB::from_corners([min_lon, min_lat], [max_lon, max_lat])
}
