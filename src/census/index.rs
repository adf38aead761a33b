//! Spatial index for census areas.

use geo::{Contains, Point};
use rstar::{RTree, RTreeObject, AABB};
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::CensusArea;

/// Wrapper for R-tree indexing of census areas
#[derive(Clone)]
struct IndexedArea {
    /// Load order, used to break ties between overlapping areas
    order: usize,
    area: Arc<CensusArea>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedArea {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedArea {
    fn new(order: usize, area: CensusArea) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = area.bbox()?;
        Some(Self {
            order,
            area: Arc::new(area),
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

/// Spatial index for census areas using R-tree
pub struct CensusIndex {
    tree: RTree<IndexedArea>,
}

impl CensusIndex {
    /// Build spatial index from census areas
    pub fn build(areas: Vec<CensusArea>) -> Self {
        let total = areas.len();

        let indexed: Vec<IndexedArea> = areas
            .into_iter()
            .enumerate()
            .filter_map(|(order, area)| {
                let id = area.id.clone();
                let indexed = IndexedArea::new(order, area);
                if indexed.is_none() {
                    warn!("Census area {} has empty geometry, skipping", id);
                }
                indexed
            })
            .collect();

        let tree = RTree::bulk_load(indexed);
        info!("Census index built with {} of {} areas", tree.size(), total);

        Self { tree }
    }

    pub fn empty() -> Self {
        Self { tree: RTree::new() }
    }

    /// Find the area containing a point.
    ///
    /// Overlapping areas resolve to the one loaded first.
    pub fn lookup(&self, lon: f64, lat: f64) -> Option<Arc<CensusArea>> {
        let point = Point::new(lon, lat);
        let query_envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .filter(|ia| ia.area.geometry.contains(&point))
            .min_by_key(|ia| ia.order)
            .map(|ia| Arc::clone(&ia.area))
    }

    /// Get total number of indexed areas
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
