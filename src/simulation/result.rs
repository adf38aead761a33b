//! Simulation output structures.

use serde::Serialize;
use std::collections::BTreeMap;

use super::DensityBand;
use crate::census::DensityLookup;
use crate::models::{GeoPoint, PostOffice, ServiceType};

/// Sum starting from `+0.0`; `Iterator::sum` over no `f64`s yields `-0.0`
fn sum<'a>(values: impl Iterator<Item = &'a f64>) -> f64 {
    values.fold(0.0, |acc, v| acc + v)
}

/// How one service's volume was redistributed
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServiceRedistribution {
    pub original_volume: f64,
    /// Volume destined for nearby post offices, including any folded-in
    /// retail share
    pub same_type_pool: f64,
    /// Volume destined for nearby enabled retail points
    pub alternative_pool: f64,
    /// True when no retail point was enabled and the retail share was folded
    /// into the post-office pool
    pub fallback_applied: bool,
    /// Post office id -> volume
    pub same_type: BTreeMap<String, f64>,
    /// Retail point id -> volume
    pub alternative: BTreeMap<String, f64>,
    pub competitor: f64,
    pub digital: f64,
    /// Pool volume with no recipient in range
    pub unassigned: f64,
}

impl ServiceRedistribution {
    pub fn same_type_total(&self) -> f64 {
        sum(self.same_type.values())
    }

    pub fn alternative_total(&self) -> f64 {
        sum(self.alternative.values())
    }

    /// Everything recorded for this service; equals `original_volume`
    pub fn accounted_total(&self) -> f64 {
        self.same_type_total()
            + self.alternative_total()
            + self.competitor
            + self.digital
            + self.unassigned
    }

    /// Share of the original volume, as a percentage
    pub fn percent(&self, volume: f64) -> f64 {
        if self.original_volume > 0.0 {
            volume / self.original_volume * 100.0
        } else {
            0.0
        }
    }
}

/// Per-service totals for each destination category
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryTotals {
    pub same_type: BTreeMap<ServiceType, f64>,
    pub alternative: BTreeMap<ServiceType, f64>,
    pub competitor: BTreeMap<ServiceType, f64>,
    pub digital: BTreeMap<ServiceType, f64>,
    pub unassigned: BTreeMap<ServiceType, f64>,
}

impl CategoryTotals {
    pub(crate) fn record(&mut self, service: ServiceType, r: &ServiceRedistribution) {
        self.same_type.insert(service, r.same_type_total());
        if service.offered_by_alternatives() {
            self.alternative.insert(service, r.alternative_total());
        }
        self.competitor.insert(service, r.competitor);
        self.digital.insert(service, r.digital);
        if r.unassigned > 0.0 {
            self.unassigned.insert(service, r.unassigned);
        }
    }

    pub fn same_type_total(&self) -> f64 {
        sum(self.same_type.values())
    }

    pub fn alternative_total(&self) -> f64 {
        sum(self.alternative.values())
    }

    pub fn competitor_total(&self) -> f64 {
        sum(self.competitor.values())
    }

    pub fn digital_total(&self) -> f64 {
        sum(self.digital.values())
    }

    pub fn unassigned_total(&self) -> f64 {
        sum(self.unassigned.values())
    }
}

/// Kind of point receiving redistributed volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientKind {
    PostOffice,
    RetailPoint,
}

/// Everything one nearby point receives across services
#[derive(Debug, Clone, Serialize)]
pub struct RecipientTotal {
    pub kind: RecipientKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: GeoPoint,
    pub distance_km: f64,
    pub total: f64,
    pub by_service: BTreeMap<ServiceType, f64>,
}

/// Competitor branch inside the search radius (display only)
#[derive(Debug, Clone, Serialize)]
pub struct NearbyCompetitor {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub location: GeoPoint,
    pub distance_km: f64,
    pub competitive_weight: f64,
}

/// Outcome of closing one post office
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub closed: PostOffice,
    pub radius_m: f64,
    pub radius_km: f64,
    pub density: DensityLookup,
    pub density_band: DensityBand,
    pub redistribution: BTreeMap<ServiceType, ServiceRedistribution>,
    pub totals: CategoryTotals,
    /// Post offices first, then retail points, each sorted by id
    pub recipients: Vec<RecipientTotal>,
    pub nearby_competitors: Vec<NearbyCompetitor>,
}

impl SimulationResult {
    pub fn density_value(&self) -> f64 {
        self.density.density()
    }

    /// Sum of original volumes over redistributed services
    pub fn original_total(&self) -> f64 {
        sum(self.redistribution.values().map(|r| &r.original_volume))
    }
}
