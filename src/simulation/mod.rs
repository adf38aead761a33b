//! Post-office closure simulation.
//!
//! Closing an office resolves the local population density, derives a search
//! radius from it, finds nearby offices, retail points and competitor banks,
//! and splits every recorded service volume between them.

mod radius;
mod redistribute;
mod result;
mod weights;

pub use radius::{search_radius_m, DensityBand};
pub use redistribute::redistribute_service;
pub use result::{
    CategoryTotals, NearbyCompetitor, RecipientKind, RecipientTotal, ServiceRedistribution,
    SimulationResult,
};
pub use weights::{inverse_square_weights, MIN_DISTANCE_KM};

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::census::{CensusIndex, DensityService};
use crate::config::SimulationParams;
use crate::error::{Result, SimulationError};
use crate::models::{AlternativePoint, CompetitorPoint, GeoPoint, PostOffice, ServiceType};
use crate::spatial::{Nearby, PointIndex};

/// All point sets and census data for one run
pub struct Network {
    pub post_offices: PointIndex<PostOffice>,
    pub alternatives: PointIndex<AlternativePoint>,
    pub competitors: PointIndex<CompetitorPoint>,
    pub density: DensityService,
}

impl Network {
    pub fn new(
        post_offices: Vec<PostOffice>,
        alternatives: Vec<AlternativePoint>,
        competitors: Vec<CompetitorPoint>,
        census: CensusIndex,
    ) -> Self {
        info!(
            "Network: {} post offices, {} retail points, {} competitors, {} census areas",
            post_offices.len(),
            alternatives.len(),
            competitors.len(),
            census.len()
        );

        Self {
            post_offices: PointIndex::build(post_offices),
            alternatives: PointIndex::build(alternatives),
            competitors: PointIndex::build(competitors),
            density: DensityService::new(census),
        }
    }
}

/// Runs closure simulations against a loaded network
pub struct ClosureSimulator {
    network: Network,
}

impl ClosureSimulator {
    pub fn new(network: Network) -> Self {
        Self { network }
    }

    /// Simulate closing the post office `id`.
    ///
    /// Returns [`SimulationError::NotFound`] for an unknown id and
    /// [`SimulationError::InvalidConfiguration`] if `params` do not validate.
    pub fn simulate(&self, id: &str, params: &SimulationParams) -> Result<SimulationResult> {
        params.validate()?;

        let closed = self
            .network
            .post_offices
            .get(id)
            .ok_or_else(|| SimulationError::NotFound { id: id.to_string() })?;
        let center = closed.location;

        let density = self.network.density.lookup(center, params.default_density);
        let density_band = DensityBand::classify(density.density());
        let radius_m = search_radius_m(params.base_radius_m, density.density());

        let offices = self
            .network
            .post_offices
            .within_radius(center, radius_m, Some(id));
        let alternatives = self.network.alternatives.within_radius(center, radius_m, None);
        let competitors = self.network.competitors.within_radius(center, radius_m, None);

        info!(
            "Closing {}: density {:.1}/km² ({}), radius {:.0} m, {} offices, {} retail points, {} competitors in range",
            id,
            density.density(),
            density_band,
            radius_m,
            offices.len(),
            alternatives.len(),
            competitors.len()
        );

        let office_distances: Vec<f64> = offices.iter().map(|n| n.distance_km).collect();
        let office_weights = inverse_square_weights(&office_distances);

        let mut redistribution = BTreeMap::new();
        let mut totals = CategoryTotals::default();

        for (&service, fractions) in &params.services {
            let Some(volume) = closed.volume(service) else {
                debug!("{} records no {} volume, skipping", id, service);
                continue;
            };

            let r = redistribute_service(
                service,
                volume,
                fractions,
                &offices,
                &office_weights,
                &alternatives,
            );
            totals.record(service, &r);
            redistribution.insert(service, r);
        }

        let recipients = collect_recipients(&redistribution, &offices, &alternatives);
        let nearby_competitors = competitors
            .iter()
            .map(|n| NearbyCompetitor {
                id: n.point.id.clone(),
                name: n.point.name.clone(),
                group: n.point.group.clone(),
                location: n.point.location,
                distance_km: n.distance_km,
                competitive_weight: n.point.competitive_weight,
            })
            .collect();

        Ok(SimulationResult {
            closed: closed.clone(),
            radius_m,
            radius_km: radius_m / 1000.0,
            density,
            density_band,
            redistribution,
            totals,
            recipients,
            nearby_competitors,
        })
    }
}

/// Fold per-service allocations into one entry per receiving point
fn collect_recipients(
    redistribution: &BTreeMap<ServiceType, ServiceRedistribution>,
    offices: &[Nearby<'_, PostOffice>],
    alternatives: &[Nearby<'_, AlternativePoint>],
) -> Vec<RecipientTotal> {
    let mut by_key: BTreeMap<(RecipientKind, String), RecipientTotal> = BTreeMap::new();

    let mut add = |kind: RecipientKind,
                   id: &str,
                   name: &Option<String>,
                   location: GeoPoint,
                   distance_km: f64,
                   service: ServiceType,
                   volume: f64| {
        let entry = by_key
            .entry((kind, id.to_string()))
            .or_insert_with(|| RecipientTotal {
                kind,
                id: id.to_string(),
                name: name.clone(),
                location,
                distance_km,
                total: 0.0,
                by_service: BTreeMap::new(),
            });
        entry.total += volume;
        *entry.by_service.entry(service).or_insert(0.0) += volume;
    };

    for (&service, r) in redistribution {
        for n in offices {
            if let Some(&volume) = r.same_type.get(&n.point.id) {
                add(
                    RecipientKind::PostOffice,
                    &n.point.id,
                    &n.point.name,
                    n.point.location,
                    n.distance_km,
                    service,
                    volume,
                );
            }
        }
        for n in alternatives {
            if let Some(&volume) = r.alternative.get(&n.point.id) {
                add(
                    RecipientKind::RetailPoint,
                    &n.point.id,
                    &n.point.name,
                    n.point.location,
                    n.distance_km,
                    service,
                    volume,
                );
            }
        }
    }

    by_key.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CensusArea;
    use geo::{polygon, MultiPolygon};

    const EPS: f64 = 1e-6;

    fn network(census: Vec<CensusArea>) -> Network {
        let closed = PostOffice::new("UP_0", GeoPoint::new(45.0, 9.0))
            .with_volume(ServiceType::Pacchi, 1000.0)
            .with_volume(ServiceType::Bollettini, 400.0)
            .with_volume(ServiceType::Conti, 200.0);
        let offices = vec![
            closed,
            PostOffice::new("UP_1", GeoPoint::new(45.0, 9.005)),
            PostOffice::new("UP_2", GeoPoint::new(45.009, 9.0)),
            PostOffice::new("UP_FAR", GeoPoint::new(45.5, 9.5)),
        ];
        let retail = vec![
            AlternativePoint::new("LIS_1", GeoPoint::new(45.002, 9.002))
                .with_enabled(ServiceType::Pacchi, true)
                .with_enabled(ServiceType::Bollettini, false),
            AlternativePoint::new("LIS_FAR", GeoPoint::new(46.0, 9.0))
                .with_enabled(ServiceType::Bollettini, true),
        ];
        let banks = vec![
            CompetitorPoint::new("BANCA_1", GeoPoint::new(45.001, 9.001)),
            CompetitorPoint::new("BANCA_FAR", GeoPoint::new(44.0, 9.0)),
        ];
        Network::new(offices, retail, banks, CensusIndex::build(census))
    }

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
    fn test_unknown_id_is_not_found() {
        let sim = ClosureSimulator::new(network(vec![]));
        let err = sim
            .simulate("UP_404", &SimulationParams::default())
            .unwrap_err();
        assert_eq!(
            err,
            SimulationError::NotFound {
                id: "UP_404".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_params_rejected() {
        let sim = ClosureSimulator::new(network(vec![]));
        let mut params = SimulationParams::default();
        params.base_radius_m = 0.0;
        assert!(matches!(
            sim.simulate("UP_0", &params),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_default_density_without_census() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        assert_eq!(result.density_value(), 1000.0);
        assert_eq!(result.density_band, DensityBand::Suburban);
        assert_eq!(result.radius_m, 2000.0);
        assert!((result.radius_km - 2.0).abs() < EPS);
    }

    #[test]
    fn test_census_density_drives_radius() {
        // ~0.88 km² holding 12 000 people: dense, 0.7 × base
        let census = vec![CensusArea::new("SEZ_0", 12_000.0, square(8.995, 44.995, 0.01))];
        let sim = ClosureSimulator::new(network(census));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        assert_eq!(result.density_band, DensityBand::Dense);
        assert!((result.radius_m - 700.0).abs() < EPS);
        match &result.density {
            crate::census::DensityLookup::Census { area_id, .. } => assert_eq!(area_id, "SEZ_0"),
            other => panic!("expected census density, got {:?}", other),
        }
        // UP_2 (~1 km) is now out of range
        let pacchi = &result.redistribution[&ServiceType::Pacchi];
        assert_eq!(pacchi.same_type.keys().collect::<Vec<_>>(), vec!["UP_1"]);
    }

    #[test]
    fn test_volumes_are_conserved() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        assert_eq!(result.redistribution.len(), 3);
        for (service, r) in &result.redistribution {
            let pools = r.same_type_pool + r.alternative_pool + r.competitor + r.digital;
            assert!(
                (pools - r.original_volume).abs() < EPS,
                "{} pools sum to {}",
                service,
                pools
            );
            assert!((r.accounted_total() - r.original_volume).abs() < EPS);
        }
        assert!((result.original_total() - 1600.0).abs() < EPS);
    }

    #[test]
    fn test_closed_office_and_far_points_excluded() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        let pacchi = &result.redistribution[&ServiceType::Pacchi];
        assert!(!pacchi.same_type.contains_key("UP_0"));
        assert!(!pacchi.same_type.contains_key("UP_FAR"));
        assert_eq!(pacchi.same_type.len(), 2);
        assert_eq!(pacchi.alternative.keys().collect::<Vec<_>>(), vec!["LIS_1"]);

        let competitor_ids: Vec<&str> = result
            .nearby_competitors
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(competitor_ids, vec!["BANCA_1"]);
    }

    #[test]
    fn test_fallback_when_no_retail_enabled() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        // LIS_1 is in range but disabled for bollettini; LIS_FAR is out of range
        let b = &result.redistribution[&ServiceType::Bollettini];
        assert!(b.fallback_applied);
        assert!(b.alternative.is_empty());
        assert!((b.same_type_total() - 400.0 * (0.4 + 0.3)).abs() < EPS);
    }

    #[test]
    fn test_empty_categories_total_positive_zero() {
        let offices = vec![
            PostOffice::new("UP_0", GeoPoint::new(45.0, 9.0))
                .with_volume(ServiceType::Bollettini, 400.0),
            PostOffice::new("UP_1", GeoPoint::new(45.001, 9.0)),
            PostOffice::new("UP_ALONE", GeoPoint::new(40.0, 15.0))
                .with_volume(ServiceType::Bollettini, 100.0),
        ];
        let sim = ClosureSimulator::new(Network::new(
            offices,
            Vec::new(),
            Vec::new(),
            CensusIndex::empty(),
        ));

        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();
        let b = &result.redistribution[&ServiceType::Bollettini];
        assert!(b.fallback_applied);
        assert_eq!(b.alternative_total(), 0.0);
        assert!(!b.alternative_total().is_sign_negative());
        assert!(!result.totals.alternative_total().is_sign_negative());

        let json = serde_json::to_value(&result.totals).unwrap();
        let alt = json["alternative"]["bollettini"].as_f64().unwrap();
        assert!(!alt.is_sign_negative());

        let alone = sim.simulate("UP_ALONE", &SimulationParams::default()).unwrap();
        let b = &alone.redistribution[&ServiceType::Bollettini];
        assert!(b.same_type.is_empty());
        assert!(!b.same_type_total().is_sign_negative());
        assert!(!alone.totals.same_type_total().is_sign_negative());
        assert!((b.unassigned - 70.0).abs() < EPS);
    }

    #[test]
    fn test_office_only_service_has_no_alternative_total() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        assert!(result.totals.alternative.get(&ServiceType::Conti).is_none());
        assert!((result.totals.same_type[&ServiceType::Conti] - 140.0).abs() < EPS);
        assert!((result.totals.competitor[&ServiceType::Conti] - 40.0).abs() < EPS);
        assert!((result.totals.digital[&ServiceType::Conti] - 20.0).abs() < EPS);
    }

    #[test]
    fn test_recipient_totals() {
        let sim = ClosureSimulator::new(network(vec![]));
        let result = sim.simulate("UP_0", &SimulationParams::default()).unwrap();

        let kinds: Vec<(RecipientKind, &str)> = result
            .recipients
            .iter()
            .map(|r| (r.kind, r.id.as_str()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (RecipientKind::PostOffice, "UP_1"),
                (RecipientKind::PostOffice, "UP_2"),
                (RecipientKind::RetailPoint, "LIS_1"),
            ]
        );

        let received: f64 = result.recipients.iter().map(|r| r.total).sum();
        let expected = result.totals.same_type_total() + result.totals.alternative_total();
        assert!((received - expected).abs() < EPS);

        let lis = &result.recipients[2];
        assert_eq!(lis.by_service.len(), 1);
        assert!((lis.total - 200.0).abs() < EPS);
    }

    #[test]
    fn test_params_override_changes_result() {
        let sim = ClosureSimulator::new(network(vec![]));
        let params = SimulationParams::default()
            .with_overrides(&[
                "pacchi.same_type=0.3".parse().unwrap(),
                "pacchi.competitor=0.4".parse().unwrap(),
            ])
            .unwrap();
        let result = sim.simulate("UP_0", &params).unwrap();
        let pacchi = &result.redistribution[&ServiceType::Pacchi];
        assert!((pacchi.competitor - 400.0).abs() < EPS);
        assert!((pacchi.same_type_total() - 300.0).abs() < EPS);
    }
}
