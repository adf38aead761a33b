//! Per-service volume redistribution.

use std::collections::BTreeMap;
use tracing::debug;

use super::weights::inverse_square_weights;
use super::ServiceRedistribution;
use crate::config::Fractions;
use crate::models::{AlternativePoint, PostOffice, ServiceType};
use crate::spatial::Nearby;

/// Spread `pool` over `ids` according to `weights` (same length)
fn distribute<'a>(
    pool: f64,
    ids: impl Iterator<Item = &'a str>,
    weights: &[f64],
) -> BTreeMap<String, f64> {
    ids.zip(weights)
        .map(|(id, w)| (id.to_string(), pool * w))
        .collect()
}

/// Split one service's volume between nearby offices, enabled retail points,
/// competitors and the digital channel.
///
/// `office_weights` are the inverse-square weights of `offices`, computed
/// once per closure and shared across services.
pub fn redistribute_service(
    service: ServiceType,
    volume: f64,
    fractions: &Fractions,
    offices: &[Nearby<'_, PostOffice>],
    office_weights: &[f64],
    alternatives: &[Nearby<'_, AlternativePoint>],
) -> ServiceRedistribution {
    let portions = fractions.split(volume);

    let mut result = ServiceRedistribution {
        original_volume: volume,
        same_type_pool: portions.same_type,
        competitor: portions.competitor,
        digital: portions.digital,
        ..Default::default()
    };

    if service.offered_by_alternatives() {
        let enabled: Vec<&Nearby<'_, AlternativePoint>> = alternatives
            .iter()
            .filter(|n| n.point.is_enabled(service))
            .collect();

        if enabled.is_empty() {
            debug!(
                "No retail point enabled for {}, folding {:.2} into post offices",
                service, portions.alternative
            );
            result.same_type_pool += portions.alternative;
            result.fallback_applied = true;
        } else {
            let distances: Vec<f64> = enabled.iter().map(|n| n.distance_km).collect();
            let weights = inverse_square_weights(&distances);
            result.alternative_pool = portions.alternative;
            result.alternative = distribute(
                portions.alternative,
                enabled.iter().map(|n| n.point.id.as_str()),
                &weights,
            );
        }
    } else {
        // Validated fractions carry no retail share for these services
        result.same_type_pool += portions.alternative;
    }

    if offices.is_empty() {
        result.unassigned = result.same_type_pool;
    } else {
        result.same_type = distribute(
            result.same_type_pool,
            offices.iter().map(|n| n.point.id.as_str()),
            office_weights,
        );
    }

    result
}
