//! Plain-text summary of a simulation result.

use std::fmt::Write;

use postal_closure::simulation::{RecipientKind, ServiceRedistribution, SimulationResult};

fn cell(r: &ServiceRedistribution, volume: f64) -> String {
    format!("{:.1} ({:.1}%)", volume, r.percent(volume))
}

pub fn render(result: &SimulationResult) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    write_report(&mut out, result)?;
    Ok(out)
}

fn write_report(out: &mut String, result: &SimulationResult) -> std::fmt::Result {
    let closed = &result.closed;
    match &closed.name {
        Some(name) => writeln!(out, "Closed post office: {} ({})", closed.id, name)?,
        None => writeln!(out, "Closed post office: {}", closed.id)?,
    }
    writeln!(
        out,
        "Location: {:.6}, {:.6}",
        closed.location.lat, closed.location.lon
    )?;
    writeln!(
        out,
        "Density: {:.1} people/km² ({}), search radius {:.2} km",
        result.density_value(),
        result.density_band,
        result.radius_km
    )?;
    if let Some(class) = result.density.density_class() {
        writeln!(out, "Census density class: {}", class)?;
    }
    writeln!(out)?;

    writeln!(
        out,
        "{:<24} {:>12} {:>20} {:>20} {:>20} {:>20}",
        "Service", "Original", "Post offices", "Retail", "Competitors", "Digital"
    )?;
    for (service, r) in &result.redistribution {
        let retail = if service.offered_by_alternatives() {
            cell(r, r.alternative_total())
        } else {
            "-".to_string()
        };
        writeln!(
            out,
            "{:<24} {:>12.1} {:>20} {:>20} {:>20} {:>20}",
            service.to_string(),
            r.original_volume,
            cell(r, r.same_type_total()),
            retail,
            cell(r, r.competitor),
            cell(r, r.digital)
        )?;
        if r.fallback_applied {
            writeln!(out, "  no enabled retail point, retail share moved to post offices")?;
        }
        if r.unassigned > 0.0 {
            writeln!(out, "  unassigned (no recipient in range): {:.1}", r.unassigned)?;
        }
    }
    let totals = &result.totals;
    writeln!(
        out,
        "{:<24} {:>12.1} {:>20.1} {:>20.1} {:>20.1} {:>20.1}",
        "Total",
        result.original_total(),
        totals.same_type_total(),
        totals.alternative_total(),
        totals.competitor_total(),
        totals.digital_total()
    )?;
    if totals.unassigned_total() > 0.0 {
        writeln!(out, "Unassigned: {:.1}", totals.unassigned_total())?;
    }

    writeln!(out)?;
    if result.recipients.is_empty() {
        writeln!(out, "No post office or retail point within the search radius")?;
    } else {
        writeln!(out, "Recipients:")?;
        for recipient in &result.recipients {
            let kind = match recipient.kind {
                RecipientKind::PostOffice => "UP",
                RecipientKind::RetailPoint => "LIS",
            };
            writeln!(
                out,
                "  [{}] {:<16} {:>8.2} km {:>12.1}  {}",
                kind,
                recipient.id,
                recipient.distance_km,
                recipient.total,
                recipient.name.as_deref().unwrap_or("")
            )?;
        }
    }

    if !result.nearby_competitors.is_empty() {
        writeln!(out)?;
        writeln!(out, "Competitors in range:")?;
        for bank in &result.nearby_competitors {
            writeln!(
                out,
                "  {:<16} {:>8.2} km  weight {:.2}  {}",
                bank.id,
                bank.distance_km,
                bank.competitive_weight,
                bank.group.as_deref().or(bank.name.as_deref()).unwrap_or("")
            )?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use postal_closure::census::CensusIndex;
    use postal_closure::{
        AlternativePoint, ClosureSimulator, GeoPoint, Network, PostOffice, ServiceType,
        SimulationParams,
    };

    #[test]
    fn test_render_lists_services_and_recipients() {
        let offices = vec![
            PostOffice::new("UP_0", GeoPoint::new(45.0, 9.0))
                .with_volume(ServiceType::Pacchi, 1000.0)
                .with_volume(ServiceType::Bollettini, 100.0)
                .with_volume(ServiceType::Conti, 200.0),
            PostOffice::new("UP_1", GeoPoint::new(45.002, 9.0)),
        ];
        let retail = vec![AlternativePoint::new("LIS_1", GeoPoint::new(45.0, 9.002))
            .with_enabled(ServiceType::Pacchi, true)];
        let network = Network::new(offices, retail, Vec::new(), CensusIndex::empty());
        let result = ClosureSimulator::new(network)
            .simulate("UP_0", &SimulationParams::default())
            .unwrap();

        let text = render(&result).unwrap();
        assert!(text.contains("Closed post office: UP_0"));
        assert!(text.contains("pacchi"));
        assert!(text.contains("conti"));
        assert!(text.contains("[UP] UP_1"));
        assert!(text.contains("[LIS] LIS_1"));
        assert!(!text.contains("Competitors in range"));
        assert!(!text.contains("Census density class"));
        assert!(!text.contains("-0.0"));
    }
}
