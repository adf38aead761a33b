//! CSV loaders for post offices, retail points and competitor banks.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::SimulationError;
use crate::models::{AlternativePoint, CompetitorPoint, GeoPoint, PostOffice, ServiceType};

/// Column prefixes marking a retail point's per-service enablement
const ENABLED_PREFIXES: &[&str] = &["abilitato_", "abilitazione_"];

/// Positions of the columns every point file carries
struct BaseColumns {
    id: usize,
    lat: usize,
    lon: usize,
    name: Option<usize>,
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

impl BaseColumns {
    fn locate(headers: &StringRecord) -> Result<Self, SimulationError> {
        let require = |names: &[&str]| {
            find_column(headers, names).ok_or_else(|| {
                SimulationError::invalid(format!("required column '{}' not found", names[0]))
            })
        };

        Ok(Self {
            id: require(&["id"])?,
            lat: require(&["latitude", "lat"])?,
            lon: require(&["longitude", "lon"])?,
            name: find_column(headers, &["nome", "name"]),
        })
    }

    fn id(&self, record: &StringRecord, row: usize) -> Result<String, SimulationError> {
        let id = record.get(self.id).unwrap_or("").trim();
        if id.is_empty() {
            return Err(SimulationError::invalid(format!("row {}: missing id", row)));
        }
        Ok(id.to_string())
    }

    fn location(&self, record: &StringRecord, row: usize) -> Result<GeoPoint, SimulationError> {
        let lat = parse_coordinate(record, self.lat, "latitude", row)?;
        let lon = parse_coordinate(record, self.lon, "longitude", row)?;
        GeoPoint::checked(lat, lon)
            .map_err(|e| SimulationError::invalid(format!("row {}: {}", row, e)))
    }

    fn covers(&self, idx: usize) -> bool {
        idx == self.id || idx == self.lat || idx == self.lon || self.name == Some(idx)
    }

    fn name(&self, record: &StringRecord) -> Option<String> {
        self.name
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }
}

fn parse_coordinate(
    record: &StringRecord,
    idx: usize,
    field: &str,
    row: usize,
) -> Result<f64, SimulationError> {
    let raw = record.get(idx).unwrap_or("").trim();
    if raw.is_empty() {
        return Err(SimulationError::invalid(format!(
            "row {}: missing {}",
            row, field
        )));
    }
    raw.parse().map_err(|_| {
        SimulationError::invalid(format!("row {}: invalid {} '{}'", row, field, raw))
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "si" | "sì" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Service named by an `abilitato_<service>` header, prefix matched in any case
fn enabled_service(header: &str) -> Option<ServiceType> {
    let header = header.trim().to_ascii_lowercase();
    ENABLED_PREFIXES
        .iter()
        .find_map(|p| header.strip_prefix(p))
        .and_then(|s| s.parse().ok())
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Load post offices; every column whose header names a service holds its volume
pub fn load_post_offices<R: Read>(reader: R) -> Result<Vec<PostOffice>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let base = BaseColumns::locate(&headers)?;

    let mut service_columns: Vec<(usize, ServiceType)> = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        if base.covers(i) {
            continue;
        }
        match h.parse::<ServiceType>() {
            Ok(service) => service_columns.push((i, service)),
            Err(_) => warn!("Post office file: ignoring unrecognised column '{}'", h),
        }
    }
    debug!("Post office file has {} service columns", service_columns.len());

    let mut offices = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = i + 1;

        let mut office = PostOffice::new(base.id(&record, row)?, base.location(&record, row)?);
        office.name = base.name(&record);

        for &(idx, service) in &service_columns {
            let raw = record.get(idx).unwrap_or("").trim();
            if raw.is_empty() {
                continue;
            }
            let volume: f64 = raw.parse().map_err(|_| {
                SimulationError::invalid(format!(
                    "row {}: invalid {} volume '{}'",
                    row, service, raw
                ))
            })?;
            if !volume.is_finite() || volume < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "row {}: {} volume must be non-negative, got {}",
                    row, service, volume
                ))
                .into());
            }
            office.volumes.insert(service, volume);
        }

        offices.push(office);
    }

    info!("Loaded {} post offices", offices.len());
    Ok(offices)
}

/// Load retail points; `abilitato_<service>` columns hold enablement flags
pub fn load_retail_points<R: Read>(reader: R) -> Result<Vec<AlternativePoint>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let base = BaseColumns::locate(&headers)?;

    let mut enabled_columns: Vec<(usize, ServiceType)> = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        if base.covers(i) {
            continue;
        }
        match enabled_service(h) {
            Some(service) => enabled_columns.push((i, service)),
            None => warn!("Retail file: ignoring unrecognised column '{}'", h),
        }
    }

    let mut points = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = i + 1;

        let mut point = AlternativePoint::new(base.id(&record, row)?, base.location(&record, row)?);
        point.name = base.name(&record);

        for &(idx, service) in &enabled_columns {
            let raw = record.get(idx).unwrap_or("").trim();
            if raw.is_empty() {
                continue;
            }
            let enabled = parse_bool(raw).ok_or_else(|| {
                SimulationError::invalid(format!(
                    "row {}: invalid flag '{}' for {}",
                    row, raw, service
                ))
            })?;
            point.enabled.insert(service, enabled);
        }

        points.push(point);
    }

    info!("Loaded {} retail points", points.len());
    Ok(points)
}

/// Load competitor bank branches
pub fn load_competitors<R: Read>(reader: R) -> Result<Vec<CompetitorPoint>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let base = BaseColumns::locate(&headers)?;
    let group_idx = find_column(&headers, &["gruppo", "gruppo_bancario", "group"]);
    let weight_idx = find_column(&headers, &["peso_competitivo", "competitive_weight"]);
    for (i, h) in headers.iter().enumerate() {
        if !base.covers(i) && group_idx != Some(i) && weight_idx != Some(i) {
            warn!("Competitor file: ignoring unrecognised column '{}'", h);
        }
    }

    let mut banks = Vec::new();
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = i + 1;

        let mut bank = CompetitorPoint::new(base.id(&record, row)?, base.location(&record, row)?);
        bank.name = base.name(&record);
        bank.group = group_idx
            .and_then(|g| record.get(g))
            .filter(|s| !s.is_empty())
            .map(String::from);

        if let Some(raw) = weight_idx.and_then(|w| record.get(w)).filter(|s| !s.is_empty()) {
            let weight: f64 = raw.parse().map_err(|_| {
                SimulationError::invalid(format!(
                    "row {}: invalid competitive weight '{}'",
                    row, raw
                ))
            })?;
            if !weight.is_finite() || weight < 0.0 {
                return Err(SimulationError::invalid(format!(
                    "row {}: competitive weight must be non-negative, got {}",
                    row, weight
                ))
                .into());
            }
            bank.competitive_weight = weight;
        }

        banks.push(bank);
    }

    info!("Loaded {} competitor branches", banks.len());
    Ok(banks)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

pub fn load_post_offices_from_path(path: &Path) -> Result<Vec<PostOffice>> {
    load_post_offices(open(path)?).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn load_retail_points_from_path(path: &Path) -> Result<Vec<AlternativePoint>> {
    load_retail_points(open(path)?).with_context(|| format!("Failed to load {}", path.display()))
}

pub fn load_competitors_from_path(path: &Path) -> Result<Vec<CompetitorPoint>> {
    load_competitors(open(path)?).with_context(|| format!("Failed to load {}", path.display()))
}
