//! Simulation parameters: search radius settings and per-service fraction tables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::SimulationError;
use crate::models::ServiceType;

/// Allowed drift of a fraction table's sum from 1.0
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// Share of a service's volume going to each destination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fractions {
    /// Nearby post offices
    pub same_type: f64,
    /// Nearby enabled retail points
    pub alternative: f64,
    pub competitor: f64,
    /// Lost to online / self-service channels
    pub digital: f64,
}

/// A service volume split according to [`Fractions`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portions {
    pub same_type: f64,
    pub alternative: f64,
    pub competitor: f64,
    pub digital: f64,
}

impl Fractions {
    pub const fn new(same_type: f64, alternative: f64, competitor: f64, digital: f64) -> Self {
        Self {
            same_type,
            alternative,
            competitor,
            digital,
        }
    }

    pub fn sum(&self) -> f64 {
        self.same_type + self.alternative + self.competitor + self.digital
    }

    pub fn split(&self, volume: f64) -> Portions {
        Portions {
            same_type: volume * self.same_type,
            alternative: volume * self.alternative,
            competitor: volume * self.competitor,
            digital: volume * self.digital,
        }
    }

    /// Check ranges, the unit sum, and that post-office-only services send
    /// nothing to retail points
    pub fn validate(&self, service: ServiceType) -> Result<(), SimulationError> {
        for (field, value) in [
            ("same_type", self.same_type),
            ("alternative", self.alternative),
            ("competitor", self.competitor),
            ("digital", self.digital),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(SimulationError::invalid(format!(
                    "{}.{} = {} is outside [0, 1]",
                    service, field, value
                )));
            }
        }

        if !service.offered_by_alternatives() && self.alternative > 0.0 {
            return Err(SimulationError::invalid(format!(
                "{} is not offered by retail points but has alternative share {}",
                service, self.alternative
            )));
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > FRACTION_TOLERANCE {
            return Err(SimulationError::invalid(format!(
                "fractions for {} sum to {}, expected 1.0",
                service, sum
            )));
        }

        Ok(())
    }
}

/// Parameters passed to each simulation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Search radius in metres before the density multiplier
    pub base_radius_m: f64,
    /// People/km² assumed when no census area covers the closure point
    pub default_density: f64,
    /// Services without an entry are not redistributed
    pub services: BTreeMap<ServiceType, Fractions>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        let services = ServiceType::all()
            .iter()
            .map(|&s| (s, default_fractions(s)))
            .collect();

        Self {
            base_radius_m: 1000.0,
            default_density: 1000.0,
            services,
        }
    }
}

/// Built-in fraction table
pub fn default_fractions(service: ServiceType) -> Fractions {
    match service {
        ServiceType::Bollettini
        | ServiceType::Bollette
        | ServiceType::PagoPa
        | ServiceType::RicarichePostepay
        | ServiceType::RicaricheTelefoniche => Fractions::new(0.4, 0.3, 0.2, 0.1),
        ServiceType::Pacchi => Fractions::new(0.5, 0.2, 0.2, 0.1),
        ServiceType::Polizze | ServiceType::Conti | ServiceType::AltriServizi => {
            Fractions::new(0.7, 0.0, 0.2, 0.1)
        }
        ServiceType::Fibra | ServiceType::Energia => Fractions::new(0.6, 0.0, 0.3, 0.1),
    }
}

impl SimulationParams {
    /// Load parameters from a TOML file, layered over the defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ParamsFile = toml::from_str(content).context("Failed to parse config file")?;
        let params = file.into_params()?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.base_radius_m.is_finite() || self.base_radius_m <= 0.0 {
            return Err(SimulationError::invalid(format!(
                "base radius must be positive, got {}",
                self.base_radius_m
            )));
        }
        if !self.default_density.is_finite() || self.default_density < 0.0 {
            return Err(SimulationError::invalid(format!(
                "default density must be non-negative, got {}",
                self.default_density
            )));
        }
        for (service, fractions) in &self.services {
            fractions.validate(*service)?;
        }
        Ok(())
    }

    /// Apply overrides and re-validate the result
    pub fn with_overrides(mut self, overrides: &[FractionOverride]) -> Result<Self, SimulationError> {
        for o in overrides {
            o.apply(&mut self);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn fractions(&self, service: ServiceType) -> Option<&Fractions> {
        self.services.get(&service)
    }
}

/// On-disk shape: every field optional so files only state what they change
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParamsFile {
    base_radius_m: Option<f64>,
    default_density: Option<f64>,
    #[serde(default)]
    services: BTreeMap<String, FractionsFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FractionsFile {
    same_type: Option<f64>,
    alternative: Option<f64>,
    competitor: Option<f64>,
    digital: Option<f64>,
}

impl ParamsFile {
    fn into_params(self) -> Result<SimulationParams> {
        let mut params = SimulationParams::default();

        if let Some(r) = self.base_radius_m {
            params.base_radius_m = r;
        }
        if let Some(d) = self.default_density {
            params.default_density = d;
        }

        for (key, f) in self.services {
            let service: ServiceType = key
                .parse()
                .map_err(SimulationError::InvalidConfiguration)?;
            let entry = params
                .services
                .entry(service)
                .or_insert_with(|| default_fractions(service));
            if let Some(v) = f.same_type {
                entry.same_type = v;
            }
            if let Some(v) = f.alternative {
                entry.alternative = v;
            }
            if let Some(v) = f.competitor {
                entry.competitor = v;
            }
            if let Some(v) = f.digital {
                entry.digital = v;
            }
        }

        Ok(params)
    }
}

/// Which of the four fractions an override targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FractionField {
    SameType,
    Alternative,
    Competitor,
    Digital,
}

impl FromStr for FractionField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "same_type" | "same" | "up_vicini" => Ok(FractionField::SameType),
            "alternative" | "alt" | "lis_vicini" => Ok(FractionField::Alternative),
            "competitor" => Ok(FractionField::Competitor),
            "digital" | "digitale" => Ok(FractionField::Digital),
            other => Err(format!("unknown fraction field '{}'", other)),
        }
    }
}

/// A single `service.field=value` override, e.g. `pacchi.same_type=0.45`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionOverride {
    pub service: ServiceType,
    pub field: FractionField,
    pub value: f64,
}

impl FractionOverride {
    pub fn apply(&self, params: &mut SimulationParams) {
        let entry = params
            .services
            .entry(self.service)
            .or_insert_with(|| default_fractions(self.service));
        match self.field {
            FractionField::SameType => entry.same_type = self.value,
            FractionField::Alternative => entry.alternative = self.value,
            FractionField::Competitor => entry.competitor = self.value,
            FractionField::Digital => entry.digital = self.value,
        }
    }
}

impl FromStr for FractionOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected <service>.<field>=<value>, got '{}'", s))?;
        let (service, field) = target
            .split_once('.')
            .ok_or_else(|| format!("expected <service>.<field>, got '{}'", target))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid fraction value '{}'", value.trim()))?;

        Ok(Self {
            service: service.parse()?,
            field: field.parse()?,
            value,
        })
    }
}
