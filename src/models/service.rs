//! Service types handled by a post office.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A transaction category recorded at a post office.
///
/// The first six variants can also be performed at authorized retail points
/// (LIS); the rest are only available at post offices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "bollettini")]
    Bollettini,
    #[serde(rename = "bollette")]
    Bollette,
    #[serde(rename = "pagoPA")]
    PagoPa,
    #[serde(rename = "ricariche_postepay")]
    RicarichePostepay,
    #[serde(rename = "ricariche_telefoniche")]
    RicaricheTelefoniche,
    #[serde(rename = "pacchi")]
    Pacchi,
    #[serde(rename = "polizze")]
    Polizze,
    #[serde(rename = "conti")]
    Conti,
    #[serde(rename = "fibra")]
    Fibra,
    #[serde(rename = "energia")]
    Energia,
    #[serde(rename = "altri_servizi")]
    AltriServizi,
}

impl ServiceType {
    /// Get all service types in reporting order
    pub fn all() -> &'static [ServiceType] {
        &[
            ServiceType::Bollettini,
            ServiceType::Bollette,
            ServiceType::PagoPa,
            ServiceType::RicarichePostepay,
            ServiceType::RicaricheTelefoniche,
            ServiceType::Pacchi,
            ServiceType::Polizze,
            ServiceType::Conti,
            ServiceType::Fibra,
            ServiceType::Energia,
            ServiceType::AltriServizi,
        ]
    }

    /// Column / config key used in datasets
    pub fn key(&self) -> &'static str {
        match self {
            ServiceType::Bollettini => "bollettini",
            ServiceType::Bollette => "bollette",
            ServiceType::PagoPa => "pagoPA",
            ServiceType::RicarichePostepay => "ricariche_postepay",
            ServiceType::RicaricheTelefoniche => "ricariche_telefoniche",
            ServiceType::Pacchi => "pacchi",
            ServiceType::Polizze => "polizze",
            ServiceType::Conti => "conti",
            ServiceType::Fibra => "fibra",
            ServiceType::Energia => "energia",
            ServiceType::AltriServizi => "altri_servizi",
        }
    }

    /// Whether authorized retail points can perform this service
    pub fn offered_by_alternatives(&self) -> bool {
        matches!(
            self,
            ServiceType::Bollettini
                | ServiceType::Bollette
                | ServiceType::PagoPa
                | ServiceType::RicarichePostepay
                | ServiceType::RicaricheTelefoniche
                | ServiceType::Pacchi
        )
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ServiceType::all()
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown service type '{}'", s))
    }
}
