//! postal-closure - post-office closure simulation
//!
//! This library provides the shared types and modules for the `simulate` and
//! `validate-addresses` binaries.

pub mod address;
pub mod census;
pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod simulation;
pub mod spatial;

pub use config::{Fractions, SimulationParams};
pub use error::SimulationError;
pub use models::{AlternativePoint, CompetitorPoint, GeoPoint, PostOffice, ServiceType};
pub use simulation::{ClosureSimulator, Network, SimulationResult};
