//! Core data models for the closure simulation.

pub mod census;
pub mod point;
pub mod service;

pub use census::{CensusArea, DensityClass};
pub use point::{AlternativePoint, CompetitorPoint, GeoPoint, Located, PostOffice};
pub use service::ServiceType;
