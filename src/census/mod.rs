//! Census-area density lookup.
//!
//! Census sections are indexed in an R-tree by bounding box; lookups refine
//! the candidates with exact point-in-polygon containment.

mod index;
mod service;

pub use index::CensusIndex;
pub use service::{DensityLookup, DensityService};
