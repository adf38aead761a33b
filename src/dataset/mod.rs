//! Loaders for the static inputs of a simulation run.
//!
//! Point sets come from CSV, census sections from GeoJSON. Rows with missing
//! or invalid coordinates are rejected with
//! [`crate::SimulationError::InvalidConfiguration`] wrapped in the returned
//! `anyhow::Error`.

mod census;
mod points;

pub use census::{load_census, load_census_from_path};
pub use points::{
    load_competitors, load_competitors_from_path, load_post_offices, load_post_offices_from_path,
    load_retail_points, load_retail_points_from_path,
};
