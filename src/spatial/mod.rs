//! Radius queries over service points.
//!
//! Points are stored in an R-tree keyed on lon/lat; candidates returned by an
//! envelope query are filtered with the haversine distance.

mod distance;
mod index;

pub use distance::{approx_km, haversine_m, KM_PER_DEGREE};
pub use index::{Nearby, PointIndex};
