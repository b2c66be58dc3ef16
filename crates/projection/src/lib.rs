//! Coordinate math for the grid slicing kernel.
//!
//! Implemented from scratch without external dependencies:
//! - great-circle geodesy on a spherical earth
//! - longitude normalization and seam handling
//! - the 1976 US standard atmosphere (pressure <-> height)
//! - the [`HorizontalTransform`] seam between grid index space and lat/lon,
//!   with a Lambert Conformal implementation

pub mod atmosphere;
pub mod error;
pub mod geodesic;
pub mod lambert;
pub mod longitude;
pub mod transform;

pub use atmosphere::{height_to_pressure, pressure_to_height};
pub use error::ProjectionError;
pub use geodesic::{
    destination_point, great_circle_path, haversine_km, initial_bearing, intermediate_point,
    EARTH_RADIUS_KM, EARTH_RADIUS_M,
};
pub use lambert::LambertConformal;
pub use longitude::{normalize_against_domain, normalize_longitude, normalize_longitude_360, seam_adjust};
pub use transform::HorizontalTransform;
