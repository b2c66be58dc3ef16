//! Common types shared across the grid slicing crates.
//!
//! Everything here is a plain value type: earth locations, bounding boxes,
//! regular axes and the small physical unit system used to validate and
//! convert coordinate and level values.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod location;
pub mod units;

pub use bbox::BoundingBox;
pub use error::{BboxParseError, UnitParseError};
pub use grid::{AxisOrder, LinearAxis};
pub use location::EarthLocation;
pub use units::{Dimension, Unit};
