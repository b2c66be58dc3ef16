//! The index-space <-> earth-space transform seam.

use std::fmt;

/// Maps fractional grid indices to latitude/longitude and back.
///
/// Implementations must be pure: the same input always yields the same
/// output, and `from_reference(to_reference(i, j))` returns `(i, j)` within
/// floating point tolerance over the grid.
pub trait HorizontalTransform: fmt::Debug + Send + Sync {
    /// Short identifier used in logs and descriptors.
    fn name(&self) -> &str;

    /// Grid index `(i, j)` to `(lat, lon)` in degrees.
    fn to_reference(&self, i: f64, j: f64) -> (f64, f64);

    /// `(lat, lon)` in degrees to fractional grid index `(i, j)`.
    ///
    /// Points outside the grid still produce an index; callers bounds-check.
    fn from_reference(&self, lat: f64, lon: f64) -> (f64, f64);

    /// Grid shape `(nx, ny)`.
    fn dimensions(&self) -> (usize, usize);
}
