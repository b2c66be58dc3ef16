//! Regular grid axes.

use serde::{Deserialize, Serialize};

/// A regularly spaced 1-D axis: `first + i * step` for `i` in `0..len`.
///
/// `step` may be negative (e.g. latitudes running north to south).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearAxis {
    /// Coordinate of the first sample
    pub first: f64,
    /// Spacing between samples
    pub step: f64,
    /// Number of samples
    pub len: usize,
}

impl LinearAxis {
    pub fn new(first: f64, step: f64, len: usize) -> Self {
        Self { first, step, len }
    }

    /// Axis running from `first` to `last` inclusive with `len` samples.
    pub fn from_range(first: f64, last: f64, len: usize) -> Self {
        let step = if len > 1 {
            (last - first) / (len - 1) as f64
        } else {
            1.0
        };
        Self { first, step, len }
    }

    /// Coordinate of sample `i`, or `None` past the end of the axis.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        if i >= self.len {
            return None;
        }
        Some(self.first + i as f64 * self.step)
    }

    /// Coordinate at a fractional index. Not bounds checked.
    pub fn value_at_fraction(&self, i: f64) -> f64 {
        self.first + i * self.step
    }

    /// Fractional index of a coordinate. Not bounds checked.
    pub fn fractional_index(&self, value: f64) -> f64 {
        if self.step == 0.0 {
            return 0.0;
        }
        (value - self.first) / self.step
    }

    /// Nearest sample index to a coordinate.
    ///
    /// Values up to half a cell beyond either end still resolve to the end
    /// sample; anything further out is `None`.
    pub fn nearest_index(&self, value: f64) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let i = self.fractional_index(value).round();
        if i < 0.0 || i >= self.len as f64 {
            return None;
        }
        Some(i as usize)
    }

    /// Last coordinate on the axis.
    pub fn last(&self) -> f64 {
        self.first + self.len.saturating_sub(1) as f64 * self.step
    }

    /// Smallest coordinate on the axis.
    pub fn low(&self) -> f64 {
        self.first.min(self.last())
    }

    /// Largest coordinate on the axis.
    pub fn high(&self) -> f64 {
        self.first.max(self.last())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Keep every `skip`-th sample, starting at the first.
    pub fn subsample(&self, skip: usize) -> Self {
        if skip <= 1 || self.len == 0 {
            return *self;
        }
        Self {
            first: self.first,
            step: self.step * skip as f64,
            len: 1 + (self.len - 1) / skip,
        }
    }
}

/// Storage order of the two horizontal axes of a lat/lon grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrder {
    /// Longitude varies fastest, then latitude
    #[default]
    #[serde(rename = "xy")]
    XY,
    /// Latitude varies fastest, then longitude
    LatLon,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_axis_extent() {
        let lat = LinearAxis::new(90.0, -0.25, 721);

        assert!((lat.low() + 90.0).abs() < 1e-9);
        assert!((lat.high() - 90.0).abs() < 1e-9);
        assert!((lat.last() + 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_and_index_roundtrip() {
        let axis = LinearAxis::new(90.0, -0.5, 361);
        for i in [0usize, 1, 180, 360] {
            let v = axis.value_at(i).unwrap();
            assert_eq!(axis.nearest_index(v), Some(i));
        }
        assert_eq!(axis.value_at(361), None);
    }

    #[test]
    fn test_nearest_index_half_cell_tolerance() {
        let axis = LinearAxis::new(0.0, 1.0, 10);
        assert_eq!(axis.nearest_index(-0.4), Some(0));
        assert_eq!(axis.nearest_index(9.4), Some(9));
        assert_eq!(axis.nearest_index(-0.6), None);
        assert_eq!(axis.nearest_index(9.6), None);
    }

    #[test]
    fn test_subsample() {
        let axis = LinearAxis::new(0.0, 1.0, 10);
        let sub = axis.subsample(3);
        assert_eq!(sub.len, 4);
        assert_eq!(sub.value_at(3), Some(9.0));
        assert_eq!(axis.subsample(1), axis);
    }

    #[test]
    fn test_from_range() {
        let axis = LinearAxis::from_range(0.0, 9.0, 10);
        assert_eq!(axis.step, 1.0);
        assert_eq!(axis.last(), 9.0);
    }
}
