//! Distance-along-path axes for cross-sections and trajectories.

use geo_common::{Dimension, Unit};
use projection::{haversine_km, seam_adjust};
use serde::Serialize;
use tracing::warn;

use crate::types::{Checked, Condition};

/// A monotonic "distance from the first point" axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransectAxis {
    /// Cumulative distance of each sample from the first, in `unit`
    pub distances: Vec<f64>,
    pub unit: Unit,
    /// Longitudes after seam adjustment, in the frame of the first point
    pub adjusted_lons: Vec<f64>,
}

impl TransectAxis {
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Total path length, ignoring missing samples.
    pub fn total(&self) -> f64 {
        self.distances
            .iter()
            .rev()
            .find(|d| !d.is_nan())
            .copied()
            .unwrap_or(0.0)
    }

    /// Keep every `skip`-th sample.
    pub fn subsample(&self, skip: usize) -> Self {
        if skip <= 1 {
            return self.clone();
        }
        Self {
            distances: self.distances.iter().step_by(skip).copied().collect(),
            unit: self.unit,
            adjusted_lons: self.adjusted_lons.iter().step_by(skip).copied().collect(),
        }
    }
}

/// Accumulates great-circle distance along a sequence of points.
#[derive(Debug, Clone, Copy)]
pub struct TransectAxisBuilder {
    unit: Unit,
}

impl TransectAxisBuilder {
    /// Builder emitting distances in `unit`.
    ///
    /// A unit that is not a length falls back to kilometers and raises a
    /// unit-conversion condition.
    pub fn new(unit: Unit) -> Checked<Self> {
        if unit.dimension() == Dimension::Length {
            Checked::new(Self { unit })
        } else {
            warn!(unit = %unit, "Distance unit is not a length, using km");
            Checked::new(Self::kilometers())
                .with_condition(Condition::unit_conversion(unit, Unit::Kilometer))
        }
    }

    pub fn kilometers() -> Self {
        Self {
            unit: Unit::Kilometer,
        }
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Distance axis for `(lat, lon)` points in path order.
    ///
    /// Each longitude is seam-adjusted against the previous adjusted
    /// longitude before measuring, so a path crossing 180° accumulates the
    /// short separation. Missing points get a NaN distance and do not break
    /// accumulation for the points after them.
    pub fn build(&self, points: &[(f64, f64)]) -> TransectAxis {
        let mut distances = Vec::with_capacity(points.len());
        let mut adjusted_lons = Vec::with_capacity(points.len());

        let mut total_km = 0.0f64;
        let mut prev: Option<(f64, f64)> = None;

        for &(lat, lon) in points {
            if lat.is_nan() || lon.is_nan() {
                distances.push(f64::NAN);
                adjusted_lons.push(f64::NAN);
                continue;
            }

            let lon = match prev {
                Some((_, prev_lon)) => seam_adjust(prev_lon, lon),
                None => lon,
            };
            if let Some((prev_lat, prev_lon)) = prev {
                total_km += haversine_km(prev_lat, prev_lon, lat, lon);
            }

            distances.push(self.from_km(total_km));
            adjusted_lons.push(lon);
            prev = Some((lat, lon));
        }

        TransectAxis {
            distances,
            unit: self.unit,
            adjusted_lons,
        }
    }

    fn from_km(&self, km: f64) -> f64 {
        Unit::Kilometer.convert(km, self.unit).unwrap_or(km)
    }
}

impl Default for TransectAxisBuilder {
    fn default() -> Self {
        Self::kilometers()
    }
}
