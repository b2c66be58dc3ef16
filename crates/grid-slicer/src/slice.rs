//! Slice values produced by extraction.

use chrono::{DateTime, Utc};
use geo_common::EarthLocation;
use serde::Serialize;

use crate::domain::{HorizontalDomain, VerticalAxis};
use crate::levels::Level;
use crate::transect::TransectAxis;
use crate::types::SamplingMode;

/// The derived spatial axes of a slice.
#[derive(Debug, Clone)]
pub enum SliceGeometry {
    /// Cross-section: columns are positions along the path, rows are levels.
    Transect {
        axis: TransectAxis,
        /// `(lat, lon)` of each column, as sampled
        positions: Vec<(f64, f64)>,
        levels: Option<VerticalAxis>,
    },
    /// Plan view: the field's horizontal grid at one level.
    Plane {
        horizontal: HorizontalDomain,
        level: Option<Level>,
    },
    /// Unstructured points, one column each.
    Scattered { positions: Vec<EarthLocation> },
}

impl SliceGeometry {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transect { .. } => "transect",
            Self::Plane { .. } => "plane",
            Self::Scattered { .. } => "scattered",
        }
    }
}

/// A lower-dimensional subfield.
///
/// Samples are stored `c + columns * (r + rows * t)`. Missing samples are NaN.
#[derive(Debug, Clone)]
pub struct Slice {
    /// Content key of the inputs that produced this slice
    pub fingerprint: u64,
    pub field_id: String,
    pub unit: String,
    /// Sampling mode actually used
    pub mode: SamplingMode,
    pub geometry: SliceGeometry,
    pub times: Vec<DateTime<Utc>>,
    pub columns: usize,
    pub rows: usize,
    pub values: Vec<f32>,
}

impl Slice {
    pub fn time_steps(&self) -> usize {
        self.times.len().max(1)
    }

    /// Samples per time step.
    pub fn layer_len(&self) -> usize {
        self.columns * self.rows
    }

    pub fn get(&self, column: usize, row: usize, t: usize) -> Option<f32> {
        if column >= self.columns || row >= self.rows || t >= self.time_steps() {
            return None;
        }
        self.values
            .get(column + self.columns * (row + self.rows * t))
            .copied()
    }

    /// All samples at time step `t`.
    pub fn layer(&self, t: usize) -> Option<&[f32]> {
        let len = self.layer_len();
        let start = t.checked_mul(len)?;
        self.values.get(start..start + len)
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// Same shape and bit-identical samples.
    pub fn same_samples(&self, other: &Slice) -> bool {
        self.columns == other.columns
            && self.rows == other.rows
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }

    /// A copy of this slice with new samples and shape.
    pub(crate) fn with_values(
        &self,
        geometry: SliceGeometry,
        columns: usize,
        rows: usize,
        values: Vec<f32>,
    ) -> Slice {
        Slice {
            fingerprint: self.fingerprint,
            field_id: self.field_id.clone(),
            unit: self.unit.clone(),
            mode: self.mode,
            geometry,
            times: self.times.clone(),
            columns,
            rows,
            values,
        }
    }
}

/// Outcome of an extraction.
#[derive(Debug, Clone)]
pub enum SliceResult {
    /// A freshly computed slice.
    Ready(Slice),
    /// The request was a no-op; the caller's previous slice (if any) stands.
    Retained(Option<Slice>),
    /// Nothing to draw.
    Missing,
}

impl SliceResult {
    pub fn slice(&self) -> Option<&Slice> {
        match self {
            Self::Ready(s) => Some(s),
            Self::Retained(s) => s.as_ref(),
            Self::Missing => None,
        }
    }

    pub fn into_slice(self) -> Option<Slice> {
        match self {
            Self::Ready(s) => Some(s),
            Self::Retained(s) => s,
            Self::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_retained(&self) -> bool {
        matches!(self, Self::Retained(_))
    }
}

/// Values of a field at one location.
///
/// `values[k + nlev * t]` where `nlev` is the number of levels returned
/// (1 for 2-D fields and for altitude-resolved probes).
#[derive(Debug, Clone, Serialize)]
pub struct ProbeSample {
    pub location: EarthLocation,
    pub times: Vec<DateTime<Utc>>,
    /// Levels of the returned column; `None` when one value per time
    pub levels: Option<VerticalAxis>,
    pub values: Vec<f32>,
}

impl ProbeSample {
    pub fn levels_per_step(&self) -> usize {
        self.levels.as_ref().map_or(1, |l| l.len())
    }

    /// Values at time step `t`.
    pub fn at_time(&self, t: usize) -> Option<&[f32]> {
        let n = self.levels_per_step();
        let start = t.checked_mul(n)?;
        self.values.get(start..start + n)
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }
}
