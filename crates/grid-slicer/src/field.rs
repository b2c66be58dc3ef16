//! Immutable gridded fields.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{SpatialDomain, VerticalAxis};
use crate::error::{Result, SliceError};

/// A scalar field over a spatial domain, optionally with a time dimension.
///
/// Samples are stored flat with `i` fastest, then `j`, then level, then time:
/// `index = i + nx * (j + ny * (k + nz * t))`. Missing samples are NaN.
/// The buffer is shared, so cloning a field is cheap.
#[derive(Debug, Clone)]
pub struct GriddedField {
    pub id: String,
    pub parameter: String,
    /// Unit of the range quantity, as given by the producer
    pub unit: String,
    pub domain: SpatialDomain,
    /// Valid times; empty means a single, untimed step
    pub times: Vec<DateTime<Utc>>,
    values: Arc<[f32]>,
    /// Surface height (m) per horizontal point, when known
    terrain: Option<Arc<[f32]>>,
    /// Digest of the sample and terrain buffers
    content: u64,
}

impl GriddedField {
    pub fn new(
        id: impl Into<String>,
        parameter: impl Into<String>,
        unit: impl Into<String>,
        domain: SpatialDomain,
        times: Vec<DateTime<Utc>>,
        values: Vec<f32>,
    ) -> Result<Self> {
        domain.validate()?;

        let steps = times.len().max(1);
        let expected = domain.size() * steps;
        if values.len() != expected {
            let (nx, ny, nz) = domain.shape();
            return Err(SliceError::malformed(format!(
                "expected {} samples ({}x{}x{} x {} times), got {}",
                expected,
                nx,
                ny,
                nz,
                steps,
                values.len()
            )));
        }

        let content = digest_samples(&values, None);
        Ok(Self {
            id: id.into(),
            parameter: parameter.into(),
            unit: unit.into(),
            domain,
            times,
            values: values.into(),
            terrain: None,
            content,
        })
    }

    /// Attach surface heights (m), one per horizontal point.
    pub fn with_terrain(mut self, terrain: Vec<f32>) -> Result<Self> {
        let expected = self.domain.horizontal.size();
        if terrain.len() != expected {
            return Err(SliceError::malformed(format!(
                "terrain has {} points, expected {}",
                terrain.len(),
                expected
            )));
        }
        self.content = digest_samples(&self.values, Some(terrain.as_slice()));
        self.terrain = Some(terrain.into());
        Ok(self)
    }

    /// Number of time steps (at least 1).
    pub fn time_steps(&self) -> usize {
        self.times.len().max(1)
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.domain.shape()
    }

    pub fn vertical(&self) -> Option<&VerticalAxis> {
        self.domain.vertical.as_ref()
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn terrain(&self) -> Option<&[f32]> {
        self.terrain.as_deref()
    }

    /// Flat index of a sample. Not bounds checked.
    pub fn flat_index(&self, i: usize, j: usize, k: usize, t: usize) -> usize {
        let (nx, ny, nz) = self.shape();
        i + nx * (j + ny * (k + nz * t))
    }

    /// Sample at `(i, j, k, t)`, or `None` when any index is out of range.
    pub fn get(&self, i: usize, j: usize, k: usize, t: usize) -> Option<f32> {
        let (nx, ny, nz) = self.shape();
        if i >= nx || j >= ny || k >= nz || t >= self.time_steps() {
            return None;
        }
        self.values.get(self.flat_index(i, j, k, t)).copied()
    }

    /// The horizontal layer at level `k` and time `t`.
    pub fn layer(&self, k: usize, t: usize) -> Result<&[f32]> {
        let (nx, ny, nz) = self.shape();
        if k >= nz {
            return Err(SliceError::invalid_index("z", k, nz));
        }
        if t >= self.time_steps() {
            return Err(SliceError::invalid_index("time", t, self.time_steps()));
        }
        let start = self.flat_index(0, 0, k, t);
        Ok(&self.values[start..start + nx * ny])
    }

    /// True when every sample is missing.
    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// Content key used in slice fingerprints.
    ///
    /// Two fields share a fingerprint only when their id, parameter, unit,
    /// domain, times and samples all agree. The sample digest is computed
    /// once at construction.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        self.parameter.hash(&mut hasher);
        self.unit.hash(&mut hasher);
        self.domain.digest(&mut hasher);
        self.times.hash(&mut hasher);
        self.content.hash(&mut hasher);
        hasher.finish()
    }
}

fn digest_samples(values: &[f32], terrain: Option<&[f32]>) -> u64 {
    let mut hasher = DefaultHasher::new();
    values.len().hash(&mut hasher);
    for v in values {
        v.to_bits().hash(&mut hasher);
    }
    if let Some(terrain) = terrain {
        terrain.len().hash(&mut hasher);
        for v in terrain {
            v.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}
