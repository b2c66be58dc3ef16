//! Configuration for the slicing kernel.

use std::path::Path;

use geo_common::{Dimension, Unit};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::types::{Checked, Condition, SamplingMode, SmoothingKind};

/// Configuration for the slicing kernel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    /// Sampling mode used when a call does not pick one.
    pub sampling_mode: SamplingMode,

    /// Smoothing applied to new slices by default.
    pub smoothing_kind: SmoothingKind,

    /// Pass count, half-width or radius depending on the smoothing kind.
    pub smoothing_factor: u32,

    /// Unit specifier for transect distances (e.g. "km", "nm").
    pub distance_unit: String,

    /// Unit specifier for display altitudes (e.g. "m", "ft").
    pub altitude_unit: String,

    /// Memory budget for the slice cache in megabytes.
    pub slice_cache_size_mb: usize,

    /// Upper bound on samples along a cross-section line.
    pub max_line_samples: usize,

    /// Endpoints closer than this (in grid cells) make a line degenerate.
    pub degenerate_tolerance: f64,

    /// Maximum number of time steps a trajectory integrates.
    pub trajectory_max_steps: usize,

    /// Keep every `(skip + 1)`-th trajectory seed.
    pub trajectory_skip: usize,
}

impl Default for SlicerConfig {
    fn default() -> Self {
        Self {
            sampling_mode: SamplingMode::WeightedAverage,
            smoothing_kind: SmoothingKind::None,
            smoothing_factor: 0,
            distance_unit: "km".to_string(),
            altitude_unit: "m".to_string(),
            slice_cache_size_mb: 256,
            max_line_samples: 2000,
            degenerate_tolerance: 0.01,
            trajectory_max_steps: 240,
            trajectory_skip: 0,
        }
    }
}

impl SlicerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SLICER_SAMPLING_MODE") {
            match val.parse() {
                Ok(mode) => config.sampling_mode = mode,
                Err(e) => warn!(error = %e, "Ignoring SLICER_SAMPLING_MODE"),
            }
        }

        if let Ok(val) = std::env::var("SLICER_SMOOTHING_KIND") {
            match val.parse() {
                Ok(kind) => config.smoothing_kind = kind,
                Err(e) => warn!(error = %e, "Ignoring SLICER_SMOOTHING_KIND"),
            }
        }

        if let Ok(val) = std::env::var("SLICER_SMOOTHING_FACTOR") {
            if let Ok(factor) = val.parse() {
                config.smoothing_factor = factor;
            }
        }

        if let Ok(val) = std::env::var("SLICER_DISTANCE_UNIT") {
            config.distance_unit = val;
        }

        if let Ok(val) = std::env::var("SLICER_ALTITUDE_UNIT") {
            config.altitude_unit = val;
        }

        if let Ok(val) = std::env::var("SLICER_CACHE_SIZE_MB") {
            if let Ok(size) = val.parse() {
                config.slice_cache_size_mb = size;
            }
        }

        if let Ok(val) = std::env::var("SLICER_MAX_LINE_SAMPLES") {
            if let Ok(n) = val.parse() {
                config.max_line_samples = n;
            }
        }

        if let Ok(val) = std::env::var("SLICER_DEGENERATE_TOLERANCE") {
            if let Ok(tol) = val.parse() {
                config.degenerate_tolerance = tol;
            }
        }

        if let Ok(val) = std::env::var("SLICER_TRAJECTORY_MAX_STEPS") {
            if let Ok(n) = val.parse() {
                config.trajectory_max_steps = n;
            }
        }

        if let Ok(val) = std::env::var("SLICER_TRAJECTORY_SKIP") {
            if let Ok(n) = val.parse() {
                config.trajectory_skip = n;
            }
        }

        config
    }

    /// Load configuration from a YAML file. Missing keys take defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&text)?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.slice_cache_size_mb == 0 {
            return Err("slice_cache_size_mb must be > 0".to_string());
        }

        if self.max_line_samples < 2 {
            return Err("max_line_samples must be >= 2".to_string());
        }

        if !(self.degenerate_tolerance.is_finite() && self.degenerate_tolerance >= 0.0) {
            return Err("degenerate_tolerance must be a finite value >= 0".to_string());
        }

        if self.trajectory_max_steps == 0 {
            return Err("trajectory_max_steps must be > 0".to_string());
        }

        if self.smoothing_kind != SmoothingKind::None && self.smoothing_factor == 0 {
            return Err(format!(
                "smoothing_factor must be > 0 for {}",
                self.smoothing_kind
            ));
        }

        Ok(())
    }

    /// Get the slice cache size in bytes.
    pub fn slice_cache_size_bytes(&self) -> usize {
        self.slice_cache_size_mb * 1024 * 1024
    }

    /// Distance unit, falling back to km when the specifier is not a length.
    pub fn distance_unit(&self) -> Checked<Unit> {
        resolve_unit(&self.distance_unit, Dimension::Length, Unit::Kilometer)
    }

    /// Altitude unit, falling back to m when the specifier is not a length.
    pub fn altitude_unit(&self) -> Checked<Unit> {
        resolve_unit(&self.altitude_unit, Dimension::Length, Unit::Meter)
    }
}

fn resolve_unit(symbol: &str, dimension: Dimension, fallback: Unit) -> Checked<Unit> {
    match Unit::parse(symbol) {
        Ok(unit) if unit.dimension() == dimension => Checked::new(unit),
        Ok(unit) => {
            warn!(unit = %unit, fallback = %fallback, "Configured unit has the wrong dimension");
            Checked::new(fallback).with_condition(Condition::unit_conversion(unit, fallback))
        }
        Err(e) => {
            warn!(symbol, error = %e, fallback = %fallback, "Configured unit not recognized");
            Checked::new(fallback).with_condition(Condition::unit_conversion(symbol, fallback))
        }
    }
}
