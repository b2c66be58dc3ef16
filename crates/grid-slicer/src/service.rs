//! High-level slicing service.
//!
//! `GridSlicer` bundles an extractor, the post-extraction smoother and a
//! shared slice cache behind one entry point. It is the interface the CLI
//! and any display layer use.
//!
//! Smoothing runs through a [`SmoothingMemo`], so a slice re-extracted
//! after a cache eviction or clear is not smoothed twice.
//!
//! # Example
//!
//! ```rust,ignore
//! use grid_slicer::{CuttingPrimitive, GridSlicer, SlicerConfig};
//!
//! let slicer = GridSlicer::new(SlicerConfig::from_env())?;
//!
//! let line = CuttingPrimitive::line(start, end);
//! let result = slicer.slice(&field, &line, None, None)?;
//! for condition in &result.conditions {
//!     eprintln!("{}", condition);
//! }
//! ```

use std::sync::Mutex;

use geo_common::EarthLocation;
use tracing::{debug, warn};

use crate::cache::{SliceCache, SliceKey};
use crate::config::SlicerConfig;
use crate::error::{Result, SliceError};
use crate::extract::{default_transect, SliceExtractor};
use crate::field::GriddedField;
use crate::filter::{KernelSmoother, Smoother, SmoothingMemo};
use crate::levels::Level;
use crate::primitive::CuttingPrimitive;
use crate::slice::{ProbeSample, Slice, SliceResult};
use crate::trajectory::{seed_points, TrajectoryHandle, TrajectoryRequest, TrajectoryRunner};
use crate::types::{CacheStats, Checked, Condition, SamplingMode, SmoothingKind};

/// Slicing front end with caching and smoothing.
///
/// Safe to share between threads; the cache and the smoothing memo are
/// internally synchronized.
pub struct GridSlicer<S: Smoother = KernelSmoother> {
    config: SlicerConfig,
    extractor: SliceExtractor,
    cache: SliceCache,
    smoothing: Mutex<SmoothingMemo<S>>,
    runner: TrajectoryRunner,
    /// Conditions raised interpreting the configuration
    config_conditions: Vec<Condition>,
}

impl GridSlicer {
    /// Create a slicer from a validated configuration.
    pub fn new(config: SlicerConfig) -> Result<Self> {
        Self::with_smoother(config, KernelSmoother)
    }
}

impl<S: Smoother> GridSlicer<S> {
    /// Create a slicer that smooths with `smoother`.
    pub fn with_smoother(config: SlicerConfig, smoother: S) -> Result<Self> {
        config.validate().map_err(SliceError::config)?;

        let Checked {
            value: extractor,
            conditions,
        } = SliceExtractor::new(&config);
        for condition in &conditions {
            warn!(condition = %condition, "Configuration fallback");
        }

        Ok(Self {
            cache: SliceCache::new(config.slice_cache_size_bytes()),
            smoothing: Mutex::new(SmoothingMemo::new(smoother)),
            runner: TrajectoryRunner::new(&config),
            extractor,
            config,
            config_conditions: conditions,
        })
    }

    pub fn config(&self) -> &SlicerConfig {
        &self.config
    }

    pub fn extractor(&self) -> &SliceExtractor {
        &self.extractor
    }

    pub fn config_conditions(&self) -> &[Condition] {
        &self.config_conditions
    }

    /// Extract and smooth with the configured smoothing.
    ///
    /// `mode` overrides the configured sampling mode. Ready slices are
    /// cached; retained and missing results are not.
    pub fn slice(
        &self,
        field: &GriddedField,
        primitive: &CuttingPrimitive,
        mode: Option<SamplingMode>,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        self.slice_smoothed(
            field,
            primitive,
            mode,
            self.config.smoothing_kind,
            self.config.smoothing_factor,
            previous,
        )
    }

    /// Extract with explicit smoothing parameters.
    pub fn slice_smoothed(
        &self,
        field: &GriddedField,
        primitive: &CuttingPrimitive,
        mode: Option<SamplingMode>,
        smoothing: SmoothingKind,
        factor: u32,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        let mode = mode.unwrap_or(self.config.sampling_mode);
        let key = SliceKey::new(field, primitive, mode, smoothing, factor);

        let mut uncached = None;
        let cached = self.cache.get_or_compute(key, || {
            let Checked { value, conditions } = self.extractor.extract(field, primitive, mode, previous)?;
            match value {
                SliceResult::Ready(slice) => {
                    let slice = if smoothing == SmoothingKind::None {
                        slice
                    } else {
                        let mut memo = self.smoothing.lock().unwrap_or_else(|e| e.into_inner());
                        Slice::clone(&memo.apply(&slice, smoothing, factor))
                    };
                    Ok(Some(Checked { value: slice, conditions }))
                }
                other => {
                    uncached = Some(Checked { value: other, conditions });
                    Ok(None)
                }
            }
        })?;

        match cached {
            Some(hit) => Ok(hit.map(|slice| SliceResult::Ready(Slice::clone(&slice)))),
            None => {
                let result = uncached.ok_or_else(|| SliceError::Internal("extraction produced no result".to_string()))?;
                debug!(
                    field = %field.id,
                    primitive = primitive.kind(),
                    retained = result.value.is_retained(),
                    "Slice not cached"
                );
                Ok(result)
            }
        }
    }

    /// Values at one location; not cached.
    pub fn probe(
        &self,
        field: &GriddedField,
        location: &EarthLocation,
        mode: Option<SamplingMode>,
    ) -> Result<Checked<ProbeSample>> {
        let mode = mode.unwrap_or(self.config.sampling_mode);
        self.extractor.slice_at_point(field, location, mode)
    }

    /// Default cross-section endpoints for `field`.
    pub fn default_transect(&self, field: &GriddedField) -> Result<Checked<Option<(EarthLocation, EarthLocation)>>> {
        default_transect(field)
    }

    /// Trajectory seeds inside `polygons`, thinned by the configured skip.
    pub fn trajectory_seeds(
        &self,
        field: &GriddedField,
        polygons: &[Vec<EarthLocation>],
        level: Option<&Level>,
    ) -> Result<Checked<Vec<EarthLocation>>> {
        seed_points(field, polygons, level, self.config.trajectory_skip)
    }

    /// Start a background trajectory job. Must be called within a Tokio
    /// runtime.
    pub fn trajectories(&self, request: TrajectoryRequest) -> TrajectoryHandle {
        self.runner.submit(request)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
