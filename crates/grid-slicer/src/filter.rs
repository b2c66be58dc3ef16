//! Post-extraction filters: smoothing and skip subsetting.
//!
//! Both filters are pure functions of their inputs. [`SmoothingMemo`] keeps
//! the last smoothed result so that re-applying the same parameters to the
//! same slice does no work.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::slice::{Slice, SliceGeometry};
use crate::types::SmoothingKind;

/// Smooth every time step of a slice.
///
/// `factor` is the pass count for the 5- and 9-point smoothers, the kernel
/// half-width for Gaussian, and the radius for the aperture averages.
/// Missing cells are skipped when averaging and stay missing. `None`, a zero
/// factor, and scattered slices come back unchanged.
pub fn apply_smoothing(slice: &Slice, kind: SmoothingKind, factor: u32) -> Slice {
    if kind == SmoothingKind::None || factor == 0 {
        return slice.clone();
    }
    if matches!(slice.geometry, SliceGeometry::Scattered { .. }) {
        debug!(field = %slice.field_id, "Scattered slices are not smoothed");
        return slice.clone();
    }

    let (w, h) = (slice.columns, slice.rows);
    let layer_len = slice.layer_len();
    if layer_len == 0 {
        return slice.clone();
    }

    let layers: Vec<Vec<f32>> = slice
        .values
        .par_chunks(layer_len)
        .map(|layer| smooth_layer(layer, w, h, kind, factor))
        .collect();

    debug!(field = %slice.field_id, kind = %kind, factor, "Smoothed slice");
    slice.with_values(slice.geometry.clone(), w, h, layers.concat())
}

fn smooth_layer(layer: &[f32], w: usize, h: usize, kind: SmoothingKind, factor: u32) -> Vec<f32> {
    match kind {
        SmoothingKind::None => layer.to_vec(),
        SmoothingKind::FivePoint => {
            let mut data = layer.to_vec();
            for _ in 0..factor {
                data = convolve(&data, w, h, 1, |dx, dy| match dx.abs() + dy.abs() {
                    0 => 0.5,
                    1 => 0.125,
                    _ => 0.0,
                });
            }
            data
        }
        SmoothingKind::NinePoint => {
            let mut data = layer.to_vec();
            for _ in 0..factor {
                data = convolve(&data, w, h, 1, |dx, dy| match dx.abs() + dy.abs() {
                    0 => 4.0,
                    1 => 2.0,
                    _ => 1.0,
                });
            }
            data
        }
        SmoothingKind::Gaussian => {
            let radius = factor as i64;
            let sigma = (factor as f64 / 2.0).max(0.5);
            let two_sigma_sq = 2.0 * sigma * sigma;
            convolve(layer, w, h, radius, |dx, dy| {
                (-((dx * dx + dy * dy) as f64) / two_sigma_sq).exp()
            })
        }
        SmoothingKind::RectangularAperture => convolve(layer, w, h, factor as i64, |_, _| 1.0),
        SmoothingKind::CircularAperture => {
            let r2 = (factor as i64) * (factor as i64);
            convolve(layer, w, h, factor as i64, |dx, dy| {
                if dx * dx + dy * dy <= r2 {
                    1.0
                } else {
                    0.0
                }
            })
        }
    }
}

/// Weighted average over a square neighborhood.
///
/// Weights of missing or out-of-grid neighbors are dropped and the rest
/// renormalized.
fn convolve(data: &[f32], w: usize, h: usize, radius: i64, weight: impl Fn(i64, i64) -> f64) -> Vec<f32> {
    let mut out = vec![f32::NAN; data.len()];
    for y in 0..h as i64 {
        for x in 0..w as i64 {
            let center = (y as usize) * w + x as usize;
            if data[center].is_nan() {
                continue;
            }
            let mut sum = 0.0f64;
            let mut total = 0.0f64;
            for dy in -radius..=radius {
                let ny = y + dy;
                if ny < 0 || ny >= h as i64 {
                    continue;
                }
                for dx in -radius..=radius {
                    let nx = x + dx;
                    if nx < 0 || nx >= w as i64 {
                        continue;
                    }
                    let wt = weight(dx, dy);
                    if wt == 0.0 {
                        continue;
                    }
                    let v = data[(ny as usize) * w + nx as usize];
                    if v.is_nan() {
                        continue;
                    }
                    sum += wt * v as f64;
                    total += wt;
                }
            }
            if total > 0.0 {
                out[center] = (sum / total) as f32;
            }
        }
    }
    out
}

/// Keep every `n`-th sample along the horizontal axes.
///
/// Each subsampled axis has `1 + (len - 1) / n` samples. Plan views skip
/// both axes; cross-sections skip along the path and keep every level.
pub fn apply_skip(slice: &Slice, n: usize) -> Slice {
    if n <= 1 || slice.columns == 0 {
        return slice.clone();
    }

    let (geometry, skip_rows) = match &slice.geometry {
        SliceGeometry::Plane { horizontal, level } => (
            SliceGeometry::Plane {
                horizontal: horizontal.subsample(n),
                level: *level,
            },
            true,
        ),
        SliceGeometry::Transect {
            axis,
            positions,
            levels,
        } => (
            SliceGeometry::Transect {
                axis: axis.subsample(n),
                positions: positions.iter().step_by(n).copied().collect(),
                levels: levels.clone(),
            },
            false,
        ),
        SliceGeometry::Scattered { positions } => (
            SliceGeometry::Scattered {
                positions: positions.iter().step_by(n).copied().collect(),
            },
            false,
        ),
    };

    let columns = 1 + (slice.columns - 1) / n;
    let rows = if skip_rows && slice.rows > 0 {
        1 + (slice.rows - 1) / n
    } else {
        slice.rows
    };
    let row_step = if skip_rows { n } else { 1 };

    let mut values = Vec::with_capacity(columns * rows * slice.time_steps());
    for t in 0..slice.time_steps() {
        for r in (0..slice.rows).step_by(row_step) {
            for c in (0..slice.columns).step_by(n) {
                values.push(slice.values[c + slice.columns * (r + slice.rows * t)]);
            }
        }
    }

    slice.with_values(geometry, columns, rows, values)
}

/// Something that smooths slices.
pub trait Smoother {
    fn smooth(&self, slice: &Slice, kind: SmoothingKind, factor: u32) -> Slice;
}

/// The built-in smoothing kernels.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelSmoother;

impl Smoother for KernelSmoother {
    fn smooth(&self, slice: &Slice, kind: SmoothingKind, factor: u32) -> Slice {
        apply_smoothing(slice, kind, factor)
    }
}

/// Remembers the last smoothing applied and skips identical repeats.
///
/// The result is recomputed only when the slice fingerprint, the kind or
/// the factor differs from the previous call.
#[derive(Debug)]
pub struct SmoothingMemo<S: Smoother = KernelSmoother> {
    smoother: S,
    last: Option<MemoEntry>,
}

#[derive(Debug)]
struct MemoEntry {
    fingerprint: u64,
    kind: SmoothingKind,
    factor: u32,
    result: Arc<Slice>,
}

impl Default for SmoothingMemo<KernelSmoother> {
    fn default() -> Self {
        Self::new(KernelSmoother)
    }
}

impl<S: Smoother> SmoothingMemo<S> {
    pub fn new(smoother: S) -> Self {
        Self {
            smoother,
            last: None,
        }
    }

    pub fn apply(&mut self, slice: &Slice, kind: SmoothingKind, factor: u32) -> Arc<Slice> {
        if let Some(entry) = &self.last {
            if entry.fingerprint == slice.fingerprint && entry.kind == kind && entry.factor == factor {
                debug!(field = %slice.field_id, kind = %kind, factor, "Smoothing unchanged, reusing result");
                return entry.result.clone();
            }
        }

        let result = Arc::new(self.smoother.smooth(slice, kind, factor));
        self.last = Some(MemoEntry {
            fingerprint: slice.fingerprint,
            kind,
            factor,
            result: result.clone(),
        });
        result
    }

    /// Forget the remembered result.
    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn smoother(&self) -> &S {
        &self.smoother
    }
}
