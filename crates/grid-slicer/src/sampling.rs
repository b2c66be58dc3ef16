//! Sampling a horizontal layer at fractional grid indices.

use crate::types::SamplingMode;

/// Tolerance for treating a fractional index as on the grid edge.
const EDGE_EPS: f64 = 1e-9;

/// Sample a `width` x `height` layer at fractional index `(x, y)`.
///
/// Returns NaN when the point is off the grid.
pub fn sample_layer(data: &[f32], width: usize, height: usize, x: f64, y: f64, mode: SamplingMode) -> f32 {
    match mode {
        SamplingMode::NearestNeighbor => nearest_interpolate(data, width, height, x, y),
        SamplingMode::WeightedAverage => bilinear_interpolate(data, width, height, x, y),
    }
}

/// Nearest neighbor interpolation.
///
/// Points up to half a cell outside the grid snap to the edge node.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if x.is_nan() || y.is_nan() {
        return f32::NAN;
    }
    let col = x.round();
    let row = y.round();
    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return f32::NAN;
    }

    data[row as usize * width + col as usize]
}

/// Bilinear interpolation.
///
/// Corners with zero weight do not contribute, so a point exactly on a node
/// returns that node even if a neighbor is missing. Any contributing missing
/// corner makes the result missing. An axis of length one is constant across
/// half a cell either side.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    let Some((x0, x1, xf)) = axis_cell(x, width) else {
        return f32::NAN;
    };
    let Some((y0, y1, yf)) = axis_cell(y, height) else {
        return f32::NAN;
    };

    let corners = [
        (x0, y0, (1.0 - xf) * (1.0 - yf)),
        (x1, y0, xf * (1.0 - yf)),
        (x0, y1, (1.0 - xf) * yf),
        (x1, y1, xf * yf),
    ];

    let mut sum = 0.0f64;
    for (cx, cy, w) in corners {
        if w == 0.0 {
            continue;
        }
        let v = data[cy * width + cx];
        if v.is_nan() {
            return f32::NAN;
        }
        sum += w * v as f64;
    }
    sum as f32
}

/// Lower node, upper node and fraction for one axis.
fn axis_cell(x: f64, len: usize) -> Option<(usize, usize, f64)> {
    if x.is_nan() || len == 0 {
        return None;
    }
    if len == 1 {
        return (x.abs() <= 0.5).then_some((0, 0, 0.0));
    }

    let max = (len - 1) as f64;
    if x < -EDGE_EPS || x > max + EDGE_EPS {
        return None;
    }
    let x = x.clamp(0.0, max);
    let x0 = (x.floor() as usize).min(len - 2);
    let frac = x - x0 as f64;
    Some((x0, x0 + 1, frac))
}

/// Linear interpolation between two level values.
///
/// NaN if a level with non-zero weight is missing.
pub fn lerp_levels(lo: f32, hi: f32, weight_hi: f64) -> f32 {
    if weight_hi == 0.0 {
        return lo;
    }
    if weight_hi == 1.0 {
        return hi;
    }
    if lo.is_nan() || hi.is_nan() {
        return f32::NAN;
    }
    (lo as f64 * (1.0 - weight_hi) + hi as f64 * weight_hi) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    const GRID: [f32; 9] = [
        1.0, 2.0, 3.0,
        4.0, 5.0, 6.0,
        7.0, 8.0, 9.0,
    ];

    #[test]
    fn test_nearest_interpolate() {
        assert_eq!(nearest_interpolate(&GRID, 3, 3, 0.0, 0.0), 1.0);
        assert_eq!(nearest_interpolate(&GRID, 3, 3, 1.0, 1.0), 5.0);
        assert_eq!(nearest_interpolate(&GRID, 3, 3, 0.4, 0.4), 1.0);
        assert_eq!(nearest_interpolate(&GRID, 3, 3, 0.6, 0.6), 5.0);
        assert_eq!(nearest_interpolate(&GRID, 3, 3, -0.4, 2.4), 7.0);
        assert!(nearest_interpolate(&GRID, 3, 3, -0.6, 0.0).is_nan());
        assert!(nearest_interpolate(&GRID, 3, 3, 0.0, 2.6).is_nan());
    }

    #[test]
    fn test_bilinear_interpolate() {
        assert_eq!(bilinear_interpolate(&GRID, 3, 3, 0.0, 0.0), 1.0);
        assert_eq!(bilinear_interpolate(&GRID, 3, 3, 2.0, 2.0), 9.0);
        assert_eq!(bilinear_interpolate(&GRID, 3, 3, 0.5, 0.0), 1.5);
        assert_eq!(bilinear_interpolate(&GRID, 3, 3, 0.5, 0.5), 3.0);
        assert!(bilinear_interpolate(&GRID, 3, 3, 2.1, 0.0).is_nan());
    }

    #[test]
    fn test_bilinear_nan_handling() {
        let mut grid = GRID;
        grid[4] = f32::NAN;

        // Contributing corner missing
        assert!(bilinear_interpolate(&grid, 3, 3, 0.5, 0.5).is_nan());
        // On a node next to the missing one
        assert_eq!(bilinear_interpolate(&grid, 3, 3, 0.0, 1.0), 4.0);
        assert_eq!(bilinear_interpolate(&grid, 3, 3, 1.0, 0.0), 2.0);
    }

    #[test]
    fn test_bilinear_single_row() {
        let row = [0.0f32, 10.0, 20.0];
        assert_eq!(bilinear_interpolate(&row, 3, 1, 1.5, 0.2), 15.0);
        assert!(bilinear_interpolate(&row, 3, 1, 1.5, 0.6).is_nan());
    }

    #[test]
    fn test_lerp_levels() {
        assert_eq!(lerp_levels(10.0, 20.0, 0.25), 12.5);
        assert!(lerp_levels(f32::NAN, 20.0, 0.25).is_nan());
        assert_eq!(lerp_levels(10.0, f32::NAN, 0.0), 10.0);
    }
}
