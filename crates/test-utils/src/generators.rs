//! Test data generators for synthetic gridded fields.
//!
//! Every generator returns a flat `Vec<f32>` laid out with the first axis
//! varying fastest: `index = col + width * (row + height * level)`.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // col=1, row=0
/// assert_eq!(grid[10], 1.0);    // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a volume where each value encodes its position:
/// `level * 1_000_000 + col * 1000 + row`.
pub fn create_test_volume(width: usize, height: usize, levels: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height * levels);
    for level in 0..levels {
        for row in 0..height {
            for col in 0..width {
                data.push((level * 1_000_000 + col * 1000 + row) as f32);
            }
        }
    }
    data
}

/// Creates a temperature-like volume in Kelvin.
///
/// Surface values range 280K..300K across the grid and each level is 6.5K
/// colder than the one below, roughly a tropospheric lapse rate per km.
pub fn create_temperature_volume(width: usize, height: usize, levels: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height * levels);
    for level in 0..levels {
        for row in 0..height {
            for col in 0..width {
                let x_factor = col as f32 / width.max(1) as f32;
                let y_factor = row as f32 / height.max(1) as f32;
                let surface = 280.0 + x_factor * 10.0 + y_factor * 10.0;
                data.push(surface - 6.5 * level as f32);
            }
        }
    }
    data
}

/// Creates a grid of zeros with NaN at the given `(col, row)` positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}

/// Creates a grid where only the columns in `valid_cols` hold data (the
/// column index); everything else is NaN.
pub fn create_masked_columns(width: usize, height: usize, valid_cols: &[usize]) -> Vec<f32> {
    let mut data = vec![f32::NAN; width * height];
    for row in 0..height {
        for &col in valid_cols {
            if col < width {
                data[row * width + col] = col as f32;
            }
        }
    }
    data
}
