//! Longitude normalization.
//!
//! Locations carry longitude exactly as given. These helpers are the only
//! places wraparound is applied, and each makes the target range explicit.

/// Normalize to -180..=180 (IEEE remainder against 360).
pub fn normalize_longitude(lon: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    lon - 360.0 * (lon / 360.0).round_ties_even()
}

/// Normalize to 0..360.
pub fn normalize_longitude_360(lon: f64) -> f64 {
    if !lon.is_finite() {
        return lon;
    }
    let r = lon.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Shift `lon` by a multiple of 360° so it falls inside `[low, high]`.
///
/// Used to bring a location into a grid's native longitude frame, which may
/// be 0..360 or -180..180. If the domain spans less than 360° and `lon` does
/// not fit any shift, the result is the first shift past the range.
pub fn normalize_against_domain(lon: f64, low: f64, high: f64) -> f64 {
    if !lon.is_finite() || !low.is_finite() || !high.is_finite() {
        return lon;
    }
    // Reduce first so the differences below stay small and exact
    let reduced = wrap_360(lon);
    if lon < low {
        low + wrap_360(reduced - low)
    } else if lon > high {
        high - wrap_360(high - reduced)
    } else {
        lon
    }
}

/// Remainder in 0..360, computed exactly for any magnitude.
fn wrap_360(delta: f64) -> f64 {
    let r = delta.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Adjust `lon` into the frame of `prev` when the step between them jumps
/// across the seam.
///
/// A raw step above +180° subtracts 360°, one below -180° adds 360°.
pub fn seam_adjust(prev: f64, lon: f64) -> f64 {
    let delta = lon - prev;
    if delta > 180.0 {
        lon - 360.0
    } else if delta < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
