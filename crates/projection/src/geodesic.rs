//! Great-circle geodesy on a spherical earth.
//!
//! All angles in and out are degrees. Distances are kilometers.

use std::f64::consts::PI;

/// Mean earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const TO_RAD: f64 = PI / 180.0;
const TO_DEG: f64 = 180.0 / PI;

/// Haversine distance between two points in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1) * TO_RAD;
    let d_lon = (lon2 - lon1) * TO_RAD;

    let a = (d_lat / 2.0).sin().powi(2)
        + (lat1 * TO_RAD).cos() * (lat2 * TO_RAD).cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing from point 1 to point 2, degrees clockwise from north in 0..360.
pub fn initial_bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1 * TO_RAD;
    let lat2 = lat2 * TO_RAD;
    let d_lon = (lon2 - lon1) * TO_RAD;

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    (y.atan2(x) * TO_DEG + 360.0) % 360.0
}

/// Point reached by travelling `distance_km` from `(lat, lon)` on `bearing`.
///
/// Returns `(lat, lon)` with longitude in -180..180.
pub fn destination_point(lat: f64, lon: f64, bearing: f64, distance_km: f64) -> (f64, f64) {
    let lat1 = lat * TO_RAD;
    let lon1 = lon * TO_RAD;
    let brng = bearing * TO_RAD;
    let d = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * d.cos() + lat1.cos() * d.sin() * brng.cos()).asin();
    let lon2 = lon1
        + (brng.sin() * d.sin() * lat1.cos()).atan2(d.cos() - lat1.sin() * lat2.sin());

    let lon2 = ((lon2 * TO_DEG + 540.0) % 360.0) - 180.0;
    (lat2 * TO_DEG, lon2)
}

/// Point at fraction `f` (0..1) along the great circle between two points.
///
/// Longitude is continued from `lon1` rather than wrapped, so a path that
/// starts at 179° and heads east yields 180°, 181°, ...
pub fn intermediate_point(lat1: f64, lon1: f64, lat2: f64, lon2: f64, f: f64) -> (f64, f64) {
    let phi1 = lat1 * TO_RAD;
    let phi2 = lat2 * TO_RAD;
    let lam1 = lon1 * TO_RAD;
    let lam2 = lon2 * TO_RAD;

    let delta = haversine_km(lat1, lon1, lat2, lon2) / EARTH_RADIUS_KM;
    if delta < 1e-12 {
        return (lat1, lon1);
    }

    let a = ((1.0 - f) * delta).sin() / delta.sin();
    let b = (f * delta).sin() / delta.sin();

    let x = a * phi1.cos() * lam1.cos() + b * phi2.cos() * lam2.cos();
    let y = a * phi1.cos() * lam1.sin() + b * phi2.cos() * lam2.sin();
    let z = a * phi1.sin() + b * phi2.sin();

    let lat = z.atan2((x * x + y * y).sqrt()) * TO_DEG;
    let mut lon = y.atan2(x) * TO_DEG;

    while lon - lon1 > 180.0 {
        lon -= 360.0;
    }
    while lon - lon1 < -180.0 {
        lon += 360.0;
    }

    (lat, lon)
}

/// `n` points along the great circle from start to end, inclusive.
///
/// The first and last entries are exactly the given endpoints.
pub fn great_circle_path(start: (f64, f64), end: (f64, f64), n: usize) -> Vec<(f64, f64)> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let mut points = Vec::with_capacity(n);
            points.push(start);
            for k in 1..n - 1 {
                let f = k as f64 / (n - 1) as f64;
                points.push(intermediate_point(start.0, start.1, end.0, end.1, f));
            }
            points.push(end);
            points
        }
    }
}
