//! Lambert Conformal Conic projection.
//!
//! The usual projection for regional NWP grids such as HRRR and NAM. A grid
//! is defined by its first point, the central meridian (LoV), one or two
//! standard parallels and the grid spacing in meters.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use geo_common::BoundingBox;

use crate::error::ProjectionError;
use crate::transform::HorizontalTransform;

const TO_RAD: f64 = PI / 180.0;
const TO_DEG: f64 = 180.0 / PI;

/// Earth radius used by GRIB2 Lambert grids (meters).
pub const LAMBERT_EARTH_RADIUS_M: f64 = 6_371_229.0;

/// Lambert grid definition in degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertParams {
    pub first_lat: f64,
    pub first_lon: f64,
    pub lov: f64,
    pub latin1: f64,
    pub latin2: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
}

/// A Lambert Conformal grid, mapping `(i, j)` to `(lat, lon)`.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    params: LambertParams,
    /// Central meridian (radians)
    lon0: f64,
    /// Cone constant
    n: f64,
    /// Scaled F constant (R * F)
    rf: f64,
    /// Cone radius at the first grid point
    rho_first: f64,
    /// First grid point in projection meters
    origin: (f64, f64),
}

fn wrap_pi(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

impl LambertConformal {
    pub fn new(params: LambertParams) -> Result<Self, ProjectionError> {
        if params.nx == 0 || params.ny == 0 {
            return Err(ProjectionError::invalid("nx/ny", "grid must be non-empty"));
        }
        if !(params.dx > 0.0 && params.dy > 0.0) {
            return Err(ProjectionError::invalid("dx/dy", "spacing must be positive"));
        }
        for (name, lat) in [("latin1", params.latin1), ("latin2", params.latin2)] {
            if !(lat.abs() < 90.0) {
                return Err(ProjectionError::invalid(name, format!("{} out of range", lat)));
            }
        }

        let latin1 = params.latin1 * TO_RAD;
        let latin2 = params.latin2 * TO_RAD;

        let n = if (latin1 - latin2).abs() < 1e-10 {
            latin1.sin()
        } else {
            (latin1.cos() / latin2.cos()).ln()
                / ((FRAC_PI_4 + latin2 / 2.0).tan() / (FRAC_PI_4 + latin1 / 2.0).tan()).ln()
        };
        if n.abs() < 1e-10 || !n.is_finite() {
            return Err(ProjectionError::Degenerate(
                "standard parallels give a flat cone".to_string(),
            ));
        }

        let f = latin1.cos() * (FRAC_PI_4 + latin1 / 2.0).tan().powf(n) / n;
        let rf = LAMBERT_EARTH_RADIUS_M * f;
        let rho_first = rf / (FRAC_PI_4 + params.first_lat * TO_RAD / 2.0).tan().powf(n);

        let mut proj = Self {
            params,
            lon0: params.lov * TO_RAD,
            n,
            rf,
            rho_first,
            origin: (0.0, 0.0),
        };
        proj.origin = proj.project(params.first_lat, params.first_lon);
        Ok(proj)
    }

    /// HRRR CONUS grid: 1799 x 1059 at 3 km, tangent at 38.5°N, LoV 97.5°W.
    pub fn hrrr() -> Result<Self, ProjectionError> {
        Self::new(LambertParams {
            first_lat: 21.138123,
            first_lon: -122.719528,
            lov: -97.5,
            latin1: 38.5,
            latin2: 38.5,
            dx: 3000.0,
            dy: 3000.0,
            nx: 1799,
            ny: 1059,
        })
    }

    pub fn params(&self) -> &LambertParams {
        &self.params
    }

    /// Projection-plane meters for a lat/lon in degrees.
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let rho = self.rf / (FRAC_PI_4 + lat * TO_RAD / 2.0).tan().powf(self.n);
        let theta = self.n * wrap_pi(lon * TO_RAD - self.lon0);
        (rho * theta.sin(), self.rho_first - rho * theta.cos())
    }

    /// Grid index to `(lat, lon)` in degrees.
    pub fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let x = self.origin.0 + i * self.params.dx;
        let y = self.origin.1 + j * self.params.dy;
        let dy = self.rho_first - y;

        let mut rho = (x * x + dy * dy).sqrt();
        if self.n < 0.0 {
            rho = -rho;
        }
        let theta = (x / dy).atan();

        let lat = 2.0 * (self.rf / rho).powf(1.0 / self.n).atan() - FRAC_PI_2;
        let lon = self.lon0 + theta / self.n;
        (lat * TO_DEG, wrap_pi(lon) * TO_DEG)
    }

    /// `(lat, lon)` in degrees to fractional grid index.
    pub fn geo_to_grid(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (x, y) = self.project(lat, lon);
        (
            (x - self.origin.0) / self.params.dx,
            (y - self.origin.1) / self.params.dy,
        )
    }

    /// Approximate lat/lon box enclosing the grid, sampled along its edges.
    pub fn geographic_bounds(&self) -> Option<BoundingBox> {
        let max_i = self.params.nx as f64 - 1.0;
        let max_j = self.params.ny as f64 - 1.0;

        let mut edge = Vec::with_capacity(44);
        for t in 0..=10 {
            let f = t as f64 / 10.0;
            edge.push((f * max_i, 0.0));
            edge.push((f * max_i, max_j));
            edge.push((0.0, f * max_j));
            edge.push((max_i, f * max_j));
        }

        BoundingBox::enclosing(edge.into_iter().map(|(i, j)| {
            let (lat, lon) = self.grid_to_geo(i, j);
            (lon, lat)
        }))
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let (i, j) = self.geo_to_grid(lat, lon);
        i >= 0.0 && i <= self.params.nx as f64 - 1.0 && j >= 0.0 && j <= self.params.ny as f64 - 1.0
    }
}

impl HorizontalTransform for LambertConformal {
    fn name(&self) -> &str {
        "lambert_conformal"
    }

    fn to_reference(&self, i: f64, j: f64) -> (f64, f64) {
        self.grid_to_geo(i, j)
    }

    fn from_reference(&self, lat: f64, lon: f64) -> (f64, f64) {
        self.geo_to_grid(lat, lon)
    }

    fn dimensions(&self) -> (usize, usize) {
        (self.params.nx, self.params.ny)
    }
}
