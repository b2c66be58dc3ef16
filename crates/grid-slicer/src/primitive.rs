//! Cutting primitives: what subset of a field to extract.

use std::hash::{Hash, Hasher};

use geo_common::EarthLocation;
use projection::{normalize_against_domain, seam_adjust};

use crate::levels::Level;

/// Describes the subset of a [`crate::GriddedField`] to extract.
#[derive(Debug, Clone, PartialEq)]
pub enum CuttingPrimitive {
    /// A single earth location (point probe).
    Point(EarthLocation),
    /// A great-circle segment between two locations (cross-section).
    LineSegment {
        start: EarthLocation,
        end: EarthLocation,
    },
    /// A horizontal plane at a vertical level (plan view).
    Level(Level),
    /// The grid points inside a closed polygon.
    Polygon(Vec<EarthLocation>),
    /// Explicit grid indices on a plane at `level`.
    InitialArea {
        level: Option<Level>,
        indices: Vec<(usize, usize)>,
    },
}

impl CuttingPrimitive {
    pub fn line(start: EarthLocation, end: EarthLocation) -> Self {
        Self::LineSegment { start, end }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "point",
            Self::LineSegment { .. } => "line",
            Self::Level(_) => "level",
            Self::Polygon(_) => "polygon",
            Self::InitialArea { .. } => "initial_area",
        }
    }
}

/// Ray-casting point-in-polygon test on `(lat, lon)` in degrees.
///
/// Vertices are unwrapped into one continuous longitude frame, each one
/// seam-adjusted against the previous, so a polygon may cross the
/// antimeridian in either 0..360 or -180..180 coordinates. The point is then
/// shifted by 360° into the 360° window starting at the westernmost vertex.
pub fn point_in_polygon(lat: f64, lon: f64, vertices: &[EarthLocation]) -> bool {
    if vertices.len() < 3 || lat.is_nan() || lon.is_nan() {
        return false;
    }

    let mut ring = Vec::with_capacity(vertices.len());
    let mut prev: Option<f64> = None;
    for v in vertices {
        let x = match prev {
            Some(p) => seam_adjust(p, v.longitude),
            None => v.longitude,
        };
        prev = Some(x);
        ring.push((x, v.latitude));
    }

    let west = ring.iter().map(|&(x, _)| x).fold(f64::INFINITY, f64::min);
    let x = normalize_against_domain(lon, west, west + 360.0);
    let y = lat;

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn hash_f64<H: Hasher>(value: f64, state: &mut H) {
    // Canonicalize so all NaNs and both zeros hash alike.
    let bits = if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0
    } else {
        value.to_bits()
    };
    bits.hash(state);
}

fn hash_location<H: Hasher>(loc: &EarthLocation, state: &mut H) {
    hash_f64(loc.latitude, state);
    hash_f64(loc.longitude, state);
    hash_f64(loc.altitude, state);
}

fn hash_level<H: Hasher>(level: &Level, state: &mut H) {
    hash_f64(level.value, state);
    level.unit.hash(state);
}

impl Hash for CuttingPrimitive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Self::Point(loc) => hash_location(loc, state),
            Self::LineSegment { start, end } => {
                hash_location(start, state);
                hash_location(end, state);
            }
            Self::Level(level) => hash_level(level, state),
            Self::Polygon(vertices) => {
                vertices.len().hash(state);
                for v in vertices {
                    hash_location(v, state);
                }
            }
            Self::InitialArea { level, indices } => {
                if let Some(level) = level {
                    hash_level(level, state);
                }
                indices.hash(state);
            }
        }
    }
}
