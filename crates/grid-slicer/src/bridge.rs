//! Mapping between grid index space, earth space and the display box.
//!
//! ```text
//!   grid index (i, j, k)  --grid_index_to_earth-->  EarthLocation
//!          ^                                            |
//!          +------------earth_to_grid-------------------+
//!                                                       |
//!                                   DisplayProjection::earth_to_box
//!                                                       v
//!                                         BoxCoord in [-1, 1]^3
//! ```

use geo_common::{AxisOrder, BoundingBox, EarthLocation, Unit};
use projection::{haversine_km, normalize_against_domain, pressure_to_height};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{lon_delta, HorizontalDomain, SpatialDomain, VerticalKind};
use crate::error::{Result, SliceError};
use crate::types::{Checked, Condition};

/// Integer grid index. `k` is the level, when one is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub i: usize,
    pub j: usize,
    pub k: Option<usize>,
}

impl GridIndex {
    pub fn new(i: usize, j: usize) -> Self {
        Self { i, j, k: None }
    }

    pub fn at_level(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k: Some(k) }
    }
}

/// A point in the display's normalized box, conventionally [-1, 1] per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCoord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// The active display's earth <-> box mapping.
pub trait DisplayProjection: Send + Sync {
    fn earth_to_box(&self, location: &EarthLocation) -> BoxCoord;

    fn box_to_earth(&self, coord: &BoxCoord) -> EarthLocation;
}

/// Linear mapping of a lat/lon box and an altitude range onto [-1, 1]^3.
///
/// A location without altitude maps to the floor of the box.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearDisplayProjection {
    pub bbox: BoundingBox,
    /// `(bottom, top)` in meters
    pub altitude_range: (f64, f64),
}

impl LinearDisplayProjection {
    pub fn new(bbox: BoundingBox, altitude_range: (f64, f64)) -> Self {
        Self {
            bbox,
            altitude_range,
        }
    }
}

fn to_unit_box(value: f64, low: f64, high: f64) -> f64 {
    let span = high - low;
    if span == 0.0 {
        return 0.0;
    }
    -1.0 + 2.0 * (value - low) / span
}

fn from_unit_box(value: f64, low: f64, high: f64) -> f64 {
    low + (value + 1.0) / 2.0 * (high - low)
}

impl DisplayProjection for LinearDisplayProjection {
    fn earth_to_box(&self, location: &EarthLocation) -> BoxCoord {
        let (bottom, top) = self.altitude_range;
        BoxCoord {
            x: to_unit_box(location.longitude, self.bbox.min_lon, self.bbox.max_lon),
            y: to_unit_box(location.latitude, self.bbox.min_lat, self.bbox.max_lat),
            z: if location.has_altitude() {
                to_unit_box(location.altitude, bottom, top)
            } else {
                -1.0
            },
        }
    }

    fn box_to_earth(&self, coord: &BoxCoord) -> EarthLocation {
        let (bottom, top) = self.altitude_range;
        EarthLocation::new(
            from_unit_box(coord.y, self.bbox.min_lat, self.bbox.max_lat),
            from_unit_box(coord.x, self.bbox.min_lon, self.bbox.max_lon),
            from_unit_box(coord.z, bottom, top),
        )
    }
}

/// Earth location to display box through the active projection.
pub fn earth_to_display_box(projection: &dyn DisplayProjection, location: &EarthLocation) -> BoxCoord {
    projection.earth_to_box(location)
}

/// Coordinate conversions for one spatial domain.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateBridge<'a> {
    domain: &'a SpatialDomain,
}

impl<'a> CoordinateBridge<'a> {
    pub fn new(domain: &'a SpatialDomain) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> &SpatialDomain {
        self.domain
    }

    /// Earth location of a grid index.
    ///
    /// Every addressed axis is bounds checked; an out-of-range index is an
    /// error and is never clamped. Altitude comes from the vertical axis when
    /// `k` is given: heights convert to meters, pressures go through the
    /// standard atmosphere, and other coordinates pass through unconverted
    /// with a condition.
    pub fn grid_index_to_earth(&self, index: GridIndex) -> Result<Checked<EarthLocation>> {
        let (nx, ny, nz) = self.domain.shape();
        if index.i >= nx {
            return Err(SliceError::invalid_index("x", index.i, nx));
        }
        if index.j >= ny {
            return Err(SliceError::invalid_index("y", index.j, ny));
        }
        if let Some(k) = index.k {
            if k >= nz {
                return Err(SliceError::invalid_index("z", k, nz));
            }
        }

        let mut checked = Checked::new(());
        let (lat, lon) = checked.absorb(self.horizontal_to_earth(index.i as f64, index.j as f64));

        let altitude = match (index.k, &self.domain.vertical) {
            (Some(k), Some(axis)) => {
                let value = axis.values[k];
                match axis.kind {
                    VerticalKind::Height => axis.unit.convert(value, Unit::Meter).unwrap_or(value),
                    VerticalKind::Pressure => axis
                        .unit
                        .convert(value, Unit::Hectopascal)
                        .map(pressure_to_height)
                        .unwrap_or(value),
                    VerticalKind::Generic => {
                        warn!(unit = %axis.unit, "Vertical coordinate has no height mapping, passing through");
                        checked.push(Condition::unit_conversion(axis.unit, Unit::Meter));
                        value
                    }
                }
            }
            _ => f64::NAN,
        };

        Ok(checked.map(|_| EarthLocation::new(lat, lon, altitude)))
    }

    /// `(lat, lon)` in degrees at a fractional horizontal index.
    ///
    /// Curvilinear domains round to the nearest stored point. Not bounds
    /// checked beyond that; callers that need errors use
    /// [`Self::grid_index_to_earth`].
    pub fn horizontal_to_earth(&self, fi: f64, fj: f64) -> Checked<(f64, f64)> {
        match &self.domain.horizontal {
            HorizontalDomain::LatLon {
                lon,
                lat,
                order,
                unit,
            } => {
                let (lon_idx, lat_idx) = match order {
                    AxisOrder::XY => (fi, fj),
                    AxisOrder::LatLon => (fj, fi),
                };
                let lon_v = lon.value_at_fraction(lon_idx);
                let lat_v = lat.value_at_fraction(lat_idx);
                match (unit.convert(lat_v, Unit::Degree), unit.convert(lon_v, Unit::Degree)) {
                    (Some(lat_d), Some(lon_d)) => Checked::new((lat_d, lon_d)),
                    _ => {
                        warn!(unit = %unit, "Horizontal axis unit is not an angle, passing through");
                        Checked::new((lat_v, lon_v))
                            .with_condition(Condition::unit_conversion(*unit, Unit::Degree))
                    }
                }
            }
            HorizontalDomain::Projected { transform } => Checked::new(transform.to_reference(fi, fj)),
            HorizontalDomain::Curvilinear { nx, ny, lats, lons } => {
                let (i, j) = (fi.round(), fj.round());
                if i < 0.0 || j < 0.0 || i >= *nx as f64 || j >= *ny as f64 {
                    return Checked::new((f64::NAN, f64::NAN));
                }
                let idx = i as usize + nx * j as usize;
                Checked::new((lats[idx], lons[idx]))
            }
        }
    }

    /// Fractional horizontal index of an earth location.
    ///
    /// `None` when the location lies more than half a cell outside the grid.
    /// Longitude is first brought into the domain's native range.
    pub fn earth_to_grid(&self, location: &EarthLocation) -> Checked<Option<(f64, f64)>> {
        if location.is_missing() {
            return Checked::new(None);
        }
        let (nx, ny) = self.domain.horizontal.shape();

        let mut checked = Checked::new(());
        let index = match &self.domain.horizontal {
            HorizontalDomain::LatLon {
                lon,
                lat,
                order,
                unit,
            } => {
                let lon_deg = self.normalize_longitude(location.longitude);
                let (lon_v, lat_v) = match (
                    Unit::Degree.convert(lon_deg, *unit),
                    Unit::Degree.convert(location.latitude, *unit),
                ) {
                    (Some(x), Some(y)) => (x, y),
                    _ => {
                        checked.push(Condition::unit_conversion(Unit::Degree, *unit));
                        (lon_deg, location.latitude)
                    }
                };
                let lon_idx = lon.fractional_index(lon_v);
                let lat_idx = if lat.len > 1 {
                    lat.fractional_index(lat_v)
                } else {
                    // A single latitude row accepts points within half a step
                    // of it, using the longitude step as the cell size.
                    let cell = if lon.step != 0.0 { lon.step.abs() } else { 1.0 };
                    (lat_v - lat.first) / cell
                };
                match order {
                    AxisOrder::XY => (lon_idx, lat_idx),
                    AxisOrder::LatLon => (lat_idx, lon_idx),
                }
            }
            HorizontalDomain::Projected { transform } => {
                transform.from_reference(location.latitude, location.longitude)
            }
            HorizontalDomain::Curvilinear { nx, ny, lats, lons } => {
                match nearest_curvilinear(*nx, *ny, lats, lons, location) {
                    Some(idx) => idx,
                    None => return checked.map(|_| None),
                }
            }
        };

        let (fi, fj) = index;
        let inside = fi.is_finite()
            && fj.is_finite()
            && fi >= -0.5
            && fj >= -0.5
            && fi <= nx as f64 - 0.5
            && fj <= ny as f64 - 0.5;
        if !inside {
            debug!(lat = location.latitude, lon = location.longitude, "Location outside grid");
        }
        checked.map(|_| inside.then_some((fi, fj)))
    }

    /// Nearest integer grid index of an earth location.
    pub fn earth_to_grid_index(&self, location: &EarthLocation) -> Checked<Option<GridIndex>> {
        let (nx, ny) = self.domain.horizontal.shape();
        self.earth_to_grid(location).map(|idx| {
            idx.map(|(fi, fj)| {
                let i = (fi.round().max(0.0) as usize).min(nx - 1);
                let j = (fj.round().max(0.0) as usize).min(ny - 1);
                GridIndex::new(i, j)
            })
        })
    }

    /// Bring a longitude (degrees) into the domain's native longitude range.
    ///
    /// Domains defined through a coordinate transform handle longitude
    /// themselves, so the value is returned unchanged for them.
    pub fn normalize_longitude(&self, lon: f64) -> f64 {
        match self.domain.longitude_range() {
            Some((low, high)) if !self.domain.has_transform() => normalize_against_domain(lon, low, high),
            _ => lon,
        }
    }

    /// Display box coordinate of a grid index.
    pub fn grid_index_to_display(
        &self,
        projection: &dyn DisplayProjection,
        index: GridIndex,
    ) -> Result<Checked<BoxCoord>> {
        let earth = self.grid_index_to_earth(index)?;
        Ok(earth.map(|loc| {
            let loc = loc.with_longitude(self.normalize_longitude(loc.longitude));
            projection.earth_to_box(&loc)
        }))
    }
}

/// Nearest stored point of a curvilinear grid, accepted when it is within
/// one neighbor spacing of the location.
fn nearest_curvilinear(
    nx: usize,
    ny: usize,
    lats: &[f64],
    lons: &[f64],
    location: &EarthLocation,
) -> Option<(f64, f64)> {
    let distance = |idx: usize| {
        let dlon = lon_delta(lons[idx], location.longitude);
        haversine_km(location.latitude, 0.0, lats[idx], dlon)
    };

    let (best, best_km) = (0..lats.len())
        .filter(|&idx| !lats[idx].is_nan() && !lons[idx].is_nan())
        .map(|idx| (idx, distance(idx)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))?;

    let (i, j) = (best % nx, best / nx);
    let neighbors = [
        (i.checked_sub(1), Some(j)),
        (Some(i + 1).filter(|&v| v < nx), Some(j)),
        (Some(i), j.checked_sub(1)),
        (Some(i), Some(j + 1).filter(|&v| v < ny)),
    ];
    let spacing = neighbors
        .iter()
        .filter_map(|&(ni, nj)| Some(ni? + nx * nj?))
        .map(|n| haversine_km(lats[best], lons[best], lats[n], lons[n]))
        .filter(|d| d.is_finite())
        .fold(0.0f64, f64::max);

    if spacing > 0.0 && best_km > spacing {
        return None;
    }
    Some((i as f64, j as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VerticalAxis;
    use geo_common::LinearAxis;
    use std::sync::Arc;
    use projection::LambertConformal;

    fn conus() -> SpatialDomain {
        SpatialDomain::lat_lon(LinearAxis::new(230.0, 1.0, 70), LinearAxis::new(20.0, 1.0, 35)).unwrap()
    }

    #[test]
    fn test_index_to_earth() {
        let domain = conus();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::new(10, 5)).unwrap();
        assert!(loc.is_clean());
        assert_eq!(loc.value.latitude, 25.0);
        assert_eq!(loc.value.longitude, 240.0);
        assert!(!loc.value.has_altitude());
    }

    #[test]
    fn test_index_out_of_bounds() {
        let domain = conus();
        let bridge = CoordinateBridge::new(&domain);
        assert!(matches!(
            bridge.grid_index_to_earth(GridIndex::new(70, 0)),
            Err(SliceError::InvalidIndex { axis: "x", index: 70, len: 70 })
        ));
        assert!(matches!(
            bridge.grid_index_to_earth(GridIndex::new(0, 35)),
            Err(SliceError::InvalidIndex { axis: "y", .. })
        ));
        assert!(matches!(
            bridge.grid_index_to_earth(GridIndex::at_level(0, 0, 1)),
            Err(SliceError::InvalidIndex { axis: "z", index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_pressure_level_altitude() {
        let domain = conus()
            .with_vertical(VerticalAxis::new(vec![1000.0, 500.0], Unit::Hectopascal))
            .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::at_level(0, 0, 1)).unwrap().value;
        assert!((loc.altitude - 5574.0).abs() < 5.0);
    }

    #[test]
    fn test_generic_level_passes_through() {
        let domain = conus()
            .with_vertical(VerticalAxis::new(vec![0.995, 0.9], Unit::Dimensionless))
            .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::at_level(0, 0, 1)).unwrap();
        assert_eq!(loc.value.altitude, 0.9);
        assert!(matches!(loc.conditions[0], Condition::UnitConversion { .. }));
    }

    #[test]
    fn test_lat_first_order() {
        let domain = SpatialDomain::new(
            HorizontalDomain::LatLon {
                lon: LinearAxis::new(0.0, 1.0, 10),
                lat: LinearAxis::new(40.0, 1.0, 4),
                order: AxisOrder::LatLon,
                unit: Unit::Degree,
            },
            None,
        )
        .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::new(2, 7)).unwrap().value;
        assert_eq!((loc.latitude, loc.longitude), (42.0, 7.0));

        let idx = bridge
            .earth_to_grid_index(&EarthLocation::surface(42.0, 7.0))
            .value
            .unwrap();
        assert_eq!(idx, GridIndex::new(2, 7));
    }

    #[test]
    fn test_earth_to_grid_normalizes_longitude() {
        let domain = conus();
        let bridge = CoordinateBridge::new(&domain);
        let idx = bridge.earth_to_grid(&EarthLocation::surface(25.0, -120.0)).value.unwrap();
        assert!((idx.0 - 10.0).abs() < 1e-9);
        assert!((idx.1 - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_earth_to_grid_off_grid() {
        let domain = conus();
        let bridge = CoordinateBridge::new(&domain);
        assert!(bridge.earth_to_grid(&EarthLocation::surface(10.0, 240.0)).value.is_none());
        assert!(bridge.earth_to_grid(&EarthLocation::surface(19.6, 240.0)).value.is_some());
    }

    #[test]
    fn test_radian_domain_converts() {
        let step = 1f64.to_radians();
        let domain = SpatialDomain::new(
            HorizontalDomain::LatLon {
                lon: LinearAxis::new(0.0, step, 10),
                lat: LinearAxis::new(0.0, step, 10),
                order: AxisOrder::XY,
                unit: Unit::Radian,
            },
            None,
        )
        .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::new(3, 4)).unwrap().value;
        assert!((loc.longitude - 3.0).abs() < 1e-9);
        assert!((loc.latitude - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_angle_unit_passes_through_with_condition() {
        let domain = SpatialDomain::new(
            HorizontalDomain::LatLon {
                lon: LinearAxis::new(0.0, 1000.0, 5),
                lat: LinearAxis::new(0.0, 1000.0, 5),
                order: AxisOrder::XY,
                unit: Unit::Meter,
            },
            None,
        )
        .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        let loc = bridge.grid_index_to_earth(GridIndex::new(1, 2)).unwrap();
        assert_eq!(loc.value.longitude, 1000.0);
        assert_eq!(loc.value.latitude, 2000.0);
        assert!(!loc.is_clean());
    }

    #[test]
    fn test_projected_round_trip() {
        let domain = SpatialDomain::new(
            HorizontalDomain::Projected {
                transform: Arc::new(LambertConformal::hrrr().unwrap()),
            },
            None,
        )
        .unwrap();
        let bridge = CoordinateBridge::new(&domain);
        for (i, j) in [(0, 0), (900, 530), (1798, 1058)] {
            let loc = bridge.grid_index_to_earth(GridIndex::new(i, j)).unwrap().value;
            let back = bridge.earth_to_grid_index(&loc).value.unwrap();
            assert_eq!(back, GridIndex::new(i, j));
        }
    }

    #[test]
    fn test_curvilinear_nearest() {
        let (nx, ny) = (4, 3);
        let mut lats = Vec::new();
        let mut lons = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                lats.push(30.0 + j as f64 * 0.5);
                lons.push(-100.0 + i as f64 * 0.5 + j as f64 * 0.1);
            }
        }
        let domain = SpatialDomain::new(HorizontalDomain::Curvilinear { nx, ny, lats, lons }, None).unwrap();
        let bridge = CoordinateBridge::new(&domain);

        let loc = bridge.grid_index_to_earth(GridIndex::new(2, 1)).unwrap().value;
        assert!((loc.latitude - 30.5).abs() < 1e-9);
        assert!((loc.longitude + 98.9).abs() < 1e-9);
        let idx = bridge.earth_to_grid_index(&loc).value.unwrap();
        assert_eq!(idx, GridIndex::new(2, 1));

        assert!(bridge
            .earth_to_grid(&EarthLocation::surface(45.0, -100.0))
            .value
            .is_none());
    }

    #[test]
    fn test_linear_display_projection() {
        let projection =
            LinearDisplayProjection::new(BoundingBox::new(-100.0, 30.0, -80.0, 50.0), (0.0, 16000.0));
        let b = projection.earth_to_box(&EarthLocation::new(40.0, -90.0, 8000.0));
        assert_eq!((b.x, b.y, b.z), (0.0, 0.0, 0.0));

        let floor = projection.earth_to_box(&EarthLocation::surface(30.0, -100.0));
        assert_eq!((floor.x, floor.y, floor.z), (-1.0, -1.0, -1.0));

        let back = projection.box_to_earth(&BoxCoord { x: 1.0, y: 1.0, z: 1.0 });
        assert_eq!((back.latitude, back.longitude, back.altitude), (50.0, -80.0, 16000.0));
    }

    #[test]
    fn test_grid_index_to_display_normalizes() {
        let domain = conus();
        let bridge = CoordinateBridge::new(&domain);
        let projection = LinearDisplayProjection::new(BoundingBox::new(230.0, 20.0, 299.0, 54.0), (0.0, 1.0));
        let b = bridge
            .grid_index_to_display(&projection, GridIndex::new(0, 0))
            .unwrap()
            .value;
        assert_eq!((b.x, b.y), (-1.0, -1.0));
    }
}
