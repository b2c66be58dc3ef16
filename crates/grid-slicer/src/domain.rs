//! Spatial domains: how grid indices map to physical coordinates.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use geo_common::{AxisOrder, Dimension, LinearAxis, Unit};
use projection::{haversine_km, normalize_longitude, HorizontalTransform};

use crate::error::{Result, SliceError};

/// The horizontal part of a grid domain.
///
/// Index `i` is the fastest varying axis of the sample buffer, `j` the next.
#[derive(Debug, Clone)]
pub enum HorizontalDomain {
    /// A regular lat/lon lattice. `order` says which axis is `i`.
    LatLon {
        lon: LinearAxis,
        lat: LinearAxis,
        order: AxisOrder,
        /// Unit the axis values are stored in
        unit: Unit,
    },
    /// A projected grid with an index <-> lat/lon transform.
    Projected { transform: Arc<dyn HorizontalTransform> },
    /// Explicit per-point coordinates, `i + nx * j` order.
    Curvilinear {
        nx: usize,
        ny: usize,
        lats: Vec<f64>,
        lons: Vec<f64>,
    },
}

impl HorizontalDomain {
    /// Shape `(nx, ny)` in storage order.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Self::LatLon {
                lon, lat, order, ..
            } => match order {
                AxisOrder::XY => (lon.len, lat.len),
                AxisOrder::LatLon => (lat.len, lon.len),
            },
            Self::Projected { transform } => transform.dimensions(),
            Self::Curvilinear { nx, ny, .. } => (*nx, *ny),
        }
    }

    pub fn size(&self) -> usize {
        let (nx, ny) = self.shape();
        nx * ny
    }

    /// Feed the coordinate definition into `state`.
    ///
    /// Projected domains contribute their name, shape and the reference
    /// coordinates of the corner points.
    pub fn digest<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::LatLon {
                lon,
                lat,
                order,
                unit,
            } => {
                for axis in [lon, lat] {
                    axis.first.to_bits().hash(state);
                    axis.step.to_bits().hash(state);
                    axis.len.hash(state);
                }
                order.hash(state);
                unit.hash(state);
            }
            Self::Projected { transform } => {
                transform.name().hash(state);
                let (nx, ny) = transform.dimensions();
                (nx, ny).hash(state);
                let (last_i, last_j) = (nx.saturating_sub(1) as f64, ny.saturating_sub(1) as f64);
                for (i, j) in [(0.0, 0.0), (last_i, 0.0), (0.0, last_j), (last_i, last_j)] {
                    let (x, y) = transform.to_reference(i, j);
                    x.to_bits().hash(state);
                    y.to_bits().hash(state);
                }
            }
            Self::Curvilinear { nx, ny, lats, lons } => {
                (nx, ny).hash(state);
                for v in lats.iter().chain(lons) {
                    v.to_bits().hash(state);
                }
            }
        }
    }

    /// Keep every `skip`-th point along both axes.
    pub fn subsample(&self, skip: usize) -> Self {
        if skip <= 1 {
            return self.clone();
        }
        match self {
            Self::LatLon {
                lon,
                lat,
                order,
                unit,
            } => Self::LatLon {
                lon: lon.subsample(skip),
                lat: lat.subsample(skip),
                order: *order,
                unit: *unit,
            },
            Self::Projected { transform } => Self::Projected {
                transform: Arc::new(SubsampledTransform::new(transform.clone(), skip)),
            },
            Self::Curvilinear { nx, ny, lats, lons } => {
                let new_nx = 1 + (nx.saturating_sub(1)) / skip;
                let new_ny = 1 + (ny.saturating_sub(1)) / skip;
                let mut sub_lats = Vec::with_capacity(new_nx * new_ny);
                let mut sub_lons = Vec::with_capacity(new_nx * new_ny);
                for j in (0..*ny).step_by(skip) {
                    for i in (0..*nx).step_by(skip) {
                        sub_lats.push(lats[i + nx * j]);
                        sub_lons.push(lons[i + nx * j]);
                    }
                }
                Self::Curvilinear {
                    nx: new_nx,
                    ny: new_ny,
                    lats: sub_lats,
                    lons: sub_lons,
                }
            }
        }
    }
}

/// A transform viewed through a coarser index space.
#[derive(Debug)]
pub struct SubsampledTransform {
    inner: Arc<dyn HorizontalTransform>,
    skip: usize,
    name: String,
}

impl SubsampledTransform {
    pub fn new(inner: Arc<dyn HorizontalTransform>, skip: usize) -> Self {
        let name = format!("{}/skip{}", inner.name(), skip);
        Self { inner, skip, name }
    }
}

impl HorizontalTransform for SubsampledTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn to_reference(&self, i: f64, j: f64) -> (f64, f64) {
        let s = self.skip as f64;
        self.inner.to_reference(i * s, j * s)
    }

    fn from_reference(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (i, j) = self.inner.from_reference(lat, lon);
        let s = self.skip as f64;
        (i / s, j / s)
    }

    fn dimensions(&self) -> (usize, usize) {
        let (nx, ny) = self.inner.dimensions();
        (
            1 + nx.saturating_sub(1) / self.skip,
            1 + ny.saturating_sub(1) / self.skip,
        )
    }
}

/// What a vertical coordinate measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerticalKind {
    Height,
    Pressure,
    /// Model levels, sigma, potential temperature and the like
    Generic,
}

/// Discrete vertical levels of a volume, in native (storage) order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct VerticalAxis {
    pub values: Vec<f64>,
    pub unit: Unit,
    pub kind: VerticalKind,
}

impl VerticalAxis {
    /// Vertical axis with the kind inferred from the unit's dimension.
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        let kind = match unit.dimension() {
            Dimension::Length => VerticalKind::Height,
            Dimension::Pressure => VerticalKind::Pressure,
            _ => VerticalKind::Generic,
        };
        Self { values, unit, kind }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(min, max)` of the level values.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied().filter(|v| !v.is_nan());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Index of a value equal to `value` within a relative tolerance.
    pub fn position(&self, value: f64, rel_tol: f64) -> Option<usize> {
        self.values.iter().position(|&v| {
            let scale = v.abs().max(value.abs()).max(1e-12);
            (v - value).abs() <= rel_tol * scale
        })
    }

    /// Index of the value closest to `value`.
    pub fn nearest(&self, value: f64) -> Option<usize> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nan())
            .min_by(|(_, a), (_, b)| {
                (*a - value)
                    .abs()
                    .partial_cmp(&(*b - value).abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(i, _)| i)
    }

    /// Indices `(lo, hi, weight_hi)` of the two levels bracketing `value`.
    pub fn bracket(&self, value: f64) -> Option<(usize, usize, f64)> {
        for k in 0..self.values.len().saturating_sub(1) {
            let (a, b) = (self.values[k], self.values[k + 1]);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            if value >= lo && value <= hi {
                if a == b {
                    return Some((k, k, 0.0));
                }
                return Some((k, k + 1, (value - a) / (b - a)));
            }
        }
        if self.values.len() == 1 && self.values[0] == value {
            return Some((0, 0, 0.0));
        }
        None
    }
}

/// A grid's index-to-physical coordinate mapping.
#[derive(Debug, Clone)]
pub struct SpatialDomain {
    pub horizontal: HorizontalDomain,
    pub vertical: Option<VerticalAxis>,
}

impl SpatialDomain {
    pub fn new(horizontal: HorizontalDomain, vertical: Option<VerticalAxis>) -> Result<Self> {
        let domain = Self {
            horizontal,
            vertical,
        };
        domain.validate()?;
        Ok(domain)
    }

    /// A regular lon-first lat/lon domain in degrees.
    pub fn lat_lon(lon: LinearAxis, lat: LinearAxis) -> Result<Self> {
        Self::new(
            HorizontalDomain::LatLon {
                lon,
                lat,
                order: AxisOrder::XY,
                unit: Unit::Degree,
            },
            None,
        )
    }

    pub fn with_vertical(mut self, vertical: VerticalAxis) -> Result<Self> {
        self.vertical = Some(vertical);
        self.validate()?;
        Ok(self)
    }

    /// Shape `(nx, ny, nz)`; `nz` is 1 for a 2-D domain.
    pub fn shape(&self) -> (usize, usize, usize) {
        let (nx, ny) = self.horizontal.shape();
        (nx, ny, self.levels())
    }

    /// Feed the horizontal and vertical coordinate definitions into `state`.
    pub fn digest<H: Hasher>(&self, state: &mut H) {
        self.horizontal.digest(state);
        if let Some(vertical) = &self.vertical {
            vertical.values.len().hash(state);
            for v in &vertical.values {
                v.to_bits().hash(state);
            }
            vertical.unit.hash(state);
            std::mem::discriminant(&vertical.kind).hash(state);
        }
    }

    pub fn levels(&self) -> usize {
        self.vertical.as_ref().map_or(1, |v| v.len())
    }

    pub fn size(&self) -> usize {
        let (nx, ny, nz) = self.shape();
        nx * ny * nz
    }

    /// Whether a coordinate transform (rather than a direct lattice)
    /// defines the horizontal coordinates.
    pub fn has_transform(&self) -> bool {
        matches!(self.horizontal, HorizontalDomain::Projected { .. })
    }

    /// Longitude range of the domain in degrees, when it is a lattice.
    ///
    /// `None` for projected domains, or when the axis unit is not an angle.
    pub fn longitude_range(&self) -> Option<(f64, f64)> {
        match &self.horizontal {
            HorizontalDomain::LatLon { lon, unit, .. } => {
                let low = unit.convert(lon.low(), Unit::Degree)?;
                let high = unit.convert(lon.high(), Unit::Degree)?;
                Some((low.min(high), low.max(high)))
            }
            HorizontalDomain::Curvilinear { lons, .. } => {
                let mut iter = lons.iter().copied().filter(|v| !v.is_nan());
                let first = iter.next()?;
                Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
            }
            HorizontalDomain::Projected { .. } => None,
        }
    }

    /// Approximate distance between adjacent grid points, in km.
    pub fn nominal_spacing_km(&self) -> f64 {
        let spacing = match &self.horizontal {
            HorizontalDomain::LatLon { lon, lat, unit, .. } => {
                let dlon = unit.convert(lon.step.abs(), Unit::Degree).unwrap_or(lon.step.abs());
                let dlat = unit.convert(lat.step.abs(), Unit::Degree).unwrap_or(lat.step.abs());
                let mid_lat = unit
                    .convert((lat.low() + lat.high()) / 2.0, Unit::Degree)
                    .unwrap_or(0.0);
                let km_per_deg = projection::EARTH_RADIUS_KM.to_radians();
                let x = dlon * km_per_deg * mid_lat.to_radians().cos();
                let y = dlat * km_per_deg;
                match (lon.len > 1, lat.len > 1) {
                    (true, true) => x.min(y),
                    (true, false) => x,
                    (false, true) => y,
                    (false, false) => 0.0,
                }
            }
            HorizontalDomain::Projected { transform } => {
                let (lat0, lon0) = transform.to_reference(0.0, 0.0);
                let (lat1, lon1) = transform.to_reference(1.0, 0.0);
                haversine_km(lat0, lon0, lat1, lon1)
            }
            HorizontalDomain::Curvilinear { nx, lats, lons, .. } => {
                if *nx > 1 {
                    haversine_km(lats[0], lons[0], lats[1], lons[1])
                } else if lats.len() > 1 {
                    haversine_km(lats[0], lons[0], lats[*nx], lons[*nx])
                } else {
                    0.0
                }
            }
        };
        if spacing.is_finite() && spacing > 0.0 {
            spacing
        } else {
            1.0
        }
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<()> {
        let (nx, ny) = self.horizontal.shape();
        if nx == 0 || ny == 0 {
            return Err(SliceError::malformed(format!(
                "horizontal shape {}x{} is empty",
                nx, ny
            )));
        }

        match &self.horizontal {
            HorizontalDomain::LatLon { lon, lat, .. } => {
                for (name, axis) in [("lon", lon), ("lat", lat)] {
                    if !axis.first.is_finite() || !axis.step.is_finite() {
                        return Err(SliceError::malformed(format!(
                            "{} axis has non-finite first/step",
                            name
                        )));
                    }
                    if axis.len > 1 && axis.step == 0.0 {
                        return Err(SliceError::malformed(format!("{} axis has zero step", name)));
                    }
                }
            }
            HorizontalDomain::Curvilinear { lats, lons, .. } => {
                if lats.len() != nx * ny || lons.len() != nx * ny {
                    return Err(SliceError::malformed(format!(
                        "curvilinear coordinates have {} lats and {} lons, expected {}",
                        lats.len(),
                        lons.len(),
                        nx * ny
                    )));
                }
            }
            HorizontalDomain::Projected { .. } => {}
        }

        if let Some(vertical) = &self.vertical {
            if vertical.is_empty() {
                return Err(SliceError::malformed("vertical axis has no levels"));
            }
            if vertical.values.iter().any(|v| !v.is_finite()) {
                return Err(SliceError::malformed("vertical axis has non-finite levels"));
            }
        }

        Ok(())
    }
}

/// Longitude difference folded into -180..180.
pub(crate) fn lon_delta(a: f64, b: f64) -> f64 {
    normalize_longitude(a - b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::LambertConformal;

    fn row_domain() -> SpatialDomain {
        SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 10), LinearAxis::new(45.0, 1.0, 1)).unwrap()
    }

    #[test]
    fn test_shape_follows_axis_order() {
        let lon = LinearAxis::new(0.0, 1.0, 10);
        let lat = LinearAxis::new(0.0, 1.0, 4);
        let xy = HorizontalDomain::LatLon {
            lon,
            lat,
            order: AxisOrder::XY,
            unit: Unit::Degree,
        };
        let latfirst = HorizontalDomain::LatLon {
            lon,
            lat,
            order: AxisOrder::LatLon,
            unit: Unit::Degree,
        };
        assert_eq!(xy.shape(), (10, 4));
        assert_eq!(latfirst.shape(), (4, 10));
    }

    #[test]
    fn test_validate_rejects_bad_curvilinear() {
        let horizontal = HorizontalDomain::Curvilinear {
            nx: 2,
            ny: 2,
            lats: vec![0.0; 3],
            lons: vec![0.0; 4],
        };
        assert!(matches!(
            SpatialDomain::new(horizontal, None),
            Err(SliceError::MalformedDomain(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_vertical() {
        let domain = row_domain();
        assert!(domain
            .with_vertical(VerticalAxis::new(vec![], Unit::Hectopascal))
            .is_err());
    }

    #[test]
    fn test_vertical_kind_inferred() {
        assert_eq!(
            VerticalAxis::new(vec![1000.0], Unit::Hectopascal).kind,
            VerticalKind::Pressure
        );
        assert_eq!(
            VerticalAxis::new(vec![0.0], Unit::Kilometer).kind,
            VerticalKind::Height
        );
        assert_eq!(
            VerticalAxis::new(vec![1.0], Unit::Dimensionless).kind,
            VerticalKind::Generic
        );
    }

    #[test]
    fn test_vertical_bracket_descending() {
        let axis = VerticalAxis::new(vec![1000.0, 850.0, 700.0], Unit::Hectopascal);
        let (lo, hi, w) = axis.bracket(925.0).unwrap();
        assert_eq!((lo, hi), (0, 1));
        assert!((w - 0.5).abs() < 1e-12);
        assert!(axis.bracket(1013.0).is_none());
        assert_eq!(axis.nearest(800.0), Some(1));
        assert_eq!(axis.position(850.0000001, 1e-6), Some(1));
    }

    #[test]
    fn test_longitude_range_in_degrees() {
        let domain = SpatialDomain::new(
            HorizontalDomain::LatLon {
                lon: LinearAxis::new(0.0, std::f64::consts::PI / 2.0, 3),
                lat: LinearAxis::new(0.0, 0.1, 2),
                order: AxisOrder::XY,
                unit: Unit::Radian,
            },
            None,
        )
        .unwrap();
        let (lo, hi) = domain.longitude_range().unwrap();
        assert!(lo.abs() < 1e-9);
        assert!((hi - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_subsampled_transform() {
        let lambert = Arc::new(LambertConformal::hrrr().unwrap());
        let sub = SubsampledTransform::new(lambert.clone(), 3);
        assert_eq!(sub.dimensions(), (600, 353));
        let (lat, lon) = sub.to_reference(10.0, 20.0);
        let expected = lambert.to_reference(30.0, 60.0);
        assert_eq!((lat, lon), expected);
    }

    #[test]
    fn test_nominal_spacing() {
        let spacing = row_domain().nominal_spacing_km();
        // one degree of longitude at 45N
        assert!((spacing - 78.6).abs() < 0.5, "got {}", spacing);
    }
}
