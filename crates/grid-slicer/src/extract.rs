//! Slice extraction: cutting a field with a primitive.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use geo_common::{EarthLocation, Unit};
use projection::{great_circle_path, haversine_km};
use tracing::{debug, warn};

use crate::bridge::{CoordinateBridge, GridIndex};
use crate::config::SlicerConfig;
use crate::domain::VerticalAxis;
use crate::error::{Result, SliceError};
use crate::field::GriddedField;
use crate::levels::{level_for_altitude, Level, LEVEL_REL_TOLERANCE};
use crate::primitive::{point_in_polygon, CuttingPrimitive};
use crate::sampling::{lerp_levels, sample_layer};
use crate::slice::{ProbeSample, Slice, SliceGeometry, SliceResult};
use crate::transect::TransectAxisBuilder;
use crate::types::{Checked, Condition, SamplingMode};

/// Endpoints closer than this (meters) are the same point when either is
/// off the grid.
const DEGENERATE_DISTANCE_M: f64 = 1.0;

/// Content key of an extraction.
pub fn slice_fingerprint(field: &GriddedField, primitive: &CuttingPrimitive, mode: SamplingMode) -> u64 {
    let mut hasher = DefaultHasher::new();
    field.fingerprint().hash(&mut hasher);
    primitive.hash(&mut hasher);
    mode.hash(&mut hasher);
    hasher.finish()
}

/// Produces slices from fields.
///
/// Holds only configuration; every call is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct SliceExtractor {
    max_line_samples: usize,
    degenerate_tolerance: f64,
    distance_unit: Unit,
}

impl Default for SliceExtractor {
    fn default() -> Self {
        let config = SlicerConfig::default();
        Self {
            max_line_samples: config.max_line_samples,
            degenerate_tolerance: config.degenerate_tolerance,
            distance_unit: Unit::Kilometer,
        }
    }
}

impl SliceExtractor {
    /// Extractor for `config`. An unusable distance unit falls back to km.
    pub fn new(config: &SlicerConfig) -> Checked<Self> {
        config.distance_unit().map(|distance_unit| Self {
            max_line_samples: config.max_line_samples.max(2),
            degenerate_tolerance: config.degenerate_tolerance,
            distance_unit,
        })
    }

    pub fn distance_unit(&self) -> Unit {
        self.distance_unit
    }

    /// Extract the subset of `field` described by `primitive`.
    ///
    /// `previous` is the caller's current slice, returned unchanged when the
    /// primitive turns out to be degenerate.
    pub fn extract(
        &self,
        field: &GriddedField,
        primitive: &CuttingPrimitive,
        mode: SamplingMode,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        match primitive {
            CuttingPrimitive::LineSegment { start, end } => {
                self.slice_along_line(field, start, end, mode, previous)
            }
            CuttingPrimitive::Level(level) => self.slice_at_level(field, level, mode),
            CuttingPrimitive::Point(location) => {
                let probe = self.slice_at_point(field, location, mode)?;
                let fingerprint = slice_fingerprint(field, primitive, mode);
                Ok(probe.map(|p| probe_to_result(field, fingerprint, mode, p)))
            }
            CuttingPrimitive::Polygon(vertices) => self.slice_in_polygon(field, vertices, mode, previous),
            CuttingPrimitive::InitialArea { level, indices } => {
                self.slice_initial_area(field, level.as_ref(), indices, mode, previous)
            }
        }
    }

    /// Cross-section along the great circle from `start` to `end`.
    ///
    /// Columns are samples along the path, rows are the field's levels.
    /// Endpoints that coincide within the degenerate tolerance make this a
    /// no-op: the result is `Retained(previous)` with a degenerate-geometry
    /// condition.
    pub fn slice_along_line(
        &self,
        field: &GriddedField,
        start: &EarthLocation,
        end: &EarthLocation,
        mode: SamplingMode,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        let bridge = CoordinateBridge::new(&field.domain);
        let mut checked = Checked::new(());

        if start.is_missing() || end.is_missing() {
            return Ok(retain(field, previous, "line endpoint is missing"));
        }

        let start_idx = checked.absorb(bridge.earth_to_grid(start));
        let end_idx = checked.absorb(bridge.earth_to_grid(end));
        let separation_km = haversine_km(start.latitude, start.longitude, end.latitude, end.longitude);

        let cells = match (start_idx, end_idx) {
            (Some(a), Some(b)) => {
                let cells = (b.0 - a.0).abs().max((b.1 - a.1).abs());
                if cells < self.degenerate_tolerance {
                    return Ok(retain(field, previous, "line endpoints coincide"));
                }
                cells
            }
            _ => {
                if separation_km * 1000.0 < DEGENERATE_DISTANCE_M {
                    return Ok(retain(field, previous, "line endpoints coincide"));
                }
                separation_km / field.domain.nominal_spacing_km()
            }
        };

        let samples = ((cells.ceil() as usize).saturating_add(1)).clamp(2, self.max_line_samples);
        let points = great_circle_path(
            (start.latitude, start.longitude),
            (end.latitude, end.longitude),
            samples,
        );

        let builder = checked.absorb(TransectAxisBuilder::new(self.distance_unit));
        let axis = builder.build(&points);

        let indices: Vec<Option<(f64, f64)>> = points
            .iter()
            .map(|&(lat, lon)| checked.absorb(bridge.earth_to_grid(&EarthLocation::surface(lat, lon))))
            .collect();

        let (nx, ny, nz) = field.shape();
        let steps = field.time_steps();
        let mut values = Vec::with_capacity(samples * nz * steps);
        for t in 0..steps {
            for k in 0..nz {
                let layer = field.layer(k, t)?;
                for idx in &indices {
                    values.push(match idx {
                        Some((fi, fj)) => sample_layer(layer, nx, ny, *fi, *fj, mode),
                        None => f32::NAN,
                    });
                }
            }
        }

        let primitive = CuttingPrimitive::line(*start, *end);
        let slice = Slice {
            fingerprint: slice_fingerprint(field, &primitive, mode),
            field_id: field.id.clone(),
            unit: field.unit.clone(),
            mode,
            geometry: SliceGeometry::Transect {
                axis,
                positions: points,
                levels: field.vertical().cloned(),
            },
            times: field.times.clone(),
            columns: samples,
            rows: nz,
            values,
        };

        debug!(field = %field.id, samples, rows = nz, "Extracted cross-section");
        Ok(checked.map(|_| ready_or_missing(field, slice)))
    }

    /// Plan view at a vertical level.
    ///
    /// A level present in the field is extracted as is. A level between
    /// native levels takes the nearest layer and reports nearest-neighbor
    /// sampling, whatever `mode` was requested. A level outside the field's
    /// range is missing. 2-D fields return their only layer.
    pub fn slice_at_level(
        &self,
        field: &GriddedField,
        level: &Level,
        mode: SamplingMode,
    ) -> Result<Checked<SliceResult>> {
        let mut checked = Checked::new(());
        let primitive = CuttingPrimitive::Level(*level);

        let (k, used_mode, native_level) = match field.vertical() {
            None => (0, mode, None),
            Some(axis) => {
                let value = match level.convert_to(axis.unit) {
                    Some(l) => l.value,
                    None => {
                        warn!(field = %field.id, level = %level, axis_unit = %axis.unit, "Level unit incompatible with vertical axis");
                        checked.push(Condition::unit_conversion(level.unit, axis.unit));
                        level.value
                    }
                };

                match pick_layer(axis, value) {
                    Some((k, exact)) => {
                        let used = if exact {
                            mode
                        } else {
                            debug!(field = %field.id, level = %level, nearest = axis.values[k], "Level not native, using nearest layer");
                            SamplingMode::NearestNeighbor
                        };
                        (k, used, Some(Level::new(axis.values[k], axis.unit)))
                    }
                    None => {
                        debug!(field = %field.id, level = %level, "Level outside vertical range");
                        checked.push(Condition::MissingData);
                        return Ok(checked.map(|_| SliceResult::Missing));
                    }
                }
            }
        };

        let (nx, ny, _) = field.shape();
        let steps = field.time_steps();
        let mut values = Vec::with_capacity(nx * ny * steps);
        for t in 0..steps {
            values.extend_from_slice(field.layer(k, t)?);
        }

        let slice = Slice {
            fingerprint: slice_fingerprint(field, &primitive, mode),
            field_id: field.id.clone(),
            unit: field.unit.clone(),
            mode: used_mode,
            geometry: SliceGeometry::Plane {
                horizontal: field.domain.horizontal.clone(),
                level: native_level,
            },
            times: field.times.clone(),
            columns: nx,
            rows: ny,
            values,
        };

        Ok(checked.map(|_| ready_or_missing(field, slice)))
    }

    /// Values of `field` at one location, one entry per time step.
    ///
    /// For a volume, a location with altitude selects a level (nearest, or
    /// interpolated between the bracketing levels for weighted sampling);
    /// without altitude the whole column is returned.
    pub fn slice_at_point(
        &self,
        field: &GriddedField,
        location: &EarthLocation,
        mode: SamplingMode,
    ) -> Result<Checked<ProbeSample>> {
        let bridge = CoordinateBridge::new(&field.domain);
        let mut checked = Checked::new(());
        let (nx, ny, nz) = field.shape();
        let steps = field.time_steps();

        let index = checked.absorb(bridge.earth_to_grid(location));

        // Which levels to read, and how to combine them.
        enum Vertical {
            Single(usize),
            Column,
            Between(usize, usize, f64),
            OutOfRange,
        }

        let vertical = match field.vertical() {
            None => Vertical::Single(0),
            Some(_) if !location.has_altitude() => Vertical::Column,
            Some(axis) => {
                let level = checked.absorb(level_for_altitude(field, location.altitude));
                match level {
                    None => Vertical::Column,
                    Some(level) => match mode {
                        SamplingMode::NearestNeighbor => match pick_layer(axis, level.value) {
                            Some((k, _)) => Vertical::Single(k),
                            None => Vertical::OutOfRange,
                        },
                        SamplingMode::WeightedAverage => match axis.bracket(level.value) {
                            Some((lo, hi, w)) => Vertical::Between(lo, hi, w),
                            None => Vertical::OutOfRange,
                        },
                    },
                }
            }
        };

        let per_step = if matches!(vertical, Vertical::Column) { nz } else { 1 };
        let mut values = Vec::with_capacity(per_step * steps);

        for t in 0..steps {
            let at = |k: usize| -> Result<f32> {
                Ok(match index {
                    Some((fi, fj)) => sample_layer(field.layer(k, t)?, nx, ny, fi, fj, mode),
                    None => f32::NAN,
                })
            };
            match vertical {
                Vertical::Single(k) => values.push(at(k)?),
                Vertical::Column => {
                    for k in 0..nz {
                        values.push(at(k)?);
                    }
                }
                Vertical::Between(lo, hi, w) => values.push(lerp_levels(at(lo)?, at(hi)?, w)),
                Vertical::OutOfRange => values.push(f32::NAN),
            }
        }

        let levels: Option<VerticalAxis> = match vertical {
            Vertical::Column => field.vertical().cloned(),
            _ => None,
        };

        let probe = ProbeSample {
            location: *location,
            times: field.times.clone(),
            levels,
            values,
        };
        if probe.is_all_missing() {
            debug!(field = %field.id, lat = location.latitude, lon = location.longitude, "Probe found no data");
            checked.push(Condition::MissingData);
        }
        Ok(checked.map(|_| probe))
    }

    /// Grid points inside a polygon, all levels.
    fn slice_in_polygon(
        &self,
        field: &GriddedField,
        vertices: &[EarthLocation],
        mode: SamplingMode,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        let usable: Vec<EarthLocation> = vertices.iter().filter(|v| !v.is_missing()).copied().collect();
        if usable.len() < 3 {
            return Ok(retain(field, previous, "polygon has fewer than 3 vertices"));
        }

        let bridge = CoordinateBridge::new(&field.domain);
        let (nx, ny, _) = field.shape();
        let mut checked = Checked::new(());
        let mut cells = Vec::new();
        for j in 0..ny {
            for i in 0..nx {
                let loc = checked.absorb(bridge.grid_index_to_earth(GridIndex::new(i, j))?);
                if point_in_polygon(loc.latitude, loc.longitude, &usable) {
                    cells.push((i, j));
                }
            }
        }

        if cells.is_empty() {
            return Ok(retain(field, previous, "polygon encloses no grid points"));
        }

        let primitive = CuttingPrimitive::Polygon(usable);
        let fingerprint = slice_fingerprint(field, &primitive, mode);
        let levels: Vec<usize> = (0..field.domain.levels()).collect();
        let slice = checked.absorb(scattered(field, fingerprint, mode, &cells, &levels)?);
        Ok(checked.map(|_| ready_or_missing(field, slice)))
    }

    /// Explicit grid indices, at one level or all of them.
    fn slice_initial_area(
        &self,
        field: &GriddedField,
        level: Option<&Level>,
        indices: &[(usize, usize)],
        mode: SamplingMode,
        previous: Option<&Slice>,
    ) -> Result<Checked<SliceResult>> {
        if indices.is_empty() {
            return Ok(retain(field, previous, "initial area has no points"));
        }

        let (nx, ny, nz) = field.shape();
        for &(i, j) in indices {
            if i >= nx {
                return Err(SliceError::invalid_index("x", i, nx));
            }
            if j >= ny {
                return Err(SliceError::invalid_index("y", j, ny));
            }
        }

        let mut checked = Checked::new(());
        let levels: Vec<usize> = match (level, field.vertical()) {
            (Some(level), Some(axis)) => {
                let value = match level.convert_to(axis.unit) {
                    Some(l) => l.value,
                    None => {
                        checked.push(Condition::unit_conversion(level.unit, axis.unit));
                        level.value
                    }
                };
                match pick_layer(axis, value) {
                    Some((k, _)) => vec![k],
                    None => {
                        checked.push(Condition::MissingData);
                        return Ok(checked.map(|_| SliceResult::Missing));
                    }
                }
            }
            (None, Some(_)) => (0..nz).collect(),
            (_, None) => vec![0],
        };

        let primitive = CuttingPrimitive::InitialArea {
            level: level.copied(),
            indices: indices.to_vec(),
        };
        let fingerprint = slice_fingerprint(field, &primitive, mode);
        let slice = checked.absorb(scattered(field, fingerprint, mode, indices, &levels)?);
        Ok(checked.map(|_| ready_or_missing(field, slice)))
    }
}

/// Default cross-section endpoints for a field.
///
/// Scans rows outward from the center row. On each row, walks inward from
/// the west and east edges to the first non-missing samples of the first
/// layer; the first row where those differ gives the endpoints. A field with
/// no such row yields `None` and a degenerate-geometry condition.
pub fn default_transect(field: &GriddedField) -> Result<Checked<Option<(EarthLocation, EarthLocation)>>> {
    let (nx, ny, _) = field.shape();
    let layer = field.layer(0, 0)?;
    let bridge = CoordinateBridge::new(&field.domain);

    let center = ny / 2;
    let rows = (0..ny).map(|d| {
        // center, center+1, center-1, center+2, ...
        let offset = d.div_ceil(2);
        if d % 2 == 1 {
            center + offset
        } else {
            center.wrapping_sub(offset)
        }
    });

    for j in rows.filter(|&j| j < ny) {
        let row = &layer[j * nx..(j + 1) * nx];
        let west = row.iter().position(|v| !v.is_nan());
        let east = row.iter().rposition(|v| !v.is_nan());
        if let (Some(w), Some(e)) = (west, east) {
            if w < e {
                let mut checked = Checked::new(());
                let start = checked.absorb(bridge.grid_index_to_earth(GridIndex::new(w, j))?);
                let end = checked.absorb(bridge.grid_index_to_earth(GridIndex::new(e, j))?);
                debug!(field = %field.id, row = j, west = w, east = e, "Default transect");
                return Ok(checked.map(|_| Some((start, end))));
            }
        }
    }

    warn!(field = %field.id, "No row with two distinct non-missing samples");
    Ok(Checked::new(None).with_condition(Condition::degenerate("no row has two non-missing samples")))
}

/// Layer index for a level value: exact match, else nearest within range.
fn pick_layer(axis: &VerticalAxis, value: f64) -> Option<(usize, bool)> {
    if let Some(k) = axis.position(value, LEVEL_REL_TOLERANCE) {
        return Some((k, true));
    }
    let (lo, hi) = axis.range()?;
    if value < lo || value > hi {
        return None;
    }
    axis.nearest(value).map(|k| (k, false))
}

fn retain(field: &GriddedField, previous: Option<&Slice>, reason: &str) -> Checked<SliceResult> {
    debug!(field = %field.id, reason, "Degenerate geometry, keeping previous slice");
    Checked::new(SliceResult::Retained(previous.cloned())).with_condition(Condition::degenerate(reason))
}

fn ready_or_missing(field: &GriddedField, slice: Slice) -> SliceResult {
    if slice.is_all_missing() {
        debug!(field = %field.id, kind = slice.geometry.kind(), "Slice is entirely missing");
        SliceResult::Missing
    } else {
        SliceResult::Ready(slice)
    }
}

/// Slice of grid cells at the given levels; columns are cells, rows levels.
fn scattered(
    field: &GriddedField,
    fingerprint: u64,
    mode: SamplingMode,
    cells: &[(usize, usize)],
    levels: &[usize],
) -> Result<Checked<Slice>> {
    let bridge = CoordinateBridge::new(&field.domain);
    let mut checked = Checked::new(());

    let mut positions = Vec::with_capacity(cells.len());
    for &(i, j) in cells {
        positions.push(checked.absorb(bridge.grid_index_to_earth(GridIndex::new(i, j))?));
    }

    let steps = field.time_steps();
    let mut values = Vec::with_capacity(cells.len() * levels.len() * steps);
    for t in 0..steps {
        for &k in levels {
            for &(i, j) in cells {
                values.push(field.get(i, j, k, t).unwrap_or(f32::NAN));
            }
        }
    }

    Ok(checked.map(|_| Slice {
        fingerprint,
        field_id: field.id.clone(),
        unit: field.unit.clone(),
        mode,
        geometry: SliceGeometry::Scattered { positions },
        times: field.times.clone(),
        columns: cells.len(),
        rows: levels.len(),
        values,
    }))
}

fn probe_to_result(field: &GriddedField, fingerprint: u64, mode: SamplingMode, probe: ProbeSample) -> SliceResult {
    let rows = probe.levels_per_step();
    let slice = Slice {
        fingerprint,
        field_id: field.id.clone(),
        unit: field.unit.clone(),
        mode,
        geometry: SliceGeometry::Scattered {
            positions: vec![probe.location],
        },
        times: probe.times,
        columns: 1,
        rows,
        values: probe.values,
    };
    ready_or_missing(field, slice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpatialDomain;
    use geo_common::LinearAxis;
    use test_utils::fixtures::levels;
    use test_utils::{create_masked_columns, create_test_volume};

    fn row_field() -> GriddedField {
        let domain =
            SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 10), LinearAxis::new(45.0, 1.0, 1)).unwrap();
        GriddedField::new("row", "TMP", "K", domain, vec![], (0..10).map(|v| v as f32).collect()).unwrap()
    }

    fn volume_field() -> GriddedField {
        let domain = SpatialDomain::lat_lon(LinearAxis::new(-100.0, 1.0, 6), LinearAxis::new(30.0, 1.0, 4))
            .unwrap()
            .with_vertical(VerticalAxis::new(
                levels::PRESSURE_SURFACE_FIRST_HPA.to_vec(),
                Unit::Hectopascal,
            ))
            .unwrap();
        GriddedField::new("vol", "TMP", "K", domain, vec![], create_test_volume(6, 4, 5)).unwrap()
    }

    #[test]
    fn test_line_over_row() {
        let field = row_field();
        let result = SliceExtractor::default()
            .slice_along_line(
                &field,
                &EarthLocation::surface(45.0, 0.0),
                &EarthLocation::surface(45.0, 9.0),
                SamplingMode::NearestNeighbor,
                None,
            )
            .unwrap();
        assert!(result.is_clean());
        let slice = result.value.slice().unwrap();
        assert_eq!(slice.columns, 10);
        assert_eq!(slice.rows, 1);
        assert_eq!(slice.values, (0..10).map(|v| v as f32).collect::<Vec<_>>());
    }

    #[test]
    fn test_degenerate_line_without_previous() {
        let field = row_field();
        let p = EarthLocation::surface(45.0, 3.0);
        let result = SliceExtractor::default()
            .slice_along_line(&field, &p, &p, SamplingMode::WeightedAverage, None)
            .unwrap();
        assert!(result.has_degenerate_geometry());
        assert!(matches!(result.value, SliceResult::Retained(None)));
    }

    #[test]
    fn test_line_off_grid_is_missing() {
        let field = row_field();
        let result = SliceExtractor::default()
            .slice_along_line(
                &field,
                &EarthLocation::surface(10.0, 0.0),
                &EarthLocation::surface(10.0, 9.0),
                SamplingMode::WeightedAverage,
                None,
            )
            .unwrap();
        assert!(result.value.is_missing());
    }

    #[test]
    fn test_line_sample_count_clamped() {
        let field = row_field();
        let config = SlicerConfig {
            max_line_samples: 4,
            ..Default::default()
        };
        let extractor = SliceExtractor::new(&config).into_inner();
        let result = extractor
            .slice_along_line(
                &field,
                &EarthLocation::surface(45.0, 0.0),
                &EarthLocation::surface(45.0, 9.0),
                SamplingMode::NearestNeighbor,
                None,
            )
            .unwrap();
        let slice = result.value.slice().unwrap();
        assert_eq!(slice.columns, 4);
        assert_eq!(slice.values[0], 0.0);
        assert_eq!(slice.values[3], 9.0);
    }

    #[test]
    fn test_level_exact_keeps_mode() {
        let field = volume_field();
        let result = SliceExtractor::default()
            .slice_at_level(&field, &Level::hpa(700.0), SamplingMode::WeightedAverage)
            .unwrap();
        let slice = result.value.slice().unwrap();
        assert_eq!(slice.mode, SamplingMode::WeightedAverage);
        assert_eq!(slice.values[0], 2_000_000.0);
        assert_eq!((slice.columns, slice.rows), (6, 4));
    }

    #[test]
    fn test_level_between_uses_nearest_neighbor() {
        let field = volume_field();
        let result = SliceExtractor::default()
            .slice_at_level(&field, &Level::hpa(720.0), SamplingMode::WeightedAverage)
            .unwrap();
        let slice = result.value.slice().unwrap();
        assert_eq!(slice.mode, SamplingMode::NearestNeighbor);
        assert_eq!(slice.values[0], 2_000_000.0);
        match &slice.geometry {
            SliceGeometry::Plane { level, .. } => assert_eq!(*level, Some(Level::hpa(700.0))),
            other => panic!("unexpected geometry {}", other.kind()),
        }
    }

    #[test]
    fn test_level_in_other_unit() {
        let field = volume_field();
        let result = SliceExtractor::default()
            .slice_at_level(&field, &Level::new(50_000.0, Unit::Pascal), SamplingMode::WeightedAverage)
            .unwrap();
        assert_eq!(result.value.slice().unwrap().values[0], 3_000_000.0);
    }

    #[test]
    fn test_level_out_of_range_is_missing() {
        let field = volume_field();
        let result = SliceExtractor::default()
            .slice_at_level(&field, &Level::hpa(100.0), SamplingMode::WeightedAverage)
            .unwrap();
        assert!(result.value.is_missing());
        assert!(result.conditions.contains(&Condition::MissingData));
    }

    #[test]
    fn test_level_on_2d_field() {
        let field = row_field();
        let result = SliceExtractor::default()
            .slice_at_level(&field, &Level::hpa(500.0), SamplingMode::WeightedAverage)
            .unwrap();
        assert_eq!(result.value.slice().unwrap().values.len(), 10);
    }

    #[test]
    fn test_point_column_without_altitude() {
        let field = volume_field();
        let probe = SliceExtractor::default()
            .slice_at_point(&field, &EarthLocation::surface(31.0, -98.0), SamplingMode::NearestNeighbor)
            .unwrap()
            .value;
        assert_eq!(probe.levels_per_step(), 5);
        assert_eq!(probe.values[0], 2_001.0);
        assert_eq!(probe.values[4], 4_002_001.0);
    }

    #[test]
    fn test_point_with_altitude_interpolates() {
        let field = volume_field();
        let alt = projection::pressure_to_height(925.0);
        let probe = SliceExtractor::default()
            .slice_at_point(
                &field,
                &EarthLocation::new(31.0, -98.0, alt),
                SamplingMode::WeightedAverage,
            )
            .unwrap()
            .value;
        assert_eq!(probe.levels_per_step(), 1);
        // halfway between 1000 and 850 hPa
        assert!((probe.values[0] - 502_001.0).abs() < 100.0, "got {}", probe.values[0]);

        let probe = SliceExtractor::default()
            .slice_at_point(
                &field,
                &EarthLocation::new(31.0, -98.0, alt),
                SamplingMode::NearestNeighbor,
            )
            .unwrap()
            .value;
        assert!(probe.values[0] == 2_001.0 || probe.values[0] == 1_002_001.0);
    }

    #[test]
    fn test_point_off_grid() {
        let field = volume_field();
        let probe = SliceExtractor::default()
            .slice_at_point(&field, &EarthLocation::surface(60.0, -98.0), SamplingMode::NearestNeighbor)
            .unwrap();
        assert!(probe.value.is_all_missing());
        assert!(probe.conditions.contains(&Condition::MissingData));
    }

    #[test]
    fn test_polygon_needs_three_vertices() {
        let field = volume_field();
        let primitive = CuttingPrimitive::Polygon(vec![
            EarthLocation::surface(30.0, -100.0),
            EarthLocation::surface(32.0, -98.0),
        ]);
        let result = SliceExtractor::default()
            .extract(&field, &primitive, SamplingMode::NearestNeighbor, None)
            .unwrap();
        assert!(result.has_degenerate_geometry());
        assert!(result.value.is_retained());
    }

    #[test]
    fn test_polygon_selects_interior_points() {
        let field = volume_field();
        let primitive = CuttingPrimitive::Polygon(vec![
            EarthLocation::surface(30.5, -99.5),
            EarthLocation::surface(30.5, -97.5),
            EarthLocation::surface(32.5, -97.5),
            EarthLocation::surface(32.5, -99.5),
        ]);
        let result = SliceExtractor::default()
            .extract(&field, &primitive, SamplingMode::NearestNeighbor, None)
            .unwrap();
        let slice = result.value.slice().unwrap();
        // i in 1..=2, j in 1..=2
        assert_eq!(slice.columns, 4);
        assert_eq!(slice.rows, 5);
        assert_eq!(slice.values[0], 1_001.0);
    }

    #[test]
    fn test_initial_area_bounds_checked() {
        let field = volume_field();
        let primitive = CuttingPrimitive::InitialArea {
            level: None,
            indices: vec![(0, 0), (6, 0)],
        };
        assert!(matches!(
            SliceExtractor::default().extract(&field, &primitive, SamplingMode::NearestNeighbor, None),
            Err(SliceError::InvalidIndex { axis: "x", .. })
        ));
    }

    #[test]
    fn test_initial_area_at_level() {
        let field = volume_field();
        let primitive = CuttingPrimitive::InitialArea {
            level: Some(Level::hpa(500.0)),
            indices: vec![(0, 0), (5, 3)],
        };
        let result = SliceExtractor::default()
            .extract(&field, &primitive, SamplingMode::NearestNeighbor, None)
            .unwrap();
        let slice = result.value.slice().unwrap();
        assert_eq!(slice.values, vec![3_000_000.0, 3_005_003.0]);
    }

    #[test]
    fn test_default_transect_skips_missing_edges() {
        let domain =
            SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 8), LinearAxis::new(10.0, 1.0, 5)).unwrap();
        let field = GriddedField::new(
            "masked",
            "TMP",
            "K",
            domain,
            vec![],
            create_masked_columns(8, 5, &[2, 3, 4, 5]),
        )
        .unwrap();
        let (start, end) = default_transect(&field).unwrap().value.unwrap();
        assert_eq!((start.latitude, start.longitude), (12.0, 2.0));
        assert_eq!((end.latitude, end.longitude), (12.0, 5.0));
    }

    #[test]
    fn test_default_transect_all_missing() {
        let domain =
            SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 4), LinearAxis::new(10.0, 1.0, 3)).unwrap();
        let field =
            GriddedField::new("empty", "TMP", "K", domain, vec![], vec![f32::NAN; 12]).unwrap();
        let result = default_transect(&field).unwrap();
        assert!(result.value.is_none());
        assert!(result.has_degenerate_geometry());
    }
}
