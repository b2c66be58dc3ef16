//! Vertical level catalog.
//!
//! Resolves which levels a data source offers and turns a level request
//! (by value, by index, all, or the default) into a concrete level. Also
//! maps levels to display altitudes and back.

use std::fmt;

use geo_common::{Dimension, Unit};
use projection::{height_to_pressure, pressure_to_height};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{VerticalAxis, VerticalKind};
use crate::error::{Result, SliceError};
use crate::field::GriddedField;
use crate::types::{Checked, Condition};

/// Relative tolerance for two level values to count as the same level.
pub const LEVEL_REL_TOLERANCE: f64 = 1e-6;

/// A physical vertical level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub value: f64,
    pub unit: Unit,
}

impl Level {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn hpa(value: f64) -> Self {
        Self::new(value, Unit::Hectopascal)
    }

    pub fn meters(value: f64) -> Self {
        Self::new(value, Unit::Meter)
    }

    /// This level expressed in `unit`, if the units are compatible.
    pub fn convert_to(&self, unit: Unit) -> Option<Level> {
        self.unit.convert(self.value, unit).map(|v| Level::new(v, unit))
    }

    /// Same level within [`LEVEL_REL_TOLERANCE`], after unit conversion.
    pub fn matches(&self, other: &Level) -> bool {
        match other.convert_to(self.unit) {
            Some(o) => {
                let scale = self.value.abs().max(o.value.abs()).max(1e-12);
                (self.value - o.value).abs() <= LEVEL_REL_TOLERANCE * scale
            }
            None => false,
        }
    }

    /// Value in SI base units, used for sorting across units.
    fn base_value(&self) -> f64 {
        self.unit.to_base(self.value)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Discrete levels available for a field, in the source's native order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelSet {
    levels: Vec<Level>,
}

impl LevelSet {
    pub fn new(levels: Vec<Level>) -> Self {
        Self { levels }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_axis(axis: &VerticalAxis) -> Self {
        Self::new(axis.values.iter().map(|&v| Level::new(v, axis.unit)).collect())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Level> {
        self.levels.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    /// Levels in native order.
    pub fn native(&self) -> &[Level] {
        &self.levels
    }

    /// Levels sorted by their physical value, ascending.
    pub fn sorted_by_value(&self) -> Vec<Level> {
        let mut sorted = self.levels.clone();
        sorted.sort_by(|a, b| {
            a.base_value()
                .partial_cmp(&b.base_value())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// Whether the native order runs from small to large values.
    pub fn is_ascending(&self) -> bool {
        self.levels
            .windows(2)
            .all(|w| w[0].base_value() <= w[1].base_value())
    }

    /// Index of the first level matching `level`.
    pub fn position(&self, level: &Level) -> Option<usize> {
        self.levels.iter().position(|l| l.matches(level))
    }

    /// The default selection: the last entry in native order.
    pub fn default_level(&self) -> Option<(usize, Level)> {
        self.levels.last().map(|l| (self.levels.len() - 1, *l))
    }

    /// Keep levels between `from` and `to` (inclusive, either order).
    pub fn within(&self, from: &Level, to: &Level) -> LevelSet {
        let (a, b) = (from.base_value(), to.base_value());
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        LevelSet::new(
            self.levels
                .iter()
                .filter(|l| {
                    l.unit.can_convert(from.unit) && l.base_value() >= lo && l.base_value() <= hi
                })
                .copied()
                .collect(),
        )
    }
}

/// Level bounds a caller attached to a data request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSelection {
    pub from_level: Option<Level>,
    pub to_level: Option<Level>,
}

impl DataSelection {
    pub fn with_range(from: Level, to: Level) -> Self {
        Self {
            from_level: Some(from),
            to_level: Some(to),
        }
    }

    pub fn has_level_range(&self) -> bool {
        self.from_level.is_some() || self.to_level.is_some()
    }

    /// This selection with any level bounds removed.
    pub fn without_level_range(&self) -> Self {
        Self {
            from_level: None,
            to_level: None,
        }
    }
}

/// A source of data that can declare its vertical levels.
pub trait DataChoice: Send + Sync {
    fn id(&self) -> &str;

    /// Levels this choice offers under `selection`.
    ///
    /// `Ok(None)` means the choice declares nothing. Errors are surfaced as
    /// [`SliceError::ResourceUnavailable`] and are not retried.
    fn declared_levels(&self, selection: &DataSelection) -> Result<Option<LevelSet>>;
}

/// A requested level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelRequest {
    Value(Level),
    Index(usize),
    All,
    Default,
}

/// A request resolved against a level set.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedLevel {
    /// One level. `index` is its position in the set, or `None` for a value
    /// that is not one of the native levels.
    Single { index: Option<usize>, level: Level },
    All(LevelSet),
    /// The field has no level concept.
    NoLevels,
}

impl ResolvedLevel {
    /// The request that resolves back to this level.
    pub fn as_request(&self) -> LevelRequest {
        match self {
            Self::Single { level, .. } => LevelRequest::Value(*level),
            Self::All(_) => LevelRequest::All,
            Self::NoLevels => LevelRequest::Default,
        }
    }

    pub fn level(&self) -> Option<&Level> {
        match self {
            Self::Single { level, .. } => Some(level),
            _ => None,
        }
    }
}

/// Levels offered by `choice`.
///
/// Any from/to bounds are removed from the selection before asking, since
/// the question is what exists, not what was previously selected. When the
/// choice declares nothing, the field's own vertical axis is used; a pure
/// 2-D field yields an empty set.
pub fn all_levels(
    choice: &dyn DataChoice,
    selection: &DataSelection,
    field: Option<&GriddedField>,
) -> Result<LevelSet> {
    let cleared = selection.without_level_range();
    if let Some(set) = choice.declared_levels(&cleared)? {
        debug!(choice = choice.id(), levels = set.len(), "Levels declared by data choice");
        return Ok(set);
    }

    let set = field
        .and_then(|f| f.vertical())
        .map(LevelSet::from_axis)
        .unwrap_or_default();
    debug!(choice = choice.id(), levels = set.len(), "Levels taken from field domain");
    Ok(set)
}

/// Resolve a level request against a set.
///
/// Resolution is a fixed point: resolving `resolved.as_request()` yields
/// the same result again.
pub fn resolve_level(set: &LevelSet, requested: LevelRequest) -> Result<Checked<ResolvedLevel>> {
    if set.is_empty() {
        return Ok(Checked::new(ResolvedLevel::NoLevels));
    }

    let resolved = match requested {
        LevelRequest::All => ResolvedLevel::All(set.clone()),
        LevelRequest::Default => match set.default_level() {
            Some((index, level)) => ResolvedLevel::Single {
                index: Some(index),
                level,
            },
            None => ResolvedLevel::NoLevels,
        },
        LevelRequest::Index(index) => match set.get(index) {
            Some(level) => ResolvedLevel::Single {
                index: Some(index),
                level: *level,
            },
            None => return Err(SliceError::invalid_index("level", index, set.len())),
        },
        LevelRequest::Value(level) => {
            let mut checked = Checked::new(());
            if let Some(native) = set.get(0) {
                if !level.unit.can_convert(native.unit) {
                    warn!(requested = %level, native_unit = %native.unit, "Level unit incompatible with level set");
                    checked.push(Condition::unit_conversion(level.unit, native.unit));
                }
            }
            let resolved = match set.position(&level) {
                Some(index) => ResolvedLevel::Single {
                    index: Some(index),
                    level: set.native()[index],
                },
                None => ResolvedLevel::Single { index: None, level },
            };
            return Ok(checked.map(|_| resolved));
        }
    };

    Ok(Checked::new(resolved))
}

/// Display altitude (m) of a level in `field`.
///
/// Height levels convert directly; pressure levels go through the standard
/// atmosphere. With `at = Some((i, j))` the result is NaN when the level lies
/// below the terrain at that horizontal point; `None` skips terrain masking.
/// Also NaN when the level's unit has no height interpretation (with a
/// unit-conversion condition).
pub fn altitude_for_level(field: &GriddedField, level: &Level, at: Option<(usize, usize)>) -> Checked<f64> {
    let altitude = match level.unit.dimension() {
        Dimension::Length => level.unit.convert(level.value, Unit::Meter),
        Dimension::Pressure => level
            .unit
            .convert(level.value, Unit::Hectopascal)
            .map(pressure_to_height),
        _ => None,
    };

    let Some(altitude) = altitude else {
        warn!(field = %field.id, level = %level, "No altitude for level unit");
        return Checked::new(f64::NAN).with_condition(Condition::unit_conversion(level.unit, Unit::Meter));
    };

    match at {
        Some(point) => Checked::new(mask_below_terrain(field, point, altitude)),
        None => Checked::new(altitude),
    }
}

/// `altitude` (m), or NaN when it is below the terrain at horizontal point
/// `(i, j)`. Points without terrain pass through.
pub fn mask_below_terrain(field: &GriddedField, (i, j): (usize, usize), altitude: f64) -> f64 {
    let (nx, ny, _) = field.shape();
    if i >= nx || j >= ny {
        return altitude;
    }
    match field.terrain().and_then(|t| t.get(i + nx * j)).copied() {
        Some(surface) if !surface.is_nan() && altitude < surface as f64 => {
            debug!(field = %field.id, i, j, altitude, surface, "Level below terrain");
            f64::NAN
        }
        _ => altitude,
    }
}

/// The level in `field`'s vertical coordinate at an altitude (m).
///
/// `None` for 2-D fields and for generic vertical coordinates.
pub fn level_for_altitude(field: &GriddedField, altitude_m: f64) -> Checked<Option<Level>> {
    let Some(axis) = field.vertical() else {
        return Checked::new(None);
    };
    if altitude_m.is_nan() {
        return Checked::new(None);
    }

    let value = match axis.kind {
        VerticalKind::Height => Unit::Meter.convert(altitude_m, axis.unit),
        VerticalKind::Pressure => Unit::Hectopascal.convert(height_to_pressure(altitude_m), axis.unit),
        VerticalKind::Generic => None,
    };

    match value {
        Some(v) => Checked::new(Some(Level::new(v, axis.unit))),
        None => Checked::new(None).with_condition(Condition::unit_conversion(Unit::Meter, axis.unit)),
    }
}
