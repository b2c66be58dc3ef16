//! Trajectory seed selection.

use geo_common::EarthLocation;
use projection::normalize_longitude;
use tracing::debug;

use crate::bridge::{CoordinateBridge, GridIndex};
use crate::error::Result;
use crate::field::GriddedField;
use crate::levels::{altitude_for_level, mask_below_terrain, Level};
use crate::primitive::point_in_polygon;
use crate::types::{Checked, Condition};

/// Grid points of `field` inside any of `polygons`.
///
/// Seed longitudes are normalized to -180..180. Every `(skip + 1)`-th
/// candidate in grid order is kept. Seeds get the display altitude of
/// `level`, missing when no level is given or when the level is below the
/// terrain at the seed's grid point. Polygons with fewer than three
/// vertices are ignored; when none is usable the result is empty with a
/// degenerate-geometry condition.
pub fn seed_points(
    field: &GriddedField,
    polygons: &[Vec<EarthLocation>],
    level: Option<&Level>,
    skip: usize,
) -> Result<Checked<Vec<EarthLocation>>> {
    let usable: Vec<&Vec<EarthLocation>> = polygons.iter().filter(|p| p.len() >= 3).collect();
    if usable.is_empty() {
        return Ok(Checked::new(Vec::new()).with_condition(Condition::degenerate("no polygon with 3 or more vertices")));
    }

    let mut checked = Checked::new(());
    let altitude = match level {
        Some(level) => checked.absorb(altitude_for_level(field, level, None)),
        None => f64::NAN,
    };

    let bridge = CoordinateBridge::new(&field.domain);
    let (nx, ny, _) = field.shape();
    let mut candidates = Vec::new();
    for j in 0..ny {
        for i in 0..nx {
            let loc = checked.absorb(bridge.grid_index_to_earth(GridIndex::new(i, j))?);
            let lon = normalize_longitude(loc.longitude);
            if usable.iter().any(|p| point_in_polygon(loc.latitude, lon, p)) {
                let altitude = mask_below_terrain(field, (i, j), altitude);
                candidates.push(EarthLocation::new(loc.latitude, lon, altitude));
            }
        }
    }

    let total = candidates.len();
    let seeds: Vec<EarthLocation> = candidates.into_iter().step_by(skip + 1).collect();
    debug!(field = %field.id, candidates = total, seeds = seeds.len(), skip, "Selected trajectory seeds");
    Ok(checked.map(|_| seeds))
}

/// Seeds at explicit grid indices at the altitude of `level`, masked by the
/// terrain at each index.
pub fn seeds_from_indices(
    field: &GriddedField,
    indices: &[(usize, usize)],
    level: Option<&Level>,
) -> Result<Checked<Vec<EarthLocation>>> {
    let mut checked = Checked::new(());
    let altitude = match level {
        Some(level) => checked.absorb(altitude_for_level(field, level, None)),
        None => f64::NAN,
    };

    let bridge = CoordinateBridge::new(&field.domain);
    let mut seeds = Vec::with_capacity(indices.len());
    for &(i, j) in indices {
        let loc = checked.absorb(bridge.grid_index_to_earth(GridIndex::new(i, j))?);
        seeds.push(EarthLocation::new(
            loc.latitude,
            normalize_longitude(loc.longitude),
            mask_below_terrain(field, (i, j), altitude),
        ));
    }
    Ok(checked.map(|_| seeds))
}
