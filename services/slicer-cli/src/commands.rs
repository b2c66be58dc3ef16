//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use geo_common::{EarthLocation, Unit};
use serde_json::{json, Value};
use tracing::{info, warn};

use grid_slicer::{
    apply_skip, resolve_level, Checked, CuttingPrimitive, FieldDescriptor, GridSlicer, GriddedField, Level,
    LevelRequest, LevelSet, SamplingMode, SliceResult, TransectAxisBuilder, TrajectoryRequest,
};

use crate::output::{conditions_json, result_json};

/// Parse `lat,lon` or `lat,lon,alt`.
pub fn parse_location(s: &str) -> std::result::Result<EarthLocation, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let number = |p: &str| p.parse::<f64>().map_err(|e| format!("'{}': {}", p, e));
    match parts.as_slice() {
        [lat, lon] => Ok(EarthLocation::surface(number(lat)?, number(lon)?)),
        [lat, lon, alt] => Ok(EarthLocation::new(number(lat)?, number(lon)?, number(alt)?)),
        _ => Err(format!("expected 'lat,lon[,alt]', got '{}'", s)),
    }
}

/// Parse `lat,lon;lat,lon;...`.
pub fn parse_path(s: &str) -> std::result::Result<Vec<EarthLocation>, String> {
    s.split(';')
        .filter(|p| !p.trim().is_empty())
        .map(parse_location)
        .collect()
}

/// Parse a level request: `default`, `all`, `index:N` or `VALUE[UNIT]`
/// such as `500hPa`.
pub fn parse_level_request(s: &str, default_unit: Unit) -> std::result::Result<LevelRequest, String> {
    let s = s.trim();
    match s.to_lowercase().as_str() {
        "default" => return Ok(LevelRequest::Default),
        "all" => return Ok(LevelRequest::All),
        _ => {}
    }
    if let Some(index) = s.strip_prefix("index:") {
        return index
            .parse()
            .map(LevelRequest::Index)
            .map_err(|e| format!("bad level index '{}': {}", index, e));
    }
    parse_level(s, default_unit).map(LevelRequest::Value)
}

/// Parse `VALUE[UNIT]`, e.g. `500hPa`, `1500 m` or `850`.
pub fn parse_level(s: &str, default_unit: Unit) -> std::result::Result<Level, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let value: f64 = number.parse().map_err(|e| format!("bad level '{}': {}", s, e))?;
    let unit = if unit.trim().is_empty() {
        default_unit
    } else {
        Unit::parse(unit).map_err(|e| e.to_string())?
    };
    Ok(Level::new(value, unit))
}

pub fn load_field(path: &Path) -> Result<GriddedField> {
    let descriptor =
        FieldDescriptor::from_file(path).with_context(|| format!("Failed to read field descriptor {}", path.display()))?;
    let field = descriptor
        .into_field()
        .with_context(|| format!("Invalid field descriptor {}", path.display()))?;
    info!(field = %field.id, shape = ?field.shape(), times = field.time_steps(), "Loaded field");
    Ok(field)
}

fn with_skip(mut result: Checked<SliceResult>, skip: usize) -> Checked<SliceResult> {
    if skip > 1 {
        if let SliceResult::Ready(slice) = &result.value {
            result.value = SliceResult::Ready(apply_skip(slice, skip));
        }
    }
    result
}

pub fn transect(
    slicer: &GridSlicer,
    field: &GriddedField,
    from: Option<EarthLocation>,
    to: Option<EarthLocation>,
    mode: Option<SamplingMode>,
    skip: usize,
) -> Result<Value> {
    let (start, end, mut conditions) = match (from, to) {
        (Some(start), Some(end)) => (start, end, Vec::new()),
        (None, None) => {
            let Checked { value, conditions } = slicer.default_transect(field)?;
            match value {
                Some((start, end)) => {
                    info!(start = ?start, end = ?end, "Using default transect");
                    (start, end, conditions)
                }
                None => {
                    return Ok(json!({
                        "status": "missing",
                        "slice": null,
                        "conditions": conditions_json(&conditions),
                    }))
                }
            }
        }
        _ => bail!("--from and --to must be given together"),
    };

    let mut result = slicer.slice(field, &CuttingPrimitive::line(start, end), mode, None)?;
    for c in conditions.drain(..) {
        result.push(c);
    }
    Ok(result_json(&with_skip(result, skip)))
}

pub fn level(
    slicer: &GridSlicer,
    field: &GriddedField,
    request: LevelRequest,
    mode: Option<SamplingMode>,
    skip: usize,
) -> Result<Value> {
    let set = field.vertical().map(LevelSet::from_axis).unwrap_or_default();
    let resolved = resolve_level(&set, request)?;

    let level = match resolved.value.level() {
        Some(level) => *level,
        None if set.is_empty() => Level::new(0.0, Unit::Dimensionless),
        None => bail!("level request {:?} does not select a single level", request),
    };

    let mut result = slicer.slice(field, &CuttingPrimitive::Level(level), mode, None)?;
    for c in resolved.conditions {
        result.push(c);
    }
    Ok(result_json(&with_skip(result, skip)))
}

pub fn probe(
    slicer: &GridSlicer,
    field: &GriddedField,
    location: EarthLocation,
    mode: Option<SamplingMode>,
) -> Result<Value> {
    let probe = slicer.probe(field, &location, mode)?;
    Ok(json!({
        "probe": probe.value,
        "conditions": conditions_json(&probe.conditions),
    }))
}

pub fn distance(path: &[EarthLocation], unit: Unit) -> Result<Value> {
    if path.len() < 2 {
        bail!("a path needs at least 2 points, got {}", path.len());
    }
    let Checked {
        value: builder,
        conditions,
    } = TransectAxisBuilder::new(unit);
    let points: Vec<(f64, f64)> = path.iter().map(|p| (p.latitude, p.longitude)).collect();
    let axis = builder.build(&points);
    Ok(json!({
        "total": axis.total(),
        "axis": axis,
        "conditions": conditions_json(&conditions),
    }))
}

pub async fn trajectory(
    slicer: &GridSlicer,
    u: GriddedField,
    v: GriddedField,
    tracer: Option<GriddedField>,
    polygon: Vec<EarthLocation>,
    level: Option<Level>,
) -> Result<Value> {
    let seeds = slicer.trajectory_seeds(&u, &[polygon], level.as_ref())?;
    if seeds.value.is_empty() {
        warn!("No trajectory seeds inside the polygon");
    }

    let mut request = TrajectoryRequest::new(Arc::new(u), Arc::new(v), seeds.value);
    if let Some(tracer) = tracer {
        request = request.with_tracer(Arc::new(tracer));
    }

    let handle = slicer.trajectories(request);
    let token = handle.token().clone();
    let paths = tokio::select! {
        result = handle.wait() => result?,
        _ = tokio::signal::ctrl_c() => {
            token.cancel();
            bail!("interrupted");
        }
    };

    Ok(json!({
        "trajectories": paths,
        "conditions": conditions_json(&seeds.conditions),
    }))
}
