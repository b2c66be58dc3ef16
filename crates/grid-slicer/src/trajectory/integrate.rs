//! Forward-Euler parcel integration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo_common::EarthLocation;
use projection::{normalize_longitude, EARTH_RADIUS_M};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::bridge::CoordinateBridge;
use crate::error::{Result, SliceError};
use crate::field::GriddedField;
use crate::levels::level_for_altitude;

use super::runner::CancelToken;

/// Wind components, an optional tracer and the parcels to release.
#[derive(Debug, Clone)]
pub struct TrajectoryRequest {
    /// Eastward wind (m/s)
    pub u: Arc<GriddedField>,
    /// Northward wind (m/s)
    pub v: Arc<GriddedField>,
    /// Scalar sampled along each path
    pub tracer: Option<Arc<GriddedField>>,
    pub seeds: Vec<EarthLocation>,
}

impl TrajectoryRequest {
    pub fn new(u: Arc<GriddedField>, v: Arc<GriddedField>, seeds: Vec<EarthLocation>) -> Self {
        Self {
            u,
            v,
            tracer: None,
            seeds,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<GriddedField>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.u.times.len() < 2 {
            return Err(SliceError::invalid_parameter(format!(
                "trajectories need at least 2 time steps, '{}' has {}",
                self.u.id,
                self.u.times.len()
            )));
        }
        if self.u.shape() != self.v.shape() || self.u.times != self.v.times {
            return Err(SliceError::malformed(format!(
                "wind components '{}' and '{}' do not share a grid",
                self.u.id, self.v.id
            )));
        }
        if let Some(tracer) = &self.tracer {
            if tracer.times != self.u.times {
                return Err(SliceError::malformed(format!(
                    "tracer '{}' times do not match the winds",
                    tracer.id
                )));
            }
        }
        Ok(())
    }
}

/// The path of one parcel, one point per time step.
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    pub seed: EarthLocation,
    pub points: Vec<EarthLocation>,
    pub times: Vec<DateTime<Utc>>,
    /// Tracer value at each point; empty without a tracer
    pub tracer: Vec<f32>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&EarthLocation> {
        self.points.last()
    }
}

/// Integrate every seed of `request` through at most `max_steps` steps.
///
/// Seeds run in parallel. Returns [`SliceError::Cancelled`] as soon as a
/// worker notices `token` was cancelled.
pub fn integrate_trajectories(
    request: &TrajectoryRequest,
    max_steps: usize,
    token: &CancelToken,
) -> Result<Vec<Trajectory>> {
    request.validate()?;
    info!(
        u = %request.u.id,
        v = %request.v.id,
        seeds = request.seeds.len(),
        max_steps,
        "Integrating trajectories"
    );

    request
        .seeds
        .par_iter()
        .map(|seed| integrate_one(request, *seed, max_steps, token))
        .collect()
}

fn integrate_one(
    request: &TrajectoryRequest,
    seed: EarthLocation,
    max_steps: usize,
    token: &CancelToken,
) -> Result<Trajectory> {
    let u = &request.u;
    let bridge = CoordinateBridge::new(&u.domain);
    let tracer_bridge = request.tracer.as_ref().map(|f| CoordinateBridge::new(&f.domain));
    let steps = u.times.len().min(max_steps + 1);

    let mut points = Vec::with_capacity(steps);
    let mut tracer = Vec::new();
    let mut position = seed;

    for t in 0..steps {
        if token.is_cancelled() {
            return Err(SliceError::Cancelled);
        }

        if t > 0 {
            let dt = (u.times[t] - u.times[t - 1]).num_milliseconds() as f64 / 1000.0;
            position = advect(&bridge, request, position, t - 1, dt);
        }
        points.push(position);

        if let (Some(field), Some(tb)) = (&request.tracer, &tracer_bridge) {
            tracer.push(sample_nearest(tb, field, &position, t).unwrap_or(f32::NAN));
        }
    }

    Ok(Trajectory {
        seed,
        points,
        times: u.times[..steps].to_vec(),
        tracer,
    })
}

/// One Euler step from `position` with the winds valid at step `t`.
///
/// A parcel whose winds are missing, or whose next position leaves the
/// domain, holds its current position.
fn advect(
    bridge: &CoordinateBridge<'_>,
    request: &TrajectoryRequest,
    position: EarthLocation,
    t: usize,
    dt: f64,
) -> EarthLocation {
    let (Some(u), Some(v)) = (
        sample_nearest(bridge, &request.u, &position, t),
        sample_nearest(bridge, &request.v, &position, t),
    ) else {
        return position;
    };
    if u.is_nan() || v.is_nan() {
        return position;
    }

    let altitude = if position.has_altitude() { position.altitude } else { 0.0 };
    let radius = EARTH_RADIUS_M + altitude;
    let cos_lat = position.latitude.to_radians().cos().max(1e-6);

    let dlat = (v as f64 * dt / radius).to_degrees();
    let dlon = (u as f64 * dt / (radius * cos_lat)).to_degrees();

    let next = EarthLocation::new(
        (position.latitude + dlat).clamp(-90.0, 90.0),
        normalize_longitude(position.longitude + dlon),
        position.altitude,
    );

    if bridge.earth_to_grid(&next).value.is_none() {
        debug!(lat = next.latitude, lon = next.longitude, "Parcel left the domain");
        return position;
    }
    next
}

fn sample_nearest(
    bridge: &CoordinateBridge<'_>,
    field: &GriddedField,
    location: &EarthLocation,
    t: usize,
) -> Option<f32> {
    let index = bridge.earth_to_grid_index(location).value?;
    field.get(index.i, index.j, level_index(field, location), t)
}

fn level_index(field: &GriddedField, location: &EarthLocation) -> usize {
    let Some(axis) = field.vertical() else {
        return 0;
    };
    if !location.has_altitude() {
        return 0;
    }
    level_for_altitude(field, location.altitude)
        .value
        .and_then(|level| axis.nearest(level.value))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SpatialDomain;
    use geo_common::LinearAxis;
    use test_utils::assert_approx_eq;
    use test_utils::fixtures::time::HOURLY_STEPS;

    fn times() -> Vec<DateTime<Utc>> {
        HOURLY_STEPS.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn wind(id: &str, value: f32) -> Arc<GriddedField> {
        let domain = SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 11), LinearAxis::new(-5.0, 1.0, 11)).unwrap();
        Arc::new(GriddedField::new(id, id, "m/s", domain, times(), vec![value; 11 * 11 * 3]).unwrap())
    }

    #[test]
    fn test_eastward_drift_at_equator() {
        let request = TrajectoryRequest::new(wind("u", 10.0), wind("v", 0.0), vec![EarthLocation::surface(0.0, 2.0)]);
        let paths = integrate_trajectories(&request, 240, &CancelToken::new()).unwrap();

        let path = &paths[0];
        assert_eq!(path.len(), 3);
        // 10 m/s for one hour
        let step = (10.0 * 3600.0 / EARTH_RADIUS_M).to_degrees();
        assert_approx_eq!(path.points[1].longitude, 2.0 + step, 1e-9);
        assert_approx_eq!(path.points[2].longitude, 2.0 + 2.0 * step, 1e-9);
        assert_approx_eq!(path.points[2].latitude, 0.0, 1e-12);
    }

    #[test]
    fn test_parcel_holds_at_domain_edge() {
        let request = TrajectoryRequest::new(wind("u", 100.0), wind("v", 0.0), vec![EarthLocation::surface(0.0, 9.0)]);
        let path = integrate_trajectories(&request, 240, &CancelToken::new()).unwrap().remove(0);
        assert_eq!(path.points[1].longitude, 9.0);
        assert_eq!(path.points[2].longitude, 9.0);
    }

    #[test]
    fn test_max_steps_limits_path() {
        let request = TrajectoryRequest::new(wind("u", 1.0), wind("v", 1.0), vec![EarthLocation::surface(0.0, 5.0)]);
        let path = integrate_trajectories(&request, 1, &CancelToken::new()).unwrap().remove(0);
        assert_eq!(path.len(), 2);
        assert_eq!(path.times.len(), 2);
    }

    #[test]
    fn test_tracer_sampled_along_path() {
        let request = TrajectoryRequest::new(wind("u", 0.0), wind("v", 0.0), vec![EarthLocation::surface(0.0, 5.0)])
            .with_tracer(wind("t", 280.0));
        let path = integrate_trajectories(&request, 240, &CancelToken::new()).unwrap().remove(0);
        assert_eq!(path.tracer, vec![280.0; 3]);
    }

    #[test]
    fn test_single_time_step_rejected() {
        let domain = SpatialDomain::lat_lon(LinearAxis::new(0.0, 1.0, 2), LinearAxis::new(0.0, 1.0, 2)).unwrap();
        let field = Arc::new(GriddedField::new("u", "u", "m/s", domain, vec![], vec![0.0; 4]).unwrap());
        let request = TrajectoryRequest::new(field.clone(), field, vec![]);
        assert!(matches!(
            integrate_trajectories(&request, 10, &CancelToken::new()),
            Err(SliceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cancelled_token_stops_integration() {
        let token = CancelToken::new();
        token.cancel();
        let request = TrajectoryRequest::new(wind("u", 1.0), wind("v", 1.0), vec![EarthLocation::surface(0.0, 5.0)]);
        assert!(matches!(
            integrate_trajectories(&request, 10, &token),
            Err(SliceError::Cancelled)
        ));
    }
}
