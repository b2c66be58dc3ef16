//! Trajectory seeding and background integration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo_common::{EarthLocation, LinearAxis};
use grid_slicer::{CancelToken, GridSlicer, GriddedField, SliceError, SlicerConfig, SpatialDomain, TrajectoryRequest};
use test_utils::fixtures::time::HOURLY_STEPS;

fn times() -> Vec<DateTime<Utc>> {
    HOURLY_STEPS.iter().map(|s| s.parse().unwrap()).collect()
}

/// 1° grid over 20..40N, -110..-90, stored in 0..360 longitudes
fn wind(id: &str, value: f32) -> Arc<GriddedField> {
    let domain = SpatialDomain::lat_lon(LinearAxis::new(250.0, 1.0, 21), LinearAxis::new(20.0, 1.0, 21)).unwrap();
    Arc::new(GriddedField::new(id, id, "m/s", domain, times(), vec![value; 21 * 21 * 3]).unwrap())
}

fn box_polygon() -> Vec<EarthLocation> {
    vec![
        EarthLocation::surface(29.5, -100.5),
        EarthLocation::surface(29.5, -97.5),
        EarthLocation::surface(31.5, -97.5),
        EarthLocation::surface(31.5, -100.5),
    ]
}

#[tokio::test]
async fn test_seed_and_integrate_northward() {
    let slicer = GridSlicer::new(SlicerConfig::default()).unwrap();
    let u = wind("u", 0.0);
    let v = wind("v", 20.0);

    let seeds = slicer.trajectory_seeds(&u, &[box_polygon()], None).unwrap().value;
    // lats 30, 31 x lons -100, -99, -98
    assert_eq!(seeds.len(), 6);

    let paths = slicer
        .trajectories(TrajectoryRequest::new(u, v, seeds.clone()))
        .wait()
        .await
        .unwrap();

    assert_eq!(paths.len(), seeds.len());
    for (path, seed) in paths.iter().zip(&seeds) {
        assert_eq!(path.len(), 3);
        assert!(path.points[2].latitude > seed.latitude);
        assert!((path.points[2].longitude - seed.longitude).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_trajectory_skip_from_config() {
    let config = SlicerConfig {
        trajectory_skip: 1,
        ..SlicerConfig::default()
    };
    let slicer = GridSlicer::new(config).unwrap();
    let seeds = slicer.trajectory_seeds(&wind("u", 0.0), &[box_polygon()], None).unwrap().value;
    assert_eq!(seeds.len(), 3);
}

#[tokio::test]
async fn test_cancelled_job_reports_cancelled() {
    let slicer = GridSlicer::new(SlicerConfig::default()).unwrap();
    let runner = grid_slicer::TrajectoryRunner::new(slicer.config());
    let token = CancelToken::new();
    token.cancel();

    let request = TrajectoryRequest::new(
        wind("u", 5.0),
        wind("v", 5.0),
        vec![EarthLocation::surface(30.0, -100.0)],
    );
    let result = runner.submit_with_token(request, token).wait().await;
    assert!(matches!(result, Err(SliceError::Cancelled)));
}
